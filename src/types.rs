//! Core types for the reconciliation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_id! {
    /// Opaque stable identifier for a user. Equality by value, never mutated.
    UserId
}

string_id! {
    /// Identifier for a voice channel (lobby or team).
    ChannelId
}

string_id! {
    /// Stable key of a selection category (e.g. "ordnance", "titan").
    CategoryId
}

string_id! {
    /// Identifier of a selectable item within a category.
    ChoiceId
}

/// A user as seen in one channel at one instant.
///
/// Rebuilt fully on every membership fetch, never partially patched, so a
/// missed roster event cannot leave a stale field behind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelUser {
    pub id: UserId,

    /// Preferred display name (per-channel nickname over global username),
    /// HTML-escaped at snapshot build time.
    pub display_name: String,

    /// Opaque avatar reference for the presentation layer.
    pub avatar: Option<String>,
}

/// A voice channel with its present members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub users: Vec<ChannelUser>,
}

impl Channel {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Ids of the users present in this channel.
    pub fn user_ids(&self) -> impl Iterator<Item = &UserId> {
        self.users.iter().map(|u| &u.id)
    }
}

/// One coherent, normalized view of "who is where".
///
/// All configured team channels are present, including empty ones - the
/// engine prunes and computes against full membership regardless of what the
/// presentation layer chooses to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lobby: Channel,
    pub team_channels: Vec<Channel>,
}

impl Snapshot {
    /// Union of every user id present in the lobby or any team channel.
    pub fn present_user_ids(&self) -> BTreeSet<UserId> {
        let mut ids: BTreeSet<UserId> = self.lobby.user_ids().cloned().collect();
        for channel in &self.team_channels {
            ids.extend(channel.user_ids().cloned());
        }
        ids
    }
}

/// Which emission shape a cycle produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Channel tree plus selections; sent on membership change or when a new
    /// client connects.
    FullUpdate,

    /// Sent after a pure selection change. Intentionally the same payload
    /// shape as a full update; clients observe identical end state.
    SelectionUpdate,
}

/// An inbound event that starts one reconciliation cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// A client changed (or cleared) their selection in one category.
    SelectionChanged {
        category: CategoryId,
        user: UserId,
        /// `None` means "unselect"; represented by store absence, not a
        /// sentinel choice value.
        choice: Option<ChoiceId>,
    },

    /// A newly connected client asked to be populated.
    ClientReady,

    /// The roster source reported some voice state change. The notification
    /// carries no usable delta; membership is re-fetched from scratch.
    VoiceStateChanged,
}

impl Trigger {
    /// The emission shape this trigger's cycle should produce.
    pub fn update_kind(&self) -> UpdateKind {
        match self {
            Trigger::SelectionChanged { .. } => UpdateKind::SelectionUpdate,
            Trigger::ClientReady | Trigger::VoiceStateChanged => UpdateKind::FullUpdate,
        }
    }
}
