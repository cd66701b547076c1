//! Roster source boundary.
//!
//! Membership lives in an external system (a voice chat platform). The
//! engine only ever sees it through [`RosterSource::fetch`]: one coherent
//! read of the configured lobby and team channels per cycle. Raw data is
//! normalized into a [`Snapshot`](crate::types::Snapshot) immediately after
//! fetching; nothing downstream holds live roster objects.

use crate::error::{EngineError, Result};
use crate::types::{ChannelId, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Which channels the engine reconciles against.
#[derive(Clone, Debug)]
pub struct RosterConfig {
    /// The neutral holding-pen channel. Presence here forfeits selections.
    pub lobby: ChannelId,

    /// Channels whose occupancy selection caps are evaluated against.
    pub teams: Vec<ChannelId>,
}

/// A member as reported by the roster source, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMember {
    pub id: UserId,

    /// Global username.
    pub username: String,

    /// Per-channel nickname, preferred over the username when present.
    pub nickname: Option<String>,

    /// Opaque avatar reference.
    pub avatar: Option<String>,

    /// Carried through from the source; mute state does not affect
    /// reconciliation, any change to it still re-triggers a full cycle.
    pub muted: bool,
}

impl RawMember {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
            nickname: None,
            avatar: None,
            muted: false,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// One channel's raw membership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawChannel {
    pub id: ChannelId,
    pub name: String,
    pub members: Vec<RawMember>,
}

/// One coherent read of every configured channel.
#[derive(Clone, Debug)]
pub struct RawRoster {
    pub lobby: RawChannel,
    pub teams: Vec<RawChannel>,
}

/// Source of current channel membership.
///
/// A fetch either returns data for every configured channel or fails with
/// [`EngineError::ChannelUnresolved`]; the engine aborts that cycle and
/// retries on the next trigger, it never retries by itself.
pub trait RosterSource: Send {
    fn fetch(&self, config: &RosterConfig) -> Result<RawRoster>;
}

impl<T: RosterSource + Sync> RosterSource for std::sync::Arc<T> {
    fn fetch(&self, config: &RosterConfig) -> Result<RawRoster> {
        (**self).fetch(config)
    }
}

#[derive(Default)]
struct MemoryRosterInner {
    names: HashMap<ChannelId, String>,
    members: HashMap<ChannelId, Vec<RawMember>>,
}

/// In-process roster, safe to mutate from any thread.
///
/// The adapter surface for embedding a real roster source (mirror the
/// platform's cache into it from the event callbacks) and the double used
/// throughout the test suites.
#[derive(Default)]
pub struct MemoryRoster {
    inner: RwLock<MemoryRosterInner>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Fetches of unregistered channels fail.
    pub fn add_channel(&self, id: ChannelId, name: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.names.insert(id.clone(), name.into());
        inner.members.entry(id).or_default();
    }

    /// Remove a channel entirely, making it unresolvable.
    pub fn remove_channel(&self, id: &ChannelId) {
        let mut inner = self.inner.write();
        inner.names.remove(id);
        inner.members.remove(id);
    }

    /// Put a member into a channel, replacing any previous entry for the
    /// same user in that channel.
    pub fn join(&self, channel: &ChannelId, member: RawMember) {
        let mut inner = self.inner.write();
        if let Some(members) = inner.members.get_mut(channel) {
            members.retain(|m| m.id != member.id);
            members.push(member);
        }
    }

    /// Remove a user from one channel.
    pub fn leave(&self, channel: &ChannelId, user: &UserId) {
        let mut inner = self.inner.write();
        if let Some(members) = inner.members.get_mut(channel) {
            members.retain(|m| &m.id != user);
        }
    }

    /// Remove a user from every channel (disconnected from voice).
    pub fn disconnect(&self, user: &UserId) {
        let mut inner = self.inner.write();
        for members in inner.members.values_mut() {
            members.retain(|m| &m.id != user);
        }
    }

    /// Move a user between channels, keeping their member data.
    pub fn move_user(&self, from: &ChannelId, to: &ChannelId, user: &UserId) {
        let mut inner = self.inner.write();
        let moved = match inner.members.get_mut(from) {
            Some(members) => {
                let pos = members.iter().position(|m| &m.id == user);
                pos.map(|i| members.remove(i))
            }
            None => None,
        };
        if let Some(member) = moved {
            if let Some(members) = inner.members.get_mut(to) {
                members.retain(|m| m.id != member.id);
                members.push(member);
            }
        }
    }

    fn resolve(inner: &MemoryRosterInner, id: &ChannelId) -> Result<RawChannel> {
        let name = inner
            .names
            .get(id)
            .ok_or_else(|| EngineError::ChannelUnresolved(id.clone()))?;
        let members = inner.members.get(id).cloned().unwrap_or_default();
        Ok(RawChannel {
            id: id.clone(),
            name: name.clone(),
            members,
        })
    }
}

impl RosterSource for MemoryRoster {
    fn fetch(&self, config: &RosterConfig) -> Result<RawRoster> {
        let inner = self.inner.read();
        let lobby = Self::resolve(&inner, &config.lobby)?;
        let teams = config
            .teams
            .iter()
            .map(|id| Self::resolve(&inner, id))
            .collect::<Result<Vec<_>>>()?;
        Ok(RawRoster { lobby, teams })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RosterConfig {
        RosterConfig {
            lobby: ChannelId::from("lobby"),
            teams: vec![ChannelId::from("alpha"), ChannelId::from("bravo")],
        }
    }

    fn test_roster() -> MemoryRoster {
        let roster = MemoryRoster::new();
        roster.add_channel(ChannelId::from("lobby"), "Waiting");
        roster.add_channel(ChannelId::from("alpha"), "Alpha");
        roster.add_channel(ChannelId::from("bravo"), "Bravo");
        roster
    }

    #[test]
    fn test_fetch_resolves_all_configured_channels() {
        let roster = test_roster();
        roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));

        let raw = roster.fetch(&test_config()).unwrap();
        assert_eq!(raw.lobby.name, "Waiting");
        assert_eq!(raw.teams.len(), 2);
        assert_eq!(raw.teams[0].members.len(), 1);
        assert!(raw.teams[1].members.is_empty());
    }

    #[test]
    fn test_fetch_fails_on_unresolvable_channel() {
        let roster = test_roster();
        roster.remove_channel(&ChannelId::from("bravo"));

        let err = roster.fetch(&test_config()).unwrap_err();
        assert!(matches!(err, EngineError::ChannelUnresolved(id) if id.as_str() == "bravo"));
    }

    #[test]
    fn test_move_user_keeps_member_data() {
        let roster = test_roster();
        let alpha = ChannelId::from("alpha");
        let bravo = ChannelId::from("bravo");
        roster.join(&alpha, RawMember::new("u1", "one").with_nickname("Ace"));

        roster.move_user(&alpha, &bravo, &UserId::from("u1"));

        let raw = roster.fetch(&test_config()).unwrap();
        assert!(raw.teams[0].members.is_empty());
        assert_eq!(raw.teams[1].members[0].nickname.as_deref(), Some("Ace"));
    }

    #[test]
    fn test_disconnect_removes_from_every_channel() {
        let roster = test_roster();
        roster.join(&ChannelId::from("lobby"), RawMember::new("u1", "one"));
        roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));

        roster.disconnect(&UserId::from("u1"));

        let raw = roster.fetch(&test_config()).unwrap();
        assert!(raw.lobby.members.is_empty());
        assert!(raw.teams[0].members.is_empty());
    }
}
