//! Gateway types: outbound payloads and client-side handles.

use crate::engine::{AvailabilityView, CategoryAvailability};
use crate::types::{CategoryId, Channel, ChannelId, ChannelUser, ChoiceId, Snapshot, UpdateKind, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for a connected client.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Max buffered updates before the client is dropped as a slow consumer.
    /// Default: 64
    pub buffer_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { buffer_size: 64 }
    }
}

/// A team channel as rendered by clients, with its availability attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChannelView {
    pub id: ChannelId,
    pub name: String,
    pub users: Vec<ChannelUser>,
    pub availability: Vec<CategoryAvailability>,
}

/// One cycle's output as delivered to every connected client.
///
/// Full and selection updates intentionally share this shape: the whole tree
/// is resent either way, so clients converge on identical end state no
/// matter which update kind they last received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub kind: UpdateKind,
    pub lobby: Channel,

    /// Render list: team channels with at least one user. Empty channels are
    /// still part of the computed snapshot, just not shipped to clients.
    pub team_channels: Vec<TeamChannelView>,

    /// Per category, the serialized user to choice mapping. Ordered maps so
    /// repeated cycles serialize bit-identically.
    pub selections: BTreeMap<CategoryId, BTreeMap<UserId, ChoiceId>>,
}

impl UpdatePayload {
    /// Assemble the client-facing payload from cycle output.
    pub fn assemble(
        kind: UpdateKind,
        snapshot: &Snapshot,
        selections: BTreeMap<CategoryId, BTreeMap<UserId, ChoiceId>>,
        availability: &AvailabilityView,
    ) -> Self {
        let team_channels = snapshot
            .team_channels
            .iter()
            .filter(|channel| !channel.is_empty())
            .map(|channel| TeamChannelView {
                id: channel.id.clone(),
                name: channel.name.clone(),
                users: channel.users.clone(),
                availability: availability
                    .channel(&channel.id)
                    .map(|c| c.categories.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            kind,
            lobby: snapshot.lobby.clone(),
            team_channels,
            selections,
        }
    }
}

/// Events delivered to a connected client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A reconciliation cycle completed; re-render from this payload.
    Update(UpdatePayload),

    /// The client was dropped by the gateway.
    Dropped { reason: DropReason },
}

/// Why a client was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a connected client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Handle held by a connected client to receive updates.
pub struct ClientHandle {
    pub id: ClientId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ClientEvent>,
}

impl ClientHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ClientEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ClientEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ClientEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
