//! Broadcast gateway for delivering updates to connected clients.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::types::{ClientEvent, ClientHandle, ClientId, DropReason, GatewayConfig, UpdatePayload};

/// Internal per-client state.
struct Client {
    sender: Sender<ClientEvent>,
}

impl Client {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (client will be dropped).
    fn try_send(&self, event: ClientEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Fans one cycle's payload out to every connected client.
///
/// Broadcast is fire-and-forget: the engine never waits for delivery. A
/// client that cannot keep up is dropped rather than allowed to block the
/// cycle; the transport's at-least-once semantics cover connected clients.
pub struct Gateway {
    /// Connected clients by id.
    clients: RwLock<HashMap<ClientId, Client>>,
    /// Counter for generating client ids.
    next_id: AtomicU64,
}

impl Gateway {
    /// Create a gateway with no clients.
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a client connection.
    ///
    /// The new client receives nothing until the next broadcast; submit a
    /// "client ready" trigger to populate it with a full update.
    pub fn subscribe(&self, config: GatewayConfig) -> ClientHandle {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.clients.write().insert(id, Client { sender });

        ClientHandle { id, receiver }
    }

    /// Disconnect a client and clean up.
    pub fn unsubscribe(&self, id: ClientId) {
        let mut clients = self.clients.write();
        if let Some(client) = clients.remove(&id) {
            // Best effort notice
            let _ = client.try_send(ClientEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Deliver a payload to every connected client. Drops clients whose
    /// buffers overflow.
    pub fn broadcast(&self, payload: UpdatePayload) {
        let event = ClientEvent::Update(payload);
        let mut to_remove = Vec::new();

        {
            let clients = self.clients.read();
            for (id, client) in clients.iter() {
                if !client.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut clients = self.clients.write();
            for id in to_remove {
                if let Some(client) = clients.remove(&id) {
                    debug!(client = id.0, "dropping slow client");
                    // Might fail too, that's ok
                    let _ = client.try_send(ClientEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
