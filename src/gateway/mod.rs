//! Broadcast gateway: the boundary between the engine and its clients.
//!
//! Every connected client holds a bounded channel; a completed cycle fans
//! its payload out to all of them:
//! - Fire-and-forget delivery, the engine never blocks on a client
//! - Slow consumers are dropped with a best-effort notice
//! - Payloads carry the full tree; a reconnecting client needs no replay,
//!   just a "client ready" trigger
//!
//! # Example
//!
//! ```ignore
//! let gateway = Arc::new(Gateway::new());
//! let handle = gateway.subscribe(GatewayConfig::default());
//!
//! // After a cycle broadcasts:
//! match handle.recv() {
//!     Ok(ClientEvent::Update(payload)) => render(payload),
//!     Ok(ClientEvent::Dropped { reason }) => reconnect(reason),
//!     Err(_) => (),
//! }
//! ```

mod manager;
mod types;

pub use manager::Gateway;
pub use types::{
    ClientEvent, ClientHandle, ClientId, DropReason, GatewayConfig, TeamChannelView, UpdatePayload,
};
