//! # Loadout Sync
//!
//! Keeps a dashboard synchronized with live voice-channel membership and
//! per-user equipment selections, against a ruleset that caps how many times
//! each choice may be used per team.
//!
//! ## Core Concepts
//!
//! - **Ruleset**: Immutable catalog of categories, choices and per-team caps
//! - **Selections**: Per-category mapping from user to chosen item
//! - **Snapshot**: Normalized "who is where", rebuilt from scratch per cycle
//! - **Cycle**: One fetch, build, prune, compute, emit pass of the engine
//! - **Gateway**: Fans each cycle's payload out to connected clients
//!
//! Selections are pruned when a user returns to the lobby or leaves voice
//! entirely. Availability is computed per team channel on a derived copy of
//! the catalog; over-allocation is surfaced, never clamped or enforced.
//! Choice ids submitted by clients are stored unvalidated - the selection UI
//! is trusted on that boundary, and "unselect" is plain store absence.
//!
//! ## Example
//!
//! ```ignore
//! use loadout_sync::{
//!     Engine, Gateway, GatewayConfig, MemoryRoster, RosterConfig, Ruleset, Service,
//! };
//!
//! let ruleset = Ruleset::load("rules/ctf.json")?;
//! let roster = Arc::new(MemoryRoster::new());
//! let config = RosterConfig {
//!     lobby: "waiting".into(),
//!     teams: vec!["militia".into(), "imc".into()],
//! };
//!
//! let gateway = Arc::new(Gateway::new());
//! let service = Service::new(
//!     Engine::new(ruleset, config, Box::new(roster.clone())),
//!     gateway.clone(),
//! );
//! let handle = service.handle();
//! std::thread::spawn(move || service.run());
//!
//! // Wire the transport: each connection subscribes and announces itself.
//! let client = gateway.subscribe(GatewayConfig::default());
//! handle.client_ready()?;
//! ```

pub mod engine;
pub mod error;
pub mod gateway;
pub mod membership;
pub mod roster;
pub mod ruleset;
pub mod selections;
pub mod service;
pub mod types;

// Re-exports
pub use engine::{
    compute_availability, AvailabilityView, CategoryAvailability, ChannelAvailability,
    ChoiceAvailability, CycleOutput, Engine,
};
pub use error::{EngineError, Result};
pub use gateway::{
    ClientEvent, ClientHandle, ClientId, DropReason, Gateway, GatewayConfig, TeamChannelView,
    UpdatePayload,
};
pub use membership::build_snapshot;
pub use roster::{MemoryRoster, RawChannel, RawMember, RawRoster, RosterConfig, RosterSource};
pub use ruleset::{Category, ChoiceItem, Ruleset};
pub use selections::SelectionStore;
pub use service::{Handle, Service};
pub use types::*;
