//! Reconciliation engine.
//!
//! One cycle per trigger: fetch the roster, build a normalized snapshot,
//! prune selections (lobby presence and absence), compute per-channel
//! availability, assemble the client payload. The snapshot is rebuilt from
//! scratch every time so a missed roster event can never cause drift.

mod availability;
mod reconciler;

pub use availability::{
    compute as compute_availability, AvailabilityView, CategoryAvailability, ChannelAvailability,
    ChoiceAvailability,
};
pub use reconciler::{CycleOutput, Engine};
