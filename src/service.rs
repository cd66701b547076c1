//! Single-consumer trigger queue feeding the reconciliation cycle.
//!
//! Triggers arrive concurrently from client connections and the roster
//! source; they are queued and processed one cycle at a time in arrival
//! order. No priority, no coalescing: a burst of N triggers produces N full
//! cycles, even if redundant. A failed cycle is logged and the loop
//! continues; the selection store is never left half-mutated by one.

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::gateway::Gateway;
use crate::types::{CategoryId, ChoiceId, Trigger, UserId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

enum Command {
    Trigger(Trigger),
    Shutdown,
}

/// Cloneable submission side of the trigger queue.
///
/// Hand one to each client connection handler and one to the roster event
/// callback; submissions fail only after the service loop has stopped.
#[derive(Clone)]
pub struct Handle {
    tx: Sender<Command>,
}

impl Handle {
    /// Enqueue a trigger.
    pub fn submit(&self, trigger: Trigger) -> Result<()> {
        self.tx
            .send(Command::Trigger(trigger))
            .map_err(|_| EngineError::ServiceStopped)
    }

    /// A client changed (or cleared, with `None`) their selection.
    pub fn selection_changed(
        &self,
        category: CategoryId,
        user: UserId,
        choice: Option<ChoiceId>,
    ) -> Result<()> {
        self.submit(Trigger::SelectionChanged {
            category,
            user,
            choice,
        })
    }

    /// A newly connected client asked for a full update.
    pub fn client_ready(&self) -> Result<()> {
        self.submit(Trigger::ClientReady)
    }

    /// The roster source reported a voice state change.
    pub fn voice_state_changed(&self) -> Result<()> {
        self.submit(Trigger::VoiceStateChanged)
    }

    /// Stop the loop after draining already-queued triggers.
    pub fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .map_err(|_| EngineError::ServiceStopped)
    }
}

/// Owns the engine and the queue's consuming end.
pub struct Service {
    engine: Engine,
    gateway: Arc<Gateway>,
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Service {
    pub fn new(engine: Engine, gateway: Arc<Gateway>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            engine,
            gateway,
            tx,
            rx,
        }
    }

    /// A new submission handle for this service's queue.
    pub fn handle(&self) -> Handle {
        Handle {
            tx: self.tx.clone(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Process one trigger: mutate, cycle, broadcast.
    ///
    /// This is the cycle boundary of the error design: everything that goes
    /// wrong in here is logged and swallowed, the loop and the store outlive
    /// it. Exposed for deterministic tests.
    pub fn dispatch(&mut self, trigger: Trigger) {
        let kind = trigger.update_kind();

        if let Trigger::SelectionChanged {
            category,
            user,
            choice,
        } = trigger
        {
            debug!(category = %category, user = %user, "selection changed");
            if let Err(e) = self.engine.apply_selection(&category, user, choice) {
                // Reject this single update; no cycle, no emission.
                warn!(error = %e, "rejected selection update");
                return;
            }
        }

        match self.engine.run_cycle(kind) {
            Ok(output) => self.gateway.broadcast(output.payload),
            Err(e) => warn!(error = %e, "cycle aborted"),
        }
    }

    /// Consume triggers until shutdown, one cycle at a time.
    pub fn run(mut self) {
        info!("service loop started");
        loop {
            match self.rx.recv() {
                Ok(Command::Trigger(trigger)) => self.dispatch(trigger),
                Ok(Command::Shutdown) => break,
                // All handles dropped
                Err(_) => break,
            }
        }
        info!("service loop stopped");
    }
}
