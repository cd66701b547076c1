//! The reconciliation cycle.

use crate::error::Result;
use crate::gateway::UpdatePayload;
use crate::membership;
use crate::roster::{RosterConfig, RosterSource};
use crate::ruleset::Ruleset;
use crate::selections::SelectionStore;
use crate::types::{CategoryId, ChoiceId, Snapshot, UpdateKind, UserId};
use tracing::{debug, warn};

use super::availability::{self, AvailabilityView};

/// Everything one completed cycle produced.
///
/// `payload` is what clients receive; `snapshot` and `availability` are the
/// unfiltered computed model (including empty team channels) kept for
/// callers that inspect cycle results directly.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    pub kind: UpdateKind,
    pub snapshot: Snapshot,
    pub availability: AvailabilityView,
    pub payload: UpdatePayload,
}

/// The selection-reconciliation engine.
///
/// Owns the selection store outright; every mutation happens either in
/// [`apply_selection`](Engine::apply_selection) or inside
/// [`run_cycle`](Engine::run_cycle), and the service loop runs those
/// back-to-back per trigger with nothing interleaved.
pub struct Engine {
    ruleset: Ruleset,
    config: RosterConfig,
    roster: Box<dyn RosterSource>,
    selections: SelectionStore,
}

impl Engine {
    pub fn new(ruleset: Ruleset, config: RosterConfig, roster: Box<dyn RosterSource>) -> Self {
        let selections = SelectionStore::new(&ruleset);
        Self {
            ruleset,
            config,
            roster,
            selections,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    /// Apply one client selection change ahead of its cycle.
    ///
    /// `None` clears the entry (unselect past the cap is always permitted).
    /// Fails with `UnknownCategory` without touching the store.
    pub fn apply_selection(
        &mut self,
        category: &CategoryId,
        user: UserId,
        choice: Option<ChoiceId>,
    ) -> Result<()> {
        match choice {
            Some(choice) => self.selections.set(category, user, choice),
            None => self.selections.clear(category, &user),
        }
    }

    /// Run one full fetch, build, prune, compute, assemble pass.
    ///
    /// A failed fetch aborts the cycle before any store mutation; the caller
    /// logs it and waits for the next trigger.
    pub fn run_cycle(&mut self, kind: UpdateKind) -> Result<CycleOutput> {
        // 1. One coherent read of the external roster.
        let raw = self.roster.fetch(&self.config)?;

        // 2. Normalize into a snapshot.
        let snapshot = membership::build_snapshot(raw);

        // 3. Returning to the lobby forfeits in-progress selections.
        for user in snapshot.lobby.user_ids() {
            debug!(user = %user, "clearing selections: user in lobby");
            self.selections.clear_everywhere(user);
        }

        // 4. Users absent from every channel lose their entries too.
        let present = snapshot.present_user_ids();
        self.selections.prune_all(&present);

        // 5. Remaining counts per team channel, from a fresh copy each.
        let availability = availability::compute(&self.ruleset, &snapshot, &self.selections);
        for (channel, category, choice) in availability.over_allocations() {
            warn!(
                channel = %channel,
                category = %category,
                choice = %choice.id,
                remaining = choice.remaining,
                "choice over-allocated"
            );
        }

        // 6. One payload, parameterized only by emission kind.
        let payload = UpdatePayload::assemble(
            kind,
            &snapshot,
            self.selections.snapshot_all(),
            &availability,
        );

        Ok(CycleOutput {
            kind,
            snapshot,
            availability,
            payload,
        })
    }
}
