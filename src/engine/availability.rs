//! Availability computation.
//!
//! For each team channel and each category, a derived copy of the catalog's
//! choice list with remaining counts decremented by current selections among
//! users present in that channel. Each channel gets a fresh copy; selections
//! in one team never affect the counts shown for another.

use crate::ruleset::Ruleset;
use crate::selections::SelectionStore;
use crate::types::{CategoryId, ChannelId, ChoiceId, Snapshot};
use serde::{Deserialize, Serialize};

/// One choice with its remaining per-team count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceAvailability {
    pub id: ChoiceId,
    pub name: String,

    /// `max_per_team` minus current selections in this channel. `None` means
    /// unlimited. Negative values are surfaced, never clamped.
    pub remaining: Option<i64>,

    /// Set when remaining went below zero. Advisory only: the store never
    /// rejects a selection for exceeding capacity.
    pub over_allocated: bool,
}

/// Availability of every choice of one category, within one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAvailability {
    pub category: CategoryId,
    pub choices: Vec<ChoiceAvailability>,
}

impl CategoryAvailability {
    pub fn choice(&self, id: &ChoiceId) -> Option<&ChoiceAvailability> {
        self.choices.iter().find(|c| &c.id == id)
    }
}

/// Per-category availability within one team channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAvailability {
    pub channel: ChannelId,
    pub categories: Vec<CategoryAvailability>,
}

impl ChannelAvailability {
    pub fn category(&self, id: &CategoryId) -> Option<&CategoryAvailability> {
        self.categories.iter().find(|c| &c.category == id)
    }
}

/// Availability for every team channel, in snapshot order. Computed for
/// empty channels too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub channels: Vec<ChannelAvailability>,
}

impl AvailabilityView {
    pub fn channel(&self, id: &ChannelId) -> Option<&ChannelAvailability> {
        self.channels.iter().find(|c| &c.channel == id)
    }

    /// Every over-allocated (channel, category, choice) triple.
    pub fn over_allocations(&self) -> Vec<(&ChannelId, &CategoryId, &ChoiceAvailability)> {
        let mut found = Vec::new();
        for channel in &self.channels {
            for category in &channel.categories {
                for choice in &category.choices {
                    if choice.over_allocated {
                        found.push((&channel.channel, &category.category, choice));
                    }
                }
            }
        }
        found
    }
}

/// Compute availability for every team channel in the snapshot.
pub fn compute(
    ruleset: &Ruleset,
    snapshot: &Snapshot,
    selections: &SelectionStore,
) -> AvailabilityView {
    let channels = snapshot
        .team_channels
        .iter()
        .map(|channel| {
            let categories = ruleset
                .categories()
                .iter()
                .map(|category| {
                    // Fresh derived copy per channel.
                    let mut choices: Vec<ChoiceAvailability> = category
                        .choices
                        .iter()
                        .map(|item| ChoiceAvailability {
                            id: item.id.clone(),
                            name: item.name.clone(),
                            remaining: item.max_per_team,
                            over_allocated: false,
                        })
                        .collect();

                    for user in &channel.users {
                        let Some(selected) = selections.get(&category.id, &user.id) else {
                            continue;
                        };
                        // Unknown choice ids match nothing and decrement
                        // nothing; they pass through the store unvalidated.
                        for choice in choices.iter_mut() {
                            if &choice.id == selected {
                                if let Some(remaining) = choice.remaining.as_mut() {
                                    *remaining -= 1;
                                }
                            }
                        }
                    }

                    for choice in choices.iter_mut() {
                        choice.over_allocated = matches!(choice.remaining, Some(r) if r < 0);
                    }

                    CategoryAvailability {
                        category: category.id.clone(),
                        choices,
                    }
                })
                .collect();

            ChannelAvailability {
                channel: channel.id.clone(),
                categories,
            }
        })
        .collect();

    AvailabilityView { channels }
}
