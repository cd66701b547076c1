//! Per-category selection store.
//!
//! One mapping per category from user id to chosen item. Absence of an entry
//! means "unselected"; there is no sentinel choice value. The store is owned
//! by the engine and only mutated inside a reconciliation cycle or by the
//! trigger that starts one.

use crate::error::{EngineError, Result};
use crate::ruleset::Ruleset;
use crate::types::{CategoryId, ChoiceId, UserId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Mutable mapping, per category, from user identity to chosen item.
#[derive(Clone, Debug)]
pub struct SelectionStore {
    by_category: HashMap<CategoryId, HashMap<UserId, ChoiceId>>,
}

impl SelectionStore {
    /// Create an empty store with one mapping per catalog category.
    pub fn new(ruleset: &Ruleset) -> Self {
        let by_category = ruleset
            .categories()
            .iter()
            .map(|c| (c.id.clone(), HashMap::new()))
            .collect();
        Self { by_category }
    }

    /// Record a selection, overwriting any previous entry for this user and
    /// category.
    ///
    /// The choice id is stored as-is, without validating membership in the
    /// category's choice list. Clients are trusted on this boundary; see the
    /// crate docs for why tightening it is a design choice, not a fix.
    pub fn set(&mut self, category: &CategoryId, user: UserId, choice: ChoiceId) -> Result<()> {
        let entries = self
            .by_category
            .get_mut(category)
            .ok_or_else(|| EngineError::UnknownCategory(category.clone()))?;
        entries.insert(user, choice);
        Ok(())
    }

    /// Remove a user's entry in one category. No-op when absent. Always
    /// permitted, even past the cap: over-allocation is advisory only.
    pub fn clear(&mut self, category: &CategoryId, user: &UserId) -> Result<()> {
        let entries = self
            .by_category
            .get_mut(category)
            .ok_or_else(|| EngineError::UnknownCategory(category.clone()))?;
        entries.remove(user);
        Ok(())
    }

    /// Remove a user's entries in every category.
    pub fn clear_everywhere(&mut self, user: &UserId) {
        for entries in self.by_category.values_mut() {
            entries.remove(user);
        }
    }

    /// Delete every entry in one category whose user is not in `keep`.
    pub fn prune(&mut self, category: &CategoryId, keep: &BTreeSet<UserId>) -> Result<()> {
        let entries = self
            .by_category
            .get_mut(category)
            .ok_or_else(|| EngineError::UnknownCategory(category.clone()))?;
        entries.retain(|user, _| keep.contains(user));
        Ok(())
    }

    /// Prune every category against `keep`.
    pub fn prune_all(&mut self, keep: &BTreeSet<UserId>) {
        for entries in self.by_category.values_mut() {
            entries.retain(|user, _| keep.contains(user));
        }
    }

    /// A user's current choice in one category, if any.
    pub fn get(&self, category: &CategoryId, user: &UserId) -> Option<&ChoiceId> {
        self.by_category.get(category)?.get(user)
    }

    /// Immutable ordered copy of one category's mapping, safe to serialize
    /// while later triggers mutate the store.
    pub fn snapshot(&self, category: &CategoryId) -> Result<BTreeMap<UserId, ChoiceId>> {
        let entries = self
            .by_category
            .get(category)
            .ok_or_else(|| EngineError::UnknownCategory(category.clone()))?;
        Ok(entries
            .iter()
            .map(|(u, c)| (u.clone(), c.clone()))
            .collect())
    }

    /// Ordered copies of every category's mapping.
    pub fn snapshot_all(&self) -> BTreeMap<CategoryId, BTreeMap<UserId, ChoiceId>> {
        self.by_category
            .iter()
            .map(|(id, entries)| {
                let copy = entries
                    .iter()
                    .map(|(u, c)| (u.clone(), c.clone()))
                    .collect();
                (id.clone(), copy)
            })
            .collect()
    }

    /// Total entry count across all categories.
    pub fn len(&self) -> usize {
        self.by_category.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
