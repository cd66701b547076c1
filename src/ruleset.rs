//! Ruleset catalog: categories, choices and per-team caps.
//!
//! Loaded once at startup from a JSON document and immutable afterwards.
//! Availability computation works on derived copies only; the catalog itself
//! is never decremented.

use crate::error::{EngineError, Result};
use crate::types::{CategoryId, ChoiceId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A selectable item within a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceItem {
    pub id: ChoiceId,
    pub name: String,

    /// Maximum simultaneous selections of this item among users in a single
    /// team channel. `None` means unlimited.
    pub max_per_team: Option<i64>,
}

/// One selection dimension (e.g. "ordnance", "titan") with independent caps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub choices: Vec<ChoiceItem>,
}

/// Wire shape of the ruleset document.
#[derive(Debug, Deserialize)]
struct RulesetDoc {
    categories: Vec<Category>,
}

/// The loaded, validated catalog. Read-only after load.
#[derive(Clone, Debug)]
pub struct Ruleset {
    categories: Vec<Category>,
}

impl Ruleset {
    /// Build a ruleset from already-parsed categories, applying the same
    /// validation as document loading.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        Self::validate(&categories)?;
        Ok(Self { categories })
    }

    /// Parse and validate a JSON ruleset document.
    pub fn from_str(doc: &str) -> Result<Self> {
        let doc: RulesetDoc =
            serde_json::from_str(doc).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::new(doc.categories)
    }

    /// Parse and validate a JSON ruleset document from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let doc: RulesetDoc =
            serde_json::from_reader(reader).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::new(doc.categories)
    }

    /// Load a ruleset document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn validate(categories: &[Category]) -> Result<()> {
        let mut seen_categories = HashSet::new();
        for category in categories {
            if !seen_categories.insert(&category.id) {
                return Err(EngineError::Config(format!(
                    "duplicate category id: {}",
                    category.id
                )));
            }

            let mut seen_choices = HashSet::new();
            for choice in &category.choices {
                if !seen_choices.insert(&choice.id) {
                    return Err(EngineError::Config(format!(
                        "duplicate choice id {} in category {}",
                        choice.id, category.id
                    )));
                }
                if let Some(max) = choice.max_per_team {
                    if max < 0 {
                        return Err(EngineError::Config(format!(
                            "negative max_per_team for {} in category {}",
                            choice.id, category.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// All categories, in document order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up one category by id.
    pub fn category(&self, id: &CategoryId) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| EngineError::UnknownCategory(id.clone()))
    }

    /// Whether a category id is part of the catalog.
    pub fn has_category(&self, id: &CategoryId) -> bool {
        self.categories.iter().any(|c| &c.id == id)
    }
}
