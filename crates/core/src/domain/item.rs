use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A catalog item snapshot as produced by the upstream tagging pipeline.
/// Immutable for the duration of a graph-build/recommendation run.
///
/// Tag and color sets are ordered so that rationale text derived from them
/// is deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub style_tags: BTreeSet<String>,
    pub dominant_colors: BTreeSet<String>,
    pub garment_type: String,
    pub gender: String,
}

impl Item {
    /// Builds an item, rejecting records with missing required fields
    /// instead of silently defaulting them.
    pub fn new(
        id: impl Into<String>,
        style_tags: impl IntoIterator<Item = String>,
        dominant_colors: impl IntoIterator<Item = String>,
        garment_type: impl Into<String>,
        gender: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvariantViolation("item id must not be empty".to_owned()));
        }

        let garment_type = garment_type.into();
        if garment_type.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "item `{id}` has an empty garment_type (use `unknown` for untagged items)"
            )));
        }

        let gender = gender.into();
        if gender.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "item `{id}` has an empty gender (use `unknown` for untagged items)"
            )));
        }

        Ok(Self {
            id: ItemId(id),
            style_tags: style_tags.into_iter().collect(),
            dominant_colors: dominant_colors.into_iter().collect(),
            garment_type,
            gender,
        })
    }

    /// Style tags shared with another item, in sorted order.
    pub fn shared_style_tags<'a>(&'a self, other: &'a Item) -> Vec<&'a str> {
        self.style_tags.intersection(&other.style_tags).map(String::as_str).collect()
    }
}
