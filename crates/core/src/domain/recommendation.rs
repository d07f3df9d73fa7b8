use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;
use crate::errors::DomainError;

/// Maximum number of items one recommendation result may carry.
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub item_id: ItemId,
    pub reason: String,
}

/// Engine output for one (user, source item) pair. Derived, not
/// authoritative: always recomputable from the graph and history snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub user_id: String,
    pub source_item_id: ItemId,
    pub items: Vec<RecommendedItem>,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResult {
    pub fn new(
        user_id: impl Into<String>,
        source_item_id: ItemId,
        items: Vec<RecommendedItem>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if items.len() > MAX_RECOMMENDATIONS {
            return Err(DomainError::InvariantViolation(format!(
                "recommendation result for `{source_item_id}` has {} items (max {MAX_RECOMMENDATIONS})",
                items.len()
            )));
        }
        Ok(Self { user_id: user_id.into(), source_item_id, items, generated_at })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
