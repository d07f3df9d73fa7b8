use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;

/// One append-only log entry of a user viewing (and possibly clicking) an
/// item. Ordering by timestamp matters for "most recent click" queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: String,
    pub item_id: ItemId,
    pub clicked: bool,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(
        user_id: impl Into<String>,
        item_id: ItemId,
        clicked: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { user_id: user_id.into(), item_id, clicked, timestamp }
    }
}
