use sqlx::Row;

use stylegraph_core::domain::interaction::InteractionEvent;
use stylegraph_core::domain::item::ItemId;

use super::{ensure_single_user, InteractionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InteractionRepository for SqlInteractionRepository {
    async fn append_session(&self, events: &[InteractionEvent]) -> Result<(), RepositoryError> {
        ensure_single_user(events)?;
        if events.is_empty() {
            return Ok(());
        }

        // One transaction per user session; dropping the tx on error rolls
        // back every event of the unit.
        let mut tx = self.pool.begin().await?;
        for event in events {
            sqlx::query(
                "INSERT INTO user_interactions (user_id, image_id, clicked, timestamp) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&event.user_id)
            .bind(event.item_id.as_str())
            .bind(event.clicked)
            .bind(event.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn clicked_history(&self, user_id: &str) -> Result<Vec<ItemId>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT image_id FROM user_interactions \
             WHERE user_id = ?1 AND clicked = 1 \
             ORDER BY timestamp, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(ItemId(row.try_get::<String, _>("image_id")?)))
            .collect()
    }

    async fn last_clicked(&self, user_id: &str) -> Result<Option<ItemId>, RepositoryError> {
        let row = sqlx::query(
            "SELECT image_id FROM user_interactions \
             WHERE user_id = ?1 AND clicked = 1 \
             ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Ok(ItemId(row.try_get::<String, _>("image_id")?))).transpose()
    }
}
