use stylegraph_core::domain::recommendation::RecommendationResult;

use super::{encode_json, RecommendationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRecommendationRepository {
    pool: DbPool,
}

impl SqlRecommendationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for SqlRecommendationRepository {
    async fn append(&self, result: &RecommendationResult) -> Result<(), RepositoryError> {
        let recommended: Vec<&str> =
            result.items.iter().map(|item| item.item_id.as_str()).collect();
        let reasoning: Vec<&str> = result.items.iter().map(|item| item.reason.as_str()).collect();

        sqlx::query(
            "INSERT INTO recommendations \
             (user_id, source_image_id, recommended_images, reasoning, generated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&result.user_id)
        .bind(result.source_item_id.as_str())
        .bind(encode_json(&recommended, "recommended_images")?)
        .bind(encode_json(&reasoning, "reasoning")?)
        .bind(result.generated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
