use sqlx::Row;

use stylegraph_core::domain::item::ItemId;
use stylegraph_core::domain::navigation::{NavigationEdge, NavigationPath};
use stylegraph_core::simulate::GraphTargets;

use super::{
    decode_score_array, decode_string_array, encode_json, NavigationPathRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlNavigationPathRepository {
    pool: DbPool,
}

impl SqlNavigationPathRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_path(row: &sqlx::sqlite::SqliteRow) -> Result<NavigationPath, RepositoryError> {
    let source = ItemId(row.try_get::<String, _>("source_image_id")?);
    let targets = decode_string_array(
        &row.try_get::<String, _>("next_possible_images")?,
        "next_possible_images",
    )?;
    let scores = decode_score_array(&row.try_get::<String, _>("path_scores")?, "path_scores")?;
    let reason: String = row.try_get("reason")?;

    if targets.len() != scores.len() {
        return Err(RepositoryError::Decode(format!(
            "navigation path `{source}` has {} targets but {} scores",
            targets.len(),
            scores.len()
        )));
    }

    // The stored parallel arrays carry no per-edge rationale; the path-level
    // reason stands in for all of them.
    let edges = targets
        .into_iter()
        .zip(scores)
        .map(|(target, score)| {
            NavigationEdge::new(source.clone(), ItemId(target), score, reason.clone())
                .map_err(|error| RepositoryError::Decode(error.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    NavigationPath::new(source, edges, reason)
        .map_err(|error| RepositoryError::Decode(error.to_string()))
}

#[async_trait::async_trait]
impl NavigationPathRepository for SqlNavigationPathRepository {
    async fn upsert(&self, path: &NavigationPath) -> Result<(), RepositoryError> {
        let targets: Vec<&str> =
            path.edges.iter().map(|edge| edge.target.as_str()).collect();
        let scores: Vec<f64> = path.scores();

        sqlx::query(
            "INSERT INTO image_navigation_paths \
             (source_image_id, next_possible_images, path_scores, reason) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (source_image_id) DO UPDATE SET \
             next_possible_images = excluded.next_possible_images, \
             path_scores = excluded.path_scores, \
             reason = excluded.reason, \
             created_at = datetime('now')",
        )
        .bind(path.source.as_str())
        .bind(encode_json(&targets, "next_possible_images")?)
        .bind(encode_json(&scores, "path_scores")?)
        .bind(&path.reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_source(
        &self,
        source: &ItemId,
    ) -> Result<Option<NavigationPath>, RepositoryError> {
        let row = sqlx::query(
            "SELECT source_image_id, next_possible_images, path_scores, reason \
             FROM image_navigation_paths WHERE source_image_id = ?1",
        )
        .bind(source.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_path).transpose()
    }

    async fn list_targets(&self) -> Result<GraphTargets, RepositoryError> {
        let rows = sqlx::query(
            "SELECT source_image_id, next_possible_images FROM image_navigation_paths",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut graph = GraphTargets::new();
        for row in &rows {
            let source = ItemId(row.try_get::<String, _>("source_image_id")?);
            let targets = decode_string_array(
                &row.try_get::<String, _>("next_possible_images")?,
                "next_possible_images",
            )?;
            if targets.is_empty() {
                continue;
            }
            graph.insert(source, targets.into_iter().map(ItemId).collect());
        }
        Ok(graph)
    }
}
