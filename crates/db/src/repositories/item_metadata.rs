use sqlx::Row;

use stylegraph_core::domain::item::{Item, ItemId};

use super::{decode_string_array, encode_json, ItemMetadataRepository, RepositoryError};
use crate::DbPool;

pub struct SqlItemMetadataRepository {
    pool: DbPool,
}

impl SqlItemMetadataRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, RepositoryError> {
    let image_id: String = row.try_get("image_id")?;
    let style_tags = decode_string_array(&row.try_get::<String, _>("style_tags")?, "style_tags")?;
    let dominant_colors =
        decode_string_array(&row.try_get::<String, _>("dominant_colors")?, "dominant_colors")?;
    let garment_type: String = row.try_get("garment_type")?;
    let gender: String = row.try_get("gender")?;

    Item::new(image_id, style_tags, dominant_colors, garment_type, gender)
        .map_err(|error| RepositoryError::Decode(error.to_string()))
}

const ITEM_COLUMNS: &str = "image_id, style_tags, dominant_colors, garment_type, gender";

#[async_trait::async_trait]
impl ItemMetadataRepository for SqlItemMetadataRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM image_metadata WHERE image_id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_item).transpose()
    }

    async fn find_batch(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM image_metadata WHERE image_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(decode_item).collect()
    }

    async fn list_ids(&self) -> Result<Vec<ItemId>, RepositoryError> {
        let rows = sqlx::query("SELECT image_id FROM image_metadata ORDER BY image_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(ItemId(row.try_get::<String, _>("image_id")?)))
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM image_metadata ORDER BY image_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_item).collect()
    }

    async fn save(&self, item: &Item) -> Result<(), RepositoryError> {
        let style_tags: Vec<&String> = item.style_tags.iter().collect();
        let dominant_colors: Vec<&String> = item.dominant_colors.iter().collect();

        sqlx::query(
            "INSERT INTO image_metadata \
             (image_id, style_tags, dominant_colors, garment_type, gender) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (image_id) DO UPDATE SET \
             style_tags = excluded.style_tags, \
             dominant_colors = excluded.dominant_colors, \
             garment_type = excluded.garment_type, \
             gender = excluded.gender, \
             created_at = datetime('now')",
        )
        .bind(item.id.as_str())
        .bind(encode_json(&style_tags, "style_tags")?)
        .bind(encode_json(&dominant_colors, "dominant_colors")?)
        .bind(&item.garment_type)
        .bind(&item.gender)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
