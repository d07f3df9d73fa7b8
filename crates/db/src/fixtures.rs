use serde::Serialize;
use tracing::info;

use stylegraph_core::domain::item::Item;

use crate::repositories::{ItemMetadataRepository, RepositoryError};

/// Outcome of seeding, reported by the CLI as JSON.
#[derive(Debug, Serialize)]
pub struct SeedResult {
    pub inserted: usize,
}

/// Upserts a small deterministic demo catalog: mixed genders, primary and
/// accessory garments, and enough tag overlap for the graph builder to find
/// both primary links and cross-gender variations.
pub async fn seed_demo_catalog(
    repo: &dyn ItemMetadataRepository,
) -> Result<SeedResult, RepositoryError> {
    let items = demo_items()?;
    for item in &items {
        repo.save(item).await?;
    }
    info!(inserted = items.len(), "seeded demo catalog");
    Ok(SeedResult { inserted: items.len() })
}

fn demo_items() -> Result<Vec<Item>, RepositoryError> {
    let records: &[(&str, &[&str], &[&str], &str, &str)] = &[
        ("img_001", &["casual", "summer", "beach"], &["white", "blue"], "t-shirt", "male"),
        ("img_002", &["casual", "summer"], &["navy", "white"], "shorts", "male"),
        ("img_003", &["casual", "summer", "beach"], &["yellow"], "dress", "female"),
        ("img_004", &["formal", "evening"], &["black"], "dress", "female"),
        ("img_005", &["casual", "beach"], &["red", "white"], "swimsuit", "female"),
        ("img_006", &["sporty", "summer"], &["green"], "shorts", "male"),
        ("img_007", &["casual", "summer"], &["beige"], "skirt", "female"),
        ("img_008", &["boho", "summer", "beach"], &["orange", "brown"], "dress", "female"),
        ("img_009", &["casual", "summer", "beach"], &["black"], "sunglasses", "unisex"),
        ("img_010", &["casual", "beach"], &["straw"], "hat", "unisex"),
        ("img_011", &["formal", "evening"], &["brown"], "belt", "male"),
        ("img_012", &["casual", "summer"], &["tan"], "bag", "female"),
        ("img_013", &["formal"], &["silver"], "watch", "unisex"),
        ("img_014", &["casual", "beach", "summer"], &["brown"], "sandals", "unisex"),
        ("img_015", &["sporty"], &["grey", "black"], "t-shirt", "female"),
    ];

    records
        .iter()
        .map(|(id, tags, colors, garment_type, gender)| {
            Item::new(
                *id,
                tags.iter().map(|tag| (*tag).to_owned()),
                colors.iter().map(|color| (*color).to_owned()),
                *garment_type,
                *gender,
            )
            .map_err(|error| RepositoryError::Decode(error.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::repositories::{InMemoryItemMetadataRepository, ItemMetadataRepository};

    use super::seed_demo_catalog;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let repo = InMemoryItemMetadataRepository::default();

        let first = seed_demo_catalog(&repo).await.expect("first seed");
        let second = seed_demo_catalog(&repo).await.expect("second seed");

        assert_eq!(first.inserted, second.inserted);
        assert_eq!(repo.list_ids().await.expect("ids").len(), first.inserted);
    }

    #[tokio::test]
    async fn demo_catalog_spans_genders_and_garment_kinds() {
        let repo = InMemoryItemMetadataRepository::default();
        seed_demo_catalog(&repo).await.expect("seed");

        let items = repo.list_all().await.expect("items");
        assert!(items.iter().any(|item| item.gender == "male"));
        assert!(items.iter().any(|item| item.gender == "female"));
        assert!(items.iter().any(|item| item.garment_type == "dress"));
        assert!(items.iter().any(|item| item.garment_type == "sunglasses"));
    }
}
