use chrono::{Duration, TimeZone, Utc};

use stylegraph_core::domain::interaction::InteractionEvent;
use stylegraph_core::domain::item::{Item, ItemId};
use stylegraph_core::domain::navigation::{NavigationEdge, NavigationPath};
use stylegraph_core::domain::recommendation::{RecommendationResult, RecommendedItem};

use stylegraph_db::migrations::run_pending;
use stylegraph_db::repositories::{
    InteractionRepository, ItemMetadataRepository, NavigationPathRepository,
    RecommendationRepository, RepositoryError, SqlInteractionRepository,
    SqlItemMetadataRepository, SqlNavigationPathRepository, SqlRecommendationRepository,
};
use stylegraph_db::{connect_with_settings, seed_demo_catalog, DbPool};

async fn migrated_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    run_pending(&pool).await.expect("migrations");
    pool
}

fn item(id: &str, tags: &[&str], garment_type: &str, gender: &str) -> Item {
    Item::new(
        id,
        tags.iter().map(|tag| (*tag).to_owned()),
        vec!["white".to_owned()],
        garment_type,
        gender,
    )
    .expect("item")
}

#[tokio::test]
async fn item_metadata_round_trips_through_sqlite() {
    let pool = migrated_pool().await;
    let repo = SqlItemMetadataRepository::new(pool);

    let original = item("img_001", &["casual", "summer"], "t-shirt", "male");
    repo.save(&original).await.expect("save");

    let found = repo.find_by_id(&ItemId::from("img_001")).await.expect("find");
    assert_eq!(found, Some(original.clone()));

    // Upsert replaces the previous row.
    let updated = item("img_001", &["formal"], "t-shirt", "male");
    repo.save(&updated).await.expect("resave");
    let found = repo.find_by_id(&ItemId::from("img_001")).await.expect("find");
    assert_eq!(found, Some(updated));

    assert_eq!(repo.find_by_id(&ItemId::from("img_404")).await.expect("find"), None);
}

#[tokio::test]
async fn item_listing_and_batch_lookups_are_id_ordered() {
    let pool = migrated_pool().await;
    let repo = SqlItemMetadataRepository::new(pool);

    repo.save(&item("img_002", &["casual"], "shorts", "male")).await.expect("save");
    repo.save(&item("img_001", &["casual"], "dress", "female")).await.expect("save");
    repo.save(&item("img_003", &["formal"], "hat", "unisex")).await.expect("save");

    assert_eq!(
        repo.list_ids().await.expect("ids"),
        vec![ItemId::from("img_001"), ItemId::from("img_002"), ItemId::from("img_003")]
    );

    let batch = repo
        .find_batch(&[ItemId::from("img_003"), ItemId::from("img_001"), ItemId::from("img_404")])
        .await
        .expect("batch");
    assert_eq!(batch.len(), 2);
}

#[tokio::test]
async fn navigation_path_upsert_is_keyed_by_source() {
    let pool = migrated_pool().await;
    let repo = SqlNavigationPathRepository::new(pool);

    let source = ItemId::from("img_001");
    let first = NavigationPath::new(
        source.clone(),
        vec![
            NavigationEdge::new(source.clone(), ItemId::from("img_002"), 0.4, "shared tags")
                .expect("edge"),
            NavigationEdge::new(source.clone(), ItemId::from("img_003"), 0.2, "shared tags")
                .expect("edge"),
        ],
        "Primary link: img_001 to img_002",
    )
    .expect("path");
    repo.upsert(&first).await.expect("first upsert");

    let second = NavigationPath::new(
        source.clone(),
        vec![NavigationEdge::new(source.clone(), ItemId::from("img_005"), 0.6, "same garment")
            .expect("edge")],
        "Primary link: img_001 to img_005",
    )
    .expect("path");
    repo.upsert(&second).await.expect("second upsert");

    let found = repo.find_by_source(&source).await.expect("find").expect("path present");
    assert_eq!(found.targets(), vec![ItemId::from("img_005")]);
    assert_eq!(found.scores(), vec![0.6]);
    assert_eq!(found.reason, "Primary link: img_001 to img_005");

    let graph = repo.list_targets().await.expect("targets");
    assert_eq!(graph.len(), 1);
    assert_eq!(graph[&source], vec![ItemId::from("img_005")]);
}

#[tokio::test]
async fn interaction_log_preserves_session_order_and_rejects_mixed_users() {
    let pool = migrated_pool().await;
    let repo = SqlInteractionRepository::new(pool);
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let session = vec![
        InteractionEvent::new("user001", ItemId::from("img_003"), true, start),
        InteractionEvent::new(
            "user001",
            ItemId::from("img_001"),
            false,
            start + Duration::seconds(1),
        ),
        InteractionEvent::new(
            "user001",
            ItemId::from("img_002"),
            true,
            start + Duration::seconds(2),
        ),
        InteractionEvent::new(
            "user001",
            ItemId::from("img_003"),
            true,
            start + Duration::seconds(3),
        ),
    ];
    repo.append_session(&session).await.expect("append");

    // Repeat clicks repeat in history; non-clicks are filtered.
    assert_eq!(
        repo.clicked_history("user001").await.expect("history"),
        vec![ItemId::from("img_003"), ItemId::from("img_002"), ItemId::from("img_003")]
    );
    assert_eq!(
        repo.last_clicked("user001").await.expect("last"),
        Some(ItemId::from("img_003"))
    );
    assert_eq!(repo.last_clicked("user002").await.expect("last"), None);

    let mixed = vec![
        InteractionEvent::new("user001", ItemId::from("img_001"), true, start),
        InteractionEvent::new("user002", ItemId::from("img_002"), true, start),
    ];
    let result = repo.append_session(&mixed).await;
    assert!(matches!(result, Err(RepositoryError::Decode(_))));
    // The rejected batch must not have written anything.
    assert_eq!(repo.clicked_history("user002").await.expect("history"), Vec::<ItemId>::new());
}

#[tokio::test]
async fn recommendation_append_writes_one_row_per_result() {
    let pool = migrated_pool().await;
    let repo = SqlRecommendationRepository::new(pool.clone());

    let result = RecommendationResult::new(
        "user001",
        ItemId::from("img_001"),
        vec![
            RecommendedItem {
                item_id: ItemId::from("img_002"),
                reason: "Matches your style: casual".to_owned(),
            },
            RecommendedItem {
                item_id: ItemId::from("img_003"),
                reason: "This item complements your current selection.".to_owned(),
            },
        ],
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    )
    .expect("result");
    repo.append(&result).await.expect("append");
    repo.append(&result).await.expect("append again");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn seeded_catalog_is_readable_through_the_sql_repository() {
    let pool = migrated_pool().await;
    let repo = SqlItemMetadataRepository::new(pool);

    let seeded = seed_demo_catalog(&repo).await.expect("seed");
    assert!(seeded.inserted > 0);

    let items = repo.list_all().await.expect("items");
    assert_eq!(items.len(), seeded.inserted);
    assert!(items.iter().any(|item| item.garment_type == "dress"));
}
