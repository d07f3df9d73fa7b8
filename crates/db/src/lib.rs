pub mod cache;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use cache::MetadataCache;
pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_demo_catalog, SeedResult};
