use std::sync::Arc;

use crate::{
    config::Config,
    services::{CatalogService, FriendshipService, PopularityService},
    storage::{EntityStorage, MemoryStorage, RelationshipStorage, SqliteStorage},
};

/// Composition root: picks the storage backend from config and wires the
/// services around owned store handles. No globals; everything the HTTP
/// layer needs hangs off this state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub friendship: FriendshipService,
    pub popularity: PopularityService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (entities, relationships): (Arc<dyn EntityStorage>, Arc<dyn RelationshipStorage>) =
            match config.storage.backend.as_str() {
                "memory" => {
                    let storage = Arc::new(MemoryStorage::new());
                    (storage.clone(), storage)
                }
                _ => {
                    let storage = Arc::new(
                        SqliteStorage::connect(&config.database.url)
                            .await
                            .map_err(|e| anyhow::anyhow!("{}", e))?,
                    );
                    (storage.clone(), storage)
                }
            };

        let friendship = FriendshipService::new(relationships.clone(), entities.clone());
        let popularity = PopularityService::new(relationships, entities.clone());
        let catalog = CatalogService::new(entities, friendship.clone(), popularity.clone());

        Ok(Self {
            catalog,
            friendship,
            popularity,
            config,
        })
    }
}
