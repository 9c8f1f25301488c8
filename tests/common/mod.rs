#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use filmgraph::models::{NewFilm, NewUser};
use filmgraph::services::{CatalogService, FriendshipService, PopularityService};
use filmgraph::storage::{EntityStorage, MemoryStorage, RelationshipStorage, SqliteStorage};

/// One fully wired service stack over a single backend.
pub struct TestContext {
    pub backend: &'static str,
    pub entities: Arc<dyn EntityStorage>,
    pub relationships: Arc<dyn RelationshipStorage>,
    pub catalog: CatalogService,
    pub friendship: FriendshipService,
    pub popularity: PopularityService,
}

fn wire(
    backend: &'static str,
    entities: Arc<dyn EntityStorage>,
    relationships: Arc<dyn RelationshipStorage>,
) -> TestContext {
    let friendship = FriendshipService::new(relationships.clone(), entities.clone());
    let popularity = PopularityService::new(relationships.clone(), entities.clone());
    let catalog = CatalogService::new(entities.clone(), friendship.clone(), popularity.clone());
    TestContext {
        backend,
        entities,
        relationships,
        catalog,
        friendship,
        popularity,
    }
}

pub async fn memory_context() -> TestContext {
    let storage = Arc::new(MemoryStorage::new());
    wire("memory", storage.clone(), storage)
}

pub async fn sqlite_context() -> TestContext {
    let storage = Arc::new(
        SqliteStorage::new_in_memory()
            .await
            .expect("in-memory sqlite"),
    );
    wire("sqlite", storage.clone(), storage)
}

/// Both backend realizations; every behavioral test runs against each.
pub async fn contexts() -> Vec<TestContext> {
    vec![memory_context().await, sqlite_context().await]
}

pub fn new_user(email: &str, login: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        login: login.to_string(),
        name: None,
        birthday: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    }
}

pub fn new_film(name: &str) -> NewFilm {
    NewFilm {
        name: name.to_string(),
        description: "A test film".to_string(),
        release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        duration: 120,
        mpa_id: 1,
        genre_ids: Vec::new(),
    }
}
