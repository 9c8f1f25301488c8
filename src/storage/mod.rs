// Storage interfaces - entity records and the relationship graph.
// Realizations are selected at composition time (memory for tests,
// sqlite for production); services only see the traits.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    EntityId, Film, FilmPatch, FriendshipStatus, Genre, MpaRating, NewFilm, NewUser, User,
    UserPatch,
};

/// Seed data for the MPA rating catalog, shared by both backends.
pub(crate) fn default_mpa_ratings() -> Vec<MpaRating> {
    [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")]
        .into_iter()
        .map(|(id, name)| MpaRating {
            id,
            name: name.to_string(),
        })
        .collect()
}

/// Seed data for the genre catalog, shared by both backends.
pub(crate) fn default_genres() -> Vec<Genre> {
    [
        (1, "Comedy"),
        (2, "Drama"),
        (3, "Cartoon"),
        (4, "Thriller"),
        (5, "Documentary"),
        (6, "Action"),
    ]
    .into_iter()
    .map(|(id, name)| Genre {
        id,
        name: name.to_string(),
    })
    .collect()
}

/// Canonical User and Film records, keyed by a monotonically increasing
/// identifier. Identifiers are never recycled after deletion.
#[async_trait]
pub trait EntityStorage: Send + Sync {
    // User lifecycle
    async fn create_user(&self, new_user: NewUser) -> AppResult<User>;
    async fn update_user(&self, patch: UserPatch) -> AppResult<User>;
    async fn delete_user(&self, id: EntityId) -> AppResult<()>;

    // User reads
    async fn user_exists(&self, id: EntityId) -> AppResult<bool>;
    async fn get_user(&self, id: EntityId) -> AppResult<User>;
    /// Resolves ids in input order, silently skipping ids with no match.
    async fn get_users_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<User>>;
    async fn get_users(&self) -> AppResult<Vec<User>>;

    // Film lifecycle
    async fn create_film(&self, new_film: NewFilm) -> AppResult<Film>;
    async fn update_film(&self, patch: FilmPatch) -> AppResult<Film>;
    async fn delete_film(&self, id: EntityId) -> AppResult<()>;

    // Film reads
    async fn film_exists(&self, id: EntityId) -> AppResult<bool>;
    async fn get_film(&self, id: EntityId) -> AppResult<Film>;
    /// Resolves ids in input order, silently skipping ids with no match.
    async fn get_films_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<Film>>;
    async fn get_films(&self) -> AppResult<Vec<Film>>;

    // Lookup catalogs
    async fn get_mpa_ratings(&self) -> AppResult<Vec<MpaRating>>;
    async fn get_mpa_rating(&self, id: i32) -> AppResult<MpaRating>;
    async fn get_genres(&self) -> AppResult<Vec<Genre>>;
    async fn get_genre(&self, id: i32) -> AppResult<Genre>;
}

/// Directed friendship-status graph plus the user <-> film like relation,
/// stored as id adjacency only - entities are resolved through
/// [`EntityStorage`] on read, never embedded here.
#[async_trait]
pub trait RelationshipStorage: Send + Sync {
    /// Upsert: overwrites the prior status if a `from -> to` edge exists.
    async fn add_friend_edge(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()>;

    /// Fails with `NotFound` if no `from -> to` edge exists.
    async fn update_friend_status(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()>;

    /// Idempotent; reports whether an edge was actually removed.
    async fn remove_friend_edge(&self, from: EntityId, to: EntityId) -> AppResult<bool>;

    /// Removes every edge where `user_id` is requester or target.
    async fn remove_all_edges_of(&self, user_id: EntityId) -> AppResult<()>;

    /// Target ids of edges from `user_id` matching the filter
    /// (`None` = any status), in ascending target id order.
    async fn friend_ids_of(
        &self,
        user_id: EntityId,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Vec<EntityId>>;

    /// Intersection of both users' edge targets regardless of status.
    /// Callers wanting confirmed-only intersection filter before
    /// intersecting instead of using this primitive.
    async fn common_friend_ids(&self, a: EntityId, b: EntityId) -> AppResult<Vec<EntityId>>;

    /// Idempotent; re-adding an existing like is a no-op.
    async fn add_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()>;

    /// Idempotent; removing an absent like is a no-op, not an error.
    async fn remove_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()>;

    /// Cascade hook for user deletion.
    async fn remove_all_likes_of_user(&self, user_id: EntityId) -> AppResult<()>;

    /// Cascade hook for film deletion.
    async fn remove_all_likes_of_film(&self, film_id: EntityId) -> AppResult<()>;

    /// Ids of users that liked the film, in ascending id order.
    async fn liked_user_ids_of(&self, film_id: EntityId) -> AppResult<Vec<EntityId>>;

    /// At most `count` film ids ordered by descending like count, ties
    /// broken by ascending film id. Zero-like films are eligible and sort
    /// after all liked films, ascending by id among themselves.
    async fn top_film_ids_by_likes(&self, count: usize) -> AppResult<Vec<EntityId>>;
}
