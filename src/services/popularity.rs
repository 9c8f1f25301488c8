use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{EntityId, Film, User};
use crate::storage::{EntityStorage, RelationshipStorage};

/// Orchestrates like mutations and the top-N popularity query.
#[derive(Clone)]
pub struct PopularityService {
    relationships: Arc<dyn RelationshipStorage>,
    entities: Arc<dyn EntityStorage>,
}

impl PopularityService {
    pub fn new(
        relationships: Arc<dyn RelationshipStorage>,
        entities: Arc<dyn EntityStorage>,
    ) -> Self {
        Self {
            relationships,
            entities,
        }
    }

    /// Idempotent: re-liking an already liked film is a no-op.
    pub async fn like_film(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        self.ensure_user_exists(user_id).await?;
        self.ensure_film_exists(film_id).await?;
        self.relationships.add_like(user_id, film_id).await?;
        tracing::info!("User {} liked film {}", user_id, film_id);
        Ok(())
    }

    /// Idempotent: unliking a film that was never liked is a no-op.
    pub async fn unlike_film(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        self.ensure_user_exists(user_id).await?;
        self.ensure_film_exists(film_id).await?;
        self.relationships.remove_like(user_id, film_id).await?;
        tracing::info!("User {} unliked film {}", user_id, film_id);
        Ok(())
    }

    /// Users that liked the film, resolved through the entity store with
    /// unresolvable ids dropped.
    pub async fn get_likers(&self, film_id: EntityId) -> AppResult<Vec<User>> {
        self.ensure_film_exists(film_id).await?;
        let user_ids = self.relationships.liked_user_ids_of(film_id).await?;
        self.entities.get_users_by_ids(&user_ids).await
    }

    /// Top `count` films by like count, most liked first, ties broken by
    /// ascending film id. Fewer than `count` results is legitimate when
    /// the catalog is smaller.
    pub async fn top_liked(&self, count: i64) -> AppResult<Vec<Film>> {
        if count <= 0 {
            return Err(AppError::BadRequest(
                "count must be a positive number".to_string(),
            ));
        }
        let film_ids = self
            .relationships
            .top_film_ids_by_likes(count as usize)
            .await?;
        self.entities.get_films_by_ids(&film_ids).await
    }

    /// Deletion hook: drop every like placed by the user.
    pub async fn on_user_deleted(&self, user_id: EntityId) -> AppResult<()> {
        self.relationships.remove_all_likes_of_user(user_id).await?;
        tracing::info!("Likes of deleted user {} removed", user_id);
        Ok(())
    }

    /// Deletion hook: drop every like placed on the film.
    pub async fn on_film_deleted(&self, film_id: EntityId) -> AppResult<()> {
        self.relationships.remove_all_likes_of_film(film_id).await?;
        tracing::info!("Likes of deleted film {} removed", film_id);
        Ok(())
    }

    async fn ensure_user_exists(&self, user_id: EntityId) -> AppResult<()> {
        if !self.entities.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn ensure_film_exists(&self, film_id: EntityId) -> AppResult<()> {
        if !self.entities.film_exists(film_id).await? {
            return Err(AppError::NotFound(format!("Film {} not found", film_id)));
        }
        Ok(())
    }
}
