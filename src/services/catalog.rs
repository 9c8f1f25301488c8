use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{
    EntityId, Film, FilmPatch, Genre, MpaRating, NewFilm, NewUser, User, UserPatch,
};
use crate::services::{FriendshipService, PopularityService};
use crate::storage::EntityStorage;

/// User and film lifecycle on top of the entity store. Deletions run the
/// relationship cascades *before* the entity row disappears, so readers
/// never see an edge pointing at a removed endpoint.
#[derive(Clone)]
pub struct CatalogService {
    entities: Arc<dyn EntityStorage>,
    friendship: FriendshipService,
    popularity: PopularityService,
}

impl CatalogService {
    pub fn new(
        entities: Arc<dyn EntityStorage>,
        friendship: FriendshipService,
        popularity: PopularityService,
    ) -> Self {
        Self {
            entities,
            friendship,
            popularity,
        }
    }

    pub async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let user = self.entities.create_user(new_user).await?;
        tracing::info!("User created: id={}, login={}", user.id, user.login);
        Ok(user)
    }

    pub async fn update_user(&self, patch: UserPatch) -> AppResult<User> {
        let user = self.entities.update_user(patch).await?;
        tracing::info!("User updated: id={}", user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: EntityId) -> AppResult<()> {
        // Existence check first so cascades don't run for unknown ids.
        self.entities.get_user(id).await?;
        self.friendship.on_user_deleted(id).await?;
        self.popularity.on_user_deleted(id).await?;
        self.entities.delete_user(id).await?;
        tracing::info!("User deleted: id={}", id);
        Ok(())
    }

    pub async fn get_user(&self, id: EntityId) -> AppResult<User> {
        self.entities.get_user(id).await
    }

    pub async fn get_users(&self) -> AppResult<Vec<User>> {
        self.entities.get_users().await
    }

    pub async fn create_film(&self, new_film: NewFilm) -> AppResult<Film> {
        let film = self.entities.create_film(new_film).await?;
        tracing::info!("Film created: id={}, name={}", film.id, film.name);
        Ok(film)
    }

    pub async fn update_film(&self, patch: FilmPatch) -> AppResult<Film> {
        let film = self.entities.update_film(patch).await?;
        tracing::info!("Film updated: id={}", film.id);
        Ok(film)
    }

    pub async fn delete_film(&self, id: EntityId) -> AppResult<()> {
        self.entities.get_film(id).await?;
        self.popularity.on_film_deleted(id).await?;
        self.entities.delete_film(id).await?;
        tracing::info!("Film deleted: id={}", id);
        Ok(())
    }

    pub async fn get_film(&self, id: EntityId) -> AppResult<Film> {
        self.entities.get_film(id).await
    }

    pub async fn get_films(&self) -> AppResult<Vec<Film>> {
        self.entities.get_films().await
    }

    pub async fn get_mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        self.entities.get_mpa_ratings().await
    }

    pub async fn get_mpa_rating(&self, id: i32) -> AppResult<MpaRating> {
        self.entities.get_mpa_rating(id).await
    }

    pub async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        self.entities.get_genres().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.entities.get_genre(id).await
    }
}
