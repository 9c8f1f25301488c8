use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{
    EntityId, Film, FilmPatch, FriendshipStatus, Genre, MpaRating, NewFilm, NewUser, User,
    UserPatch,
};
use crate::storage::{EntityStorage, RelationshipStorage};

/// Map-backed implementation of both storage interfaces, used for tests
/// and as the non-persistent backend.
///
/// Each adjacency structure sits behind its own `RwLock`, so writers on the
/// same structure serialize and readers never observe a half-written edge.
/// No lock is held across an await into another structure.
pub struct MemoryStorage {
    users: RwLock<BTreeMap<EntityId, User>>,
    films: RwLock<BTreeMap<EntityId, Film>>,
    /// requester -> (target -> status)
    friendships: RwLock<HashMap<EntityId, HashMap<EntityId, FriendshipStatus>>>,
    /// film -> set of users that liked it
    likes: RwLock<HashMap<EntityId, HashSet<EntityId>>>,
    next_user_id: AtomicI64,
    next_film_id: AtomicI64,
    mpa_ratings: Vec<MpaRating>,
    genres: Vec<Genre>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            films: RwLock::new(BTreeMap::new()),
            friendships: RwLock::new(HashMap::new()),
            likes: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_film_id: AtomicI64::new(1),
            mpa_ratings: crate::storage::default_mpa_ratings(),
            genres: crate::storage::default_genres(),
        }
    }

    fn resolve_mpa(&self, id: i32) -> AppResult<MpaRating> {
        self.mpa_ratings
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("MPA rating {} not found", id)))
    }

    /// Dedup and resolve genre ids, ordered ascending by id.
    fn resolve_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let unique: BTreeSet<i32> = ids.iter().copied().collect();
        unique
            .into_iter()
            .map(|id| {
                self.genres
                    .iter()
                    .find(|g| g.id == id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
            })
            .collect()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStorage for MemoryStorage {
    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict(format!(
                "Email {} is already in use",
                new_user.email
            )));
        }
        if users.values().any(|u| u.login == new_user.login) {
            return Err(AppError::Conflict(format!(
                "Login {} is already in use",
                new_user.login
            )));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let name = match new_user.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => new_user.login.clone(),
        };
        let user = User {
            id,
            email: new_user.email,
            login: new_user.login,
            name,
            birthday: new_user.birthday,
        };
        users.insert(id, user.clone());
        tracing::debug!("Created user {} ({})", user.id, user.login);
        Ok(user)
    }

    async fn update_user(&self, patch: UserPatch) -> AppResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&patch.id) {
            return Err(AppError::NotFound(format!("User {} not found", patch.id)));
        }
        if let Some(email) = &patch.email {
            if users.values().any(|u| u.id != patch.id && &u.email == email) {
                return Err(AppError::Conflict(format!("Email {} is already in use", email)));
            }
        }
        if let Some(login) = &patch.login {
            if users.values().any(|u| u.id != patch.id && &u.login == login) {
                return Err(AppError::Conflict(format!("Login {} is already in use", login)));
            }
        }

        let user = users
            .get_mut(&patch.id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", patch.id)))?;
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(login) = patch.login {
            user.login = login;
        }
        if let Some(name) = patch.name {
            user.name = if name.trim().is_empty() {
                user.login.clone()
            } else {
                name
            };
        }
        if let Some(birthday) = patch.birthday {
            user.birthday = birthday;
        }
        tracing::debug!("Updated user {}", user.id);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: EntityId) -> AppResult<()> {
        let mut users = self.users.write().await;
        users
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        tracing::debug!("Deleted user {}", id);
        Ok(())
    }

    async fn user_exists(&self, id: EntityId) -> AppResult<bool> {
        Ok(self.users.read().await.contains_key(&id))
    }

    async fn get_user(&self, id: EntityId) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn get_users_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn get_users(&self) -> AppResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn create_film(&self, new_film: NewFilm) -> AppResult<Film> {
        let mpa = self.resolve_mpa(new_film.mpa_id)?;
        let genres = self.resolve_genres(&new_film.genre_ids)?;

        let mut films = self.films.write().await;
        let id = self.next_film_id.fetch_add(1, Ordering::SeqCst);
        let film = Film {
            id,
            name: new_film.name,
            description: new_film.description,
            release_date: new_film.release_date,
            duration: new_film.duration,
            mpa,
            genres,
        };
        films.insert(id, film.clone());
        tracing::debug!("Created film {} ({})", film.id, film.name);
        Ok(film)
    }

    async fn update_film(&self, patch: FilmPatch) -> AppResult<Film> {
        let mpa = match patch.mpa_id {
            Some(id) => Some(self.resolve_mpa(id)?),
            None => None,
        };
        let genres = match &patch.genre_ids {
            Some(ids) => Some(self.resolve_genres(ids)?),
            None => None,
        };

        let mut films = self.films.write().await;
        let film = films
            .get_mut(&patch.id)
            .ok_or_else(|| AppError::NotFound(format!("Film {} not found", patch.id)))?;
        if let Some(name) = patch.name {
            film.name = name;
        }
        if let Some(description) = patch.description {
            film.description = description;
        }
        if let Some(release_date) = patch.release_date {
            film.release_date = release_date;
        }
        if let Some(duration) = patch.duration {
            film.duration = duration;
        }
        if let Some(mpa) = mpa {
            film.mpa = mpa;
        }
        if let Some(genres) = genres {
            film.genres = genres;
        }
        tracing::debug!("Updated film {}", film.id);
        Ok(film.clone())
    }

    async fn delete_film(&self, id: EntityId) -> AppResult<()> {
        let mut films = self.films.write().await;
        films
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Film {} not found", id)))?;
        tracing::debug!("Deleted film {}", id);
        Ok(())
    }

    async fn film_exists(&self, id: EntityId) -> AppResult<bool> {
        Ok(self.films.read().await.contains_key(&id))
    }

    async fn get_film(&self, id: EntityId) -> AppResult<Film> {
        self.films
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Film {} not found", id)))
    }

    async fn get_films_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<Film>> {
        let films = self.films.read().await;
        Ok(ids.iter().filter_map(|id| films.get(id).cloned()).collect())
    }

    async fn get_films(&self) -> AppResult<Vec<Film>> {
        Ok(self.films.read().await.values().cloned().collect())
    }

    async fn get_mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        Ok(self.mpa_ratings.clone())
    }

    async fn get_mpa_rating(&self, id: i32) -> AppResult<MpaRating> {
        self.resolve_mpa(id)
    }

    async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.genres.clone())
    }

    async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }
}

#[async_trait]
impl RelationshipStorage for MemoryStorage {
    async fn add_friend_edge(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let mut friendships = self.friendships.write().await;
        friendships.entry(from).or_default().insert(to, status);
        tracing::debug!("Friendship edge {} -> {} set to {}", from, to, status.as_str());
        Ok(())
    }

    async fn update_friend_status(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let mut friendships = self.friendships.write().await;
        let edges = friendships
            .get_mut(&from)
            .filter(|edges| edges.contains_key(&to))
            .ok_or_else(|| {
                AppError::NotFound(format!("Friendship {} -> {} not found", from, to))
            })?;
        edges.insert(to, status);
        tracing::debug!(
            "Friendship edge {} -> {} updated to {}",
            from,
            to,
            status.as_str()
        );
        Ok(())
    }

    async fn remove_friend_edge(&self, from: EntityId, to: EntityId) -> AppResult<bool> {
        let mut friendships = self.friendships.write().await;
        let Some(edges) = friendships.get_mut(&from) else {
            return Ok(false);
        };
        let removed = edges.remove(&to).is_some();
        if edges.is_empty() {
            friendships.remove(&from);
        }
        if removed {
            tracing::debug!("Friendship edge {} -> {} removed", from, to);
        }
        Ok(removed)
    }

    async fn remove_all_edges_of(&self, user_id: EntityId) -> AppResult<()> {
        let mut friendships = self.friendships.write().await;
        friendships.remove(&user_id);
        for edges in friendships.values_mut() {
            edges.remove(&user_id);
        }
        friendships.retain(|_, edges| !edges.is_empty());
        tracing::debug!("All friendship edges of user {} removed", user_id);
        Ok(())
    }

    async fn friend_ids_of(
        &self,
        user_id: EntityId,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Vec<EntityId>> {
        let friendships = self.friendships.read().await;
        let mut ids: Vec<EntityId> = friendships
            .get(&user_id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|(_, s)| status.map_or(true, |wanted| **s == wanted))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn common_friend_ids(&self, a: EntityId, b: EntityId) -> AppResult<Vec<EntityId>> {
        let friendships = self.friendships.read().await;
        let empty = HashMap::new();
        let first = friendships.get(&a).unwrap_or(&empty);
        let second = friendships.get(&b).unwrap_or(&empty);
        let mut ids: Vec<EntityId> = first
            .keys()
            .filter(|id| second.contains_key(id))
            .copied()
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn add_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        let mut likes = self.likes.write().await;
        likes.entry(film_id).or_default().insert(user_id);
        tracing::debug!("User {} likes film {}", user_id, film_id);
        Ok(())
    }

    async fn remove_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        let mut likes = self.likes.write().await;
        if let Some(likers) = likes.get_mut(&film_id) {
            likers.remove(&user_id);
            if likers.is_empty() {
                likes.remove(&film_id);
            }
            tracing::debug!("User {} unliked film {}", user_id, film_id);
        }
        Ok(())
    }

    async fn remove_all_likes_of_user(&self, user_id: EntityId) -> AppResult<()> {
        let mut likes = self.likes.write().await;
        for likers in likes.values_mut() {
            likers.remove(&user_id);
        }
        likes.retain(|_, likers| !likers.is_empty());
        tracing::debug!("All likes of user {} removed", user_id);
        Ok(())
    }

    async fn remove_all_likes_of_film(&self, film_id: EntityId) -> AppResult<()> {
        let mut likes = self.likes.write().await;
        likes.remove(&film_id);
        tracing::debug!("All likes of film {} removed", film_id);
        Ok(())
    }

    async fn liked_user_ids_of(&self, film_id: EntityId) -> AppResult<Vec<EntityId>> {
        let likes = self.likes.read().await;
        let mut ids: Vec<EntityId> = likes
            .get(&film_id)
            .map(|likers| likers.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn top_film_ids_by_likes(&self, count: usize) -> AppResult<Vec<EntityId>> {
        // Zero-like films are eligible, so ranking starts from the full
        // catalog rather than the like map.
        let films = self.films.read().await;
        let likes = self.likes.read().await;
        let mut ranked: Vec<(EntityId, usize)> = films
            .keys()
            .map(|id| (*id, likes.get(id).map_or(0, HashSet::len)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(count);
        Ok(ranked.into_iter().map(|(id, _)| id).collect())
    }
}
