use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row,
};

use crate::error::{AppError, AppResult};
use crate::models::{
    EntityId, Film, FilmPatch, FriendshipStatus, Genre, MpaRating, NewFilm, NewUser, User,
    UserPatch,
};
use crate::storage::{EntityStorage, RelationshipStorage};

/// SQLite implementation of both storage interfaces.
///
/// `AUTOINCREMENT` keys guarantee identifiers are never reused after
/// deletion; per-statement atomicity gives each edge mutation the required
/// at-most-one-writer behavior.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to SQLite: {}", e)))?;
        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// In-memory database for tests. Capped at one connection: each
    /// `:memory:` connection is its own database, so a wider pool would
    /// scatter the tables.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;
        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Create tables and seed the lookup catalogs.
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                login TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                birthday TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS mpa_ratings (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS films (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                release_date TEXT NOT NULL,
                duration INTEGER NOT NULL,
                mpa_id INTEGER NOT NULL REFERENCES mpa_ratings(id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS film_genres (
                film_id INTEGER NOT NULL,
                genre_id INTEGER NOT NULL,
                PRIMARY KEY (film_id, genre_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS friendships (
                user_id INTEGER NOT NULL,
                friend_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (user_id, friend_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS film_likes (
                film_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY (film_id, user_id)
            )
            "#,
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;
        }

        for mpa in crate::storage::default_mpa_ratings() {
            sqlx::query("INSERT OR IGNORE INTO mpa_ratings (id, name) VALUES (?, ?)")
                .bind(mpa.id)
                .bind(&mpa.name)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to seed MPA ratings: {}", e))
                })?;
        }
        for genre in crate::storage::default_genres() {
            sqlx::query("INSERT OR IGNORE INTO genres (id, name) VALUES (?, ?)")
                .bind(genre.id)
                .bind(&genre.name)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to seed genres: {}", e)))?;
        }

        Ok(())
    }

    async fn email_in_use(&self, email: &str, exclude: Option<EntityId>) -> AppResult<bool> {
        let row = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to check email: {}", e)))?;
        Ok(row.is_some_and(|r| Some(r.get::<EntityId, _>("id")) != exclude))
    }

    async fn login_in_use(&self, login: &str, exclude: Option<EntityId>) -> AppResult<bool> {
        let row = sqlx::query("SELECT id FROM users WHERE login = ?")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to check login: {}", e)))?;
        Ok(row.is_some_and(|r| Some(r.get::<EntityId, _>("id")) != exclude))
    }

    async fn load_film(&self, id: EntityId) -> AppResult<Option<Film>> {
        let row = sqlx::query(
            r#"
            SELECT f.id, f.name, f.description, f.release_date, f.duration,
                   f.mpa_id, m.name AS mpa_name
            FROM films f
            JOIN mpa_ratings m ON m.id = f.mpa_id
            WHERE f.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get film {}: {}", id, e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let genre_rows = sqlx::query(
            r#"
            SELECT g.id, g.name
            FROM film_genres fg
            JOIN genres g ON g.id = fg.genre_id
            WHERE fg.film_id = ?
            ORDER BY g.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get film genres: {}", e)))?;

        Ok(Some(Film {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            release_date: row.get("release_date"),
            duration: row.get("duration"),
            mpa: MpaRating {
                id: row.get("mpa_id"),
                name: row.get("mpa_name"),
            },
            genres: genre_rows
                .into_iter()
                .map(|g| Genre {
                    id: g.get("id"),
                    name: g.get("name"),
                })
                .collect(),
        }))
    }

    /// Dedup and validate genre ids against the catalog.
    async fn checked_genre_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let unique: BTreeSet<i32> = ids.iter().copied().collect();
        for id in &unique {
            self.get_genre(*id).await?;
        }
        Ok(unique.into_iter().collect())
    }

    async fn replace_film_genres(&self, film_id: EntityId, genre_ids: &[i32]) -> AppResult<()> {
        sqlx::query("DELETE FROM film_genres WHERE film_id = ?")
            .bind(film_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to clear film genres: {}", e)))?;
        for genre_id in genre_ids {
            sqlx::query("INSERT OR IGNORE INTO film_genres (film_id, genre_id) VALUES (?, ?)")
                .bind(film_id)
                .bind(genre_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to insert film genre: {}", e))
                })?;
        }
        Ok(())
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        login: row.get("login"),
        name: row.get("name"),
        birthday: row.get("birthday"),
    }
}

#[async_trait]
impl EntityStorage for SqliteStorage {
    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        if self.email_in_use(&new_user.email, None).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already in use",
                new_user.email
            )));
        }
        if self.login_in_use(&new_user.login, None).await? {
            return Err(AppError::Conflict(format!(
                "Login {} is already in use",
                new_user.login
            )));
        }

        let name = match new_user.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => new_user.login.clone(),
        };
        let result = sqlx::query(
            "INSERT INTO users (email, login, name, birthday) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.login)
        .bind(&name)
        .bind(new_user.birthday)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create user: {}", e)))?;

        let id = result.last_insert_rowid();
        tracing::debug!("Created user {} ({})", id, new_user.login);
        Ok(User {
            id,
            email: new_user.email,
            login: new_user.login,
            name,
            birthday: new_user.birthday,
        })
    }

    async fn update_user(&self, patch: UserPatch) -> AppResult<User> {
        let current = self.get_user(patch.id).await?;

        if let Some(email) = &patch.email {
            if self.email_in_use(email, Some(patch.id)).await? {
                return Err(AppError::Conflict(format!("Email {} is already in use", email)));
            }
        }
        if let Some(login) = &patch.login {
            if self.login_in_use(login, Some(patch.id)).await? {
                return Err(AppError::Conflict(format!("Login {} is already in use", login)));
            }
        }

        let email = patch.email.unwrap_or(current.email);
        let login = patch.login.unwrap_or(current.login);
        let name = match patch.name {
            Some(name) if !name.trim().is_empty() => name,
            Some(_) => login.clone(),
            None => current.name,
        };
        let birthday = patch.birthday.unwrap_or(current.birthday);

        sqlx::query("UPDATE users SET email = ?, login = ?, name = ?, birthday = ? WHERE id = ?")
            .bind(&email)
            .bind(&login)
            .bind(&name)
            .bind(birthday)
            .bind(patch.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update user {}: {}", patch.id, e))
            })?;

        tracing::debug!("Updated user {}", patch.id);
        Ok(User {
            id: patch.id,
            email,
            login,
            name,
            birthday,
        })
    }

    async fn delete_user(&self, id: EntityId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user {}: {}", id, e)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        tracing::debug!("Deleted user {}", id);
        Ok(())
    }

    async fn user_exists(&self, id: EntityId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check if user {} exists: {}", id, e))
            })?;
        Ok(row.is_some())
    }

    async fn get_user(&self, id: EntityId) -> AppResult<User> {
        let row = sqlx::query("SELECT id, email, login, name, birthday FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;
        row.map(|r| row_to_user(&r))
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn get_users_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let query = format!(
            "SELECT id, email, login, name, birthday FROM users WHERE id IN ({})",
            placeholders
        );
        let mut q = sqlx::query(&query);
        for id in ids {
            q = q.bind(*id);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get users: {}", e)))?;

        // IN() loses the caller's order; re-apply it, dropping misses.
        let by_id: HashMap<EntityId, User> = rows
            .iter()
            .map(|r| {
                let user = row_to_user(r);
                (user.id, user)
            })
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    async fn get_users(&self) -> AppResult<Vec<User>> {
        let rows =
            sqlx::query("SELECT id, email, login, name, birthday FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to get users: {}", e)))?;
        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn create_film(&self, new_film: NewFilm) -> AppResult<Film> {
        let mpa = self.get_mpa_rating(new_film.mpa_id).await?;
        let genre_ids = self.checked_genre_ids(&new_film.genre_ids).await?;

        let result = sqlx::query(
            "INSERT INTO films (name, description, release_date, duration, mpa_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_film.name)
        .bind(&new_film.description)
        .bind(new_film.release_date)
        .bind(new_film.duration)
        .bind(mpa.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create film: {}", e)))?;

        let id = result.last_insert_rowid();
        self.replace_film_genres(id, &genre_ids).await?;

        tracing::debug!("Created film {} ({})", id, new_film.name);
        self.load_film(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Film {} vanished after insert", id)))
    }

    async fn update_film(&self, patch: FilmPatch) -> AppResult<Film> {
        let current = self.get_film(patch.id).await?;

        let mpa_id = match patch.mpa_id {
            Some(id) => self.get_mpa_rating(id).await?.id,
            None => current.mpa.id,
        };
        let genre_ids = match &patch.genre_ids {
            Some(ids) => Some(self.checked_genre_ids(ids).await?),
            None => None,
        };

        sqlx::query(
            "UPDATE films SET name = ?, description = ?, release_date = ?, duration = ?, mpa_id = ? WHERE id = ?",
        )
        .bind(patch.name.as_deref().unwrap_or(&current.name))
        .bind(patch.description.as_deref().unwrap_or(&current.description))
        .bind(patch.release_date.unwrap_or(current.release_date))
        .bind(patch.duration.unwrap_or(current.duration))
        .bind(mpa_id)
        .bind(patch.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update film {}: {}", patch.id, e)))?;

        if let Some(genre_ids) = genre_ids {
            self.replace_film_genres(patch.id, &genre_ids).await?;
        }

        tracing::debug!("Updated film {}", patch.id);
        self.load_film(patch.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Film {} vanished after update", patch.id)))
    }

    async fn delete_film(&self, id: EntityId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM films WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete film {}: {}", id, e)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Film {} not found", id)));
        }
        sqlx::query("DELETE FROM film_genres WHERE film_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to clear film genres: {}", e)))?;
        tracing::debug!("Deleted film {}", id);
        Ok(())
    }

    async fn film_exists(&self, id: EntityId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM films WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check if film {} exists: {}", id, e))
            })?;
        Ok(row.is_some())
    }

    async fn get_film(&self, id: EntityId) -> AppResult<Film> {
        self.load_film(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Film {} not found", id)))
    }

    async fn get_films_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<Film>> {
        let mut films = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(film) = self.load_film(*id).await? {
                films.push(film);
            }
        }
        Ok(films)
    }

    async fn get_films(&self) -> AppResult<Vec<Film>> {
        let rows = sqlx::query("SELECT id FROM films ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list films: {}", e)))?;
        let ids: Vec<EntityId> = rows.iter().map(|r| r.get("id")).collect();
        self.get_films_by_ids(&ids).await
    }

    async fn get_mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        let rows = sqlx::query("SELECT id, name FROM mpa_ratings ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get MPA ratings: {}", e)))?;
        Ok(rows
            .into_iter()
            .map(|r| MpaRating {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn get_mpa_rating(&self, id: i32) -> AppResult<MpaRating> {
        let row = sqlx::query("SELECT id, name FROM mpa_ratings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get MPA rating: {}", e)))?;
        row.map(|r| MpaRating {
            id: r.get("id"),
            name: r.get("name"),
        })
        .ok_or_else(|| AppError::NotFound(format!("MPA rating {} not found", id)))
    }

    async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get genres: {}", e)))?;
        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        let row = sqlx::query("SELECT id, name FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get genre: {}", e)))?;
        row.map(|r| Genre {
            id: r.get("id"),
            name: r.get("name"),
        })
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }
}

#[async_trait]
impl RelationshipStorage for SqliteStorage {
    async fn add_friend_edge(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id, status)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, friend_id) DO UPDATE SET status = excluded.status
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to add friendship edge: {}", e)))?;
        tracing::debug!("Friendship edge {} -> {} set to {}", from, to, status.as_str());
        Ok(())
    }

    async fn update_friend_status(
        &self,
        from: EntityId,
        to: EntityId,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE friendships SET status = ? WHERE user_id = ? AND friend_id = ?")
                .bind(status.as_str())
                .bind(from)
                .bind(to)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to update friendship status: {}", e))
                })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Friendship {} -> {} not found",
                from, to
            )));
        }
        tracing::debug!(
            "Friendship edge {} -> {} updated to {}",
            from,
            to,
            status.as_str()
        );
        Ok(())
    }

    async fn remove_friend_edge(&self, from: EntityId, to: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM friendships WHERE user_id = ? AND friend_id = ?")
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to remove friendship edge: {}", e))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_all_edges_of(&self, user_id: EntityId) -> AppResult<()> {
        sqlx::query("DELETE FROM friendships WHERE user_id = ? OR friend_id = ?")
            .bind(user_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to remove friendship edges: {}", e))
            })?;
        tracing::debug!("All friendship edges of user {} removed", user_id);
        Ok(())
    }

    async fn friend_ids_of(
        &self,
        user_id: EntityId,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Vec<EntityId>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT friend_id FROM friendships WHERE user_id = ? AND status = ? ORDER BY friend_id",
                )
                .bind(user_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT friend_id FROM friendships WHERE user_id = ? ORDER BY friend_id")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::DatabaseError(format!("Failed to get friend ids: {}", e)))?;
        Ok(rows.iter().map(|r| r.get("friend_id")).collect())
    }

    async fn common_friend_ids(&self, a: EntityId, b: EntityId) -> AppResult<Vec<EntityId>> {
        let rows = sqlx::query(
            r#"
            SELECT f1.friend_id
            FROM friendships f1
            JOIN friendships f2 ON f1.friend_id = f2.friend_id
            WHERE f1.user_id = ? AND f2.user_id = ?
            ORDER BY f1.friend_id
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get common friends: {}", e)))?;
        Ok(rows.iter().map(|r| r.get("friend_id")).collect())
    }

    async fn add_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO film_likes (film_id, user_id) VALUES (?, ?)")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to add like: {}", e)))?;
        tracing::debug!("User {} likes film {}", user_id, film_id);
        Ok(())
    }

    async fn remove_like(&self, user_id: EntityId, film_id: EntityId) -> AppResult<()> {
        sqlx::query("DELETE FROM film_likes WHERE film_id = ? AND user_id = ?")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to remove like: {}", e)))?;
        tracing::debug!("User {} unliked film {}", user_id, film_id);
        Ok(())
    }

    async fn remove_all_likes_of_user(&self, user_id: EntityId) -> AppResult<()> {
        sqlx::query("DELETE FROM film_likes WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to remove likes: {}", e)))?;
        tracing::debug!("All likes of user {} removed", user_id);
        Ok(())
    }

    async fn remove_all_likes_of_film(&self, film_id: EntityId) -> AppResult<()> {
        sqlx::query("DELETE FROM film_likes WHERE film_id = ?")
            .bind(film_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to remove likes: {}", e)))?;
        tracing::debug!("All likes of film {} removed", film_id);
        Ok(())
    }

    async fn liked_user_ids_of(&self, film_id: EntityId) -> AppResult<Vec<EntityId>> {
        let rows =
            sqlx::query("SELECT user_id FROM film_likes WHERE film_id = ? ORDER BY user_id")
                .bind(film_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to get likers: {}", e)))?;
        Ok(rows.iter().map(|r| r.get("user_id")).collect())
    }

    async fn top_film_ids_by_likes(&self, count: usize) -> AppResult<Vec<EntityId>> {
        let rows = sqlx::query(
            r#"
            SELECT f.id
            FROM films f
            LEFT JOIN film_likes fl ON fl.film_id = f.id
            GROUP BY f.id
            ORDER BY COUNT(fl.user_id) DESC, f.id ASC
            LIMIT ?
            "#,
        )
        .bind(count as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to rank films: {}", e)))?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }
}
