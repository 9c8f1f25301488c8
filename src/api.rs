// HTTP layer - request DTOs, field validation, handlers, and the router.
// Field-level constraints are enforced here so the stores and services
// only ever see well-formed entities.

use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{EntityId, Film, FilmPatch, Genre, MpaRating, NewFilm, NewUser, User, UserPatch},
};

// HTTP Request types

#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    pub email: String,
    pub login: String,
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: EntityId,
    pub email: Option<String>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFilmRequest {
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa: IdRef,
    #[serde(default)]
    pub genres: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilmRequest {
    pub id: EntityId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub mpa: Option<IdRef>,
    pub genres: Option<Vec<IdRef>>,
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    pub count: Option<i64>,
}

// Field validation

fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be blank".to_string()));
    }
    if !email.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("Invalid email: {}", email)));
    }
    Ok(())
}

fn validate_login(login: &str) -> AppResult<()> {
    if login.trim().is_empty() {
        return Err(AppError::Validation("Login must not be blank".to_string()));
    }
    if login.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Login must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

fn validate_birthday(birthday: NaiveDate) -> AppResult<()> {
    if birthday > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Birthday must not be in the future".to_string(),
        ));
    }
    Ok(())
}

fn validate_film_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "Film name must not be blank".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> AppResult<()> {
    if description.chars().count() > 200 {
        return Err(AppError::Validation(
            "Description must not exceed 200 characters".to_string(),
        ));
    }
    Ok(())
}

/// The first public film screening; nothing can be released before it.
fn validate_release_date(release_date: NaiveDate) -> AppResult<()> {
    let floor = NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN);
    if release_date < floor {
        return Err(AppError::Validation(
            "Release date must not precede 1895-12-28".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(duration: i64) -> AppResult<()> {
    if duration < 0 {
        return Err(AppError::Validation(
            "Duration must be non-negative".to_string(),
        ));
    }
    Ok(())
}

// User handlers

async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> AppResult<Json<User>> {
    validate_email(&req.email)?;
    validate_login(&req.login)?;
    validate_birthday(req.birthday)?;
    let user = state
        .catalog
        .create_user(NewUser {
            email: req.email,
            login: req.login,
            name: req.name,
            birthday: req.birthday,
        })
        .await?;
    Ok(Json(user))
}

async fn update_user_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    if let Some(login) = &req.login {
        validate_login(login)?;
    }
    if let Some(birthday) = req.birthday {
        validate_birthday(birthday)?;
    }
    let user = state
        .catalog
        .update_user(UserPatch {
            id: req.id,
            email: req.email,
            login: req.login,
            name: req.name,
            birthday: req.birthday,
        })
        .await?;
    Ok(Json(user))
}

async fn list_users_handler(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.catalog.get_users().await?))
}

async fn get_user_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<User>> {
    Ok(Json(state.catalog.get_user(id).await?))
}

async fn delete_user_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Value>> {
    state.catalog.delete_user(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// Friendship handlers

async fn add_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.friendship.add_friend(id, friend_id).await?;
    Ok(Json(json!({"user_id": id, "friend_id": friend_id, "status": "NOT_CONFIRMED"})))
}

async fn confirm_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.friendship.confirm_friend(id, friend_id).await?;
    Ok(Json(json!({"user_id": id, "friend_id": friend_id, "status": "CONFIRMED"})))
}

async fn decline_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.friendship.decline_friend(id, friend_id).await?;
    Ok(Json(json!({"user_id": id, "friend_id": friend_id, "status": "DECLINED"})))
}

async fn remove_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.friendship.remove_friend(id, friend_id).await?;
    Ok(Json(json!({"deleted": true})))
}

async fn get_friends_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.friendship.get_friends(id).await?))
}

async fn get_common_friends_handler(
    State(state): State<AppState>,
    AxumPath((id, other_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.friendship.get_common_friends(id, other_id).await?))
}

// Film handlers

async fn create_film_handler(
    State(state): State<AppState>,
    Json(req): Json<NewFilmRequest>,
) -> AppResult<Json<Film>> {
    validate_film_name(&req.name)?;
    validate_description(&req.description)?;
    validate_release_date(req.release_date)?;
    validate_duration(req.duration)?;
    let film = state
        .catalog
        .create_film(NewFilm {
            name: req.name,
            description: req.description,
            release_date: req.release_date,
            duration: req.duration,
            mpa_id: req.mpa.id,
            genre_ids: req.genres.iter().map(|g| g.id).collect(),
        })
        .await?;
    Ok(Json(film))
}

async fn update_film_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateFilmRequest>,
) -> AppResult<Json<Film>> {
    if let Some(name) = &req.name {
        validate_film_name(name)?;
    }
    if let Some(description) = &req.description {
        validate_description(description)?;
    }
    if let Some(release_date) = req.release_date {
        validate_release_date(release_date)?;
    }
    if let Some(duration) = req.duration {
        validate_duration(duration)?;
    }
    let film = state
        .catalog
        .update_film(FilmPatch {
            id: req.id,
            name: req.name,
            description: req.description,
            release_date: req.release_date,
            duration: req.duration,
            mpa_id: req.mpa.map(|m| m.id),
            genre_ids: req
                .genres
                .map(|genres| genres.iter().map(|g| g.id).collect()),
        })
        .await?;
    Ok(Json(film))
}

async fn list_films_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.catalog.get_films().await?))
}

async fn get_film_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.get_film(id).await?))
}

async fn delete_film_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Value>> {
    state.catalog.delete_film(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// Popularity handlers

async fn like_film_handler(
    State(state): State<AppState>,
    AxumPath((id, user_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.popularity.like_film(user_id, id).await?;
    Ok(Json(json!({"film_id": id, "user_id": user_id, "liked": true})))
}

async fn unlike_film_handler(
    State(state): State<AppState>,
    AxumPath((id, user_id)): AxumPath<(EntityId, EntityId)>,
) -> AppResult<Json<Value>> {
    state.popularity.unlike_film(user_id, id).await?;
    Ok(Json(json!({"film_id": id, "user_id": user_id, "liked": false})))
}

async fn get_likers_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.popularity.get_likers(id).await?))
}

async fn popular_films_handler(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> AppResult<Json<Vec<Film>>> {
    let count = params.count.unwrap_or(10);
    Ok(Json(state.popularity.top_liked(count).await?))
}

// Catalog handlers

async fn list_mpa_handler(State(state): State<AppState>) -> AppResult<Json<Vec<MpaRating>>> {
    Ok(Json(state.catalog.get_mpa_ratings().await?))
}

async fn get_mpa_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i32>,
) -> AppResult<Json<MpaRating>> {
    Ok(Json(state.catalog.get_mpa_rating(id).await?))
}

async fn list_genres_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.get_genres().await?))
}

async fn get_genre_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.catalog.get_genre(id).await?))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Users
        .route(
            "/users",
            get(list_users_handler)
                .post(create_user_handler)
                .put(update_user_handler),
        )
        .route(
            "/users/{id}",
            get(get_user_handler).delete(delete_user_handler),
        )
        // Friendships
        .route("/users/{id}/friends", get(get_friends_handler))
        .route(
            "/users/{id}/friends/common/{other_id}",
            get(get_common_friends_handler),
        )
        .route(
            "/users/{id}/friends/{friend_id}",
            put(add_friend_handler).delete(remove_friend_handler),
        )
        .route(
            "/users/{id}/friends/{friend_id}/confirm",
            put(confirm_friend_handler),
        )
        .route(
            "/users/{id}/friends/{friend_id}/decline",
            put(decline_friend_handler),
        )
        // Films
        .route(
            "/films",
            get(list_films_handler)
                .post(create_film_handler)
                .put(update_film_handler),
        )
        .route("/films/popular", get(popular_films_handler))
        .route(
            "/films/{id}",
            get(get_film_handler).delete(delete_film_handler),
        )
        .route("/films/{id}/likes", get(get_likers_handler))
        .route(
            "/films/{id}/like/{user_id}",
            put(like_film_handler).delete(unlike_film_handler),
        )
        // Lookup catalogs
        .route("/mpa", get(list_mpa_handler))
        .route("/mpa/{id}", get(get_mpa_handler))
        .route("/genres", get(list_genres_handler))
        .route("/genres/{id}", get(get_genre_handler))
        .with_state(state)
}
