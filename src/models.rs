use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Entity ID type for users and films
pub type EntityId = i64;

/// Status tag on a directed friendship edge.
///
/// Mutual friendship is modeled as two independent directed edges; a
/// confirmed A -> B edge says nothing about B -> A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    NotConfirmed,
    Confirmed,
    Declined,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::NotConfirmed => "NOT_CONFIRMED",
            FriendshipStatus::Confirmed => "CONFIRMED",
            FriendshipStatus::Declined => "DECLINED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: NaiveDate,
}

/// User fields as handed to the entity store on registration. The store
/// assigns the id and falls back to the login when the name is blank.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

/// Partial user update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub id: EntityId,
    pub email: Option<String>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// MPA rating lookup entry (G, PG, PG-13, R, NC-17).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpaRating {
    pub id: i32,
    pub name: String,
}

/// Genre lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Duration in minutes, non-negative.
    pub duration: i64,
    pub mpa: MpaRating,
    /// Deduplicated, ordered by genre id.
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone)]
pub struct NewFilm {
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa_id: i32,
    pub genre_ids: Vec<i32>,
}

/// Partial film update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct FilmPatch {
    pub id: EntityId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub mpa_id: Option<i32>,
    pub genre_ids: Option<Vec<i32>>,
}
