use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{EntityId, FriendshipStatus, User};
use crate::storage::{EntityStorage, RelationshipStorage};

/// Orchestrates friendship mutations and queries, enforcing the directed
/// edge state machine: absent -> NOT_CONFIRMED -> {CONFIRMED, DECLINED},
/// with re-`add_friend` resetting any state back to NOT_CONFIRMED.
#[derive(Clone)]
pub struct FriendshipService {
    relationships: Arc<dyn RelationshipStorage>,
    entities: Arc<dyn EntityStorage>,
}

impl FriendshipService {
    pub fn new(
        relationships: Arc<dyn RelationshipStorage>,
        entities: Arc<dyn EntityStorage>,
    ) -> Self {
        Self {
            relationships,
            entities,
        }
    }

    /// Upserts a NOT_CONFIRMED edge `user_id -> friend_id`. The reverse
    /// edge is never created here; mutuality takes two requests.
    pub async fn add_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_distinct_users(user_id, friend_id).await?;
        self.relationships
            .add_friend_edge(user_id, friend_id, FriendshipStatus::NotConfirmed)
            .await?;
        tracing::info!("Friend request {} -> {}", user_id, friend_id);
        Ok(())
    }

    pub async fn confirm_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_distinct_users(user_id, friend_id).await?;
        self.relationships
            .update_friend_status(user_id, friend_id, FriendshipStatus::Confirmed)
            .await?;
        tracing::info!("Friendship {} -> {} confirmed", user_id, friend_id);
        Ok(())
    }

    pub async fn decline_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_distinct_users(user_id, friend_id).await?;
        self.relationships
            .update_friend_status(user_id, friend_id, FriendshipStatus::Declined)
            .await?;
        tracing::info!("Friendship {} -> {} declined", user_id, friend_id);
        Ok(())
    }

    /// Removes only the `user_id -> friend_id` edge; a reverse edge, if
    /// present, is untouched.
    pub async fn remove_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_distinct_users(user_id, friend_id).await?;
        let removed = self
            .relationships
            .remove_friend_edge(user_id, friend_id)
            .await?;
        if !removed {
            return Err(AppError::NotFound(format!(
                "Friendship {} -> {} not found",
                user_id, friend_id
            )));
        }
        tracing::info!("Friendship {} -> {} removed", user_id, friend_id);
        Ok(())
    }

    /// Confirmed friends of `user_id`, resolved through the entity store.
    /// Ids that no longer resolve are dropped rather than surfaced.
    pub async fn get_friends(&self, user_id: EntityId) -> AppResult<Vec<User>> {
        self.ensure_user_exists(user_id).await?;
        let friend_ids = self
            .relationships
            .friend_ids_of(user_id, Some(FriendshipStatus::Confirmed))
            .await?;
        self.entities.get_users_by_ids(&friend_ids).await
    }

    /// Intersection of both users' CONFIRMED friend sets. The confirmed
    /// filter is applied here deliberately; the raw store intersection
    /// primitive ignores status.
    pub async fn get_common_friends(
        &self,
        user_id: EntityId,
        other_id: EntityId,
    ) -> AppResult<Vec<User>> {
        self.ensure_distinct_users(user_id, other_id).await?;

        let mine = self
            .relationships
            .friend_ids_of(user_id, Some(FriendshipStatus::Confirmed))
            .await?;
        let theirs: HashSet<EntityId> = self
            .relationships
            .friend_ids_of(other_id, Some(FriendshipStatus::Confirmed))
            .await?
            .into_iter()
            .collect();
        let common: Vec<EntityId> = mine.into_iter().filter(|id| theirs.contains(id)).collect();
        self.entities.get_users_by_ids(&common).await
    }

    /// Deletion hook: must run before the user row disappears so no edge
    /// outlives its endpoint.
    pub async fn on_user_deleted(&self, user_id: EntityId) -> AppResult<()> {
        self.relationships.remove_all_edges_of(user_id).await?;
        tracing::info!("Friendship edges of deleted user {} removed", user_id);
        Ok(())
    }

    async fn ensure_distinct_users(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::BadRequest(
                "A user cannot befriend themselves".to_string(),
            ));
        }
        self.ensure_user_exists(user_id).await?;
        self.ensure_user_exists(friend_id).await?;
        Ok(())
    }

    async fn ensure_user_exists(&self, user_id: EntityId) -> AppResult<()> {
        if !self.entities.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }
}
