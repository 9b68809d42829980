use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error::{self, ErrorCode},
    modules::{
        friend::{
            model::{FriendResponse, FriendshipResponse, NewFriendship},
            repository::FriendRepository,
            schema::{FriendshipEntity, FriendshipStatus, PairKey, Transition},
        },
        user::repository::UserRepository,
    },
};

fn request_not_found() -> error::SystemError {
    error::SystemError::not_found("Friendship request not found")
        .with_code(ErrorCode::FriendshipRequestNotFound)
}

/// Owns every state change of the relation between two users.
///
/// Writes run in a single store transaction. Operations addressed by user id
/// take the pair lock before reading; operations addressed by friendship id
/// rely on the row lock taken by `find_by_id`.
#[derive(Clone)]
pub struct FriendService {
    friend_repo: Arc<dyn FriendRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl FriendService {
    pub fn with_dependencies(
        friend_repo: Arc<dyn FriendRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        FriendService { friend_repo, user_repo }
    }

    async fn ensure_other_user(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), error::SystemError> {
        if user_id == target_id {
            return Err(error::SystemError::bad_request("You cannot target yourself"));
        }

        if !self.user_repo.exists_by_id(&target_id).await? {
            return Err(error::SystemError::not_found("User not found")
                .with_code(ErrorCode::UserNotFound));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_request(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<FriendshipEntity, error::SystemError> {
        self.ensure_other_user(user_id, friend_id).await?;

        let pair = PairKey::new(user_id, friend_id);
        let mut tx = self.friend_repo.begin().await?;
        tx.lock_pair(&pair).await?;

        // blocked rows count too: a block in either direction forbids new requests
        if !tx.find_between(&pair).await?.is_empty() {
            return Err(error::SystemError::conflict(
                "A friendship request already exists between these users",
            )
            .with_code(ErrorCode::FriendshipExists));
        }

        let request = tx.insert(&NewFriendship::pending(user_id, friend_id)).await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, "friendship request sent");
        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    pub async fn accept_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<FriendshipEntity, error::SystemError> {
        let mut tx = self.friend_repo.begin().await?;

        let request = tx
            .find_by_id(&request_id)
            .await?
            .filter(|r| r.recipient_id == user_id && r.status == FriendshipStatus::Pending)
            .ok_or_else(request_not_found)?;

        let next = request.status.apply(Transition::Accept)?.ok_or_else(request_not_found)?;
        let accepted = tx.update_status(&request.id, next).await?;
        tx.commit().await?;

        tracing::info!(requester_id = %accepted.requester_id, "friendship request accepted");
        Ok(accepted)
    }

    #[tracing::instrument(skip(self))]
    pub async fn reject_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.friend_repo.begin().await?;

        let request = tx
            .find_by_id(&request_id)
            .await?
            .filter(|r| r.recipient_id == user_id && r.status == FriendshipStatus::Pending)
            .ok_or_else(request_not_found)?;

        request.status.apply(Transition::Remove)?;
        tx.delete(&request.id).await?;
        tx.commit().await?;

        tracing::info!(requester_id = %request.requester_id, "friendship request rejected");
        Ok(())
    }

    /// Replaces whatever non-blocked relation exists between the two users with
    /// a block owned by `user_id`. A block held by the other side stays in place.
    #[tracing::instrument(skip(self))]
    pub async fn block_user(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<FriendshipEntity, error::SystemError> {
        self.ensure_other_user(user_id, target_id).await?;

        let pair = PairKey::new(user_id, target_id);
        let mut tx = self.friend_repo.begin().await?;
        tx.lock_pair(&pair).await?;

        let existing = tx.find_between(&pair).await?;

        if existing
            .iter()
            .any(|r| r.is_from_to(&user_id, &target_id) && r.status == FriendshipStatus::Blocked)
        {
            return Err(error::SystemError::conflict("User is already blocked")
                .with_code(ErrorCode::FriendshipUserIsAlreadyBlocked));
        }

        for row in existing.iter().filter(|r| r.status != FriendshipStatus::Blocked) {
            row.status.apply(Transition::Remove)?;
            tx.delete(&row.id).await?;
            tracing::debug!(friendship_id = %row.id, status = %row.status, "relation replaced by block");
        }

        let block = tx.insert(&NewFriendship::blocked(user_id, target_id)).await?;
        tx.commit().await?;

        tracing::info!(block_id = %block.id, "user blocked");
        Ok(block)
    }

    /// Only the blocker can lift a block.
    #[tracing::instrument(skip(self))]
    pub async fn unblock_user(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), error::SystemError> {
        if user_id == target_id {
            return Err(error::SystemError::bad_request("You cannot target yourself"));
        }

        let pair = PairKey::new(user_id, target_id);
        let mut tx = self.friend_repo.begin().await?;
        tx.lock_pair(&pair).await?;

        let block = tx
            .find_between(&pair)
            .await?
            .into_iter()
            .find(|r| r.is_from_to(&user_id, &target_id) && r.status == FriendshipStatus::Blocked)
            .ok_or_else(|| {
                error::SystemError::not_found("Friendship block not found")
                    .with_code(ErrorCode::FriendshipRequestNotFound)
            })?;

        block.status.apply(Transition::Remove)?;
        tx.delete(&block.id).await?;
        tx.commit().await?;

        tracing::info!(block_id = %block.id, "user unblocked");
        Ok(())
    }

    /// Either party may dissolve an accepted friendship.
    #[tracing::instrument(skip(self))]
    pub async fn delete_friendship(
        &self,
        user_id: Uuid,
        friendship_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.friend_repo.begin().await?;

        let friendship = tx
            .find_by_id(&friendship_id)
            .await?
            .filter(|r| r.involves(&user_id) && r.status == FriendshipStatus::Accepted)
            .ok_or_else(request_not_found)?;

        friendship.status.apply(Transition::Remove)?;
        tx.delete(&friendship.id).await?;
        tx.commit().await?;

        tracing::info!("friendship deleted");
        Ok(())
    }

    pub async fn list_pending_sent(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, error::SystemError> {
        let rows = self.friend_repo.find_sent(&user_id, FriendshipStatus::Pending).await?;
        Ok(rows.into_iter().map(|r| FriendshipResponse::sent(user_id, r)).collect())
    }

    pub async fn list_pending_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, error::SystemError> {
        let rows = self.friend_repo.find_received(&user_id, FriendshipStatus::Pending).await?;
        Ok(rows.into_iter().map(|r| FriendshipResponse::received(user_id, r)).collect())
    }

    pub async fn list_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let rows = self.friend_repo.find_friends(&user_id).await?;
        Ok(rows.into_iter().map(FriendResponse::from).collect())
    }

    /// Blocks issued by `user_id`. Who blocked `user_id` is never exposed.
    pub async fn list_blocked(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipResponse>, error::SystemError> {
        let rows = self.friend_repo.find_sent(&user_id, FriendshipStatus::Blocked).await?;
        Ok(rows.into_iter().map(|r| FriendshipResponse::sent(user_id, r)).collect())
    }
}
