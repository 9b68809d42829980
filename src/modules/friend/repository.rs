use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::{FriendshipUserRow, NewFriendship};
use crate::modules::friend::schema::{FriendshipEntity, FriendshipStatus, PairKey};

/// One unit of work against the friendship relation. Dropping it without
/// calling [`commit`](FriendshipTx::commit) discards every write.
#[async_trait::async_trait]
pub trait FriendshipTx: Send {
    /// Serializes writers touching the same unordered pair until the transaction ends.
    async fn lock_pair(&mut self, pair: &PairKey) -> Result<(), error::SystemError>;

    /// Fetches a row and locks it for the rest of the transaction.
    async fn find_by_id(
        &mut self,
        friendship_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    /// Every row between the two users, in both directions.
    async fn find_between(
        &mut self,
        pair: &PairKey,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError>;

    async fn insert(
        &mut self,
        friendship: &NewFriendship,
    ) -> Result<FriendshipEntity, error::SystemError>;

    async fn update_status(
        &mut self,
        friendship_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<FriendshipEntity, error::SystemError>;

    async fn delete(&mut self, friendship_id: &Uuid) -> Result<(), error::SystemError>;

    async fn commit(self: Box<Self>) -> Result<(), error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepository {
    async fn begin(&self) -> Result<Box<dyn FriendshipTx>, error::SystemError>;

    /// Rows requested by `user_id` with the given status, joined with the recipient.
    async fn find_sent(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError>;

    /// Rows addressed to `user_id` with the given status, joined with the requester.
    async fn find_received(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError>;

    /// Accepted rows on either side, joined with the other user.
    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError>;
}
