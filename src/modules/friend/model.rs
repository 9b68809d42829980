use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{friend::schema::FriendshipStatus, user::model::PublicUserResponse};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub friend_id: Uuid,
}

pub struct NewFriendship {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendshipStatus,
}

impl NewFriendship {
    pub fn pending(requester_id: Uuid, recipient_id: Uuid) -> Self {
        NewFriendship { requester_id, recipient_id, status: FriendshipStatus::Pending }
    }

    pub fn blocked(blocker_id: Uuid, blocked_id: Uuid) -> Self {
        NewFriendship {
            requester_id: blocker_id,
            recipient_id: blocked_id,
            status: FriendshipStatus::Blocked,
        }
    }
}

/// A friendship row joined with the profile of the user on the other side.
#[derive(Debug, Clone, FromRow)]
pub struct FriendshipUserRow {
    pub friendship_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

impl FriendshipUserRow {
    pub fn profile(&self) -> PublicUserResponse {
        PublicUserResponse {
            id: self.user_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IdOrInfo {
    Id(Uuid),
    Info(PublicUserResponse),
}

/// Pending request or block as seen by one of its parties.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipResponse {
    pub id: Uuid,
    pub status: FriendshipStatus,
    pub from: IdOrInfo,
    pub to: IdOrInfo,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendshipResponse {
    /// Row where `user_id` is the requester and the joined profile is the recipient.
    pub fn sent(user_id: Uuid, row: FriendshipUserRow) -> Self {
        FriendshipResponse {
            id: row.friendship_id,
            status: row.status,
            from: IdOrInfo::Id(user_id),
            to: IdOrInfo::Info(row.profile()),
            created_at: row.created_at,
        }
    }

    /// Row where `user_id` is the recipient and the joined profile is the requester.
    pub fn received(user_id: Uuid, row: FriendshipUserRow) -> Self {
        FriendshipResponse {
            id: row.friendship_id,
            status: row.status,
            from: IdOrInfo::Info(row.profile()),
            to: IdOrInfo::Id(user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendResponse {
    pub friendship_id: Uuid,
    pub since: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub user: PublicUserResponse,
}

impl From<FriendshipUserRow> for FriendResponse {
    fn from(row: FriendshipUserRow) -> Self {
        FriendResponse { friendship_id: row.friendship_id, since: row.updated_at, user: row.profile() }
    }
}
