use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

use crate::api::error::{ErrorCode, SystemError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friendship_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

/// Moves a row can make. Blocking is modelled as `Remove` on the old rows plus a fresh insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Remove,
}

impl FriendshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        }
    }

    /// pending -> {accepted, removed}, accepted -> {removed}, blocked -> {removed}.
    /// Returns the next status, `None` when the row goes away.
    pub fn apply(self, transition: Transition) -> Result<Option<FriendshipStatus>, SystemError> {
        match (self, transition) {
            (FriendshipStatus::Pending, Transition::Accept) => Ok(Some(FriendshipStatus::Accepted)),
            (_, Transition::Remove) => Ok(None),
            (from, to) => Err(SystemError::BadRequest(
                ErrorCode::FriendshipInvalidTransition,
                format!("Cannot apply {:?} to a {} friendship", to, from.as_str()).into(),
            )),
        }
    }
}

impl std::fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl FriendshipEntity {
    pub fn involves(&self, user_id: &Uuid) -> bool {
        self.requester_id == *user_id || self.recipient_id == *user_id
    }

    pub fn is_from_to(&self, requester_id: &Uuid, recipient_id: &Uuid) -> bool {
        self.requester_id == *requester_id && self.recipient_id == *recipient_id
    }
}

/// Order independent key of a user pair: `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: Uuid,
    high: Uuid,
}

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            PairKey { low: a, high: b }
        } else {
            PairKey { low: b, high: a }
        }
    }

    pub fn low(&self) -> &Uuid {
        &self.low
    }

    pub fn high(&self) -> &Uuid {
        &self.high
    }
}
