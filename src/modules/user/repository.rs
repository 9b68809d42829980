use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        schema::UserEntity,
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn exists_by_id(&self, id: &Uuid) -> Result<bool, error::SystemError>;

    /// Case-insensitive lookup on username or email.
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;

    async fn update_password(
        &self,
        id: &Uuid,
        hash_password: &str,
    ) -> Result<(), error::SystemError>;

    async fn update_avatar(
        &self,
        id: &Uuid,
        avatar_url: Option<&str>,
    ) -> Result<(), error::SystemError>;

    /// Hard delete. Friendships referencing the user are removed by the store.
    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}

/// Revoked access tokens, keyed by `jti`.
#[async_trait::async_trait]
pub trait SessionStore {
    async fn revoke(&self, jti: &Uuid, ttl_seconds: u64) -> Result<(), error::SystemError>;

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError>;
}
