use uuid::Uuid;

use crate::{api::error, configs::RedisCache, modules::user::repository::SessionStore};

fn revoked_key(jti: &Uuid) -> String {
    format!("revoked_token:{jti}")
}

#[async_trait::async_trait]
impl SessionStore for RedisCache {
    async fn revoke(&self, jti: &Uuid, ttl_seconds: u64) -> Result<(), error::SystemError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.set(&revoked_key(jti), &true, ttl_seconds).await
    }

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        self.exists(&revoked_key(jti)).await
    }
}
