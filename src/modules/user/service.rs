use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::{self, ErrorCode};
use crate::modules::file_upload::FileUploadService;
use crate::modules::user::model::{
    InsertUser, PublicUserResponse, SignInModel, SignUpModel, UpdatePasswordModel, UpdateUser,
    UpdateUserModel, UserResponse,
};
use crate::modules::user::repository::{SessionStore, UserRepository};
use crate::modules::user::schema::UserEntity;
use crate::utils::{hash_password, verify_password, Claims};

const AVATAR_FOLDER: &str = "avatar";

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
    files: FileUploadService,
    auth: Arc<AuthSettings>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
        files: FileUploadService,
        auth: AuthSettings,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, sessions, files, auth: Arc::new(auth) }
    }

    async fn find_existing(&self, id: &Uuid) -> Result<UserEntity, error::SystemError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| {
            error::SystemError::not_found("User not found").with_code(ErrorCode::UserNotFound)
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        Ok(UserResponse::from(self.find_existing(&id).await?))
    }

    pub async fn get_public_profile(
        &self,
        id: Uuid,
    ) -> Result<PublicUserResponse, error::SystemError> {
        Ok(PublicUserResponse::from(self.find_existing(&id).await?))
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<UserResponse, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            username: user.username,
            email: user.email,
            hash_password,
            first_name: user.first_name,
            last_name: user.last_name,
            birth_date: user.birth_date,
        };

        let created = self.repo.create(&new_user).await?;
        info!("User {} signed up", created.id);
        Ok(UserResponse::from(created))
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<String, error::SystemError> {
        let user_entity = self
            .repo
            .find_by_identifier(&user.identifier)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid credentials"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid credentials"));
        }

        let access_token = Claims::new(&user_entity.id, self.auth.access_token_expiration)
            .encode(self.auth.jwt_secret.as_bytes())?;

        info!("User {} signed in", user_entity.id);
        Ok(access_token)
    }

    /// Decodes a bearer token and rejects revoked sessions.
    pub async fn authenticate(&self, token: &str) -> Result<Claims, error::SystemError> {
        let claims = Claims::decode(token, self.auth.jwt_secret.as_bytes())?;

        if self.sessions.is_revoked(&claims.jti).await? {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        Ok(claims)
    }

    pub async fn sign_out(&self, claims: &Claims) -> Result<(), error::SystemError> {
        self.sessions.revoke(&claims.jti, claims.remaining_ttl()).await?;
        info!("User {} signed out", claims.sub);
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        user: UpdateUserModel,
    ) -> Result<UserResponse, error::SystemError> {
        let update_user = UpdateUser::from(user);
        if update_user.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        let updated = self.repo.update(&id, &update_user).await?;
        Ok(UserResponse::from(updated))
    }

    pub async fn update_password(
        &self,
        id: Uuid,
        payload: UpdatePasswordModel,
    ) -> Result<(), error::SystemError> {
        let user = self.find_existing(&id).await?;

        if !verify_password(&user.hash_password, &payload.old_password)? {
            return Err(error::SystemError::unprocessable("Old password is invalid")
                .with_code(ErrorCode::InvalidOldPassword));
        }

        let hash = hash_password(&payload.password)?;
        self.repo.update_password(&id, &hash).await
    }

    /// Fails once an avatar upload of `size` bytes is over the limit.
    pub fn check_avatar_size(&self, size: usize) -> Result<(), error::SystemError> {
        self.files.ensure_within_limit(size)
    }

    /// Stores the new avatar first, then drops the previous blob.
    pub async fn upload_avatar(
        &self,
        id: Uuid,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<UserResponse, error::SystemError> {
        let user = self.find_existing(&id).await?;

        let stored = self.files.upload(AVATAR_FOLDER, bytes, mime_type).await?;
        if let Err(e) = self.repo.update_avatar(&id, Some(&stored.url)).await {
            if let Err(cleanup) = self.files.remove(&stored.url).await {
                warn!("Failed to remove orphaned avatar {}: {}", stored.key, cleanup);
            }
            return Err(e);
        }

        if let Some(previous) = &user.avatar_url {
            self.files.remove(previous).await?;
        }

        self.get_by_id(id).await
    }

    pub async fn remove_avatar(&self, id: Uuid) -> Result<(), error::SystemError> {
        let user = self.find_existing(&id).await?;

        let Some(url) = user.avatar_url else {
            return Err(error::SystemError::forbidden("Avatar is null")
                .with_code(ErrorCode::AvatarIsNull));
        };

        self.repo.update_avatar(&id, None).await?;
        self.files.remove(&url).await
    }

    /// Deletes the account, its avatar and its friendships, and ends the current session.
    pub async fn delete(&self, claims: &Claims) -> Result<(), error::SystemError> {
        let user = self.find_existing(&claims.sub).await?;

        self.repo.delete(&user.id).await?;

        if let Some(url) = &user.avatar_url {
            if let Err(e) = self.files.remove(url).await {
                warn!("Failed to remove avatar of deleted user {}: {}", user.id, e);
            }
        }

        self.sessions.revoke(&claims.jti, claims.remaining_ttl()).await?;
        info!("User {} deleted", user.id);
        Ok(())
    }
}
