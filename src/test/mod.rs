//! In-memory stores and fixtures shared by the unit and HTTP tests.

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use actix_web::{
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    api::error::{self, ErrorCode},
    modules::{
        file_upload::{storage::BlobStore, FileUploadService, UploadConfig},
        friend::{
            model::{FriendshipUserRow, NewFriendship},
            repository::{FriendRepository, FriendshipTx},
            schema::{FriendshipEntity, FriendshipStatus, PairKey},
            service::FriendService,
        },
        user::{
            model::{InsertUser, SignInModel, SignUpModel, UpdateUser},
            repository::{SessionStore, UserRepository},
            repository_pg::UserRepositoryPg,
            schema::UserEntity,
            service::{AuthSettings, UserService},
        },
    },
};

pub const SAMPLE_PASSWORD: &str = "Str0ng!pass";

pub fn sample_sign_up(username: &str) -> SignUpModel {
    SignUpModel {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: SAMPLE_PASSWORD.to_string(),
        password_confirmation: SAMPLE_PASSWORD.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
    }
}

/// Pool on `DATABASE_URL` with migrations applied, or `None` when no database is configured.
pub async fn pg_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        log::warn!("DATABASE_URL is not set, skipping Postgres test");
        return None;
    };

    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(pool)
}

/// Inserts a user with a unique username straight through the Postgres repository.
pub async fn insert_pg_user(pool: &PgPool) -> Uuid {
    let tag = Uuid::now_v7().simple().to_string();
    let username = format!("u{}", &tag[20..]);

    UserRepositoryPg::new(pool.clone())
        .create(&InsertUser {
            email: format!("{}@example.com", username),
            username,
            hash_password: "not-a-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        })
        .await
        .unwrap()
        .id
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserEntity>,
    friendships: Vec<FriendshipEntity>,
}

impl State {
    fn check_unique_user(
        &self,
        id: Option<&Uuid>,
        username: &str,
        email: &str,
    ) -> Result<(), error::SystemError> {
        let others = self.users.values().filter(|u| Some(&u.id) != id);
        for user in others {
            if user.username.eq_ignore_ascii_case(username) {
                return Err(duplicate("Username already exists"));
            }
            if user.email.eq_ignore_ascii_case(email) {
                return Err(duplicate("Email already exists"));
            }
        }
        Ok(())
    }

    fn joined(&self, row: &FriendshipEntity, other: &Uuid) -> Option<FriendshipUserRow> {
        let user = self.users.get(other)?;
        Some(FriendshipUserRow {
            friendship_id: row.id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar_url: user.avatar_url.clone(),
        })
    }
}

fn duplicate(msg: &'static str) -> error::SystemError {
    error::SystemError::Conflict(ErrorCode::DuplicateValue, msg.into())
}

/// Users and friendships behind a single lock, with the same constraints the
/// database enforces.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn exists_by_id(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.state.lock().await.users.contains_key(id))
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| {
                u.username.eq_ignore_ascii_case(identifier) || u.email.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let mut state = self.state.lock().await;
        state.check_unique_user(None, &user.username, &user.email)?;

        let now = Utc::now();
        let entity = UserEntity {
            id: Uuid::now_v7(),
            username: user.username.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let mut state = self.state.lock().await;
        let mut entity = state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(username) = &user.username {
            entity.username = username.clone();
        }
        if let Some(email) = &user.email {
            entity.email = email.clone();
        }
        if let Some(first_name) = &user.first_name {
            entity.first_name = first_name.clone();
        }
        if let Some(last_name) = &user.last_name {
            entity.last_name = last_name.clone();
        }
        state.check_unique_user(Some(id), &entity.username, &entity.email)?;

        entity.updated_at = Utc::now();
        state.users.insert(*id, entity.clone());
        Ok(entity)
    }

    async fn update_password(
        &self,
        id: &Uuid,
        hash_password: &str,
    ) -> Result<(), error::SystemError> {
        if let Some(user) = self.state.lock().await.users.get_mut(id) {
            user.hash_password = hash_password.to_string();
        }
        Ok(())
    }

    async fn update_avatar(
        &self,
        id: &Uuid,
        avatar_url: Option<&str>,
    ) -> Result<(), error::SystemError> {
        if let Some(user) = self.state.lock().await.users.get_mut(id) {
            user.avatar_url = avatar_url.map(str::to_string);
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut state = self.state.lock().await;
        let removed = state.users.remove(id).is_some();
        state.friendships.retain(|f| !f.involves(id));
        Ok(removed)
    }
}

/// Delegates to a [`MemoryStore`] until [`fail_writes`](Self::fail_writes)
/// is called, after which avatar updates and deletes fail.
pub struct FlakyUserRepository {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyUserRepository {
    pub fn new(inner: MemoryStore) -> Self {
        FlakyUserRepository { inner, failing: AtomicBool::new(false) }
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), error::SystemError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for FlakyUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        self.inner.find_by_id(id).await
    }

    async fn exists_by_id(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        self.inner.exists_by_id(id).await
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        self.inner.find_by_identifier(identifier).await
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        self.inner.create(user).await
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        self.inner.update(id, user).await
    }

    async fn update_password(
        &self,
        id: &Uuid,
        hash_password: &str,
    ) -> Result<(), error::SystemError> {
        self.inner.update_password(id, hash_password).await
    }

    async fn update_avatar(
        &self,
        id: &Uuid,
        avatar_url: Option<&str>,
    ) -> Result<(), error::SystemError> {
        self.check()?;
        self.inner.update_avatar(id, avatar_url).await
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        self.check()?;
        self.inner.delete(id).await
    }
}

/// Holds the store lock for its whole life, so it also plays the pair lock.
struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    staged: Vec<FriendshipEntity>,
}

#[async_trait::async_trait]
impl FriendshipTx for MemoryTx {
    async fn lock_pair(&mut self, _pair: &PairKey) -> Result<(), error::SystemError> {
        Ok(())
    }

    async fn find_by_id(
        &mut self,
        friendship_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        Ok(self.staged.iter().find(|f| f.id == *friendship_id).cloned())
    }

    async fn find_between(
        &mut self,
        pair: &PairKey,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        Ok(self.staged.iter().filter(|f| PairKey::new(f.requester_id, f.recipient_id) == *pair).cloned().collect())
    }

    async fn insert(
        &mut self,
        friendship: &NewFriendship,
    ) -> Result<FriendshipEntity, error::SystemError> {
        if friendship.requester_id == friendship.recipient_id {
            return Err(error::SystemError::bad_request("Value violates a data constraint"));
        }
        if !self.guard.users.contains_key(&friendship.requester_id)
            || !self.guard.users.contains_key(&friendship.recipient_id)
        {
            return Err(error::SystemError::not_found("Referenced resource not found"));
        }

        let pair = PairKey::new(friendship.requester_id, friendship.recipient_id);
        let clash = self.staged.iter().any(|f| {
            f.is_from_to(&friendship.requester_id, &friendship.recipient_id)
                || (PairKey::new(f.requester_id, f.recipient_id) == pair
                    && f.status != FriendshipStatus::Blocked
                    && friendship.status != FriendshipStatus::Blocked)
        });
        if clash {
            return Err(duplicate("Duplicate value"));
        }

        let now = Utc::now();
        let entity = FriendshipEntity {
            id: Uuid::now_v7(),
            requester_id: friendship.requester_id,
            recipient_id: friendship.recipient_id,
            status: friendship.status,
            created_at: now,
            updated_at: now,
        };
        self.staged.push(entity.clone());
        Ok(entity)
    }

    async fn update_status(
        &mut self,
        friendship_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<FriendshipEntity, error::SystemError> {
        let row = self
            .staged
            .iter_mut()
            .find(|f| f.id == *friendship_id)
            .ok_or_else(|| error::SystemError::not_found("Friendship not found"))?;

        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&mut self, friendship_id: &Uuid) -> Result<(), error::SystemError> {
        self.staged.retain(|f| f.id != *friendship_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), error::SystemError> {
        let MemoryTx { mut guard, staged } = *self;
        guard.friendships = staged;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FriendRepository for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn FriendshipTx>, error::SystemError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.friendships.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn find_sent(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .friendships
            .iter()
            .filter(|f| f.requester_id == *user_id && f.status == status)
            .filter_map(|f| state.joined(f, &f.recipient_id))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_received(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .friendships
            .iter()
            .filter(|f| f.recipient_id == *user_id && f.status == status)
            .filter_map(|f| state.joined(f, &f.requester_id))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .friendships
            .iter()
            .filter(|f| f.involves(user_id) && f.status == FriendshipStatus::Accepted)
            .filter_map(|f| {
                let other = if f.requester_id == *user_id { f.recipient_id } else { f.requester_id };
                state.joined(f, &other)
            })
            .collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemorySessions {
    revoked: Mutex<HashSet<Uuid>>,
}

#[async_trait::async_trait]
impl SessionStore for MemorySessions {
    async fn revoke(&self, jti: &Uuid, ttl_seconds: u64) -> Result<(), error::SystemError> {
        if ttl_seconds > 0 {
            self.revoked.lock().await.insert(*jti);
        }
        Ok(())
    }

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.revoked.lock().await.contains(jti))
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: std::sync::Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), error::SystemError> {
        self.blobs.lock().unwrap().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct TestContext {
    pub users: UserService,
    pub friends: FriendService,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::default();
        Self::build(store.clone(), Arc::new(store))
    }

    /// Same wiring, but the user service writes through a [`FlakyUserRepository`].
    pub fn with_flaky_users() -> (Self, Arc<FlakyUserRepository>) {
        let store = MemoryStore::default();
        let flaky = Arc::new(FlakyUserRepository::new(store.clone()));
        (Self::build(store, flaky.clone()), flaky)
    }

    fn build(store: MemoryStore, user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        let blobs = Arc::new(MemoryBlobStore::default());
        let files = FileUploadService::new(blobs.clone(), UploadConfig::avatars("/uploads"));

        let users = UserService::with_dependencies(
            user_repo,
            Arc::new(MemorySessions::default()),
            files,
            AuthSettings { jwt_secret: "test-secret".to_string(), access_token_expiration: 3600 },
        );
        let friends = FriendService::with_dependencies(Arc::new(store.clone()), Arc::new(store));

        TestContext { users, friends, blobs }
    }

    pub async fn register(&self, username: &str) -> Uuid {
        self.users.sign_up(sample_sign_up(username)).await.unwrap().id
    }

    pub async fn signed_in(&self, username: &str) -> (Uuid, String) {
        let id = self.register(username).await;
        let token = self
            .users
            .sign_in(SignInModel {
                identifier: username.to_string(),
                password: SAMPLE_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        (id, token)
    }

    /// The `/api` tree wired to this context's services.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.friends.clone()))
            .configure(crate::api_config)
    }
}
