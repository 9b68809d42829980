use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::{FriendshipUserRow, NewFriendship},
        repository::{FriendRepository, FriendshipTx},
        schema::{FriendshipEntity, FriendshipStatus, PairKey},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgFriendshipTx {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait::async_trait]
impl FriendshipTx for PgFriendshipTx {
    async fn lock_pair(&mut self, pair: &PairKey) -> Result<(), error::SystemError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
            .bind(pair.low())
            .bind(pair.high())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn find_by_id(
        &mut self,
        friendship_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE id = $1 FOR UPDATE",
        )
        .bind(friendship_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(friendship)
    }

    async fn find_between(
        &mut self,
        pair: &PairKey,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        let friendships = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            SELECT *
            FROM friendships
            WHERE
                (requester_id = $1 AND recipient_id = $2)
            OR (requester_id = $2 AND recipient_id = $1)
            FOR UPDATE
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(friendships)
    }

    async fn insert(
        &mut self,
        friendship: &NewFriendship,
    ) -> Result<FriendshipEntity, error::SystemError> {
        let created = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            INSERT INTO friendships (id, requester_id, recipient_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(friendship.requester_id)
        .bind(friendship.recipient_id)
        .bind(friendship.status)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(created)
    }

    async fn update_status(
        &mut self,
        friendship_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<FriendshipEntity, error::SystemError> {
        sqlx::query_as::<_, FriendshipEntity>(
            "UPDATE friendships SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(friendship_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friendship not found"))
    }

    async fn delete(&mut self, friendship_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), error::SystemError> {
        let PgFriendshipTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FriendRepository for FriendRepositoryPg {
    async fn begin(&self) -> Result<Box<dyn FriendshipTx>, error::SystemError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgFriendshipTx { tx }))
    }

    async fn find_sent(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendshipUserRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                f.status,
                f.created_at,
                f.updated_at,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url
            FROM friendships f
            JOIN users u
                ON f.recipient_id = u.id
            WHERE f.requester_id = $1
              AND f.status = $2
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_received(
        &self,
        user_id: &Uuid,
        status: FriendshipStatus,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendshipUserRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                f.status,
                f.created_at,
                f.updated_at,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url
            FROM friendships f
            JOIN users u
                ON f.requester_id = u.id
            WHERE f.recipient_id = $1
              AND f.status = $2
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendshipUserRow>(
            r#"
            SELECT
                f.id AS friendship_id,
                f.status,
                f.created_at,
                f.updated_at,
                u.id AS user_id,
                u.username,
                u.first_name,
                u.last_name,
                u.avatar_url
            FROM friendships f
            JOIN users u
                ON u.id = CASE
                    WHEN f.requester_id = $1 THEN f.recipient_id
                    ELSE f.requester_id
                END
            WHERE (f.requester_id = $1 OR f.recipient_id = $1)
              AND f.status = 'accepted'
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
