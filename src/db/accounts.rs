use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::Account;

pub async fn create(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (id, email, password_hash)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn set_reset_token(
    pool: &PgPool,
    email: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts
         SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = $4
         WHERE email = $1
         RETURNING *",
    )
    .bind(email)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Compare-and-clear: the token check and the password write are one statement.
pub async fn redeem_reset_token(
    pool: &PgPool,
    token_hash: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts
         SET password_hash = $2,
             reset_token_hash = NULL,
             reset_token_expires_at = NULL,
             updated_at = $3
         WHERE reset_token_hash = $1 AND reset_token_expires_at > $3
         RETURNING *",
    )
    .bind(token_hash)
    .bind(password_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(find_by_email(&self.pool, email).await?)
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        Ok(set_reset_token(&self.pool, email, token_hash, expires_at, now).await?)
    }

    async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        Ok(redeem_reset_token(&self.pool, token_hash, password_hash, now).await?)
    }
}
