pub mod accounts;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::Account;

pub use accounts::PgAccountStore;
pub use memory::MemoryAccountStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("account already exists: {0}")]
    Conflict(String),
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for accounts and their pending reset tokens.
///
/// Both token writes are single conditional updates, so callers never hold a
/// row between reading it and writing it back.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Read-only lookup. The reset flow never calls it; it is here for
    /// inspecting accounts from tests and tooling.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Store a token digest on the account with this email, replacing any
    /// pending one. Returns `None` when no account matches.
    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;

    /// Swap in `password_hash` and clear the token on the account holding
    /// `token_hash`, if it expires strictly after `now`. Returns `None` when
    /// the token is unknown, expired or already consumed.
    async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;
}
