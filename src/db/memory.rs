use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::Account;

/// In-process account store keyed by email.
///
/// Every operation runs under one lock, which gives the same per-record
/// atomicity as the single-statement Postgres updates.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account. Fails if the email is already taken.
    pub fn create(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        self.check_available()?;
        let mut accounts = self.lock();
        if accounts.contains_key(email) {
            return Err(StoreError::Conflict(email.to_string()));
        }
        let account = Account {
            id: Uuid::now_v7(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(email.to_string(), account.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(account)
    }

    /// Number of successful mutations so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail, as if the database went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.check_available()?;
        Ok(self.lock().get(email).cloned())
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        self.check_available()?;
        let mut accounts = self.lock();
        let Some(account) = accounts.get_mut(email) else {
            return Ok(None);
        };

        account.reset_token_hash = Some(token_hash.to_string());
        account.reset_token_expires_at = Some(expires_at);
        account.updated_at = now;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(account.clone()))
    }

    async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        self.check_available()?;
        let mut accounts = self.lock();
        let Some(account) = accounts.values_mut().find(|a| {
            a.reset_token_hash.as_deref() == Some(token_hash)
                && a.reset_token_expires_at.is_some_and(|expires_at| expires_at > now)
        }) else {
            return Ok(None);
        };

        account.password_hash = password_hash.to_string();
        account.reset_token_hash = None;
        account.reset_token_expires_at = None;
        account.updated_at = now;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(account.clone()))
    }
}
