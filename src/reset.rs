//! Reset token lifecycle: issue a token for an email, redeem it for a new
//! password.
//!
//! A token is pending from `issue` until it is redeemed or its expiry passes.
//! Expiry is never written; it is only compared against the clock at
//! redemption time.

use std::sync::Arc;

use chrono::Duration;

use crate::auth::password::PasswordHasher;
use crate::auth::token;
use crate::clock::Clock;
use crate::db::AccountStore;
use crate::email::Mailer;
use crate::error::AppError;
use crate::worker::{MailJob, MailQueue};

/// How an issued token reaches the user.
#[derive(Clone)]
pub enum Delivery {
    Queued(MailQueue),
    Inline(Arc<dyn Mailer>),
}

#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub token_ttl: Duration,
    pub min_password_length: usize,
    pub conceal_unknown_email: bool,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            token_ttl: Duration::hours(1),
            min_password_length: 8,
            conceal_unknown_email: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    Sent,
    /// No account matched and the policy hides that from the caller.
    Concealed,
}

#[derive(Clone)]
pub struct ResetService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    delivery: Delivery,
    policy: ResetPolicy,
}

impl ResetService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
        delivery: Delivery,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            delivery,
            policy,
        }
    }

    /// Mint a token for `email`, store its digest, then hand it to delivery.
    ///
    /// The store write completes before delivery starts, so a delivery
    /// failure still leaves a redeemable token behind.
    pub async fn issue(&self, email: &str) -> Result<IssueOutcome, AppError> {
        // Lookup is exact; only a blank value counts as missing
        if email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }

        let token = token::generate();
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.policy.token_ttl).ok_or_else(|| {
            AppError::Internal(format!(
                "token expiry overflows: {now} + {}",
                self.policy.token_ttl
            ))
        })?;

        let Some(account) = self
            .store
            .set_reset_token(email, &token::digest(&token), expires_at, now)
            .await?
        else {
            if self.policy.conceal_unknown_email {
                tracing::info!("Password reset requested for unknown email; concealed");
                return Ok(IssueOutcome::Concealed);
            }
            return Err(AppError::NotFound("User not found".to_string()));
        };

        tracing::info!("Reset token issued for account {} (expires {expires_at})", account.id);

        match &self.delivery {
            Delivery::Queued(queue) => queue.enqueue(MailJob {
                to: account.email,
                token,
            })?,
            Delivery::Inline(mailer) => mailer.send_password_reset(&account.email, &token).await?,
        }

        Ok(IssueOutcome::Sent)
    }

    /// Replace the password of the account holding `token`, if the token is
    /// still pending. Wrong, expired and already-used tokens are reported
    /// the same way.
    pub async fn redeem(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::BadRequest("New password is required".to_string()));
        }
        if new_password.chars().count() < self.policy.min_password_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                self.policy.min_password_length
            )));
        }

        let token = token.trim();
        if token.len() != token::TOKEN_LEN {
            return Err(AppError::InvalidOrExpiredToken);
        }

        let password_hash = self
            .hasher
            .hash_blocking(new_password.to_string())
            .await
            .map_err(AppError::Internal)?;

        let account = self
            .store
            .redeem_reset_token(&token::digest(token), &password_hash, self.clock.now())
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        tracing::info!("Password reset for account {}", account.id);
        Ok(())
    }
}
