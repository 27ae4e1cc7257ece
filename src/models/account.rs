use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether a reset token is stored and still redeemable at `now`.
    pub fn has_pending_reset(&self, now: DateTime<Utc>) -> bool {
        matches!(
            (&self.reset_token_hash, self.reset_token_expires_at),
            (Some(_), Some(expires_at)) if expires_at > now
        )
    }
}
