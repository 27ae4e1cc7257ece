use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::db::StoreError;
use crate::email::MailError;
use crate::worker::EnqueueError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),
    #[error("Internal Error: {0}")]
    Internal(String),
    #[error("Store Error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            AppError::MailDelivery(_) | AppError::Internal(_) | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidOrExpiredToken => self.to_string(),
            AppError::MailDelivery(cause) => {
                tracing::error!("Mail delivery error: {cause}");
                "Email could not be sent".to_string()
            }
            AppError::Internal(cause) => {
                tracing::error!("Internal error: {cause}");
                "Password reset failed".to_string()
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                "Password reset failed".to_string()
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::MailDelivery(err.to_string())
    }
}

impl From<EnqueueError> for AppError {
    fn from(err: EnqueueError) -> Self {
        AppError::MailDelivery(err.to_string())
    }
}
