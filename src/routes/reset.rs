use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::json::ApiJson;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct GenerateResetTokenRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn generate_reset_token(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<GenerateResetTokenRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // A concealed unknown email gets the same body as a real send
    state
        .reset
        .issue(req.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset link sent".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .reset
        .redeem(
            req.token.as_deref().unwrap_or_default(),
            req.new_password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successful".to_string(),
    }))
}
