pub mod json;
pub mod reset;

use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/generate-reset-token", post(reset::generate_reset_token))
        .route("/reset-password", post(reset::reset_password))
}
