pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod reset;
pub mod routes;
pub mod state;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::password::PasswordHasher;
use crate::clock::Clock;
use crate::config::{Config, DeliveryMode};
use crate::db::AccountStore;
use crate::email::Mailer;
use crate::reset::{Delivery, ResetPolicy, ResetService};
use crate::state::{AppState, SharedState};

/// Wire the reset service from its collaborators.
///
/// In queued mode this spawns the mail worker on the current runtime and
/// returns its handle; the worker exits once the returned state (and every
/// router holding it) is dropped.
pub fn build_state(
    config: Config,
    store: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
) -> Result<(SharedState, Option<JoinHandle<()>>), String> {
    let hasher = PasswordHasher::new(config.hashing)?;

    let (delivery, worker) = match config.mail_delivery {
        DeliveryMode::Queued => {
            let (queue, handle) = worker::spawn(mailer, config.mail_queue_capacity);
            (Delivery::Queued(queue), Some(handle))
        }
        DeliveryMode::Inline => (Delivery::Inline(mailer), None),
    };

    let policy = ResetPolicy {
        token_ttl: config.token_ttl,
        min_password_length: config.min_password_length,
        conceal_unknown_email: config.conceal_unknown_email,
    };

    let reset = ResetService::new(store, hasher, clock, delivery, policy);
    Ok((Arc::new(AppState { config, reset }), worker))
}

pub fn build_app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ));

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(layers)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
