use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use passreset::clock::SystemClock;
use passreset::config::Config;
use passreset::db::PgAccountStore;
use passreset::email::{LogMailer, Mailer, ResetEmail, SmtpMailer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting passreset");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations applied");

    let reset_email = ResetEmail {
        reset_url: config.reset_url.clone(),
        ttl_minutes: config.token_ttl.num_minutes(),
    };
    let mailer: Arc<dyn Mailer> = match config.smtp.as_ref() {
        Some(smtp) => match SmtpMailer::new(smtp, reset_email) {
            Ok(mailer) => {
                tracing::info!("SMTP configured");
                Arc::new(mailer)
            }
            Err(e) => {
                tracing::warn!("SMTP not available: {e}");
                Arc::new(LogMailer)
            }
        },
        None => {
            tracing::warn!("SMTP not configured, reset tokens will only be logged");
            Arc::new(LogMailer)
        }
    };

    if !config.conceal_unknown_email {
        tracing::warn!(
            "Unknown emails get 404 on /generate-reset-token; set PASSRESET_CONCEAL_UNKNOWN_EMAIL=true to hide account existence"
        );
    }

    let addr = SocketAddr::new(config.host, config.port);
    let store = Arc::new(PgAccountStore::new(pool.clone()));
    let (state, worker) = passreset::build_state(config, store, Arc::new(SystemClock), mailer)?;
    let app = passreset::build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the queue sender) is gone; let the worker drain.
    if let Some(worker) = worker {
        passreset::worker::drain(worker, Duration::from_secs(30)).await;
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
