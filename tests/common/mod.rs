#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use passreset::auth::password::PasswordHasher;
use passreset::clock::ManualClock;
use passreset::config::{Config, DeliveryMode, HashingConfig};
use passreset::db::{AccountStore, MemoryAccountStore, PgAccountStore};
use passreset::email::{MailError, Mailer};
use passreset::models::Account;

pub const EMAIL: &str = "user@test.com";
pub const OLD_PASSWORD: &str = "OldPassword1";

/// Fixed issuance instant so expiry assertions are exact.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn cheap_hashing() -> HashingConfig {
    HashingConfig {
        memory_kib: 1024,
        iterations: 1,
    }
}

pub fn hash(password: &str) -> String {
    PasswordHasher::new(cheap_hashing())
        .unwrap()
        .hash(password)
        .unwrap()
}

pub fn test_config(database_url: &str, delivery: DeliveryMode) -> Config {
    Config {
        database_url: database_url.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        log_level: "warn".to_string(),
        max_body_size: 16 * 1024,
        token_ttl: chrono::Duration::hours(1),
        min_password_length: 8,
        hashing: cheap_hashing(),
        conceal_unknown_email: false,
        mail_delivery: delivery,
        mail_queue_capacity: 16,
        reset_url: None,
        smtp: None,
    }
}

/// Captures outgoing reset emails instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<bool>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn last_token(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
            .expect("no reset email recorded")
    }

    /// Wait for the background worker to deliver `count` emails.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, String)> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} emails, got {}", self.sent().len());
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        if *self.failing.lock().unwrap() {
            return Err(MailError::Transport("550 mailbox unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), token.to_string()));
        Ok(())
    }
}

/// HTTP client bound to one running server.
pub struct Api {
    pub addr: SocketAddr,
    pub client: Client,
}

impl Api {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn generate_reset_token(&self, email: &str) -> (Value, StatusCode) {
        self.post_json("/generate-reset-token", &json!({ "email": email }))
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/reset-password",
            &json!({ "token": token, "newPassword": new_password }),
        )
        .await
    }
}

async fn serve(app: axum::Router) -> Api {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    Api {
        addr,
        client: Client::new(),
    }
}

/// A running server backed by the in-memory store and a manual clock.
pub struct TestApp {
    pub api: Api,
    pub store: Arc<MemoryAccountStore>,
    pub clock: Arc<ManualClock>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn account(&self, email: &str) -> Account {
        self.store
            .find_by_email(email)
            .await
            .unwrap()
            .expect("account missing")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config("postgres://unused", DeliveryMode::Inline)).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryAccountStore::new());
    store.create(EMAIL, &hash(OLD_PASSWORD), t0()).unwrap();

    let clock = Arc::new(ManualClock::new(t0()));
    let mailer = Arc::new(RecordingMailer::default());

    let (state, _worker) =
        passreset::build_state(config, store.clone(), clock.clone(), mailer.clone())
            .expect("Failed to build state");
    let api = serve(passreset::build_app(state)).await;

    TestApp {
        api,
        store,
        clock,
        mailer,
    }
}

/// A running server backed by a throwaway Postgres database.
pub struct PgTestApp {
    pub api: Api,
    pub pool: PgPool,
    pub clock: Arc<ManualClock>,
    pub mailer: Arc<RecordingMailer>,
    pub db_name: String,
}

impl PgTestApp {
    pub async fn account(&self, email: &str) -> Account {
        passreset::db::accounts::find_by_email(&self.pool, email)
            .await
            .unwrap()
            .expect("account missing")
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn against a fresh database created from `DATABASE_URL`.
pub async fn spawn_pg_app() -> PgTestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("passreset_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    passreset::db::accounts::create(&pool, EMAIL, &hash(OLD_PASSWORD))
        .await
        .expect("Failed to seed account");

    let clock = Arc::new(ManualClock::new(t0()));
    let mailer = Arc::new(RecordingMailer::default());
    let store = Arc::new(PgAccountStore::new(pool.clone()));

    let (state, _worker) = passreset::build_state(
        test_config(&test_url, DeliveryMode::Inline),
        store,
        clock.clone(),
        mailer.clone(),
    )
    .expect("Failed to build state");
    let api = serve(passreset::build_app(state)).await;

    PgTestApp {
        api,
        pool,
        clock,
        mailer,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: PgTestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
