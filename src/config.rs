use std::net::IpAddr;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub max_body_size: usize,
    pub token_ttl: Duration,
    pub min_password_length: usize,
    pub hashing: HashingConfig,
    pub conceal_unknown_email: bool,
    pub mail_delivery: DeliveryMode,
    pub mail_queue_capacity: usize,
    pub reset_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Argon2id cost parameters for new password hashes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryMode {
    /// Hand the email to the background worker after the token is stored.
    Queued,
    /// Send within the request and fail it if the transport fails.
    Inline,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("PASSRESET_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PASSRESET_HOST: {e}"))?;

        let port: u16 = env_or("PASSRESET_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PASSRESET_PORT: {e}"))?;

        let log_level = env_or("PASSRESET_LOG_LEVEL", "info");

        let max_body_size: usize = env_or("PASSRESET_MAX_BODY_SIZE", "16384")
            .parse()
            .map_err(|e| format!("Invalid PASSRESET_MAX_BODY_SIZE: {e}"))?;

        let token_ttl = parse_token_ttl(&env_or("PASSRESET_TOKEN_TTL_SECS", "3600"))?;

        let min_password_length: usize = env_or("PASSRESET_MIN_PASSWORD_LENGTH", "8")
            .parse()
            .map_err(|e| format!("Invalid PASSRESET_MIN_PASSWORD_LENGTH: {e}"))?;

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_or("PASSRESET_ARGON2_MEMORY_KIB", &defaults.memory_kib.to_string())
                .parse()
                .map_err(|e| format!("Invalid PASSRESET_ARGON2_MEMORY_KIB: {e}"))?,
            iterations: env_or("PASSRESET_ARGON2_ITERATIONS", &defaults.iterations.to_string())
                .parse()
                .map_err(|e| format!("Invalid PASSRESET_ARGON2_ITERATIONS: {e}"))?,
        };

        let conceal_unknown_email = parse_bool(
            "PASSRESET_CONCEAL_UNKNOWN_EMAIL",
            &env_or("PASSRESET_CONCEAL_UNKNOWN_EMAIL", "false"),
        )?;

        let mail_delivery = parse_delivery_mode(&env_or("PASSRESET_MAIL_DELIVERY", "queued"))?;

        let mail_queue_capacity: usize = env_or("PASSRESET_MAIL_QUEUE_CAPACITY", "256")
            .parse()
            .map_err(|e| format!("Invalid PASSRESET_MAIL_QUEUE_CAPACITY: {e}"))?;
        if mail_queue_capacity == 0 {
            return Err("PASSRESET_MAIL_QUEUE_CAPACITY must be at least 1".to_string());
        }

        let reset_url = std::env::var("PASSRESET_RESET_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let smtp = match (
            std::env::var("PASSRESET_SMTP_HOST").ok(),
            std::env::var("PASSRESET_SMTP_PORT").ok(),
            std::env::var("PASSRESET_SMTP_USER").ok(),
            std::env::var("PASSRESET_SMTP_PASS").ok(),
            std::env::var("PASSRESET_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid PASSRESET_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            log_level,
            max_body_size,
            token_ttl,
            min_password_length,
            hashing,
            conceal_unknown_email,
            mail_delivery,
            mail_queue_capacity,
            reset_url,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("Invalid {key}: expected a boolean, got '{other}'")),
    }
}

/// Longest accepted token lifetime, one leap year.
const MAX_TOKEN_TTL_SECS: i64 = 366 * 24 * 3600;

fn parse_token_ttl(value: &str) -> Result<Duration, String> {
    let secs: i64 = value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid PASSRESET_TOKEN_TTL_SECS: {e}"))?;
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(format!(
            "PASSRESET_TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}, got {secs}"
        ));
    }
    Ok(Duration::seconds(secs))
}

fn parse_delivery_mode(value: &str) -> Result<DeliveryMode, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "queued" => Ok(DeliveryMode::Queued),
        "inline" => Ok(DeliveryMode::Inline),
        other => Err(format!(
            "Invalid PASSRESET_MAIL_DELIVERY: expected 'queued' or 'inline', got '{other}'"
        )),
    }
}
