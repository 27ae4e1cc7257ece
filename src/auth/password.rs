use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashingConfig;

/// Argon2id hasher with a fixed cost, shared across requests.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(config: HashingConfig) -> Result<Self, String> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None)
            .map_err(|e| format!("Invalid params: {e}"))?;
        Ok(Self { params })
    }

    pub fn hash(&self, password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| format!("Hashing failed: {e}"))
    }

    /// Hash on the blocking pool so the async workers stay free.
    pub async fn hash_blocking(&self, password: String) -> Result<String, String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| format!("Hashing task failed: {e}"))?
    }
}

/// Verify a password against a PHC hash string. Cost is read from the hash.
pub fn verify(password: &str, hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
