use sha2::{Digest, Sha256};

/// Bytes of entropy in a reset token.
pub const TOKEN_BYTES: usize = 20;

/// Length of the hex-encoded token sent to the user.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Mint a fresh reset token as lowercase hex.
pub fn generate() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Digest stored in place of the raw token.
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
