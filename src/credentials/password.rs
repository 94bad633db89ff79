//! bcrypt password hashing on the blocking thread pool.

use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Join(#[from] JoinError),
}

/// Hashes `password` with the given bcrypt cost.
///
/// # Errors
/// Returns an error if the cost is out of range or the worker task panics.
pub async fn hash(password: String, cost: u32) -> Result<String, PasswordError> {
    let hashed = spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Compares `password` against a stored bcrypt hash.
///
/// # Errors
/// Returns an error if the stored hash is malformed or the worker task panics.
pub async fn verify(password: String, hashed: String) -> Result<bool, PasswordError> {
    let matches = spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;
    Ok(matches)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify() {
        let hashed = hash("password123".to_string(), 4).await.unwrap();
        assert_ne!(hashed, "password123");
        assert!(verify("password123".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify("wrong".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(verify("password123".to_string(), "nope".to_string()).await.is_err());
    }
}
