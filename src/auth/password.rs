use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] JoinError),
}

/// bcrypt is CPU bound, so hashing runs on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Any failure, including a malformed stored hash, counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .ok()
        .and_then(Result::ok)
        .unwrap_or(false)
}

/// Random stored credential for federated accounts. It is not a bcrypt hash
/// so no password ever verifies against it.
pub fn unusable_credential() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("correct horse".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse".to_string(), hash.clone()).await);
        assert!(!verify_password("wrong horse".to_string(), hash).await);
    }

    #[tokio::test]
    async fn federated_placeholder_never_verifies() {
        let placeholder = unusable_credential();
        assert_eq!(placeholder.len(), 43);
        assert!(!verify_password(placeholder.clone(), placeholder).await);
        assert!(!verify_password(String::new(), unusable_credential()).await);
    }
}
