//! Test doubles shared by unit and integration tests.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::google::{IdentityVerifier, VerifiedIdentity, VerifyError};
use crate::config::AppConfig;
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_GOOGLE_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

/// Development profile with a signing secret, a federated audience and a
/// cheap bcrypt cost.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = Some(TEST_JWT_SECRET.to_string());
    config.security.google_client_id = Some(TEST_GOOGLE_CLIENT_ID.to_string());
    config.security.bcrypt_cost = 4;
    config
}

pub fn test_state(config: AppConfig, store: Arc<MemoryStore>, verifier: StaticVerifier) -> AppState {
    AppState::new(config, store, Arc::new(verifier))
}

/// Verifier that accepts a fixed set of tokens for one audience.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    audience: String,
    identities: HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            identities: HashMap::new(),
        }
    }

    pub fn with_identity(mut self, token: &str, email: &str, name: Option<&str>) -> Self {
        self.identities.insert(
            token.to_string(),
            VerifiedIdentity {
                email: email.to_string(),
                name: name.map(str::to_string),
            },
        );
        self
    }
}

impl Default for StaticVerifier {
    fn default() -> Self {
        Self::new(TEST_GOOGLE_CLIENT_ID)
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, id_token: &str, audience: &str) -> Result<VerifiedIdentity, VerifyError> {
        if audience != self.audience {
            return Err(VerifyError::AudienceMismatch(audience.to_string()));
        }
        self.identities
            .get(id_token)
            .cloned()
            .ok_or_else(|| VerifyError::Rejected("unknown token".to_string()))
    }
}
