use std::sync::Arc;

use crate::auth::google::IdentityVerifier;
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;

/// Shared handles injected into every handler via `Router::with_state`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let tokens = TokenService::from_config(&config.security);
        Self {
            config: Arc::new(config),
            store,
            tokens,
            verifier,
        }
    }
}
