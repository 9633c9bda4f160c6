use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::google::{IdentityVerifier, VerifyError};
use crate::auth::password::{self, PasswordError};
use crate::auth::{TokenError, TokenService};
use crate::config::SecurityConfig;
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Store};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: u64 = 8;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid request: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("email already registered")]
    EmailTaken,

    #[error("unidad académica {0} does not exist")]
    UnknownUnidad(i64),

    #[error("unidad_id is required for a new account")]
    UnidadRequired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user is inactive")]
    Inactive,

    #[error("user not found")]
    UserNotFound,

    #[error("GOOGLE_CLIENT_ID is not configured")]
    FederationNotConfigured,

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub nombre: String,
    #[validate(contains(pattern = "@", message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub password: String,
    #[validate(range(min = 1, message = "unidad_id must be a positive integer"))]
    pub unidad_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GoogleLoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub id_token: String,
    pub unidad_id: Option<i64>,
}

/// Token plus the account it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

/// Registration, password login, federated login and profile lookup.
pub struct IdentityService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    verifier: Arc<dyn IdentityVerifier>,
    security: SecurityConfig,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        verifier: Arc<dyn IdentityVerifier>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            verifier,
            security,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.tokens.clone(),
            state.verifier.clone(),
            state.config.security.clone(),
        )
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, IdentityError> {
        request.validate()?;
        let nombre = request.nombre.trim().to_string();
        let email = request.email.trim().to_string();

        if !self.store.unidad_exists(request.unidad_id).await? {
            return Err(IdentityError::UnknownUnidad(request.unidad_id));
        }
        if self.store.email_exists(&email).await? {
            return Err(IdentityError::EmailTaken);
        }

        let password_hash = password::hash_password(request.password, self.security.bcrypt_cost).await?;
        let user = self
            .store
            .insert_user(NewUser {
                unidad_id: request.unidad_id,
                nombre_completo: nombre,
                email,
                password_hash,
            })
            .await
            .map_err(map_email_conflict)?;

        info!(user_id = user.id, unidad_id = user.unidad_id, "Registered user");
        Ok(user)
    }

    /// Unknown email, inactive account and wrong password all fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, IdentityError> {
        request.validate()?;
        let email = request.email.trim().to_string();

        let Some(credentials) = self.store.find_user_by_email(&email).await? else {
            warn!("Login failed: unknown email");
            return Err(IdentityError::InvalidCredentials);
        };
        if !credentials.user.is_active {
            warn!(user_id = credentials.user.id, "Login failed: inactive user");
            return Err(IdentityError::InvalidCredentials);
        }
        if !password::verify_password(request.password, credentials.password_hash).await {
            warn!(user_id = credentials.user.id, "Login failed: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        self.session_for(credentials.user)
    }

    pub async fn google_login(&self, request: GoogleLoginRequest) -> Result<AuthSession, IdentityError> {
        request.validate()?;
        let id_token = request.id_token.trim();
        let audience = self
            .security
            .google_client_id
            .as_deref()
            .ok_or(IdentityError::FederationNotConfigured)?;

        let identity = self.verifier.verify(id_token, audience).await?;

        let user = match self.store.find_user_by_email(&identity.email).await? {
            Some(credentials) => credentials.user,
            None => {
                let unidad_id = request
                    .unidad_id
                    .filter(|id| *id > 0)
                    .ok_or(IdentityError::UnidadRequired)?;
                if !self.store.unidad_exists(unidad_id).await? {
                    return Err(IdentityError::UnknownUnidad(unidad_id));
                }

                let nombre_completo = identity.name.clone().unwrap_or_else(|| identity.email.clone());
                let user = self
                    .store
                    .insert_user(NewUser {
                        unidad_id,
                        nombre_completo,
                        email: identity.email.clone(),
                        password_hash: password::unusable_credential(),
                    })
                    .await
                    .map_err(map_email_conflict)?;
                info!(user_id = user.id, unidad_id, "Created federated user");
                user
            }
        };

        if !user.is_active {
            warn!(user_id = user.id, "Federated login refused: inactive user");
            return Err(IdentityError::Inactive);
        }

        self.session_for(user)
    }

    /// Fresh read of the caller's account from storage.
    pub async fn current_user(&self, user_id: i64) -> Result<User, IdentityError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, IdentityError> {
        let access_token = self.tokens.issue(&user)?;
        Ok(AuthSession {
            access_token,
            token_type: "bearer",
            user,
        })
    }
}

/// Required text fields: whitespace alone counts as missing.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn map_email_conflict(err: DatabaseError) -> IdentityError {
    match err {
        DatabaseError::UniqueViolation(_) => IdentityError::EmailTaken,
        other => IdentityError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(nombre: &str, email: &str, password: &str, unidad_id: i64) -> RegisterRequest {
        RegisterRequest {
            nombre: nombre.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            unidad_id,
        }
    }

    fn failing_field(request: &impl Validate) -> Option<String> {
        let errors = request.validate().err()?;
        errors.field_errors().keys().next().map(|field| field.to_string())
    }

    #[test]
    fn registration_rules() {
        assert!(registration("Ana", "ana@x.com", "abcdefgh", 1).validate().is_ok());
        assert_eq!(failing_field(&registration("", "ana@x.com", "abcdefgh", 1)).as_deref(), Some("nombre"));
        assert_eq!(failing_field(&registration("   ", "ana@x.com", "abcdefgh", 1)).as_deref(), Some("nombre"));
        assert_eq!(failing_field(&registration("Ana", "ana.x.com", "abcdefgh", 1)).as_deref(), Some("email"));
        assert_eq!(failing_field(&registration("Ana", "ana@x.com", "abcdefg", 1)).as_deref(), Some("password"));
        assert_eq!(failing_field(&registration("Ana", "ana@x.com", "abcdefgh", 0)).as_deref(), Some("unidad_id"));
    }

    #[test]
    fn password_length_counts_characters() {
        // 9 bytes, 6 characters
        assert!(registration("Ana", "ana@x.com", "ñandúñ", 1).validate().is_err());
        assert!(registration("Ana", "ana@x.com", "ñandúñan", 1).validate().is_ok());
    }

    #[test]
    fn blank_login_fields_are_rejected() {
        let request = LoginRequest {
            email: "ana@x.com".to_string(),
            password: "   ".to_string(),
        };
        assert_eq!(failing_field(&request).as_deref(), Some("password"));

        let request = GoogleLoginRequest {
            id_token: " ".to_string(),
            unidad_id: None,
        };
        assert_eq!(failing_field(&request).as_deref(), Some("id_token"));
    }

    #[test]
    fn unique_violation_becomes_email_taken() {
        let err = map_email_conflict(DatabaseError::UniqueViolation("usuarios_email_key".to_string()));
        assert!(matches!(err, IdentityError::EmailTaken));
    }
}
