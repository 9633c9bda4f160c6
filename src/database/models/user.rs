use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role assigned to every self-registered or federated account.
pub const ROLE_PROFESOR: &str = "profesor";

/// Account as exposed to clients. The password hash never lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub unidad_id: i64,
    pub nombre_completo: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account plus its stored credential, only used while authenticating.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub unidad_id: i64,
    pub nombre_completo: String,
    pub email: String,
    pub password_hash: String,
}
