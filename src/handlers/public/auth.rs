use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::database::models::User;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::identity_service::{GoogleLoginRequest, LoginRequest, RegisterRequest};
use crate::services::{AuthSession, IdentityService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user: User,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Registered> {
    let Json(request) = payload?;
    let user = IdentityService::from_state(&state).register(request).await?;
    Ok(ApiResponse::created(Registered { user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let Json(request) = payload?;
    let session = IdentityService::from_state(&state).login(request).await?;
    Ok(ApiResponse::success(session))
}

/// POST /api/auth/google - exchange a Google ID token for a session
pub async fn google(
    State(state): State<AppState>,
    payload: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let Json(request) = payload?;
    let session = IdentityService::from_state(&state).google_login(request).await?;
    Ok(ApiResponse::success(session))
}
