use axum::{extract::State, Extension};

use crate::database::models::User;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::IdentityService;
use crate::state::AppState;

/// GET /api/me
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let user = IdentityService::from_state(&state).current_user(auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
