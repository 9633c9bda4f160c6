pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, session_auth_middleware, AuthUser, AUTH_COOKIE};
pub use response::{ApiResponse, ApiResult};
