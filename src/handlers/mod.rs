// Public (no token) and protected (token required) route handlers.
pub mod health;
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Path ids are positive integers; anything else is a 400.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("invalid id: {}", raw))),
    }
}
