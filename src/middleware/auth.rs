use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Claims, TokenError, TokenService};
use crate::error::ApiError;
use crate::state::AppState;

/// Cookie consulted by the session gate when no bearer header is present.
pub const AUTH_COOKIE: &str = "auth_token";

/// One message for both "no token" and "bad token".
const UNAUTHENTICATED: &str = "missing or invalid token";

/// Authenticated caller, as asserted by a verified token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub unidad_id: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
            unidad_id: claims.unidad_id,
        }
    }
}

/// Verifies the caller's bearer token and injects `AuthUser` into request extensions.
/// The auth cookie is not consulted.
/// The user row is not re-read; the token is trusted for the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&state.tokens, bearer_token(request.headers()))?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Read-only session lookup: accepts the bearer header or the auth cookie.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&state.tokens, extract_token(request.headers()))?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

pub fn authenticate(tokens: &TokenService, token: Option<String>) -> Result<AuthUser, ApiError> {
    let token = token.ok_or_else(|| {
        tracing::warn!("Rejected request without credentials");
        ApiError::unauthorized(UNAUTHENTICATED)
    })?;

    match tokens.verify(&token) {
        Ok(claims) => Ok(claims.into()),
        Err(TokenError::Invalid(reason)) => {
            tracing::warn!("Rejected token: {}", reason);
            Err(ApiError::unauthorized(UNAUTHENTICATED))
        }
        Err(other) => Err(other.into()),
    }
}

/// `Authorization: Bearer <token>` first, then the auth cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == AUTH_COOKIE && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "auth_token=from-cookie"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; auth_token=abc.def.ghi; lang=es")]);
        assert_eq!(extract_token(&map).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn malformed_bearer_falls_back_to_cookie() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz"), (header::COOKIE, "auth_token=tok")]);
        assert_eq!(extract_token(&map).as_deref(), Some("tok"));
    }

    #[test]
    fn bearer_only_ignores_cookie() {
        let map = headers(&[(header::COOKIE, "auth_token=abc.def.ghi")]);
        assert_eq!(bearer_token(&map), None);

        let map = headers(&[(header::AUTHORIZATION, "Bearer abc"), (header::COOKIE, "auth_token=xyz")]);
        assert_eq!(bearer_token(&map).as_deref(), Some("abc"));
    }

    #[test]
    fn nothing_to_extract() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers(&[(header::AUTHORIZATION, "Bearer   ")])), None);
        assert_eq!(extract_token(&headers(&[(header::COOKIE, "auth_token=")])), None);
    }

    #[test]
    fn missing_and_invalid_tokens_look_the_same() {
        let tokens = TokenService::new(Some("secret".to_string()), 24);
        let missing = authenticate(&tokens, None).unwrap_err();
        let invalid = authenticate(&tokens, extract_token(&headers(&[(header::AUTHORIZATION, "Bearer nope")]))).unwrap_err();
        assert_eq!(missing.status_code(), 401);
        assert_eq!(missing.to_json(), invalid.to_json());
    }
}
