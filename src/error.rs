// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use validator::{ValidationError, ValidationErrors};

use crate::auth::{google::VerifyError, password::PasswordError, TokenError};
use crate::database::manager::DatabaseError;
use crate::services::{CatalogError, IdentityError, PlaneacionError};

/// HTTP API error with the status code and message the client sees
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),
    // Duplicates are reported as a plain 400, not 409
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure attributed to a single request field.
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(msg) => ApiError::conflict(msg),
            other => {
                tracing::error!("Storage error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => ApiError::unauthorized("missing or invalid token"),
            other => {
                tracing::error!("Token error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::internal_server_error("could not process password")
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        tracing::warn!("Federated token rejected: {}", err);
        match err {
            VerifyError::MissingEmail => ApiError::unauthorized("id_token has no email"),
            _ => ApiError::unauthorized("invalid id_token"),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Invalid(errors) => errors.into(),
            IdentityError::EmailTaken => ApiError::conflict(err.to_string()),
            IdentityError::UnknownUnidad(_) | IdentityError::UnidadRequired => {
                ApiError::field_error("unidad_id", err.to_string())
            }
            IdentityError::InvalidCredentials | IdentityError::Inactive => ApiError::unauthorized(err.to_string()),
            IdentityError::UserNotFound => ApiError::not_found(err.to_string()),
            IdentityError::FederationNotConfigured => {
                tracing::error!("Federated login attempted without GOOGLE_CLIENT_ID");
                ApiError::internal_server_error(err.to_string())
            }
            IdentityError::Verify(e) => e.into(),
            IdentityError::Token(e) => e.into(),
            IdentityError::Password(e) => e.into(),
            IdentityError::Database(e) => e.into(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = HashMap::new();
        for (field, failures) in errors.field_errors() {
            if let Some(failure) = failures.first() {
                field_errors.insert(field.to_string(), describe_failure(&field, failure));
            }
        }

        // Report the alphabetically first field so the headline is stable.
        let message = field_errors
            .iter()
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, message)| message.clone())
            .unwrap_or_else(|| "invalid request".to_string());
        ApiError::validation_error(message, Some(field_errors))
    }
}

fn describe_failure(field: &str, failure: &ValidationError) -> String {
    if let Some(message) = &failure.message {
        return message.to_string();
    }
    match failure.code.as_ref() {
        "required" => format!("{} is required", field),
        "length" => match failure.params.get("min") {
            Some(min) => format!("{} must be at least {} characters", field, min),
            None => format!("{} has an invalid length", field),
        },
        _ => format!("{} is invalid", field),
    }
}

impl From<PlaneacionError> for ApiError {
    fn from(err: PlaneacionError) -> Self {
        match err {
            PlaneacionError::NotFound => ApiError::not_found(err.to_string()),
            PlaneacionError::Database(e) => e.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingFilter | CatalogError::MissingSlug => ApiError::validation_error(err.to_string(), None),
            CatalogError::NotFound => ApiError::not_found(err.to_string()),
            CatalogError::StatsTimeout(_) => {
                tracing::error!("{}", err);
                ApiError::internal_server_error(err.to_string())
            }
            CatalogError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_reported_as_bad_request() {
        let err = ApiError::conflict("email already registered");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["code"], "CONFLICT");
        assert_eq!(err.to_json()["success"], false);
    }

    #[test]
    fn test_field_error_carries_field_map() {
        let body = ApiError::field_error("email", "email is invalid").to_json();
        assert_eq!(body["error"], "email is invalid");
        assert_eq!(body["field_errors"]["email"], "email is invalid");
    }

    #[test]
    fn test_validation_errors_become_field_errors() {
        let mut errors = ValidationErrors::new();
        let mut length = ValidationError::new("length");
        length.add_param("min".into(), &8);
        errors.add("password", length);
        errors.add("nombre", ValidationError::new("required"));

        let body = ApiError::from(errors).to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["password"], "password must be at least 8 characters");
        assert_eq!(body["field_errors"]["nombre"], "nombre is required");
        assert_eq!(body["error"], "nombre is required");
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err: ApiError = DatabaseError::UniqueViolation("usuarios_email_key".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_storage_error_message_is_surfaced() {
        let err: ApiError = DatabaseError::Query("relation \"planeaciones\" does not exist".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert!(err.message().contains("planeaciones"));
    }
}
