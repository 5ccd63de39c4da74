/// Error handling for the API server
///
/// Provides a unified error type that maps to HTTP responses. Handlers
/// return `Result<T, ApiError>` which converts to the right status code
/// and body automatically.
///
/// Validation failures carry a map of field name to error messages and
/// serialize as that map directly, so clients see every failing field of a
/// request in one response:
///
/// ```json
/// {
///   "title": ["This field may not be blank."],
///   "performers": ["Object with username=ghost does not exist."]
/// }
/// ```
///
/// Every other error kind serializes as `{"detail": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field validation errors, keyed by field name
///
/// All checks for a request are evaluated and collected here before the
/// request is rejected; nothing short-circuits on the first failure.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Creates an empty error collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection with a single field error
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records an error message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// True when no field has errors
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the messages recorded for a field
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Converts into `Err(ApiError::Validation)` when any error was recorded
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400), body is the per-field error map
    Validation(ValidationErrors),

    /// Missing or invalid credentials (401)
    Unauthorized(String),

    /// Authenticated but not permitted (403)
    Forbidden(String),

    /// Resource does not exist (404)
    NotFound(String),

    /// Internal server error (500); message is logged, not leaked
    Internal(String),
}

impl ApiError {
    /// The canonical 404 body used across the API
    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed for {} field(s)", errors.0.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": msg })),
            )
                .into_response(),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found(),
            sqlx::Error::Database(db_err) => {
                // Unique-constraint races on registration surface the same
                // per-field message as the pre-insert check.
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("username") {
                        return ApiError::Validation(ValidationErrors::single(
                            "username",
                            "A user with that username already exists.",
                        ));
                    }
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert authentication errors to API errors
impl From<taskboard_shared::auth::middleware::AuthError> for ApiError {
    fn from(err: taskboard_shared::auth::middleware::AuthError) -> Self {
        use taskboard_shared::auth::middleware::AuthError;

        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            ),
            AuthError::InvalidFormat(msg) => ApiError::Unauthorized(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::UnknownUser => {
                ApiError::Unauthorized("User not found for token".to_string())
            }
            AuthError::DatabaseError(msg) => ApiError::Internal(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<taskboard_shared::auth::authorization::AuthzError> for ApiError {
    fn from(err: taskboard_shared::auth::authorization::AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<taskboard_shared::auth::password::PasswordError> for ApiError {
    fn from(err: taskboard_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
impl From<taskboard_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: taskboard_shared::auth::jwt::JwtError) -> Self {
        match err {
            taskboard_shared::auth::jwt::JwtError::CreateError(msg) => {
                ApiError::Internal(format!("Token creation failed: {}", msg))
            }
            other => ApiError::Unauthorized(format!("Invalid token: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collects_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "This field may not be blank.");
        errors.add("performers", "This list may not be empty.");
        errors.add("performers", "Object with username=ghost does not exist.");

        assert!(!errors.is_empty());
        assert_eq!(
            errors.field("title").unwrap(),
            &["This field may not be blank.".to_string()]
        );
        assert_eq!(errors.field("performers").unwrap().len(), 2);
    }

    #[test]
    fn test_validation_errors_serialize_as_map() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "This field is required.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "username": ["This field is required."] })
        );
    }

    #[test]
    fn test_empty_validation_errors_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::single("x", "bad").into_result().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Not found.");

        let err = ApiError::Forbidden("nope".to_string());
        assert_eq!(err.to_string(), "Forbidden: nope");
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = vec![
            (
                ApiError::Validation(ValidationErrors::single("f", "bad")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("no".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (ApiError::not_found(), StatusCode::NOT_FOUND),
            (
                ApiError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
