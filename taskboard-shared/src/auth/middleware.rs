/// Request authentication helpers
///
/// Extracts the bearer token from the `Authorization` header, validates it,
/// and resolves the subject to a live user record. The API server wraps
/// [`authenticate`] in an Axum middleware layer and stores the resulting
/// [`AuthUser`] in request extensions.
///
/// A structurally valid token whose subject no longer exists in the
/// database does not authenticate: deleting an account revokes its tokens.

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Authenticated caller identity added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor:
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthUser;
///
/// async fn handler(Extension(caller): Extension<AuthUser>) -> String {
///     format!("Hello, {}!", caller.username)
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Authenticated user ID
    pub id: Uuid,

    /// Username of the authenticated user
    pub username: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Error type for request authentication
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token subject does not resolve to an existing user
    UnknownUser,

    /// Database error during user lookup
    DatabaseError(String),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
///
/// Validates the bearer token and looks the subject up in the database.
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when no Authorization header is present
/// - [`AuthError::InvalidFormat`] when the header is not `Bearer <token>`
/// - [`AuthError::InvalidToken`] when the token is expired or malformed
/// - [`AuthError::UnknownUser`] when the subject has no user record
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(user.into())
}
