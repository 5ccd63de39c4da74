/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/` - Register a new user
/// - `POST /api/v1/auth/token/` - Issue a bearer token for credentials
///
/// Both endpoints are public; everything else in the API requires the
/// token minted here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrors},
    serializers::{
        validate_register, validate_token_request, RegisterRequest, TokenRequest, TokenResponse,
        UserResponse, MSG_WRONG_PASSWORD,
    },
};
use axum::{extract::State, http::StatusCode, Json};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/
/// Content-Type: application/json
///
/// {
///   "username": "ivan",
///   "password": "correct horse battery staple",
///   "full_name": "Ivan Petrov"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: per-field validation errors (missing/blank fields,
///   username taken, length bounds) — all collected in one response
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let validated = validate_register(&state.db, &req).await?;

    let password_hash = password::hash_password(&validated.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: validated.username,
            password_hash,
            full_name: validated.full_name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Issue a bearer token for username + password
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/token/
/// Content-Type: application/json
///
/// {
///   "username": "ivan",
///   "password": "correct horse battery staple"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: no user with that username
/// - `400 Bad Request`: `{"password": ["Incorrect password."]}`
///
/// Unknown usernames intentionally return 404 rather than a generic 401,
/// mirroring the behavior the clients of this API already rely on.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let credentials = validate_token_request(&req)?;

    let user = User::find_by_username(&state.db, &credentials.username)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let valid = password::verify_password(&credentials.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Validation(ValidationErrors::single(
            "password",
            MSG_WRONG_PASSWORD,
        )));
    }

    let claims = jwt::Claims::new(user.id, state.config.token_lifetime());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}
