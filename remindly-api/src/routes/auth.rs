/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Start a registration, mails a confirmation link
/// - `GET /v1/auth/confirm-email?token=` - Redeem the link, creating the user
/// - `POST /v1/auth/login` - Exchange credentials for an access token
///
/// A registration is not an account: nothing can log in until the emailed link
/// has been followed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use remindly_shared::{
    auth::{jwt, password},
    registration::normalize_email,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Normalised email the link was sent to
    pub email: String,

    /// What happens next
    pub message: String,
}

/// Confirmation query string
#[derive(Debug, Deserialize)]
pub struct ConfirmEmailQuery {
    /// Token from the emailed link
    pub token: String,
}

/// Confirmed account
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmEmailResponse {
    /// Verified email
    pub email: String,

    /// Reminder subscription, always false for a new account
    pub subscribed: bool,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Seconds until the access token expires
    pub expires_in: i64,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// `202 Accepted`. Repeating the request for an unconfirmed email sends a new
/// link and invalidates the old one.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered and confirmed
/// - `422 Unprocessable Entity`: Validation failed
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)])
    })?;

    let email = normalize_email(&req.email);
    state
        .registration
        .request_registration(&email, &req.password)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RegisterResponse {
            email,
            message: "Check your inbox for a confirmation link".to_string(),
        }),
    ))
}

/// Confirm an email address
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/confirm-email?token=<token>
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "email": "user@example.com", "subscribed": false }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Token unknown, already used, or superseded
/// - `409 Conflict`: Email was confirmed in the meantime
/// - `500 Internal Server Error`: Server error
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> ApiResult<(StatusCode, Json<ConfirmEmailResponse>)> {
    let user = state.registration.confirm_registration(&query.token).await?;

    Ok((
        StatusCode::CREATED,
        Json(ConfirmEmailResponse {
            email: user.email,
            subscribed: user.subscribed,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 86400
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials, or email not confirmed yet
/// - `422 Unprocessable Entity`: Validation failed
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = jwt::Claims::with_expiration(
        user.email,
        chrono::Duration::hours(state.config.jwt.expiration_hours),
    );
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(email = %claims.sub, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: claims.lifetime_seconds(),
    }))
}
