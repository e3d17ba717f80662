/// Account endpoints
///
/// All endpoints act on the caller identified by the access token.
///
/// - `GET /v1/users/me` - Account details
/// - `PUT /v1/users/me/subscription` - Opt in or out of reminder emails
/// - `DELETE /v1/users/me` - Delete the account and its tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account details
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// Verified email
    pub email: String,

    /// Whether reminder emails are sent
    pub subscribed: bool,

    /// When the email was confirmed
    pub created_at: DateTime<Utc>,
}

/// Subscription change
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// New subscription state
    pub subscribed: bool,
}

/// Subscription state after the change
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    /// Verified email
    pub email: String,

    /// Current subscription state
    pub subscribed: bool,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Returns the caller's account
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Account deleted since the token was issued
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .find_user_by_email(&auth.email)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse {
        email: user.email,
        subscribed: user.subscribed,
        created_at: user.created_at,
    }))
}

/// Updates the reminder subscription
///
/// # Endpoint
///
/// ```text
/// PUT /v1/users/me/subscription
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "subscribed": true }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Account deleted since the token was issued
pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SubscriptionRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let updated = state
        .store
        .set_subscribed(&auth.email, req.subscribed)
        .await?;

    if !updated {
        return Err(user_not_found());
    }

    tracing::info!(
        email = %auth.email,
        subscribed = req.subscribed,
        "Subscription updated"
    );

    Ok(Json(SubscriptionResponse {
        email: auth.email,
        subscribed: req.subscribed,
    }))
}

/// Deletes the caller's account and every task it owns
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Account already deleted
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_user(&auth.email).await? {
        return Err(user_not_found());
    }

    tracing::info!(email = %auth.email, "Account deleted");

    Ok(StatusCode::NO_CONTENT)
}
