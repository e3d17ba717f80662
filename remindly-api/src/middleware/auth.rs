//! JWT authentication middleware
//!
//! Validates the `Authorization: Bearer <token>` header and adds an
//! [`AuthContext`] to the request extensions. Handlers read it with
//! `Extension<AuthContext>`.
//!
//! ```no_run
//! use axum::Extension;
//! use remindly_api::middleware::auth::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("Hello, {}!", auth.email)
//! }
//! ```

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use remindly_shared::auth::jwt;

use crate::{app::AppState, error::ApiError};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Email of the verified user the token was issued to
    pub email: String,
}

/// Extracts the token from an `Authorization` header value
fn bearer_token(header_value: &str) -> Result<&str, ApiError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))
}

/// Rejects requests without a valid access token
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)?;
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext { email: claims.sub });

    Ok(next.run(req).await)
}
