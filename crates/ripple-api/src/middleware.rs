//! Middleware — authentication extraction for protected routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use ripple_common::error::RippleError;
use std::sync::Arc;

use crate::AppState;

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: String,
}

/// Extract and validate the JWT from the Authorization: Bearer <token>
/// header, rejecting revoked tokens when the blocklist is available.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, RippleError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(RippleError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(RippleError::Unauthorized)?;

    let config = ripple_common::config::get();
    let claims = ripple_common::auth::validate_token(token, &config.auth.jwt_secret)
        .map_err(|_| RippleError::InvalidToken)?;

    // Ensure it's an access token, not a refresh token
    if claims.token_type != "access" {
        return Err(RippleError::InvalidToken);
    }

    if let Some(redis) = &state.db.redis {
        if ripple_db::blocklist::is_revoked(redis, token).await? {
            return Err(RippleError::TokenRevoked);
        }
    }

    let user_id = claims
        .sub
        .parse::<uuid::Uuid>()
        .map_err(|_| RippleError::InvalidToken)?;

    let auth_ctx = AuthContext {
        user_id,
        username: claims.username,
        role: claims.role,
    };

    // Insert auth context into request extensions for handlers to use
    request.extensions_mut().insert(auth_ctx);

    Ok(next.run(request).await)
}
