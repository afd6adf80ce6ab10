//! Authentication routes — register, login, refresh, logout.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use ripple_common::{
    error::{RippleError, RippleResult},
    id,
    models::user::{CreateUserRequest, LoginRequest, UserResponse},
    validation::validate_request,
};
use ripple_db::{blocklist, repository::users};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    AppState,
    auth::{self, TokenPair},
};

/// Auth router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
}

#[derive(Serialize)]
struct AuthResponse {
    user: UserResponse,
    #[serde(flatten)]
    tokens: TokenPair,
}

/// POST /api/v1/auth/register
///
/// Create a new account. Returns user profile + JWT tokens.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> RippleResult<Json<AuthResponse>> {
    validate_request(&body)?;

    // Check username availability
    if users::find_by_username(&state.db.pool, &body.username)
        .await?
        .is_some()
    {
        return Err(RippleError::AlreadyExists {
            resource: "Username".into(),
        });
    }

    // Check email availability (if provided)
    if let Some(ref email) = body.email {
        if users::find_by_email(&state.db.pool, email).await?.is_some() {
            return Err(RippleError::AlreadyExists {
                resource: "Email".into(),
            });
        }
    }

    let password_hash = auth::hash_password(&body.password)
        .map_err(|e| RippleError::Internal(anyhow::anyhow!("{e}")))?;

    let user = users::create_user(
        &state.db.pool,
        id::generate_id(),
        &body.username,
        body.email.as_deref(),
        &password_hash,
    )
    .await?;

    let config = ripple_common::config::get();
    let tokens = auth::generate_token_pair(
        user.id,
        &user.username,
        &user.role,
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    )
    .map_err(|e| RippleError::Internal(e.into()))?;

    tracing::info!(user_id = %user.id, username = %user.username, "New user registered");

    Ok(Json(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns JWT tokens.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> RippleResult<Json<AuthResponse>> {
    validate_request(&body)?;

    let user = users::find_by_username(&state.db.pool, &body.username)
        .await?
        .ok_or(RippleError::InvalidCredentials)?;

    let valid = auth::verify_password(&body.password, &user.password_hash)
        .map_err(|_| RippleError::InvalidCredentials)?;
    if !valid {
        return Err(RippleError::InvalidCredentials);
    }

    let config = ripple_common::config::get();
    let tokens = auth::generate_token_pair(
        user.id,
        &user.username,
        &user.role,
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    )
    .map_err(|e| RippleError::Internal(e.into()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new token pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> RippleResult<Json<TokenPair>> {
    let config = ripple_common::config::get();

    let claims = ripple_common::auth::validate_token(&body.refresh_token, &config.auth.jwt_secret)
        .map_err(|_| RippleError::InvalidToken)?;

    if claims.token_type != "refresh" {
        return Err(RippleError::InvalidToken);
    }

    if let Some(redis) = &state.db.redis {
        if blocklist::is_revoked(redis, &body.refresh_token).await? {
            return Err(RippleError::TokenRevoked);
        }
    }

    let user_id: uuid::Uuid = claims.sub.parse().map_err(|_| RippleError::InvalidToken)?;

    // Verify the user still exists
    let user = users::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or(RippleError::InvalidToken)?;

    let tokens = auth::generate_token_pair(
        user.id,
        &user.username,
        &user.role,
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    )
    .map_err(|e| RippleError::Internal(e.into()))?;

    Ok(Json(tokens))
}

#[derive(serde::Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct LogoutRequest {
    refresh_token: Option<String>,
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented access token (and, if supplied, the refresh token)
/// for the remainder of their validity. Without Redis configured this is a
/// no-op server-side and the client simply discards its tokens.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LogoutRequest>,
) -> RippleResult<StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(RippleError::Unauthorized)?;

    let config = ripple_common::config::get();
    let claims = ripple_common::auth::validate_token(token, &config.auth.jwt_secret)
        .map_err(|_| RippleError::InvalidToken)?;

    if let Some(redis) = &state.db.redis {
        let now = chrono::Utc::now().timestamp();
        blocklist::revoke(redis, token, claims.exp - now).await?;

        if let Some(refresh) = &body.refresh_token {
            if let Ok(refresh_claims) =
                ripple_common::auth::validate_token(refresh, &config.auth.jwt_secret)
            {
                blocklist::revoke(redis, refresh, refresh_claims.exp - now).await?;
            }
        }
    }

    tracing::info!(user = %claims.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
