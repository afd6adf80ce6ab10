//! User profile routes.

use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    routing::get,
};
use ripple_common::{
    error::{RippleError, RippleResult},
    models::user::{UpdateUserRequest, UserResponse},
    validation::validate_request,
};
use ripple_db::repository::users;
use std::sync::Arc;
use uuid::Uuid;

use crate::{AppState, middleware::AuthContext};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/@me", get(get_me).patch(update_me))
        .route("/users/{user_id}", get(get_user))
}

/// GET /api/v1/users/@me — the authenticated user's own profile.
async fn get_me(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> RippleResult<Json<UserResponse>> {
    let user = users::find_by_id(&state.db.pool, auth.user_id)
        .await?
        .ok_or(RippleError::NotFound {
            resource: "User".into(),
        })?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/@me — update profile fields.
async fn update_me(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateUserRequest>,
) -> RippleResult<Json<UserResponse>> {
    validate_request(&body)?;

    let user = users::update_user(
        &state.db.pool,
        auth.user_id,
        body.display_name.as_deref(),
        body.avatar.as_deref(),
        body.bio.as_deref(),
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, "Profile updated");
    Ok(Json(user.into()))
}

/// GET /api/v1/users/{user_id} — another user's public profile.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> RippleResult<Json<UserResponse>> {
    let user = users::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or(RippleError::NotFound {
            resource: "User".into(),
        })?;
    Ok(Json(user.into()))
}
