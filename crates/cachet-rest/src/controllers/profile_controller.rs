//! Profile of the calling user.
//!
//! The read is cached per user; a write publishes a mutation of the user
//! model, which clears every entry cached for that user.

use crate::{
    extractors::CurrentPrincipal,
    middleware::ResponseCache,
    repository::{Profile, ProfileInput},
    responses::AppError,
    state::AppState,
};
use axum::{extract::State, routing::get, Json, Router};
use cachet_core::{CachetError, Model, UserId};
use cachet_service::{handler_identity, ModelChanged};

/// Creates the profile router.
pub fn router(cache: &ResponseCache) -> Router<AppState> {
    let me = cache.wrap(
        get(get_profile),
        handler_identity!(get_profile),
        cache.options().cache_user(true),
    );

    Router::new().route("/", me.put(update_profile))
}

fn require_user(principal: &CurrentPrincipal) -> Result<&UserId, AppError> {
    principal
        .user_id()
        .ok_or_else(|| CachetError::unauthorized("profile requires an authenticated user").into())
}

async fn get_profile(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
) -> Result<Json<Profile>, AppError> {
    let user = require_user(&principal)?;
    Ok(Json(state.profiles.get_or_default(user.as_str())))
}

async fn update_profile(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>, AppError> {
    let user = require_user(&principal)?;
    let (profile, created) = state.profiles.upsert(user.as_str(), input);
    state
        .publish(ModelChanged::saved(Profile::model_type(), user.as_str(), created))
        .await;
    Ok(Json(profile))
}
