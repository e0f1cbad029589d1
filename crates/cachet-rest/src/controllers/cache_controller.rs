//! Manual cache invalidation endpoints.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::delete,
    Router,
};
use cachet_core::{ModelType, Principal};
use serde::{Deserialize, Serialize};

/// Creates the cache administration router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(invalidate_pattern))
        .route("/models/:namespace/:name", delete(invalidate_model))
        .route("/users/:id", delete(invalidate_user))
}

/// Number of entries removed by an invalidation.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidationReport {
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct PatternQuery {
    pub pattern: String,
}

async fn invalidate_pattern(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> ApiResult<InvalidationReport> {
    let deleted = state.invalidation.invalidate_by_pattern(&query.pattern).await?;
    ok(InvalidationReport { deleted })
}

async fn invalidate_model(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<InvalidationReport> {
    let model = ModelType::from_parts(namespace, name);
    let deleted = state.invalidation.invalidate_model(&model).await?;
    ok(InvalidationReport { deleted })
}

async fn invalidate_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<InvalidationReport> {
    let deleted = state.invalidation.invalidate_user(&Principal::user(id)).await?;
    ok(InvalidationReport { deleted })
}
