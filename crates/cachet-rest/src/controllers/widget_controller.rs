//! Widget catalogue controller.
//!
//! Reads are cached and depend on [`Widget`]; writes publish mutations so
//! those entries are invalidated.

use crate::{
    middleware::ResponseCache,
    repository::{Widget, WidgetInput},
    responses::AppError,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cachet_core::{CachetError, Model};
use cachet_service::{handler_identity, ModelChanged};
use serde::Deserialize;
use tracing::debug;

/// Creates the widget router.
pub fn router(cache: &ResponseCache) -> Router<AppState> {
    let list = cache.wrap(
        get(list_widgets),
        handler_identity!(list_widgets),
        cache.options().cache_user(false).depends_on_model::<Widget>(),
    );
    let detail = cache.wrap(
        get(get_widget),
        handler_identity!(get_widget),
        cache.options().cache_user(false).depends_on_model::<Widget>(),
    );

    Router::new()
        .route("/", list.post(create_widget))
        .route("/:pk", detail.put(update_widget).delete(delete_widget))
}

/// Query parameters for listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

async fn list_widgets(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Widget>> {
    debug!(category = ?query.category, "List widgets request");
    Json(state.widgets.list(query.category.as_deref()))
}

async fn get_widget(
    State(state): State<AppState>,
    Path(pk): Path<u64>,
) -> Result<Json<Widget>, AppError> {
    state
        .widgets
        .find(pk)
        .map(Json)
        .ok_or_else(|| CachetError::not_found(format!("widget {pk}")).into())
}

async fn create_widget(
    State(state): State<AppState>,
    Json(input): Json<WidgetInput>,
) -> (StatusCode, Json<Widget>) {
    let widget = state.widgets.create(input);
    state
        .publish(ModelChanged::saved(Widget::model_type(), widget.id.to_string(), true))
        .await;
    (StatusCode::CREATED, Json(widget))
}

async fn update_widget(
    State(state): State<AppState>,
    Path(pk): Path<u64>,
    Json(input): Json<WidgetInput>,
) -> Result<Json<Widget>, AppError> {
    let widget = state
        .widgets
        .update(pk, input)
        .ok_or_else(|| CachetError::not_found(format!("widget {pk}")))?;
    state
        .publish(ModelChanged::saved(Widget::model_type(), pk.to_string(), false))
        .await;
    Ok(Json(widget))
}

async fn delete_widget(
    State(state): State<AppState>,
    Path(pk): Path<u64>,
) -> Result<StatusCode, AppError> {
    if !state.widgets.delete(pk) {
        return Err(CachetError::not_found(format!("widget {pk}")).into());
    }
    state
        .publish(ModelChanged::deleted(Widget::model_type(), pk.to_string()))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
