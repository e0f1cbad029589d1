//! HTTP-level caching and invalidation through the full router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use cachet_config::AppConfig;
use cachet_rest::{create_router, X_CACHE};
use cachet_service::{InvalidationServiceComponent, MemoryCacheService};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

shaku::module! {
    TestModule {
        components = [MemoryCacheService, InvalidationServiceComponent],
        providers = []
    }
}

fn app() -> Router {
    let module = TestModule::builder().build();
    create_router(&module, &AppConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_widget(app: &Router, name: &str, category: &str) -> Value {
    let request = Request::post("/api/v1/widgets")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "name": name, "category": category }).to_string(),
        ))
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

fn cache_status(response: &Response) -> &str {
    response.headers()[X_CACHE].to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_list_is_cached_until_a_widget_is_created() {
    let app = app();
    post_widget(&app, "sprocket", "parts").await;

    let first = get(&app, "/api/v1/widgets").await;
    assert_eq!(cache_status(&first), "MISS");
    let second = get(&app, "/api/v1/widgets").await;
    assert_eq!(cache_status(&second), "HIT");
    assert_eq!(json_body(second).await.as_array().unwrap().len(), 1);

    post_widget(&app, "gear", "parts").await;

    let third = get(&app, "/api/v1/widgets").await;
    assert_eq!(cache_status(&third), "MISS");
    assert_eq!(json_body(third).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cached_response_keeps_content_type() {
    let app = app();
    post_widget(&app, "sprocket", "parts").await;

    get(&app, "/api/v1/widgets/1").await;
    let hit = get(&app, "/api/v1/widgets/1").await;

    assert_eq!(cache_status(&hit), "HIT");
    assert_eq!(hit.headers()["content-type"], "application/json");
    assert_eq!(json_body(hit).await["name"], "sprocket");
}

#[tokio::test]
async fn test_missing_widget_is_not_stored() {
    let app = app();

    let first = get(&app, "/api/v1/widgets/7").await;
    assert_eq!(first.status(), StatusCode::NOT_FOUND);
    assert_eq!(cache_status(&first), "BYPASS");

    post_widget(&app, "sprocket", "parts").await;
    let found = get(&app, "/api/v1/widgets/1").await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(cache_status(&found), "MISS");
}

#[tokio::test]
async fn test_update_invalidates_detail() {
    let app = app();
    post_widget(&app, "sprocket", "parts").await;
    get(&app, "/api/v1/widgets/1").await;

    let request = Request::put("/api/v1/widgets/1")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "name": "cog", "category": "parts" }).to_string(),
        ))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let after = get(&app, "/api/v1/widgets/1").await;
    assert_eq!(cache_status(&after), "MISS");
    assert_eq!(json_body(after).await["name"], "cog");
}

#[tokio::test]
async fn test_language_varies_entry() {
    let app = app();
    post_widget(&app, "sprocket", "parts").await;
    get(&app, "/api/v1/widgets").await;

    let german = Request::get("/api/v1/widgets")
        .header("accept-language", "de")
        .body(Body::empty())
        .unwrap();
    assert_eq!(cache_status(&send(&app, german).await), "MISS");
}

#[tokio::test]
async fn test_manual_model_invalidation() {
    let app = app();
    post_widget(&app, "sprocket", "parts").await;
    get(&app, "/api/v1/widgets").await;
    get(&app, "/api/v1/widgets/1").await;

    let request = Request::delete("/api/v1/cache/models/shop/Widget")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["deleted"], 2);
    assert_eq!(cache_status(&get(&app, "/api/v1/widgets").await), "MISS");
}

#[tokio::test]
async fn test_empty_pattern_is_rejected() {
    let app = app();

    let request = Request::delete("/api/v1/cache?pattern=")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_malformed_model_is_rejected() {
    let app = app();

    let request = Request::delete("/api/v1/cache/models/shop/Wid,get")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "INVALID_INPUT");
}

fn profile_get(user: Option<&str>, uri: &str) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_profile_is_cached_per_user() {
    let app = app();

    let first = send(&app, profile_get(Some("7"), "/api/v1/me")).await;
    assert_eq!(cache_status(&first), "MISS");
    let again = send(&app, profile_get(Some("7"), "/api/v1/me")).await;
    assert_eq!(cache_status(&again), "HIT");
    let other = send(&app, profile_get(Some("8"), "/api/v1/me")).await;
    assert_eq!(cache_status(&other), "MISS");
    assert_eq!(json_body(other).await["user_id"], "8");
}

#[tokio::test]
async fn test_profile_update_clears_only_that_users_entries() {
    let app = app();
    send(&app, profile_get(Some("7"), "/api/v1/me")).await;
    send(&app, profile_get(Some("8"), "/api/v1/me")).await;

    let request = Request::put("/api/v1/me")
        .header("x-user-id", "7")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "display_name": "Ann" }).to_string()))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let seven = send(&app, profile_get(Some("7"), "/api/v1/me")).await;
    assert_eq!(cache_status(&seven), "MISS");
    assert_eq!(json_body(seven).await["display_name"], "Ann");
    let eight = send(&app, profile_get(Some("8"), "/api/v1/me")).await;
    assert_eq!(cache_status(&eight), "HIT");
}

#[tokio::test]
async fn test_user_query_param_cannot_read_user_profile() {
    let app = app();
    send(&app, profile_get(Some("42"), "/api/v1/me")).await;

    let response = send(&app, profile_get(None, "/api/v1/me?user=42")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(cache_status(&response), "BYPASS");
}

#[tokio::test]
async fn test_health() {
    let response = get(&app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["name"], "memory");
}
