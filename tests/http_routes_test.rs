//! Router-level checks: requests travel through the full /api/v1 router,
//! so path parameters and query strings are exercised end to end.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use bagforge_api::{
    api_v1_routes,
    config::AppConfig,
    costing::GatePolicy,
    db::{establish_connection, run_migrations, DbPool},
    events::{Event, EventSender},
    services::inventory::CreateItemRequest,
    AppState,
};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _event_rx: mpsc::Receiver<Event>,
}

async fn test_app(db_name: &str) -> TestApp {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);
    let db = establish_connection(&url).await.expect("connect sqlite");
    run_migrations(&db).await.expect("run migrations");
    let db: Arc<DbPool> = Arc::new(db);

    let (tx, rx) = mpsc::channel(256);
    let events = Some(Arc::new(EventSender::new(tx)));

    let config = AppConfig {
        database_url: url,
        db_max_connections: 5,
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "debug".into(),
        log_json: false,
        auto_migrate: false,
        gate_policy: GatePolicy::AllCompleted,
        cors_allowed_origins: None,
    };

    let state = Arc::new(AppState::new(db, config, events));
    let router = Router::new()
        .nest("/api/v1", api_v1_routes())
        .with_state(state.clone());

    TestApp {
        router,
        state,
        _event_rx: rx,
    }
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

#[tokio::test]
async fn path_parameters_reach_the_handlers() {
    let app = test_app("routes_path_params").await;

    let item = app
        .state
        .services
        .inventory
        .create_item(CreateItemRequest {
            name: "Canvas 12oz".to_string(),
            material_type: Some("fabric".to_string()),
            unit: "m".to_string(),
            quantity: dec!(1000),
            min_stock_level: dec!(100),
            unit_rate: dec!(62),
            supplier_id: None,
        })
        .await
        .expect("create item");

    let (status, body) = get(app.router, &format!("/api/v1/inventory/{}", item.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], Value::String(item.id.to_string()));
    assert_eq!(body["name"], Value::String("Canvas 12oz".into()));
}

#[tokio::test]
async fn zero_per_page_query_lists_without_error() {
    let app = test_app("routes_zero_per_page").await;

    let (status, body) = get(app.router, "/api/v1/inventory?per_page=0").await;

    assert_eq!(status, StatusCode::OK);
    // The clamp keeps the reported page size at one.
    assert_eq!(body["pagination"]["per_page"], Value::from(1u64));
}

#[tokio::test]
async fn status_endpoint_reports_the_service() {
    let app = test_app("routes_status").await;

    let (status, body) = get(app.router, "/api/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], Value::String("bagforge-api".into()));
}
