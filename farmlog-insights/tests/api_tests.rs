//! HTTP routing tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use farmlog_insights::{build_router, AppState};
use helpers::{seeded_store, service};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn app() -> axum::Router {
    let store = Arc::new(seeded_store().await);
    build_router(AppState::new(Arc::new(service(&store)), false))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app().await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "farmlog-insights");
    assert_eq!(body["enhancement_enabled"], false);
}

#[tokio::test]
async fn test_list_insights_with_limit() {
    let response = app()
        .await
        .oneshot(get("/farms/farm-1/insights?limit=3&user_id=user-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let insights = body.as_array().unwrap();
    assert_eq!(insights.len(), 3);
    assert_eq!(insights[0]["id"], "pest-p-crit");
    assert_eq!(insights[0]["type"], "pest_alert");
    assert_eq!(insights[0]["priority"], "critical");
    assert_eq!(insights[0]["actionType"], "navigate");
    assert_eq!(insights[0]["timeRelevant"], true);
}

#[tokio::test]
async fn test_default_limit_when_absent() {
    let response = app().await.oneshot(get("/farms/farm-1/insights")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_limit_above_maximum_rejected() {
    let response = app()
        .await
        .oneshot(get("/farms/farm-1/insights?limit=500"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_numeric_limit_rejected() {
    let response = app()
        .await
        .oneshot(get("/farms/farm-1/insights?limit=lots"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_farm_returns_empty_list() {
    let response = app().await.oneshot(get("/farms/nowhere/insights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_categories() {
    let response = app()
        .await
        .oneshot(get("/farms/farm-1/insights/categories?user_id=user-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["pest_alert"].as_array().unwrap().len(), 2);
    assert_eq!(body["task_recommendation"][0]["id"], "task-t1");
    assert_eq!(body["growth_optimization"][0]["title"], "Flowering Stage");
}

#[tokio::test]
async fn test_execute_task_action_round_trip() {
    let app = app().await;

    let list = app
        .clone()
        .oneshot(get("/farms/farm-1/insights?limit=2"))
        .await
        .unwrap();
    let insights = body_json(list).await;
    let task = insights
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["id"] == "task-t1")
        .cloned()
        .unwrap();

    let response = app
        .oneshot(post_json("/insights/actions", &task))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "message": "Task scheduled"})
    );
}

#[tokio::test]
async fn test_unknown_action_type_reports_failure() {
    let insight = json!({
        "id": "x-1",
        "type": "market_intelligence",
        "priority": "low",
        "title": "Prices",
        "subtitle": "Mango prices rising",
        "icon": "store",
        "actionLabel": "Go",
        "actionType": "teleport",
        "confidence": 0.5,
        "timeRelevant": false,
        "source": "direct"
    });

    let response = app()
        .await
        .oneshot(post_json("/insights/actions", &insight))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Unknown action type");
}

#[tokio::test]
async fn test_malformed_action_body_rejected() {
    let response = app()
        .await
        .oneshot(post_json("/insights/actions", &json!({"id": 7})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
