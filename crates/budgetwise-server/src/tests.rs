//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use budgetwise_core::ai::{MockBackend, MockBehavior};
use budgetwise_core::db::Database;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn setup_app_with(config: ServerConfig, ai: Option<AIClient>) -> Router {
    let db = Database::in_memory().unwrap();
    create_router_with_options(db, None, config, Settings::default(), ai)
}

fn setup_test_app() -> Router {
    let config = ServerConfig {
        require_auth: false,
        dev_user: "alice".to_string(),
        ..Default::default()
    };
    setup_app_with(config, Some(AIClient::mock()))
}

fn setup_auth_app() -> Router {
    let config = ServerConfig {
        require_auth: true,
        jwt_secret: Some(SECRET.to_string()),
        ..Default::default()
    };
    setup_app_with(config, Some(AIClient::mock()))
}

fn token(sub: &str, admin: bool) -> String {
    let claims = IdentityClaims {
        sub: sub.to_string(),
        email: Some(format!("{}@example.com", sub)),
        admin,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    bearer: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = send(app, "GET", uri, None, None).await;
    let status = response.status();
    (status, get_body_json(response).await)
}

/// Writes land in the background; poll until the list reaches `count`
async fn wait_for_transactions(app: &Router, count: usize) -> serde_json::Value {
    for _ in 0..100 {
        let (_, json) = get_json(app, "/api/transactions").await;
        if json["transactions"].as_array().map(Vec::len) == Some(count) {
            return json;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("transactions never reached {}", count);
}

async fn add_transaction(app: &Router, date: &str, category: &str, amount: f64, kind: &str) {
    let body = serde_json::json!({
        "date": date,
        "merchant": "Corner Market",
        "category": category,
        "amount": amount,
        "type": kind,
    });
    let response = send(app, "POST", "/api/transactions", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

// ========== Status ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();
    let (status, json) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_status_lists_services() {
    let app = setup_test_app();
    let (status, json) = get_json(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);

    let services = json["services"].as_array().unwrap();
    assert_eq!(services.len(), 5);
    assert_eq!(services[2]["name"], "Database");
    assert_eq!(services[2]["status"], "operational");
    assert_eq!(services[3]["status"], "degraded");
}

#[tokio::test]
async fn test_categories() {
    let app = setup_test_app();
    let (status, json) = get_json(&app, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);

    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 12);
    assert_eq!(categories[0]["category"], "Groceries");
    assert_eq!(categories[0]["icon"], "utensils-crossed");
    assert_eq!(categories[11]["budgetable"], false);
}

// ========== Transactions ==========

#[tokio::test]
async fn test_create_and_list_transactions() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "date": "2024-03-04",
        "merchant": "Corner Market",
        "category": "Groceries",
        "amount": 42.5,
        "type": "expense",
    });
    let response = send(&app, "POST", "/api/transactions", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = get_body_json(response).await;
    let id = json["id"].as_str().unwrap().to_string();
    assert_eq!(json["path"], format!("users/alice/transactions/{}", id));

    let listed = wait_for_transactions(&app, 1).await;
    let tx = &listed["transactions"][0];
    assert_eq!(tx["id"], id.as_str());
    assert_eq!(tx["date"], "2024-03-04");
    assert_eq!(tx["type"], "expense");
    assert_eq!(tx["amount"], 42.5);
}

#[tokio::test]
async fn test_create_transaction_rejects_invalid_amount() {
    let app = setup_test_app();
    let body = serde_json::json!({
        "date": "2024-03-04",
        "merchant": "Corner Market",
        "category": "Groceries",
        "amount": 0,
        "type": "expense",
    });
    let response = send(&app, "POST", "/api/transactions", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid data"));
}

#[tokio::test]
async fn test_update_transaction() {
    let app = setup_test_app();
    add_transaction(&app, "2024-03-04", "Groceries", 10.0, "expense").await;
    let listed = wait_for_transactions(&app, 1).await;
    let id = listed["transactions"][0]["id"].as_str().unwrap().to_string();

    let body = serde_json::json!({
        "date": "2024-03-05",
        "merchant": "Train",
        "category": "Transport",
        "amount": 12,
        "type": "expense",
    });
    let response = send(
        &app,
        "PUT",
        &format!("/api/transactions/{}", id),
        Some(body),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    for _ in 0..100 {
        let (_, json) = get_json(&app, "/api/transactions").await;
        if json["transactions"][0]["merchant"] == "Train" {
            assert_eq!(json["transactions"][0]["category"], "Transport");
            assert_eq!(json["transactions"].as_array().unwrap().len(), 1);
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("update never landed");
}

#[tokio::test]
async fn test_update_missing_transaction_is_notified() {
    let app = setup_test_app();
    let body = serde_json::json!({
        "date": "2024-03-05",
        "merchant": "Ghost",
        "category": "Other",
        "amount": 1,
        "type": "expense",
    });
    let response = send(&app, "PUT", "/api/transactions/missing", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    for _ in 0..100 {
        let (status, json) = get_json(&app, "/api/notifications").await;
        assert_eq!(status, StatusCode::OK);
        if let Some(first) = json.as_array().and_then(|a| a.first()) {
            assert_eq!(first["kind"], "not_found");
            assert_eq!(first["operation"], "update");
            assert_eq!(first["path"], "users/alice/transactions/missing");
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("failure never reached notifications");
}

// ========== Budgets & reports ==========

#[tokio::test]
async fn test_budgets_with_spent() {
    let app = setup_test_app();
    add_transaction(&app, "2024-03-04", "Groceries", 150.0, "expense").await;
    wait_for_transactions(&app, 1).await;

    let response = send(
        &app,
        "PUT",
        "/api/budgets/groceries",
        Some(serde_json::json!({"amount": 300})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = get_body_json(response).await;
    assert_eq!(json["path"], "users/alice/budgets/Groceries");

    for _ in 0..100 {
        let (_, json) = get_json(&app, "/api/budgets").await;
        if let Some(budget) = json.as_array().and_then(|a| a.first()) {
            assert_eq!(budget["category"], "Groceries");
            assert_eq!(budget["spent"], 150.0);
            assert_eq!(budget["utilization_percent"], 50.0);
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("budget never landed");
}

#[tokio::test]
async fn test_set_budget_rejects_bad_categories() {
    let app = setup_test_app();
    for category in ["Nope", "Income"] {
        let response = send(
            &app,
            "PUT",
            &format!("/api/budgets/{}", category),
            Some(serde_json::json!({"amount": 100})),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_dashboard() {
    let app = setup_test_app();
    add_transaction(&app, "2024-03-01", "Income", 3000.0, "income").await;
    add_transaction(&app, "2024-03-04", "Groceries", 150.0, "expense").await;
    add_transaction(&app, "2024-03-09", "Housing", 1200.0, "expense").await;
    wait_for_transactions(&app, 3).await;

    let (status, json) = get_json(&app, "/api/dashboard?recent=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_income"], 3000.0);
    assert_eq!(json["total_expenses"], 1350.0);
    assert_eq!(json["balance"], 1650.0);
    assert_eq!(json["spending_by_category"]["Housing"], 1200.0);
    assert!(json["spending_by_category"].get("Income").is_none());
    assert_eq!(json["recent_transactions"].as_array().unwrap().len(), 2);
    assert_eq!(json["category_breakdown"][0]["category"], "Housing");
}

#[tokio::test]
async fn test_trend_lengths() {
    let app = setup_test_app();
    let (status, json) = get_json(&app, "/api/reports/trend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 6);

    let (_, json) = get_json(&app, "/api/reports/trend?months=100").await;
    assert_eq!(json.as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_spending_report_empty() {
    let app = setup_test_app();
    let (status, json) = get_json(&app, "/api/reports/spending").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

// ========== Forecast ==========

#[tokio::test]
async fn test_forecast_requires_history() {
    let app = setup_test_app();
    let response = send(&app, "POST", "/api/forecast", None, None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_forecast_with_mock_backend() {
    let app = setup_test_app();
    add_transaction(&app, "2024-02-04", "Groceries", 100.0, "expense").await;
    add_transaction(&app, "2024-03-04", "Groceries", 200.0, "expense").await;
    wait_for_transactions(&app, 2).await;

    let response = send(
        &app,
        "POST",
        "/api/forecast",
        Some(serde_json::json!({"horizon": "next quarter"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["horizon"], "next quarter");
    assert_eq!(json["predicted_spending"]["Groceries"], 150.0);
    assert_eq!(json["confidence"], "medium");

    let (_, state) = get_json(&app, "/api/forecast/state").await;
    assert_eq!(state["state"], "succeeded");
}

#[tokio::test]
async fn test_forecast_failure_maps_to_bad_gateway() {
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let ai = AIClient::Mock(MockBackend::with_behavior(MockBehavior::Fail));
    let app = setup_app_with(config, Some(ai));
    add_transaction(&app, "2024-03-04", "Groceries", 10.0, "expense").await;
    wait_for_transactions(&app, 1).await;

    let response = send(&app, "POST", "/api/forecast", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let (_, state) = get_json(&app, "/api/forecast/state").await;
    assert_eq!(state["state"], "failed");
    assert_eq!(state["kind"], "prediction_failed");
}

#[tokio::test]
async fn test_forecast_without_backend() {
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let app = setup_app_with(config, None);
    let response = send(&app, "POST", "/api/forecast", None, None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (_, state) = get_json(&app, "/api/forecast/state").await;
    assert_eq!(state["state"], "idle");
}

// ========== Identity ==========

#[tokio::test]
async fn test_me_requires_identity() {
    let app = setup_auth_app();
    let response = send(&app, "GET", "/api/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", "/api/me", None, Some("not-a-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bob = token("bob", false);
    let response = send(&app, "GET", "/api/me", None, Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["user_id"], "bob");
    assert_eq!(json["email"], "bob@example.com");
    assert_eq!(json["is_admin"], false);
}

#[tokio::test]
async fn test_public_endpoints_without_token() {
    let app = setup_auth_app();
    let response = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_write_is_rejected() {
    let app = setup_auth_app();
    let body = serde_json::json!({
        "date": "2024-03-04",
        "merchant": "Corner Market",
        "category": "Groceries",
        "amount": 5,
        "type": "expense",
    });
    let response = send(&app, "POST", "/api/transactions", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_deletion_not_implemented() {
    let app = setup_test_app();
    let response = send(&app, "DELETE", "/api/me", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_update_me_uses_token_email() {
    let app = setup_auth_app();
    let bob = token("bob", false);
    let response = send(&app, "PUT", "/api/me", Some(serde_json::json!({})), Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = get_body_json(response).await;
    assert_eq!(json["path"], "users/bob");
}

// ========== Admin ==========

#[tokio::test]
async fn test_admin_endpoints_require_admin_claim() {
    let app = setup_auth_app();
    let bob = token("bob", false);
    for uri in [
        "/api/admin/overview",
        "/api/admin/users",
        "/api/admin/users/bob",
        "/api/admin/transactions",
    ] {
        let response = send(&app, "GET", uri, None, Some(&bob)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let response = send(&app, "GET", "/api/admin/overview", None, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_overview_across_users() {
    let app = setup_auth_app();
    for (user, amount) in [("alice", 30), ("bob", 12)] {
        let body = serde_json::json!({
            "date": "2024-03-04",
            "merchant": "Corner Market",
            "category": "Groceries",
            "amount": amount,
            "type": "expense",
        });
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(body),
            Some(&token(user, false)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let admin = token("root", true);
    for _ in 0..100 {
        let response = send(&app, "GET", "/api/admin/overview", None, Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_body_json(response).await;
        if json["total_transactions"] == 2 {
            assert_eq!(json["total_users"], 2);
            assert_eq!(json["total_expenses"], 42.0);

            let response = send(&app, "GET", "/api/admin/users", None, Some(&admin)).await;
            let rows = get_body_json(response).await;
            assert_eq!(rows.as_array().unwrap().len(), 2);
            assert_eq!(rows[0]["id"], "alice");

            let response =
                send(&app, "GET", "/api/admin/users/bob", None, Some(&admin)).await;
            let detail = get_body_json(response).await;
            assert_eq!(detail["transactions"].as_array().unwrap().len(), 1);

            let response = send(
                &app,
                "GET",
                "/api/admin/transactions?limit=1",
                None,
                Some(&admin),
            )
            .await;
            let latest = get_body_json(response).await;
            assert_eq!(latest.as_array().unwrap().len(), 1);
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("writes never landed");
}

#[test]
fn test_resolve_session() {
    let admin = resolve_session(&token("root", true), Some(SECRET)).unwrap();
    assert_eq!(admin.user_id(), Some("root"));
    assert!(admin.is_admin());

    assert!(resolve_session(&token("root", true), Some("wrong")).is_err());
    assert!(resolve_session(&token("root", true), None).is_err());
}
