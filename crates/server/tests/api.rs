use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
    token: String,
}

async fn test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let token = engine
        .issue_session(user.id, Duration::hours(1))
        .await
        .unwrap();
    TestApp {
        router: server::router(engine.clone()),
        engine,
        token,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, Some(&self.token), body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_account(&self, name: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/api/accounts",
                Some(json!({ "name": name, "kind": "checking" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn requests_without_a_valid_session_are_rejected() {
    let app = test_app().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/accounts",
            None,
            Some(json!({ "name": "Checking", "kind": "checking" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = app
        .send("GET", "/api/accounts", Some("not-a-session"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app.json("GET", "/api/accounts", None).await;
    assert_eq!(body["accounts"], json!([]));
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let app = test_app().await;
    let user = app.engine.user_by_email("alice@example.com").await.unwrap();
    let stale = app
        .engine
        .issue_session(user.id, Duration::seconds(-1))
        .await
        .unwrap();

    let (status, _) = app.send("GET", "/api/accounts", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_balance_comes_from_transactions() {
    let app = test_app().await;
    let account_id = app.create_account("Checking").await;

    for (amount, date) in [(250_000, "2025-03-01"), (-4_550, "2025-03-02")] {
        let (status, _) = app
            .json(
                "POST",
                "/api/transactions",
                Some(json!({
                    "account_id": account_id,
                    "amount_minor": amount,
                    "description": "entry",
                    "transaction_date": date,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .json("GET", &format!("/api/accounts/{account_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], json!(245_450));
    assert_eq!(body["currency"], json!("USD"));
}

#[tokio::test]
async fn foreign_accounts_are_not_found() {
    let app = test_app().await;
    let bob = app.engine.create_user("bob@example.com", None).await.unwrap();
    let bob_token = app
        .engine
        .issue_session(bob.id, Duration::hours(1))
        .await
        .unwrap();
    let (status, body) = app
        .send(
            "POST",
            "/api/accounts",
            Some(&bob_token),
            Some(json!({ "name": "Bob's", "kind": "savings" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let bob_account: Value = serde_json::from_slice(&body).unwrap();
    let bob_account_id = bob_account["id"].as_str().unwrap();

    let (status, _) = app
        .json("GET", &format!("/api/accounts/{bob_account_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            "/api/transactions",
            Some(json!({
                "account_id": bob_account_id,
                "amount_minor": -100,
                "description": "sneaky",
                "transaction_date": "2025-03-01",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_errors_list_every_field() {
    let app = test_app().await;
    let account_id = app.create_account("Checking").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/transactions",
            Some(json!({
                "account_id": account_id,
                "amount_minor": 0,
                "description": "   ",
                "transaction_date": "2025-03-01",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Validation failed"));
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["amount_minor", "description"]);

    let (status, _) = app
        .json("POST", "/api/transactions", Some(json!({ "amount_minor": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_strings_get_json_errors() {
    let app = test_app().await;

    for uri in [
        "/api/recurring-payments?status=bogus",
        "/api/recurring-payments/budget-impact?horizon_days=-1",
        "/api/accounts?include_archived=maybe",
        "/api/notifications?unread_only=maybe",
    ] {
        let (status, body) = app.json("GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }

    let (status, body) = app
        .json("GET", "/api/recurring-payments/budget-impact?horizon_days=400", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("horizon_days"));

    let (status, _) = app
        .json("GET", "/api/recurring-payments?status=paused", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_account_names_conflict() {
    let app = test_app().await;
    app.create_account("Checking").await;

    let (status, _) = app
        .json(
            "POST",
            "/api/accounts",
            Some(json!({ "name": "Checking", "kind": "checking" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn transfers_move_money_between_accounts() {
    let app = test_app().await;
    let checking = app.create_account("Checking").await;
    let savings = app.create_account("Savings").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/transfers",
            Some(json!({
                "from_account_id": checking,
                "to_account_id": savings,
                "amount_minor": 10_000,
                "transaction_date": "2025-03-05",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["debit"]["amount_minor"], json!(-10_000));
    assert_eq!(body["credit"]["amount_minor"], json!(10_000));
    assert_eq!(body["debit"]["transfer_id"], body["transfer_id"]);

    let (_, body) = app
        .json("GET", &format!("/api/accounts/{savings}"), None)
        .await;
    assert_eq!(body["balance_minor"], json!(10_000));

    let (status, body) = app
        .json(
            "POST",
            "/api/transfers",
            Some(json!({
                "from_account_id": checking,
                "to_account_id": checking,
                "amount_minor": 10,
                "transaction_date": "2025-03-05",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("to_account_id"));
}

#[tokio::test]
async fn export_returns_csv() {
    let app = test_app().await;
    let account_id = app.create_account("Checking").await;
    app.json(
        "POST",
        "/api/transactions",
        Some(json!({
            "account_id": account_id,
            "amount_minor": -1_599,
            "description": "NETFLIX.COM",
            "transaction_date": "2025-03-15",
        })),
    )
    .await;

    let (status, bytes) = app
        .send(
            "GET",
            &format!("/api/transactions/export?account_id={account_id}"),
            Some(&app.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,transaction_date,account_id,amount_minor,description,category_id,transfer_id")
    );
    let row = lines.next().unwrap();
    assert!(row.contains("2025-03-15"));
    assert!(row.contains("-1599"));
    assert!(row.contains("NETFLIX.COM"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn notification_preferences_round_trip() {
    let app = test_app().await;

    let (status, body) = app
        .json(
            "PUT",
            "/api/notifications/preferences",
            Some(json!({ "utilization_threshold_pct": 50.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["utilization_threshold_pct"], json!(50.0));

    let (status, body) = app
        .json(
            "PUT",
            "/api/notifications/preferences",
            Some(json!({ "reminder_days_ahead": 90 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("reminder_days_ahead"));

    let (_, body) = app
        .json("GET", "/api/notifications/preferences", None)
        .await;
    assert_eq!(body["utilization_threshold_pct"], json!(50.0));
}

#[tokio::test]
async fn goal_contributions_complete_the_goal() {
    let app = test_app().await;

    let (status, goal) = app
        .json(
            "POST",
            "/api/savings-goals",
            Some(json!({ "name": "Bike", "target_minor": 50_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["priority"], json!("medium"));
    let goal_id = goal["id"].as_str().unwrap();

    let (status, body) = app
        .json(
            "POST",
            &format!("/api/savings-goals/{goal_id}/contributions"),
            Some(json!({ "amount_minor": 50_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("completed"));
    assert_eq!(body["remaining_minor"], json!(0));

    let (_, body) = app.json("GET", "/api/notifications", None).await;
    assert_eq!(body["notifications"][0]["kind"], json!("goal_completed"));
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = test_app().await;

    let (status, _) = app.json("DELETE", "/api/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.json("GET", "/api/accounts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
