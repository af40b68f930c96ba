use axum::http::StatusCode;
use chrono::{Duration, Utc};
use ridederby::api::{self, AppState};
use ridederby::config::Config;
use ridederby::db::init_db;
use ridederby::finalize::Finalizer;
use ridederby::notify::{NotificationSink, StoreSink};
use ridederby::Repository;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    state: AppState,
    _temp: TempDir,
}

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: ":memory:".to_string(),
        join_code_length: 6,
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let sink: Arc<dyn NotificationSink> = Arc::new(StoreSink::new(repo.clone()));
    let finalizer = Arc::new(Finalizer::new(repo.clone(), sink));
    let state = AppState::new(repo, test_config(), finalizer);
    let app = api::create_router(state.clone());

    TestApp {
        app,
        state,
        _temp: temp_dir,
    }
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    user: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user);

    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let res = app.oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

fn day(offset: i64) -> String {
    (Utc::now().date_naive() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

/// Create a competition as `host` and return its join code.
async fn create_competition(test_app: &TestApp, host: &str, body: serde_json::Value) -> String {
    let (status, v) = send(test_app.app.clone(), "POST", "/v1/competitions", host, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    v["code"].as_str().unwrap().to_string()
}

fn base_request() -> serde_json::Value {
    json!({
        "name": "Weekly Race",
        "goalValue": 1000,
        "prizeValue": 500,
        "startDate": day(-1),
        "endDate": day(7),
    })
}

#[tokio::test]
async fn test_join_checks_password_then_capacity() {
    let test_app = setup_test_app().await;

    let mut body = base_request();
    body["password"] = json!("segredo");
    body["maxMembers"] = json!(2);
    let code = create_competition(&test_app, "driver-ana", body).await;

    // Wrong, empty, and missing passwords are all rejected.
    for password in [json!("errado"), json!(""), json!("   "), serde_json::Value::Null] {
        let (status, _) = send(
            test_app.app.clone(),
            "POST",
            "/v1/competitions/join",
            "driver-bia",
            Some(json!({ "code": code, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code, "password": "segredo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["alreadyMember"], false);
    assert_eq!(v["code"], code.as_str());
    assert_eq!(v["name"], "Weekly Race");

    // Rejoining is a soft success and skips the password check.
    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["alreadyMember"], true);

    // The host fills the first of two seats, so the third driver is out.
    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-caio",
        Some(json!({ "code": code, "password": "segredo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["error"], "competition is full");
}

#[tokio::test]
async fn test_join_open_competition_ignores_password() {
    let test_app = setup_test_app().await;
    let code = create_competition(&test_app, "driver-ana", base_request()).await;

    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code, "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["alreadyMember"], false);
}

#[tokio::test]
async fn test_join_unknown_code_is_not_found() {
    let test_app = setup_test_app().await;

    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": "ZZZZZZ" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_rejected_after_competition_ends() {
    let test_app = setup_test_app().await;

    let mut body = base_request();
    body["startDate"] = json!(day(-10));
    body["endDate"] = json!(day(-1));
    let code = create_competition(&test_app, "driver-ana", body).await;

    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["error"], "competition has ended");
}

#[tokio::test]
async fn test_leave_competition() {
    let test_app = setup_test_app().await;
    let code = create_competition(&test_app, "driver-ana", base_request()).await;
    send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code })),
    )
    .await;

    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/competitions/{}/leave", code),
        "driver-bia",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["left"], true);

    // Leaving twice finds no membership.
    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/competitions/{}/leave", code),
        "driver-bia",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, v) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/competitions/{}/leave", code),
        "driver-ana",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        v["error"],
        "the host cannot leave; delete the competition instead"
    );
}

#[tokio::test]
async fn test_delete_competition_is_host_only() {
    let test_app = setup_test_app().await;
    let code = create_competition(&test_app, "driver-ana", base_request()).await;
    send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-bia",
        Some(json!({ "code": code })),
    )
    .await;

    let (status, _) = send(
        test_app.app.clone(),
        "DELETE",
        &format!("/v1/competitions/{}", code),
        "driver-bia",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, v) = send(
        test_app.app.clone(),
        "DELETE",
        &format!("/v1/competitions/{}", code),
        "driver-ana",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["deleted"], true);

    // A deleted competition is gone for reads and joins alike.
    let (status, _) = send(
        test_app.app.clone(),
        "GET",
        &format!("/v1/competitions/{}/dashboard", code),
        "driver-ana",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-caio",
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_competition_validations() {
    let test_app = setup_test_app().await;

    let cases = [
        ("blank name", json!({ "name": "   " })),
        ("zero goal", json!({ "goalValue": 0 })),
        ("negative prize", json!({ "prizeValue": -10 })),
        ("end before start", json!({ "endDate": day(-5) })),
        ("zero capacity", json!({ "maxMembers": 0 })),
        ("team size without teams", json!({ "teamSize": 2 })),
        (
            "zero team size",
            json!({ "allowTeams": true, "teamSize": 0 }),
        ),
    ];

    for (label, overrides) in cases {
        let mut body = base_request();
        for (key, value) in overrides.as_object().unwrap() {
            body[key] = value.clone();
        }
        let (status, _) = send(
            test_app.app.clone(),
            "POST",
            "/v1/competitions",
            "driver-ana",
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case: {}", label);
    }
}

#[tokio::test]
async fn test_list_splits_mine_from_public() {
    let test_app = setup_test_app().await;

    let mut private_body = base_request();
    private_body["name"] = json!("Private Race");
    create_competition(&test_app, "driver-ana", private_body).await;

    let mut public_body = base_request();
    public_body["name"] = json!("Open Race");
    public_body["isPublic"] = json!(true);
    let open_code = create_competition(&test_app, "driver-bia", public_body).await;

    let (status, v) = send(test_app.app.clone(), "GET", "/v1/competitions", "driver-ana", None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = v["mine"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["name"], "Private Race");
    assert_eq!(mine[0]["phase"], "active");
    assert_eq!(mine[0]["memberCount"], 1);
    assert_eq!(mine[0]["hasPassword"], false);
    let public = v["public"].as_array().unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["name"], "Open Race");

    // Private competitions never show up for outsiders, and a joined
    // public competition moves from the public list into mine.
    send(
        test_app.app.clone(),
        "POST",
        "/v1/competitions/join",
        "driver-ana",
        Some(json!({ "code": open_code })),
    )
    .await;
    let (_, v) = send(test_app.app.clone(), "GET", "/v1/competitions", "driver-ana", None).await;
    assert_eq!(v["mine"].as_array().unwrap().len(), 2);
    assert!(v["public"].as_array().unwrap().is_empty());

    let (_, v) = send(test_app.app.clone(), "GET", "/v1/competitions", "driver-caio", None).await;
    assert!(v["mine"].as_array().unwrap().is_empty());
    let public = v["public"].as_array().unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["name"], "Open Race");
}
