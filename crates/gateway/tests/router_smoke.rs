use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use portal_common::config::{AppConfig, DataConfig};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

fn write_json(dir: &Path, name: &str, value: Value) {
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

fn read_json(dir: &Path, name: &str) -> Value {
    serde_json::from_slice(&std::fs::read(dir.join(name)).unwrap()).unwrap()
}

async fn portal() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_json(
        root,
        "academicians_merged.json",
        json!([
            {"Fullname": "Prof. Dr. Ahmet Şen", "Email": "ahmet.sen@uni.edu.tr", "Title": "Profesör"},
            {"Fullname": "Ayşe Kaya", "Email": "ayse.kaya@uni.edu.tr"},
            {"Fullname": "Mehmet Öz", "Email": "mehmet.oz@uni.edu.tr"}
        ]),
    );
    write_json(
        root,
        "eu_projects_merged_tum.json",
        json!({"Sheet1": [
            {"project_id": "101", "title": "Green Hydrogen", "status": "SIGNED", "overall_budget": 2500000},
            {"project_id": "102", "acronym": "EUPROJ"}
        ]}),
    );
    write_json(
        root,
        "n8n_akademisyen_proje_onerileri.json",
        json!([
            {"data": "academician_name", "Column3": "project_id", "Column7": "score"},
            {"data": "Ahmet Şen", "Column3": "101", "Column7": 80},
            {"data": null, "Column3": "999", "Column7": 90},
            {"data": "AYŞE KAYA", "Column3": "101", "Column7": 70},
            {"data": "Mehmet Öz", "Column3": "101", "Column7": 60},
            {"data": "Mehmet Öz", "Column3": "102", "Column7": 50}
        ]),
    );
    write_json(
        root,
        "decisions.json",
        json!([{"academician": "Ayşe Kaya", "projId": "101", "decision": "accepted"}]),
    );
    write_json(root, "passwords.json", json!({"ayse.kaya@uni.edu.tr": "kimya123"}));

    std::fs::create_dir(root.join("images")).unwrap();
    std::fs::write(root.join("images").join("Ayse.JPG"), b"\xff\xd8\xff").unwrap();

    let mut config = AppConfig::default();
    config.data = DataConfig::with_base_dir(root);
    config.rate_limit.enabled = false;

    let state = portal_gateway::AppState::load(config).await;
    (dir, portal_gateway::create_router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_and_readiness() {
    let (_dir, app) = portal().await;

    let (status, _) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"]["academicians"], json!(3));
    // announcements, messages, access logs and web data files are absent
    assert_eq!(body["status"], json!("degraded"));
}

#[tokio::test]
async fn login_roles_and_access_log() {
    let (dir, app) = portal().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login/",
        Some(json!({"username": "admin", "password": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("admin"));
    assert_eq!(body["name"], json!("Yönetici"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login/",
        Some(json!({"username": "Ayse.Kaya@uni.edu.tr", "password": "kimya123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["role"], json!("academician"));
    assert_eq!(body["name"], json!("Ayşe Kaya"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login/",
        Some(json!({"username": "mehmet.oz@uni.edu.tr", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("INVALID_CREDENTIALS"));

    let logs = read_json(dir.path(), "access_logs.json");
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[2]["success"], json!(false));
}

#[tokio::test]
async fn profile_keeps_missing_projects() {
    let (_dir, app) = portal().await;

    let (status, body) = send(&app, Method::POST, "/api/profile/", Some(json!({"name": "ahmet sen"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["Fullname"], json!("Prof. Dr. Ahmet Şen"));

    let projects = body["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["id"], json!("999"));
    assert_eq!(projects[0]["status"], json!("-"));
    assert_eq!(projects[0]["budget"], json!("-"));
    assert_eq!(projects[0]["title"], json!("Proje-999"));
    assert_eq!(projects[1]["collaborators"], json!(["Ayşe Kaya"]));
}

#[tokio::test]
async fn profile_rejects_missing_and_unknown_names() {
    let (_dir, app) = portal().await;

    let (status, body) = send(&app, Method::POST, "/api/profile/", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], json!("name"));

    let (status, _) = send(&app, Method::POST, "/api/profile/", Some(json!({"name": "Nobody"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/api/profile/", Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decision_upsert_keeps_one_row() {
    let (dir, app) = portal().await;

    for decision in ["accepted", "rejected"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/decision/",
            Some(json!({"academician": "Mehmet Öz", "projId": 102, "decision": decision})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("success"));
    }

    let stored = read_json(dir.path(), "decisions.json");
    let rows: Vec<&Value> = stored
        .as_array()
        .unwrap()
        .iter()
        .filter(|row| row["projId"] == json!("102"))
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["decision"], json!("rejected"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/decision/",
        Some(json!({"academician": "Mehmet Öz", "projId": "102", "decision": "maybe"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decision_keeps_extra_client_fields() {
    let (dir, app) = portal().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/decision/",
        Some(json!({
            "academician": "Ayşe Kaya",
            "projId": "101",
            "decision": "rejected",
            "source": "mobile"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = read_json(dir.path(), "decisions.json");
    let rows = stored.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["decision"], json!("rejected"));
    assert_eq!(rows[0]["source"], json!("mobile"));
}

#[tokio::test]
async fn changed_password_with_padding_still_logs_in() {
    let (_dir, app) = portal().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/change-password/",
        Some(json!({
            "email": "mehmet.oz@uni.edu.tr",
            "old_password": "mehmet.oz",
            "new_password": " newpass "
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for password in ["newpass", " newpass "] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/login/",
            Some(json!({"username": "mehmet.oz@uni.edu.tr", "password": password})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login/",
        Some(json!({"username": "mehmet.oz@uni.edu.tr", "password": "mehmet.oz"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn top_projects_are_ranked() {
    let (_dir, app) = portal().await;

    let (status, body) = send(&app, Method::GET, "/api/top-projects/", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["101", "102", "999"]);
    assert_eq!(body[0]["count"], json!(3));

    let (_, body) = send(&app, Method::GET, "/api/top-projects/?limit=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn announcements_round_trip_through_disk() {
    let (dir, app) = portal().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/announcements/",
        Some(json!({"title": "Çağrı", "content": "Horizon çağrısı açıldı"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["index"], json!(0));
    assert_eq!(read_json(dir.path(), "announcements.json")[0]["title"], json!("Çağrı"));

    let (_, body) = send(&app, Method::GET, "/api/announcements/", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, "/api/announcements/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/api/announcements/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"]["title"], json!("Çağrı"));
    assert_eq!(read_json(dir.path(), "announcements.json"), json!([]));
}

#[tokio::test]
async fn messages_filter_by_user() {
    let (_dir, app) = portal().await;

    for (from, to) in [("admin", "Ayşe Kaya"), ("Mehmet Öz", "admin")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/messages/",
            Some(json!({"from": from, "to": to, "content": "Merhaba"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, Method::GET, "/api/messages/?user=AYSE%20KAYA", None).await;
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["index"], json!(0));

    let (_, body) = send(&app, Method::GET, "/api/messages/", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::DELETE, "/api/messages/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/messages/?user=admin", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn network_and_dashboard() {
    let (_dir, app) = portal().await;

    send(
        &app,
        Method::POST,
        "/api/decision/",
        Some(json!({"academician": "Mehmet Öz", "projId": "101", "decision": "accepted"})),
    )
    .await;

    let (status, body) = send(&app, Method::POST, "/api/network/", Some(json!({"name": "Ayşe Kaya"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"][0]["group"], json!("self"));
    assert_eq!(body["nodes"][1]["label"], json!("Mehmet Öz"));
    assert_eq!(body["edges"][0]["projects"], json!(["101"]));

    let (status, body) = send(&app, Method::GET, "/api/admin/dashboard/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["decisions"], json!(2));
    assert_eq!(body["academicians"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn reload_reports_sources() {
    let (dir, app) = portal().await;

    write_json(
        dir.path(),
        "announcements.json",
        json!({"Sheet1": [{"title": "Yeni", "content": "Dosyadan"}]}),
    );

    let (status, body) = send(&app, Method::POST, "/api/admin/reload/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"]["announcements"], json!(1));

    let sources = body["sources"].as_array().unwrap();
    let messages = sources.iter().find(|s| s["source"] == json!("messages")).unwrap();
    assert_eq!(messages["status"], json!("missing"));
    let projects = sources.iter().find(|s| s["source"] == json!("projects")).unwrap();
    assert_eq!(projects["status"], json!("loaded"));
    assert_eq!(projects["records"], json!(2));
}

#[tokio::test]
async fn images_are_served_case_insensitively() {
    let (_dir, app) = portal().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/images/ayse.jpg").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

    let (status, _) = send(&app, Method::GET, "/images/missing.png", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/akademisyen_fotograflari/ayse.jpg", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_dir, app) = portal().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
