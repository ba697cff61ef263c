mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{spawn_app, unique_email};

fn request_body(email: &str) -> serde_json::Value {
    json!({
        "full_name": "Jo Patron",
        "discord_id": "jo#0001",
        "email": email,
        "project_description": "A portrait of my cat as a knight",
    })
}

#[tokio::test]
async fn new_commission_starts_pending_and_queued() {
    let Some(app) = spawn_app().await else { return };

    let (status, commission) = app
        .json(
            Method::POST,
            "/api/commissions/",
            None,
            request_body(&unique_email("patron")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(commission["status"], "pending");
    assert_eq!(commission["payment_status"], "pending");
    assert_eq!(commission["progress_status"], "in_queue");
    assert!(commission["notes"].is_null());
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let (status, _) = app
        .json(Method::POST, "/api/commissions", None, request_body("not-an-email"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_commission_is_not_found() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (status, err) = app
        .get("/api/commissions/does-not-exist", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["detail"], "Commission request not found");

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/commissions/does-not-exist",
            Some(&admin),
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_updates_and_deletes() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (_, created) = app
        .json(
            Method::POST,
            "/api/commissions/",
            None,
            request_body(&unique_email("patron")),
        )
        .await;
    let uri = format!("/api/commissions/{}", created["id"].as_str().unwrap());

    let (status, updated) = app
        .json(
            Method::PUT,
            &uri,
            Some(&admin),
            json!({"progress_status": "in_progress", "notes": "sketch sent"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["progress_status"], "in_progress");
    assert_eq!(updated["status"], "pending");
    assert_eq!(updated["notes"], "sketch sent");

    let (status, cleared) = app
        .json(Method::PUT, &uri, Some(&admin), json!({"notes": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["notes"].is_null());
    assert_eq!(cleared["progress_status"], "in_progress");

    let (status, stats) = app.get("/api/commissions/stats/summary", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["in_progress_requests"].as_i64().unwrap() >= 1);
    assert!(stats["total_requests"].as_i64().unwrap() >= 1);

    let (status, _) = app.json(Method::DELETE, &uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (status, _) = app.get("/api/commissions/?limit=0", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = app
        .get("/api/commissions/?status_filter=pending&limit=5", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert!(list.len() <= 5);
    assert!(list.iter().all(|c| c["status"] == "pending"));
}
