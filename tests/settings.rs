mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{MB, files_in, spawn_app, spawn_isolated_app};

const JPG: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

#[tokio::test]
async fn upsert_creates_then_updates() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;
    let key = format!("banner_{}", uuid::Uuid::new_v4().simple());
    let uri = format!("/api/settings/{}", key);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app
        .json(
            Method::PUT,
            &uri,
            Some(&admin),
            json!({"value": "Hello", "description": "Front page banner"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["value"], "Hello");

    let (status, updated) = app
        .json(Method::PUT, &uri, Some(&admin), json!({"value": "Bye"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["value"], "Bye");
    assert_eq!(updated["description"], "Front page banner");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/settings/",
            Some(&admin),
            json!({"key": key, "value": "dup"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, res) = app.json(Method::DELETE, &uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], format!("Setting '{}' deleted successfully", key));
}

#[tokio::test]
async fn commissions_status_round_trip() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (status, res) = app
        .json(
            Method::POST,
            "/api/settings/commissions/status?commissions_open=false",
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], "Commissions status updated to closed");

    let (status, res) = app.get("/api/settings/commissions/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, json!({"commissions_open": false}));

    app.json(
        Method::POST,
        "/api/settings/commissions/status?commissions_open=true",
        Some(&admin),
        json!({}),
    )
    .await;
    let (_, res) = app.get("/api/settings/commissions/status", None).await;
    assert_eq!(res["commissions_open"], true);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (status, _) = app.get("/api/settings/initialize", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = app.get("/api/settings/initialize", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "Default settings initialized");
    assert_eq!(second["created_settings"], json!([]));

    let (_, pricing) = app.get("/api/settings/pricing_info", None).await;
    assert!(pricing["value"].is_string());
}

#[tokio::test]
async fn replacing_background_removes_previous_file() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin_token().await;

    let (status, first) = app
        .multipart(
            "/api/settings/background-image",
            Some(&admin),
            &[],
            Some(("sky.jpg", JPG)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let first_url = first["value"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/uploads/backgrounds/background_"));
    assert_eq!(files_in(&app, "backgrounds"), 1);

    let (status, second) = app
        .multipart(
            "/api/settings/background-image",
            Some(&admin),
            &[("description", "Night sky")],
            Some(("night.jpeg", JPG)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["description"], "Night sky");
    assert_ne!(second["value"], first_url.as_str());
    assert_eq!(files_in(&app, "backgrounds"), 1);
}

#[tokio::test]
async fn settings_writes_need_an_admin() {
    let Some(app) = spawn_app().await else { return };
    let (status, _) = app
        .json(Method::PUT, "/api/settings/anything", None, json!({"value": "x"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/settings/initialize", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_image_has_its_own_ceiling_and_prefix() {
    let Some(app) = spawn_isolated_app().await else { return };
    let admin = app.admin_token().await;
    let big = vec![0u8; MB + MB / 2];

    let (status, err) = app
        .multipart(
            "/api/settings/profile-image",
            Some(&admin),
            &[],
            Some(("me.jpg", big.as_slice())),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "File size too large. Maximum size is 1MB");
    assert_eq!(files_in(&app, "profiles"), 0);

    let (status, _) = app
        .multipart(
            "/api/settings/background-image",
            Some(&admin),
            &[],
            Some(("bg.jpg", big.as_slice())),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = app
        .multipart(
            "/api/settings/profile-image",
            Some(&admin),
            &[],
            Some(("me.jpg", JPG)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["key"], "admin_profile_image");
    assert_eq!(profile["description"], "Admin profile image");
    let value = profile["value"].as_str().unwrap();
    assert!(value.starts_with("/uploads/profiles/profile_"), "{}", value);
    assert!(value.ends_with(".jpg"));
    assert_eq!(files_in(&app, "profiles"), 1);

    app.teardown().await;
}

#[tokio::test]
async fn create_then_list_settings() {
    let Some(app) = spawn_isolated_app().await else { return };
    let admin = app.admin_token().await;

    let (status, created) = app
        .json(
            Method::POST,
            "/api/settings/",
            Some(&admin),
            json!({"key": "tagline", "value": "Ink and paper", "description": "Header text"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["key"], "tagline");
    assert_eq!(created["value"], "Ink and paper");

    let (status, err) = app
        .json(
            Method::POST,
            "/api/settings/",
            Some(&admin),
            json!({"key": "tagline", "value": "again"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "Setting with key 'tagline' already exists");

    let (status, list) = app.get("/api/settings/", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["key"], "tagline");

    app.teardown().await;
}
