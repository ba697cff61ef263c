#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use commission_backend::{
    AppState,
    config::Config,
    create_app, database,
    routes::user::{Role, User},
    utils::generate_token,
};
use serde_json::Value;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const MB: usize = 1024 * 1024;
const BOUNDARY: &str = "X-COMMISSION-TEST-BOUNDARY";

/// App wired to the test database with its own upload root.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub uploads: TempDir,
    schema: Option<String>,
}

pub fn test_config(upload_dir: PathBuf, database_url: String) -> Config {
    Config {
        database_url,
        database_max_connections: 5,
        jwt_secret: "integration-secret".into(),
        jwt_expiration_secs: 30 * 60,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_prefix: "/api".into(),
        upload_dir,
        max_file_size: MB,
        max_background_size: 2 * MB,
        max_profile_size: MB,
        allowed_origins: vec!["http://localhost:3000".into()],
        admin_email: None,
        admin_password: None,
    }
}

fn database_url() -> Option<String> {
    let url = std::env::var("TEST_DATABASE_URL").ok();
    if url.is_none() {
        eprintln!("TEST_DATABASE_URL not set, skipping");
    }
    url
}

async fn build(pool: PgPool, url: String, schema: Option<String>) -> TestApp {
    database::init_schema(&pool).await.unwrap();
    let uploads = TempDir::new().unwrap();
    let config = test_config(uploads.path().to_path_buf(), url);
    let router = create_app(AppState::new(pool.clone(), config));
    TestApp {
        router,
        pool,
        uploads,
        schema,
    }
}

/// App on the shared test database. `None` when `TEST_DATABASE_URL` is unset;
/// callers return early.
pub async fn spawn_app() -> Option<TestApp> {
    let url = database_url()?;
    let config = test_config(PathBuf::new(), url.clone());
    let pool = database::connect(&config).await.unwrap();
    Some(build(pool, url, None).await)
}

/// App whose tables live in a fresh Postgres schema, for tests that need an
/// empty database (no admin yet, exact row counts). Call `teardown` at the end.
pub async fn spawn_isolated_app() -> Option<TestApp> {
    let url = database_url()?;
    let schema = format!("test_{}", Uuid::new_v4().simple());

    let setup = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&setup)
        .await
        .unwrap();
    setup.close().await;

    let options = PgConnectOptions::from_str(&url)
        .unwrap()
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap();
    Some(build(pool, url, Some(schema)).await)
}

pub fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4().simple())
}

impl TestApp {
    pub async fn teardown(self) {
        if let Some(schema) = &self.schema {
            sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema))
                .execute(&self.pool)
                .await
                .unwrap();
        }
        self.pool.close().await;
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn admin_token(&self) -> String {
        let email = unique_email("admin");
        User::create(&self.pool, &email, "admin-pass", Some("Admin"), Role::Admin)
            .await
            .unwrap();
        self.token_for(&email)
    }

    pub fn token_for(&self, email: &str) -> String {
        let config = test_config(self.uploads.path().to_path_buf(), String::new());
        generate_token(email, &config).unwrap().0
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let req = request(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn form(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = request(Method::POST, uri, None)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let req = request(Method::POST, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        self.send(req).await
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Text fields plus an optional `image` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Number of files directly inside `<upload root>/<subdir>`.
pub fn files_in(app: &TestApp, subdir: &str) -> usize {
    std::fs::read_dir(app.uploads.path().join(subdir))
        .map(|entries| entries.count())
        .unwrap_or(0)
}
