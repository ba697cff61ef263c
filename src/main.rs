use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use commission_backend::{AppState, config::Config, create_app, database, routes::user::User};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("DATABASE_URL and JWT_SECRET must be set");

    let pool = database::connect(&config)
        .await
        .expect("Failed to connect to Postgres");
    database::init_schema(&pool)
        .await
        .expect("Failed to create database tables");

    for dir in [
        config.upload_dir.clone(),
        config.portfolio_dir(),
        config.profile_dir(),
        config.background_dir(),
    ] {
        tokio::fs::create_dir_all(&dir)
            .await
            .unwrap_or_else(|e| panic!("Failed to create upload directory {:?}: {}", dir, e));
    }
    tracing::info!("Upload directories ready under {:?}", config.upload_dir);

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            match User::ensure_bootstrap_admin(&pool, email, password).await {
                Ok(Some(admin)) => tracing::info!("Bootstrap admin {} ready", admin.email),
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to bootstrap admin {}: {}", email, e),
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set to bootstrap an admin")
        }
        (None, None) => {}
    }

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to 0.0.0.0");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }),
        config.server_port,
    );

    let app = create_app(AppState::new(pool, config));

    // 启动服务器
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
