use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{MethodRouter, get, post, put},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    AppState,
    config::Config,
    middleware::{log_errors, panic_response},
    routes::{commission, portfolio, settings, system, user},
};

// Collection roots answer with and without the trailing slash.
fn collection(
    router: Router<AppState>,
    path: &str,
    methods: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, methods.clone())
        .route(&format!("{}/", path), methods)
}

// 认证与用户管理
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(user::register))
        .route("/auth/token", post(user::token))
        .route("/auth/login", post(user::login))
        .route("/auth/me", get(user::me))
        .route("/auth/logout", post(user::logout))
        .route("/auth/create-admin", post(user::create_admin))
        .route("/auth/verify-admin", get(user::verify_admin))
        .route("/auth/users", get(user::list_users))
        .route("/auth/users/{id}/role", put(user::update_role))
        .route("/auth/users/{id}/active", put(user::update_active))
}

// 委托请求
pub fn commission_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/commissions/stats/summary", get(commission::commission_stats))
        .route(
            "/commissions/{id}",
            get(commission::get_commission)
                .put(commission::update_commission)
                .delete(commission::delete_commission),
        );
    collection(
        router,
        "/commissions",
        get(commission::list_commissions).post(commission::create_commission),
    )
}

// 作品集
pub fn portfolio_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/portfolio/categories/list", get(portfolio::list_categories))
        .route("/portfolio/stats/summary", get(portfolio::portfolio_stats))
        .route(
            "/portfolio/{id}",
            get(portfolio::get_item)
                .put(portfolio::update_item)
                .delete(portfolio::delete_item),
        )
        .route("/portfolio/{id}/toggle-featured", post(portfolio::toggle_featured));
    collection(
        router,
        "/portfolio",
        get(portfolio::list_items).post(portfolio::create_item),
    )
}

// 站点设置
pub fn settings_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/settings/background-image", post(settings::upload_background_image))
        .route("/settings/profile-image", post(settings::upload_profile_image))
        .route(
            "/settings/commissions/status",
            get(settings::get_commissions_status).post(settings::update_commissions_status),
        )
        .route("/settings/initialize", get(settings::initialize_settings))
        .route(
            "/settings/{key}",
            get(settings::get_setting)
                .put(settings::update_setting)
                .delete(settings::delete_setting),
        );
    collection(
        router,
        "/settings",
        get(settings::list_settings).post(settings::create_setting),
    )
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(commission_routes())
        .merge(portfolio_routes())
        .merge(settings_routes())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

/// Full application: API under the configured prefix, system endpoints at the
/// root, stored uploads under `/uploads`.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let prefix = config.api_prefix.trim_end_matches('/');
    let router = if prefix.is_empty() {
        Router::new().merge(api_routes())
    } else {
        Router::new().nest(prefix, api_routes())
    };

    let router = router
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir));

    // 最后添加的 layer 在最外层
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(DefaultBodyLimit::max(config.body_limit()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}
