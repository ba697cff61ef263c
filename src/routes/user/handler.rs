use axum::{
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    database::is_unique_violation,
    error::{AppError, AppResult, write_failed},
    extract::{Form, Json, Path, Query},
    middleware::{ActiveUser, AdminUser},
    routes::MessageResponse,
    utils::{generate_token, is_valid_email},
};

use super::model::{
    ActiveQuery, LoginResponse, RegisterRequest, Role, RoleQuery, TokenForm, TokenResponse, User,
    UserActionResponse, UserBrief, UserProfile,
};

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    if !is_valid_email(&req.email) {
        return Err(AppError::bad_request("Invalid email address"));
    }
    if req.password.is_empty() {
        return Err(AppError::bad_request("Password must not be empty"));
    }
    Ok(())
}

async fn ensure_email_free(state: &AppState, email: &str) -> AppResult<()> {
    if User::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::bad_request("Email already registered"));
    }
    Ok(())
}

fn map_create_error(action: &str, e: AppError) -> AppError {
    match e {
        AppError::Database(db) if is_unique_violation(&db) => {
            AppError::bad_request("Email already registered")
        }
        AppError::Database(db) => write_failed(action, db),
        other => other,
    }
}

async fn authenticate(state: &AppState, form: &TokenForm) -> AppResult<User> {
    User::authenticate(&state.pool, &form.username, &form.password)
        .await?
        .ok_or_else(|| {
            tracing::info!("Failed login for {}", form.username);
            AppError::unauthorized("Incorrect email or password")
        })
}

fn issue_token(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let (token, _exp) = generate_token(&user.email, &state.config)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;
    Ok(TokenResponse::bearer(token))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_registration(&req)?;
    ensure_email_free(&state, &req.email).await?;

    let user = User::create(
        &state.pool,
        &req.email,
        &req.password,
        req.display_name.as_deref(),
        Role::User,
    )
    .await
    .map_err(|e| map_create_error("creating user", e))?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> AppResult<Json<TokenResponse>> {
    let user = authenticate(&state, &form).await?;
    Ok(Json(issue_token(&state, &user)?))
}

/// Same as `token`, with the account profile alongside the token.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> AppResult<Json<LoginResponse>> {
    let user = authenticate(&state, &form).await?;
    let token = issue_token(&state, &user)?;
    tracing::info!("User {} logged in", user.email);

    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

#[axum::debug_handler(state = AppState)]
pub async fn me(ActiveUser(user): ActiveUser) -> Json<User> {
    Json(user)
}

/// Tokens are stateless; the client drops its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Successfully logged out"))
}

#[axum::debug_handler]
pub async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<User>> {
    if User::admin_exists(&state.pool).await? {
        return Err(AppError::bad_request("Admin user already exists"));
    }
    validate_registration(&req)?;
    ensure_email_free(&state, &req.email).await?;

    let display_name = req.display_name.as_deref().unwrap_or("Admin");
    let user = User::create(
        &state.pool,
        &req.email,
        &req.password,
        Some(display_name),
        Role::Admin,
    )
    .await
    .map_err(|e| map_create_error("creating admin user", e))?;

    Ok(Json(user))
}

#[axum::debug_handler(state = AppState)]
pub async fn verify_admin(AdminUser(user): AdminUser) -> Json<UserActionResponse> {
    Json(UserActionResponse {
        message: "Admin access verified".into(),
        user: UserBrief::from(&user),
    })
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(User::list(&state.pool).await?))
}

#[axum::debug_handler]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> AppResult<Json<UserActionResponse>> {
    let role: Role = query.new_role.parse().map_err(AppError::BadRequest)?;

    if User::find_by_id(&state.pool, &user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let user = User::update_role(&state.pool, &user_id, role)
        .await
        .map_err(|e| write_failed("updating user role", e))?;
    tracing::info!("{} set role of {} to {}", admin.email, user.email, user.role);

    Ok(Json(UserActionResponse {
        message: format!("User role updated to {}", role.as_str()),
        user: UserBrief::from(&user),
    }))
}

#[axum::debug_handler]
pub async fn update_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Query(query): Query<ActiveQuery>,
) -> AppResult<Json<UserActionResponse>> {
    if User::find_by_id(&state.pool, &user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    if admin.id == user_id && !query.is_active {
        return Err(AppError::bad_request("Admins cannot deactivate themselves"));
    }

    let user = User::set_active(&state.pool, &user_id, query.is_active)
        .await
        .map_err(|e| write_failed("updating user status", e))?;
    let state_word = if user.is_active { "activated" } else { "deactivated" };
    tracing::info!("{} {} account {}", admin.email, state_word, user.email);

    Ok(Json(UserActionResponse {
        message: format!("User {}", state_word),
        user: UserBrief::from(&user),
    }))
}
