use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    routes::user::User,
    utils::verify_token,
};

fn credentials_error() -> AppError {
    AppError::unauthorized("Could not validate credentials")
}

/// The account behind a valid bearer token, whatever its state.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A `CurrentUser` whose account is active.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub User);

/// An `ActiveUser` holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

pub fn require_active(user: User) -> AppResult<User> {
    if !user.is_active {
        return Err(AppError::bad_request("Inactive user"));
    }
    Ok(user)
}

pub fn require_admin(user: User) -> AppResult<User> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Not enough permissions"));
    }
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| credentials_error())?;

        let claims = verify_token(bearer.token(), &state.config).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            credentials_error()
        })?;

        let user = User::find_by_email(&state.pool, &claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Token subject {} no longer exists", claims.sub);
                credentials_error()
            })?;

        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_active(user).map(ActiveUser)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ActiveUser(user) = ActiveUser::from_request_parts(parts, state).await?;
        require_admin(user).map(AdminUser)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(role: &str, is_active: bool) -> User {
        User {
            id: "u-1".into(),
            email: "someone@example.com".into(),
            hashed_password: String::new(),
            display_name: None,
            role: role.into(),
            avatar_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn inactive_user_is_a_bad_request() {
        let err = require_active(user("admin", false)).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Inactive user");
    }

    #[test]
    fn non_admin_is_forbidden() {
        let err = require_admin(user("user", true)).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert!(require_admin(user("admin", true)).is_ok());
    }
}
