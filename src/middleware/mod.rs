mod auth;
mod error_handler;

pub use auth::{ActiveUser, AdminUser, CurrentUser, require_active, require_admin};
pub use error_handler::{log_errors, panic_response};
