mod handler;
mod model;

pub use handler::{
    create_admin, list_users, login, logout, me, register, token, update_active, update_role,
    verify_admin,
};
pub use model::{Role, TokenResponse, User};
