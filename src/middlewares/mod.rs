pub mod admin;
pub mod auth;
pub mod cors;
pub mod email_verified;

pub use admin::AdminGuard;
pub use auth::{AuthMiddleware, AuthenticatedUser, current_user};
pub use cors::create_cors;
pub use email_verified::ensure_email_verified;
