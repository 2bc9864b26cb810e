pub mod admin_event;
pub mod admin_user;
pub mod event;
pub mod statistics;
pub mod user;

pub use admin_event::admin_event_config;
pub use admin_user::admin_user_config;
pub use event::event_config;
pub use statistics::statistics_config;
pub use user::user_config;
