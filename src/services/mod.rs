pub mod event_service;
pub mod statistics_service;
pub mod user_service;
pub mod vote_service;

pub use event_service::EventService;
pub use statistics_service::*;
pub use user_service::*;
pub use vote_service::*;
