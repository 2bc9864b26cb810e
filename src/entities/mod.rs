pub mod events;
pub mod user_events;
pub mod users;

pub use events as event_entity;
pub use user_events as vote_entity;
pub use users as user_entity;
