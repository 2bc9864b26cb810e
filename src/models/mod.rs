pub mod common;
pub mod event;
pub mod statistics;
pub mod user;
pub mod vote;

pub use common::*;
pub use event::*;
pub use statistics::*;
pub use user::*;
pub use vote::*;
