mod event_repository;
mod mission_repository;

pub use event_repository::*;
pub use mission_repository::*;
