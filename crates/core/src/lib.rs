pub mod distribution;
pub mod domain;
mod error;

pub use distribution::{
    completed_step_ids, derive_status, latest_step_statuses, next_pending_step, progress, Progress,
};
pub use domain::*;
pub use error::*;
