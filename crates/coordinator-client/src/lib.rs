pub mod client;
pub mod error;

pub use client::CoordinatorClient;
pub use error::{ClientError, Result};
