mod health;
mod missions;

pub use health::*;
pub use missions::*;
