mod event;
mod mission;
mod plan;

pub use event::*;
pub use mission::*;
pub use plan::*;
