//! Worker side of mission control: polls the coordinator for the next step of
//! a mission, runs its actions and reports the outcome as an event.

pub mod actions;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod poll;
pub mod reporter;

pub use actions::{
    ActionContext, ActionHandler, ActionKind, ActionParams, ActionResult, FallbackChain,
    HandlerRegistry, PromptDedup, Strategy,
};
pub use config::{ActionSettings, WorkerConfig};
pub use controller::{ControllerState, MissionController};
pub use coordinator::Coordinator;
pub use error::{ActionError, Result, WorkerError};
pub use executor::{ExecutionResult, StepExecutor};
pub use poll::{poll_until, sleep_or_cancel, PollOutcome};
pub use reporter::{EventDetails, EventReporter};
