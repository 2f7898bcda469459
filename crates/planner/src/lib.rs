//! Plan generation for new missions.
//!
//! The coordinator depends only on [`PlanGenerator`], which never fails: any
//! planner error or invalid output is replaced by [`static_plan`].

mod client;
mod error;
mod fallback;
mod generator;
mod parse;
mod prompts;
mod types;

pub use client::{GeminiClient, GeminiPlanner};
pub use error::{PlannerError, PlannerResult};
pub use fallback::static_plan;
pub use generator::{PlanGenerator, PlanRequest, Planner};
pub use parse::parse_plan_response;
pub use types::PlannerConfig;
