//! Fashion Pricing Optimizer Coordinator
//!
//! Client-side coordination of one simulation job at a time:
//! - Configuration: polling cadence, timeouts and retry policy
//! - Session: the active job ID and its in-progress guard
//! - Scheduler: fixed-interval status polling with a staleness guard
//! - Coordinator: submission, termination and best-effort cleanup
//!
//! Progress, per-algorithm errors and the single final message of each run
//! are delivered as [`CoordinatorEvent`]s.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
mod scheduler;
pub mod session;

pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{Result, SimulationError};
pub use events::{CoordinatorEvent, FinalReport};
