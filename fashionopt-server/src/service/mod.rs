//! Service Module
//!
//! Business logic layer of the server.
//! Services orchestrate between the repository and the optimizer processes.

pub mod optimizer;
pub mod simulation;

pub use simulation as simulation_service;
