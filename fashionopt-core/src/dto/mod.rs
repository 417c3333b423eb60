//! Data Transfer Objects for client/server communication
//!
//! DTOs are the request-side shapes exchanged when a simulation is submitted.
//! Status and result payloads live in [`crate::domain`].

pub mod simulation;
