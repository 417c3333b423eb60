//! Repository Module
//!
//! Data access layer over the in-memory job store.

pub mod simulation;

pub use simulation as simulation_repository;
