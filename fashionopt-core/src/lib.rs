//! Fashion Pricing Optimizer Core
//!
//! Core types and pure logic shared by the simulation server, the HTTP client
//! and the polling coordinator.
//!
//! This crate contains:
//! - Domain types: simulation status, optimization results, severities
//! - DTOs: simulation request parameters exchanged on submission
//! - Lifecycle: the job state machine and client-side status evaluation
//! - Reconcile: merging GA and ACO result sets into comparison views

pub mod domain;
pub mod dto;
pub mod lifecycle;
pub mod reconcile;
