//! Core domain types
//!
//! This module contains the structures shared between the server (which owns
//! and mutates simulation jobs) and clients (which only observe them).

pub mod message;
pub mod result;
pub mod simulation;
