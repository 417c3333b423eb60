//! Fashion Pricing Optimizer Server
//!
//! Accepts simulation submissions, runs the GA and ACO optimizers as child
//! processes and serves job status to polling clients.

pub mod api;
pub mod config;
pub mod repository;
pub mod service;
pub mod state;
pub mod store;
