//! Scheduling layer of the coordinator
//!
//! Drives the fixed-interval status polling of the active simulation and
//! decides when a run is over.

mod poller;

pub(crate) use poller::StatusPoller;
