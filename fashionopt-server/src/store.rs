//! In-memory job store
//!
//! Jobs live only for the lifetime of the process. The store is a cheap handle
//! around a shared map, cloned into every handler and optimizer task the way a
//! connection pool would be.

use chrono::{DateTime, Utc};
use fashionopt_core::domain::simulation::{SimulationId, SimulationStatus};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A job as kept by the store
#[derive(Debug, Clone)]
pub struct SimulationRecord {
    pub status: SimulationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationStore {
    records: Arc<RwLock<HashMap<SimulationId, SimulationRecord>>>,
}

impl SimulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, HashMap<SimulationId, SimulationRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, HashMap<SimulationId, SimulationRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
