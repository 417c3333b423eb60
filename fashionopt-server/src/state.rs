//! Shared handler state

use fashionopt_core::domain::simulation::SimulationId;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::service::optimizer::OptimizerRunner;
use crate::store::SimulationStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SimulationStore,
    pub runner: Arc<OptimizerRunner>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let store = SimulationStore::new();
        let runner = Arc::new(OptimizerRunner::new(config, store.clone()));

        Self {
            store,
            runner,
            upload_dir: config.upload_dir.clone(),
        }
    }

    /// Directory holding the uploaded file of one job
    ///
    /// `None` unless the ID is a single plain path component, so a
    /// client-supplied ID can never point outside the upload directory.
    pub fn job_dir(&self, simulation_id: &SimulationId) -> Option<PathBuf> {
        let mut components = Path::new(simulation_id.as_str()).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.upload_dir.join(name)),
            _ => None,
        }
    }
}
