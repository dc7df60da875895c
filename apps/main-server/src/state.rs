//! Application state.

use std::sync::Arc;

use task_store::{ConnectorRegistry, DaoRegistry};

use crate::config::Config;
use crate::controller::TaskController;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Controller serving the task routes.
    pub tasks: TaskController,
    /// DAOs built so far.
    pub registry: Arc<DaoRegistry>,
}

impl AppState {
    /// Creates new application state.
    pub fn new(config: Config, tasks: TaskController, registry: Arc<DaoRegistry>) -> Self {
        Self {
            config,
            tasks,
            registry,
        }
    }

    /// Live database connectors.
    pub fn connectors(&self) -> &Arc<ConnectorRegistry> {
        self.registry.connectors()
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<AppState>;
