//! Task DAO trait definitions.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use entities::{Task, TaskCreateDto, TaskUpdate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{TaskStoreError, TaskStoreResult};

/// Backends a task DAO can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaoKind {
    /// Placeholder backend, every operation fails.
    Void,
    /// Process-local map.
    InMemory,
    /// PostgreSQL through a named connector.
    Postgres,
    /// MongoDB through a named connector.
    Mongo,
}

impl DaoKind {
    /// All known kinds.
    pub const ALL: [DaoKind; 4] = [Self::Void, Self::InMemory, Self::Postgres, Self::Mongo];

    /// Configuration tag of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Void => "VoidDAO",
            Self::InMemory => "InMemoryDAO",
            Self::Postgres => "PostgresDAO",
            Self::Mongo => "MongoDAO",
        }
    }
}

impl fmt::Display for DaoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DaoKind {
    type Err = TaskStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VoidDAO" | "TaskVoidDAO" => Ok(Self::Void),
            "InMemoryDAO" | "TaskInMemoryDAO" => Ok(Self::InMemory),
            "PostgresDAO" | "TaskPostgresDAO" => Ok(Self::Postgres),
            "MongoDAO" | "TaskMongoDAO" => Ok(Self::Mongo),
            other => Err(TaskStoreError::DaoTypeNotFound {
                dao_type: other.to_string(),
            }),
        }
    }
}

/// Connector name used when none is configured.
pub const DEFAULT_CONNECTOR: &str = "default";

fn default_connector() -> String {
    DEFAULT_CONNECTOR.to_string()
}

/// Descriptor selecting which DAO to build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaoOptions {
    /// DAO type tag, e.g. `PostgresDAO`.
    #[serde(rename = "type")]
    pub dao_type: String,
    /// Logical connector name.
    #[serde(default = "default_connector")]
    pub connector: String,
}

impl DaoOptions {
    /// Creates a new descriptor.
    pub fn new(dao_type: impl Into<String>, connector: impl Into<String>) -> Self {
        Self {
            dao_type: dao_type.into(),
            connector: connector.into(),
        }
    }
}

impl Default for DaoOptions {
    fn default() -> Self {
        Self::new(DaoKind::InMemory.as_str(), DEFAULT_CONNECTOR)
    }
}

/// Trait for task storage operations.
///
/// Identifiers and timestamps are always assigned by the implementation.
#[async_trait]
pub trait TaskDao: Send + Sync {
    /// Backend of this DAO.
    fn kind(&self) -> DaoKind;

    /// Connector this DAO was built with.
    fn connector_name(&self) -> &str;

    /// Persists a new task and returns it fully materialized.
    async fn create(&self, task: TaskCreateDto) -> TaskStoreResult<Task>;

    /// Gets a task by ID.
    async fn read_by_id(&self, id: Uuid) -> TaskStoreResult<Task>;

    /// Lists every task. An empty store yields an empty vector.
    async fn read_all(&self) -> TaskStoreResult<Vec<Task>>;

    /// Applies a partial update to a task.
    async fn update(&self, id: Uuid, update: &TaskUpdate) -> TaskStoreResult<()>;

    /// Deletes a task.
    async fn delete(&self, id: Uuid) -> TaskStoreResult<()>;
}

impl fmt::Debug for dyn TaskDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDao")
            .field("kind", &self.kind())
            .field("connector", &self.connector_name())
            .finish()
    }
}
