//! DAO registry and factory.
//!
//! The registry builds at most one DAO per (type, connector) pair and hands
//! out the same instance on every later lookup.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    ConnectorRegistry, DaoKind, DaoOptions, MemoryTaskDao, MongoTaskDao, PostgresTaskDao,
    TaskDao, TaskStoreResult, VoidTaskDao,
};

type DaoCache = HashMap<DaoKind, HashMap<String, Arc<dyn TaskDao>>>;

/// Cache of task DAOs keyed by backend and connector name.
#[derive(Debug)]
pub struct DaoRegistry {
    connectors: Arc<ConnectorRegistry>,
    daos: Mutex<DaoCache>,
}

impl DaoRegistry {
    /// Creates an empty registry resolving connectors from `connectors`.
    pub fn new(connectors: Arc<ConnectorRegistry>) -> Self {
        Self {
            connectors,
            daos: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached DAO for `options`, building it on first use.
    ///
    /// The cache lock is held while building, so concurrent first lookups of
    /// the same pair share one instance.
    pub async fn resolve(&self, options: &DaoOptions) -> TaskStoreResult<Arc<dyn TaskDao>> {
        let kind: DaoKind = options.dao_type.parse()?;
        let mut daos = self.daos.lock().await;

        if let Some(dao) = daos
            .get(&kind)
            .and_then(|by_connector| by_connector.get(&options.connector))
        {
            return Ok(Arc::clone(dao));
        }

        let dao = self.build(kind, &options.connector)?;
        tracing::info!(dao_type = %kind, connector = %options.connector, "TaskDAO built");
        daos.entry(kind)
            .or_default()
            .insert(options.connector.clone(), Arc::clone(&dao));
        Ok(dao)
    }

    /// Builds a new, uncached DAO for `options`.
    pub fn create(&self, options: &DaoOptions) -> TaskStoreResult<Arc<dyn TaskDao>> {
        let kind: DaoKind = options.dao_type.parse()?;
        self.build(kind, &options.connector)
    }

    fn build(&self, kind: DaoKind, connector: &str) -> TaskStoreResult<Arc<dyn TaskDao>> {
        let dao: Arc<dyn TaskDao> = match kind {
            DaoKind::Void => Arc::new(VoidTaskDao::new(connector)),
            DaoKind::InMemory => Arc::new(MemoryTaskDao::new(connector)),
            DaoKind::Postgres => Arc::new(PostgresTaskDao::new(
                self.connectors.postgres(connector)?,
                connector,
            )),
            DaoKind::Mongo => Arc::new(MongoTaskDao::new(
                self.connectors.mongo(connector)?,
                connector,
            )),
        };
        Ok(dao)
    }

    /// Number of cached DAOs.
    pub async fn cached_count(&self) -> usize {
        self.daos.lock().await.values().map(HashMap::len).sum()
    }

    /// Connectors this registry builds DAOs from.
    pub fn connectors(&self) -> &Arc<ConnectorRegistry> {
        &self.connectors
    }
}
