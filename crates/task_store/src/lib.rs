//! Pluggable data-access layer for tasks.
//!
//! This crate provides the [`TaskDao`] abstraction and its backends:
//! in-memory, PostgreSQL, MongoDB and a no-op placeholder. DAOs are built and
//! cached per (type, connector) pair by the [`DaoRegistry`], using the live
//! handles held by the [`ConnectorRegistry`].

mod connectors;
mod error;
mod memory;
mod mongo;
mod postgres;
mod registry;
mod traits;
mod void;

pub use connectors::*;
pub use error::*;
pub use memory::*;
pub use mongo::{MongoTaskDao, TASKS_COLLECTION};
pub use postgres::PostgresTaskDao;
pub use registry::*;
pub use traits::*;
pub use void::*;
