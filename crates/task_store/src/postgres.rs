//! PostgreSQL task DAO.
//!
//! Expects a `tasks` table whose identifier and timestamps are generated by
//! the database:
//!
//! ```sql
//! CREATE TABLE tasks (
//!     task_uuid    UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     description  TEXT NOT NULL,
//!     status       TEXT NOT NULL,
//!     created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Task, TaskCreateDto, TaskUpdate};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{DaoKind, TaskDao, TaskStoreError, TaskStoreResult};

type TaskRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

fn row_to_task(row: TaskRow) -> Task {
    let (id, description, status, created_at, last_updated) = row;
    Task {
        id,
        description,
        status,
        created_at,
        last_updated,
    }
}

/// Builds the `UPDATE` statement for `update`.
///
/// Each changed field takes the next positional placeholder and the
/// identifier takes the last one.
pub(crate) fn build_update_query(update: &TaskUpdate) -> String {
    let mut set_statements: Vec<String> = update
        .field_names()
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{} = ${}", field, i + 1))
        .collect();
    set_statements.push("last_updated = now()".to_string());

    format!(
        "UPDATE tasks SET {} WHERE task_uuid = ${}",
        set_statements.join(", "),
        update.len() + 1
    )
}

/// Fails unless a write on `id` touched exactly one row.
pub(crate) fn check_single_row(rows_affected: u64, id: Uuid) -> TaskStoreResult<()> {
    match rows_affected {
        1 => Ok(()),
        0 => Err(TaskStoreError::not_found("Task", id.to_string())),
        actual => Err(TaskStoreError::ConstraintViolation {
            expected: 1,
            actual,
        }),
    }
}

/// Task DAO backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresTaskDao {
    pool: PgPool,
    connector_name: String,
}

impl PostgresTaskDao {
    pub fn new(pool: PgPool, connector_name: impl Into<String>) -> Self {
        Self {
            pool,
            connector_name: connector_name.into(),
        }
    }

    /// Commits `tx` only if exactly one row was affected.
    async fn finish_single_row(
        tx: Transaction<'_, Postgres>,
        rows_affected: u64,
        id: Uuid,
    ) -> TaskStoreResult<()> {
        match check_single_row(rows_affected, id) {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => Err(Self::rollback(tx, err).await),
        }
    }

    /// Rolls `tx` back and returns the error to report.
    async fn rollback(tx: Transaction<'_, Postgres>, original: TaskStoreError) -> TaskStoreError {
        match tx.rollback().await {
            Ok(()) => original,
            Err(source) => TaskStoreError::Rollback {
                source,
                original: Box::new(original),
            },
        }
    }
}

#[async_trait]
impl TaskDao for PostgresTaskDao {
    fn kind(&self) -> DaoKind {
        DaoKind::Postgres
    }

    fn connector_name(&self) -> &str {
        &self.connector_name
    }

    #[tracing::instrument(skip(self, task), fields(connector = %self.connector_name))]
    async fn create(&self, task: TaskCreateDto) -> TaskStoreResult<Task> {
        let (id, created_at, last_updated): (Uuid, DateTime<Utc>, DateTime<Utc>) =
            sqlx::query_as(
                r#"
                INSERT INTO tasks (description, status)
                VALUES ($1, $2)
                RETURNING task_uuid, created_at, last_updated
                "#,
            )
            .bind(&task.description)
            .bind(&task.status)
            .fetch_one(&self.pool)
            .await?;

        Ok(Task {
            id,
            description: task.description,
            status: task.status,
            created_at,
            last_updated,
        })
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn read_by_id(&self, id: Uuid) -> TaskStoreResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT task_uuid, description, status, created_at, last_updated
            FROM tasks
            WHERE task_uuid = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_task)
            .ok_or_else(|| TaskStoreError::not_found("Task", id.to_string()))
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn read_all(&self) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT task_uuid, description, status, created_at, last_updated
            FROM tasks
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_task).collect())
    }

    #[tracing::instrument(skip(self, update), fields(connector = %self.connector_name, fields = ?update.field_names()))]
    async fn update(&self, id: Uuid, update: &TaskUpdate) -> TaskStoreResult<()> {
        update.validate()?;
        let sql = build_update_query(update);

        let mut tx = self.pool.begin().await?;

        let mut query = sqlx::query(&sql);
        for (_, value) in update.changes() {
            query = query.bind(value.as_str());
        }
        let result = match query.bind(id).execute(&mut *tx).await {
            Ok(result) => result,
            Err(e) => return Err(Self::rollback(tx, e.into()).await),
        };

        Self::finish_single_row(tx, result.rows_affected(), id).await
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn delete(&self, id: Uuid) -> TaskStoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = match sqlx::query("DELETE FROM tasks WHERE task_uuid = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
        {
            Ok(result) => result,
            Err(e) => return Err(Self::rollback(tx, e.into()).await),
        };

        Self::finish_single_row(tx, result.rows_affected(), id).await
    }
}
