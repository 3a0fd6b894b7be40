//! ABOUTME: Generic table-scoped repository with CRUD over one table
//! ABOUTME: Runs standalone on the shared pool or inside a caller-supplied executor

use std::marker::PhantomData;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use tb_core::{Error, Result};

use crate::identifier::check_identifier;
use crate::query::{push_criteria, SelectQuery};
use crate::value::{to_columns, SqlValue};

/// A record-shaped CRUD surface over one table
///
/// The repository is bound to exactly one table for its lifetime and owns no
/// connection state beyond the injected shared pool. Reads map rows into `T`;
/// write payloads may be `T` itself or any partial projection that
/// serializes to an object. Every operation issues a single statement and
/// propagates engine failures unmodified.
///
/// Each verb has one implementation, generic over the execution context: the
/// plain methods run on the shared pool, the `_in` variants run on whatever
/// executor the caller supplies - normally `&mut *tx` for a transaction
/// obtained from [`crate::Db::begin`].
pub struct TableRepository<T> {
    pool: SqlitePool,
    table: String,
    _record: PhantomData<T>,
}

impl<T> std::fmt::Debug for TableRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRepository")
            .field("table", &self.table)
            .finish()
    }
}

impl<T> Clone for TableRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            table: self.table.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> TableRepository<T> {
    /// Bind a repository to `table` on the shared pool
    pub fn new(pool: SqlitePool, table: &str) -> Result<Self> {
        check_identifier("table", table)?;
        Ok(Self {
            pool,
            table: table.to_owned(),
            _record: PhantomData,
        })
    }

    /// The table this repository is bound to
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// The shared handle standalone operations run on
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a lazy `SELECT` over the whole table
    ///
    /// The caller may refine columns, criteria and ordering before running
    /// the statement.
    pub fn find(&self) -> SelectQuery {
        SelectQuery::new(&self.table)
    }

    /// Fetch the single record whose `id` column matches, if any
    pub async fn get_by_id<I>(&self, id: I) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        I: Into<SqlValue>,
    {
        self.get_by_id_in(&self.pool, id).await
    }

    /// `get_by_id` within a caller-managed execution context
    pub async fn get_by_id_in<'e, E, I>(&self, executor: E, id: I) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
        I: Into<SqlValue>,
    {
        self.find().by_id(id).limit(1).fetch_optional(executor).await
    }

    /// Fetch every record matching the equality criteria
    ///
    /// Present fields must all match; an empty criteria object selects the
    /// whole table.
    pub async fn find_by_criteria<C>(&self, criteria: &C) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        C: Serialize + ?Sized,
    {
        self.find().filter(criteria)?.fetch_all(&self.pool).await
    }

    /// Insert `value` and return the stored row
    pub async fn insert<V>(&self, value: &V) -> Result<T>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        V: Serialize + ?Sized,
    {
        let rows: Vec<T> = self.insert_returning(&self.pool, value, &[]).await?;
        rows.into_iter().next().ok_or_else(|| {
            Error::Database(format!("Insert into {} returned no row", self.table))
        })
    }

    /// `insert` within a caller-managed execution context
    pub async fn insert_in<'e, E, V>(&self, executor: E, value: &V) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
        V: Serialize + ?Sized,
    {
        self.insert_returning(executor, value, &[]).await
    }

    /// Insert `value`, returning the chosen columns of the new row
    ///
    /// An empty `returning` list means all columns. This is the single
    /// insert implementation; the convenience methods delegate here.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn insert_returning<'e, O, E, V>(
        &self,
        executor: E,
        value: &V,
        returning: &[&str],
    ) -> Result<Vec<O>>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
        V: Serialize + ?Sized,
    {
        let columns = to_columns("insert payload", value)?;
        if columns.is_empty() {
            return Err(Error::Validation(
                "insert payload has no columns".to_string(),
            ));
        }

        let mut builder = QueryBuilder::new("INSERT INTO ");
        builder.push(&self.table);
        builder.push(" (");
        builder.push(
            columns
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        builder.push(") VALUES (");
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            value.push_bind(&mut builder);
        }
        builder.push(")");
        push_returning(&mut builder, returning)?;

        debug!(sql = builder.sql(), "Executing insert");
        builder
            .build_query_as::<O>()
            .fetch_all(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to insert into {}: {}", self.table, e)))
    }

    /// Update the row(s) whose `id` column matches, returning them post-write
    ///
    /// Zero matching rows is a no-op with an empty result.
    pub async fn update_by_id<I, V>(&self, id: I, value: &V) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        I: Into<SqlValue>,
        V: Serialize + ?Sized,
    {
        self.update_where_returning(&self.pool, "id", id, value, &[])
            .await
    }

    /// `update_by_id` within a caller-managed execution context
    pub async fn update_by_id_in<'e, E, I, V>(
        &self,
        executor: E,
        id: I,
        value: &V,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
        I: Into<SqlValue>,
        V: Serialize + ?Sized,
    {
        self.update_where_returning(executor, "id", id, value, &[])
            .await
    }

    /// Update the row(s) where `column` equals `matches`
    ///
    /// Generalizes [`TableRepository::update_by_id`] to any column.
    pub async fn update_by_column<I, V>(
        &self,
        column: &str,
        matches: I,
        value: &V,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        I: Into<SqlValue>,
        V: Serialize + ?Sized,
    {
        self.update_where_returning(&self.pool, column, matches, value, &[])
            .await
    }

    /// Update rows where `column` matches, returning chosen columns post-write
    ///
    /// An empty `returning` list means all columns. This is the single
    /// update implementation; the convenience methods delegate here.
    #[instrument(skip_all, fields(table = %self.table, column = column))]
    pub async fn update_where_returning<'e, O, E, I, V>(
        &self,
        executor: E,
        column: &str,
        matches: I,
        value: &V,
        returning: &[&str],
    ) -> Result<Vec<O>>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        E: Executor<'e, Database = Sqlite>,
        I: Into<SqlValue>,
        V: Serialize + ?Sized,
    {
        check_identifier("column", column)?;
        let assignments = to_columns("update payload", value)?;
        if assignments.is_empty() {
            return Err(Error::Validation(
                "update payload has no columns".to_string(),
            ));
        }

        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(&self.table);
        builder.push(" SET ");
        for (i, (name, value)) in assignments.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(name);
            builder.push(" = ");
            value.push_bind(&mut builder);
        }
        push_criteria(&mut builder, &[(column.to_owned(), matches.into())]);
        push_returning(&mut builder, returning)?;

        debug!(sql = builder.sql(), "Executing update");
        builder
            .build_query_as::<O>()
            .fetch_all(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to update {}: {}", self.table, e)))
    }

    /// Delete the row(s) whose `id` column matches, returning the affected count
    ///
    /// Zero matching rows is a no-op returning zero.
    pub async fn delete_by_id<I>(&self, id: I) -> Result<u64>
    where
        I: Into<SqlValue>,
    {
        self.delete_by_id_in(&self.pool, id).await
    }

    /// `delete_by_id` within a caller-managed execution context
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn delete_by_id_in<'e, E, I>(&self, executor: E, id: I) -> Result<u64>
    where
        E: Executor<'e, Database = Sqlite>,
        I: Into<SqlValue>,
    {
        let mut builder = QueryBuilder::new("DELETE FROM ");
        builder.push(&self.table);
        push_criteria(&mut builder, &[("id".to_owned(), id.into())]);

        debug!(sql = builder.sql(), "Executing delete");
        let result = builder
            .build()
            .execute(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete from {}: {}", self.table, e)))?;
        Ok(result.rows_affected())
    }
}

/// Append a `RETURNING` clause; an empty column list means all columns
fn push_returning(builder: &mut QueryBuilder<'static, Sqlite>, returning: &[&str]) -> Result<()> {
    builder.push(" RETURNING ");
    if returning.is_empty() {
        builder.push("*");
        return Ok(());
    }
    for (i, column) in returning.iter().enumerate() {
        check_identifier("returning column", column)?;
        if i > 0 {
            builder.push(", ");
        }
        builder.push(*column);
    }
    Ok(())
}
