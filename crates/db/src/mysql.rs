//! [`SchemaSource`] over a MySQL `sqlx` pool.
//!
//! Introspection statements are sent with the text protocol (`raw_sql`), so
//! every value arrives as text regardless of its column type and `SHOW`
//! statements never need server-side preparation. Values are scanned as raw
//! bytes and converted lossily to UTF-8, which keeps binary and numeric
//! columns readable instead of failing type checks.

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Executor, Row, Statement};

use crate::error::DumpError;
use crate::source::{CreateStatement, RowSet, SchemaSource};
use crate::DbPool;

/// Column index of the object name in `SHOW TABLES` / `SHOW TRIGGERS`.
const NAME_COLUMN: usize = 0;

/// Column index of `Create Table` in `SHOW CREATE TABLE`.
const CREATE_TABLE_COLUMN: usize = 1;

/// Column index of `SQL Original Statement` in `SHOW CREATE TRIGGER`.
const CREATE_TRIGGER_COLUMN: usize = 2;

/// Live MySQL schema reached through a connection pool.
pub struct MySqlSource {
    pool: DbPool,
}

impl MySqlSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn fetch_all(&self, statement: &str) -> Result<Vec<MySqlRow>, DumpError> {
        sqlx::raw_sql(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DumpError::query(statement, e))
    }

    async fn fetch_single(&self, statement: &str) -> Result<MySqlRow, DumpError> {
        let fetched = sqlx::raw_sql(statement).fetch_one(&self.pool).await;
        single_row(statement, fetched)
    }

    async fn first_column_of_each_row(
        &self,
        statement: &str,
    ) -> Result<Vec<Option<String>>, DumpError> {
        self.fetch_all(statement)
            .await?
            .iter()
            .map(|row| text_column(row, NAME_COLUMN, statement))
            .collect()
    }
}

#[async_trait]
impl SchemaSource for MySqlSource {
    async fn show_tables(&self) -> Result<Vec<Option<String>>, DumpError> {
        self.first_column_of_each_row("SHOW TABLES").await
    }

    async fn show_triggers(&self) -> Result<Vec<Option<String>>, DumpError> {
        self.first_column_of_each_row("SHOW TRIGGERS").await
    }

    async fn select_version(&self) -> Result<Option<String>, DumpError> {
        let statement = "SELECT version()";
        let row = self.fetch_single(statement).await?;
        text_column(&row, 0, statement)
    }

    async fn select_database(&self) -> Result<Option<String>, DumpError> {
        let statement = "SELECT DATABASE()";
        let row = self.fetch_single(statement).await?;
        text_column(&row, 0, statement)
    }

    async fn show_create_table(&self, table: &str) -> Result<CreateStatement, DumpError> {
        let statement = format!("SHOW CREATE TABLE {table}");
        let row = self.fetch_single(&statement).await?;
        Ok(CreateStatement {
            name: text_column(&row, NAME_COLUMN, &statement)?,
            sql: text_column(&row, CREATE_TABLE_COLUMN, &statement)?,
        })
    }

    /// The table name is interpolated verbatim. It only ever comes from
    /// `SHOW TABLES`; any caller passing user input here opens an injection
    /// hole.
    async fn select_all(&self, table: &str) -> Result<RowSet, DumpError> {
        let statement = format!("SELECT * FROM {table}");

        // Column metadata comes from preparing the statement, so it is known
        // even when the table is empty.
        let prepared = (&self.pool)
            .prepare(&statement)
            .await
            .map_err(|e| DumpError::query(&statement, e))?;
        let columns: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        if columns.is_empty() {
            return Ok(RowSet {
                columns,
                rows: Vec::new(),
            });
        }

        let rows = self
            .fetch_all(&statement)
            .await?
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| text_column(row, i, &statement))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowSet { columns, rows })
    }

    async fn show_create_trigger(&self, trigger: &str) -> Result<Option<String>, DumpError> {
        let statement = format!("SHOW CREATE TRIGGER {trigger}");
        let row = self.fetch_single(&statement).await?;
        text_column(&row, CREATE_TRIGGER_COLUMN, &statement)
    }
}

/// Map the outcome of a single-row fetch. An empty result is
/// [`DumpError::InvalidResult`]; any other failure is a query error.
fn single_row<R>(statement: &str, fetched: Result<R, sqlx::Error>) -> Result<R, DumpError> {
    match fetched {
        Ok(row) => Ok(row),
        Err(sqlx::Error::RowNotFound) => Err(DumpError::InvalidResult(format!(
            "`{statement}` returned no rows"
        ))),
        Err(e) => Err(DumpError::query(statement, e)),
    }
}

/// Scan column `index` as nullable text.
fn text_column(
    row: &MySqlRow,
    index: usize,
    statement: &str,
) -> Result<Option<String>, DumpError> {
    let raw: Option<Vec<u8>> = row
        .try_get_unchecked(index)
        .map_err(|e| DumpError::query(statement, e))?;
    Ok(raw.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn row_is_passed_through() {
        assert_matches!(single_row("SELECT version()", Ok(7)), Ok(7));
    }

    #[test]
    fn missing_row_is_invalid_result() {
        let result: Result<(), _> = single_row("SELECT DATABASE()", Err(sqlx::Error::RowNotFound));
        assert_matches!(
            result,
            Err(DumpError::InvalidResult(msg)) if msg.contains("SELECT DATABASE()")
        );
    }

    #[test]
    fn other_failures_keep_the_statement() {
        let result: Result<(), _> = single_row(
            "SHOW CREATE TABLE orders",
            Err(sqlx::Error::Protocol("connection reset".into())),
        );
        assert_matches!(
            result,
            Err(DumpError::Query { statement, .. }) if statement == "SHOW CREATE TABLE orders"
        );
    }
}
