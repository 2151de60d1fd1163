//! The raw query surface the dump engine reads from.
//!
//! Implementations return values exactly as scanned, with SQL `NULL` as
//! `None`. Validation (null names, empty versions, mismatched echoes) is the
//! job of [`crate::reader`] and [`crate::serializer`], so it behaves the same
//! for every implementation.

use async_trait::async_trait;

use crate::error::DumpError;

/// Result of a `SHOW CREATE ...` statement: the echoed object name and its
/// definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateStatement {
    pub name: Option<String>,
    pub sql: Option<String>,
}

/// Every row of a table, each value rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    /// Column names from statement metadata, known even with zero rows.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Read-only introspection queries against one live schema.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// `SHOW TABLES`, in server order.
    async fn show_tables(&self) -> Result<Vec<Option<String>>, DumpError>;

    /// Trigger names from `SHOW TRIGGERS`, in server order.
    async fn show_triggers(&self) -> Result<Vec<Option<String>>, DumpError>;

    /// `SELECT version()`.
    async fn select_version(&self) -> Result<Option<String>, DumpError>;

    /// `SELECT DATABASE()`.
    async fn select_database(&self) -> Result<Option<String>, DumpError>;

    /// `SHOW CREATE TABLE <table>`.
    async fn show_create_table(&self, table: &str) -> Result<CreateStatement, DumpError>;

    /// `SELECT * FROM <table>`.
    async fn select_all(&self, table: &str) -> Result<RowSet, DumpError>;

    /// Original statement column of `SHOW CREATE TRIGGER <trigger>`.
    async fn show_create_trigger(&self, trigger: &str) -> Result<Option<String>, DumpError>;
}
