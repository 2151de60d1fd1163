//! Table/Trigger Serializer: fetches definitions and row payloads.
//!
//! # Known limitation
//!
//! Row values are wrapped in single quotes **without escaping**. A value
//! containing `'` produces a literal that breaks (or alters) the statement
//! when the dump is replayed. Existing dumps were produced this way, so the
//! output is kept byte-compatible rather than silently hardened.

use crate::error::DumpError;
use crate::source::SchemaSource;

/// Fetches re-creation statements and row data for individual objects.
pub struct TableSerializer;

impl TableSerializer {
    /// `CREATE TABLE` text for `name`.
    ///
    /// The server echoes the table name alongside the definition; an echo
    /// that differs from `name` in any way, including letter case, fails with
    /// [`DumpError::SchemaMismatch`].
    pub async fn fetch_table_ddl(source: &dyn SchemaSource, name: &str) -> Result<String, DumpError> {
        let created = source.show_create_table(name).await?;

        let returned = created.name.unwrap_or_default();
        if returned != name {
            return Err(DumpError::SchemaMismatch {
                requested: name.to_string(),
                returned,
            });
        }

        created
            .sql
            .ok_or_else(|| DumpError::InvalidResult(format!("returned SQL for table '{name}' is null")))
    }

    /// Every row of `name` as `(v1,v2,...)` tuples joined by `,`.
    ///
    /// Returns an empty string for an empty table.
    pub async fn fetch_table_rows(source: &dyn SchemaSource, name: &str) -> Result<String, DumpError> {
        let row_set = source.select_all(name).await?;
        if row_set.columns.is_empty() {
            return Err(DumpError::NoColumns(name.to_string()));
        }

        tracing::debug!(
            table = %name,
            columns = row_set.columns.len(),
            rows = row_set.rows.len(),
            "Fetched table rows"
        );

        Ok(format_rows(&row_set.rows))
    }

    /// `CREATE TRIGGER` text for `name`.
    pub async fn fetch_trigger_ddl(source: &dyn SchemaSource, name: &str) -> Result<String, DumpError> {
        source
            .show_create_trigger(name)
            .await?
            .ok_or_else(|| DumpError::InvalidResult(format!("returned SQL for trigger '{name}' is null")))
    }
}

/// Join rows into the `VALUES` payload of a single `INSERT`.
pub fn format_rows(rows: &[Vec<Option<String>>]) -> String {
    rows.iter()
        .map(|row| format_tuple(row))
        .collect::<Vec<_>>()
        .join(",")
}

fn format_tuple(row: &[Option<String>]) -> String {
    let values: Vec<String> = row.iter().map(|v| quote_value(v.as_deref())).collect();
    format!("({})", values.join(","))
}

/// `'value'` for non-null values (unescaped), bare `null` otherwise.
pub fn quote_value(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "null".to_string(),
    }
}
