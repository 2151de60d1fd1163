//! Schema Reader: lists the objects of the connected schema.

use crate::error::DumpError;
use crate::source::SchemaSource;

/// Lists tables and triggers and reads server/schema identity.
pub struct SchemaReader;

impl SchemaReader {
    /// Table names in server order. Null names are skipped with a warning.
    pub async fn list_tables(source: &dyn SchemaSource) -> Result<Vec<String>, DumpError> {
        let names = source.show_tables().await?;
        Ok(skip_null_names(names, "table"))
    }

    /// Trigger names in server order. Null names are skipped with a warning.
    pub async fn list_triggers(source: &dyn SchemaSource) -> Result<Vec<String>, DumpError> {
        let names = source.show_triggers().await?;
        Ok(skip_null_names(names, "trigger"))
    }

    /// Server version string; fails with [`DumpError::EmptyResult`] when the
    /// server reports nothing.
    pub async fn server_version(source: &dyn SchemaSource) -> Result<String, DumpError> {
        match source.select_version().await? {
            Some(version) if !version.is_empty() => Ok(version),
            _ => Err(DumpError::EmptyResult("returned version is empty".into())),
        }
    }

    /// Name of the schema the connection is bound to.
    pub async fn current_schema_name(source: &dyn SchemaSource) -> Result<String, DumpError> {
        source.select_database().await?.ok_or_else(|| {
            DumpError::InvalidResult("returned schema is null (no database selected)".into())
        })
    }
}

fn skip_null_names(names: Vec<Option<String>>, kind: &'static str) -> Vec<String> {
    names
        .into_iter()
        .enumerate()
        .filter_map(|(position, name)| {
            if name.is_none() {
                tracing::warn!(kind, position, "Skipping null name returned by introspection");
            }
            name
        })
        .collect()
}
