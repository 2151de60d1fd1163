//! Dump Assembler: builds a [`DatabaseSnapshot`] from a live schema.

use chrono::Utc;
use dumpster_core::render::render;
use dumpster_core::snapshot::{DatabaseSnapshot, DumpMode, TableRecord, TriggerRecord};

use crate::error::DumpError;
use crate::reader::SchemaReader;
use crate::serializer::TableSerializer;
use crate::source::SchemaSource;

/// Orchestrates reader and serializer calls into one snapshot.
pub struct DumpAssembler;

impl DumpAssembler {
    /// Introspect the schema behind `source` into a snapshot.
    ///
    /// Tables are processed before triggers, each in server order. Any
    /// failure aborts the whole snapshot. In [`DumpMode::DdlOnly`] row data is
    /// never fetched. `completed_at` is stamped after the last query.
    pub async fn build_snapshot(
        source: &dyn SchemaSource,
        mode: DumpMode,
    ) -> Result<DatabaseSnapshot, DumpError> {
        let schema = SchemaReader::current_schema_name(source).await?;
        let server_version = SchemaReader::server_version(source).await?;

        tracing::info!(
            schema = %schema,
            server_version = %server_version,
            mode = mode.as_str(),
            "Building snapshot"
        );

        let table_names = SchemaReader::list_tables(source).await?;
        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            let ddl = TableSerializer::fetch_table_ddl(source, &name).await?;
            let rows = if mode.includes_rows() {
                TableSerializer::fetch_table_rows(source, &name).await?
            } else {
                String::new()
            };
            tables.push(TableRecord { name, ddl, rows });
        }

        let trigger_names = SchemaReader::list_triggers(source).await?;
        let mut triggers = Vec::with_capacity(trigger_names.len());
        for name in trigger_names {
            let sql = TableSerializer::fetch_trigger_ddl(source, &name).await?;
            triggers.push(TriggerRecord { name, sql });
        }

        let snapshot = DatabaseSnapshot {
            schema,
            server_version,
            mode,
            tables,
            triggers,
            completed_at: Utc::now(),
        };

        tracing::info!(
            tables = snapshot.tables.len(),
            populated_tables = snapshot.populated_table_count(),
            triggers = snapshot.triggers.len(),
            "Snapshot complete"
        );

        Ok(snapshot)
    }

    /// Build a snapshot and render it to a SQL script in one step.
    pub async fn dump(
        source: &dyn SchemaSource,
        mode: DumpMode,
    ) -> Result<(DatabaseSnapshot, String), DumpError> {
        let snapshot = Self::build_snapshot(source, mode).await?;
        let script = render(&snapshot);
        Ok((snapshot, script))
    }
}
