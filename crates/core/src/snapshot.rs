//! In-memory model of one database dump before it is rendered to text.
//!
//! A [`DatabaseSnapshot`] is built fresh for every invocation, rendered once
//! by [`crate::render::render`], and then dropped. Table and trigger order is
//! the order the server listed them in and is never re-sorted.

use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Dump mode
// ---------------------------------------------------------------------------

/// Whether a snapshot carries row data or only schema definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpMode {
    /// Schema only: table and trigger definitions, no rows.
    DdlOnly,
    /// Schema plus every table's rows.
    FullDump,
}

impl DumpMode {
    /// Whether row payloads should be fetched and kept.
    pub fn includes_rows(self) -> bool {
        matches!(self, Self::FullDump)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DdlOnly => "ddl_only",
            Self::FullDump => "full_dump",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One table: its re-creation statement and serialized rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    pub name: String,
    /// Raw `CREATE TABLE` text as returned by the server.
    pub ddl: String,
    /// Comma-joined `(v1,v2,...)` tuples. Empty when the table has no rows
    /// or the snapshot is [`DumpMode::DdlOnly`].
    pub rows: String,
}

impl TableRecord {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// One trigger and its re-creation statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerRecord {
    pub name: String,
    pub sql: String,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Root document of a dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSnapshot {
    pub schema: String,
    pub server_version: String,
    pub mode: DumpMode,
    pub tables: Vec<TableRecord>,
    pub triggers: Vec<TriggerRecord>,
    /// Stamped after all introspection I/O has finished.
    pub completed_at: Timestamp,
}

impl DatabaseSnapshot {
    /// Number of tables that carry at least one row.
    pub fn populated_table_count(&self) -> usize {
        self.tables.iter().filter(|t| t.has_rows()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn table(name: &str, rows: &str) -> TableRecord {
        TableRecord {
            name: name.into(),
            ddl: format!("CREATE TABLE `{name}` (id int)"),
            rows: rows.into(),
        }
    }

    #[test]
    fn mode_includes_rows() {
        assert!(DumpMode::FullDump.includes_rows());
        assert!(!DumpMode::DdlOnly.includes_rows());
    }

    #[test]
    fn populated_table_count_ignores_empty_tables() {
        let snapshot = DatabaseSnapshot {
            schema: "shop".into(),
            server_version: "8.0.36".into(),
            mode: DumpMode::FullDump,
            tables: vec![table("a", "('1')"), table("b", ""), table("c", "('2'),('3')")],
            triggers: vec![],
            completed_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        };
        assert_eq!(snapshot.populated_table_count(), 2);
    }

    #[test]
    fn snapshot_serializes_mode_as_snake_case() {
        let snapshot = DatabaseSnapshot {
            schema: "shop".into(),
            server_version: "8.0.36".into(),
            mode: DumpMode::DdlOnly,
            tables: vec![],
            triggers: vec![],
            completed_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&snapshot).expect("serialization should succeed");
        assert_eq!(json["mode"], "ddl_only");
        assert_eq!(json["schema"], "shop");
    }
}
