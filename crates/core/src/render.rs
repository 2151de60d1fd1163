//! SQL script rendering for a [`DatabaseSnapshot`].
//!
//! Rendering is a pure function of the snapshot: the only time value in the
//! output is the snapshot's own `completed_at` stamp.
//!
//! Layout:
//!
//! ```text
//! -- Server version	<version>
//!
//! CREATE DATABASE IF NOT EXISTS <schema>;
//! USE <schema>;
//!
//! SET FOREIGN_KEY_CHECKS=0;
//!
//! -- Table structure for table <name>
//! DROP TABLE IF EXISTS <name>;          (full dump only)
//! <ddl>;
//!
//! -- Data dump for table <name>         (only when the table has rows)
//! LOCK TABLES <name> WRITE;
//!
//! INSERT INTO <name> VALUES <rows>;
//!
//! UNLOCK TABLES;
//!
//! SET FOREIGN_KEY_CHECKS=1;
//!
//! -- Trigger structure for trigger <name>
//! <sql>;
//!
//! -- Dump completed at <timestamp>
//! ```

use chrono::SecondsFormat;

use crate::snapshot::{DatabaseSnapshot, DumpMode, TableRecord, TriggerRecord};

/// Render a snapshot into a replayable SQL script.
///
/// In [`DumpMode::FullDump`] every table is preceded by
/// `DROP TABLE IF EXISTS`, so replaying the script replaces existing tables.
pub fn render(snapshot: &DatabaseSnapshot) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("-- Server version\t{}\n\n", snapshot.server_version));
    out.push_str(&format!("CREATE DATABASE IF NOT EXISTS {};\n", snapshot.schema));
    out.push_str(&format!("USE {};\n\n", snapshot.schema));

    out.push_str("SET FOREIGN_KEY_CHECKS=0;\n");
    for table in &snapshot.tables {
        render_table(&mut out, table, snapshot.mode);
    }
    out.push_str("\n\nSET FOREIGN_KEY_CHECKS=1;\n\n");

    for trigger in &snapshot.triggers {
        render_trigger(&mut out, trigger);
    }

    out.push_str(&format!(
        "\n\n-- Dump completed at {}\n",
        snapshot
            .completed_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    out
}

fn render_table(out: &mut String, table: &TableRecord, mode: DumpMode) {
    let name = &table.name;

    out.push_str(&format!("\n-- Table structure for table {name}\n"));
    if mode == DumpMode::FullDump {
        out.push_str(&format!("DROP TABLE IF EXISTS {name};\n"));
    }
    out.push_str(&format!("{};\n", table.ddl));

    if table.has_rows() {
        out.push_str(&format!("\n-- Data dump for table {name}\n"));
        out.push_str(&format!("LOCK TABLES {name} WRITE;\n\n"));
        out.push_str(&format!("INSERT INTO {name} VALUES {};\n\n", table.rows));
        out.push_str("UNLOCK TABLES;\n");
    }
}

fn render_trigger(out: &mut String, trigger: &TriggerRecord) {
    out.push_str(&format!(
        "\n-- Trigger structure for trigger {}\n{};\n",
        trigger.name, trigger.sql
    ));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
