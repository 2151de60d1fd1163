//! MySQL introspection and dump assembly.
//!
//! [`source::SchemaSource`] is the raw query surface; [`mysql::MySqlSource`]
//! implements it over a `sqlx` pool. On top of it, [`reader::SchemaReader`]
//! lists objects, [`serializer::TableSerializer`] fetches definitions and
//! rows, and [`assembler::DumpAssembler`] composes them into a
//! [`dumpster_core::snapshot::DatabaseSnapshot`].

use sqlx::mysql::MySqlPoolOptions;

pub mod assembler;
pub mod error;
pub mod mysql;
pub mod reader;
pub mod serializer;
pub mod source;

pub use error::DumpError;

pub type DbPool = sqlx::MySqlPool;

/// Create a connection pool from a database URL.
///
/// Dumps run strictly sequentially, so a single connection is enough.
pub async fn create_pool(database_url: &str) -> Result<DbPool, DumpError> {
    MySqlPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .map_err(DumpError::Connection)
}

/// Verify the connection is usable before starting any introspection.
pub async fn health_check(pool: &DbPool) -> Result<(), DumpError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DumpError::Connection)?;
    Ok(())
}
