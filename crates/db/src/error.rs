/// Errors raised while connecting to, introspecting, or reading a database.
///
/// Every variant is fatal for the snapshot being built; there is no partial
/// dump.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// The database could not be reached or failed its health check.
    #[error("Database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Preparing, executing, or scanning a statement failed.
    #[error("Query `{statement}` failed: {source}")]
    Query {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    /// A required scalar came back empty.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// A required scalar came back null or the statement returned no row.
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// `SHOW CREATE TABLE` answered for a different table than requested.
    #[error("Schema mismatch: requested table '{requested}' but server returned '{returned}'")]
    SchemaMismatch { requested: String, returned: String },

    /// `SELECT *` produced no column metadata.
    #[error("No columns found for table '{0}'")]
    NoColumns(String),
}

impl DumpError {
    pub fn query(statement: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Query {
            statement: statement.into(),
            source,
        }
    }
}
