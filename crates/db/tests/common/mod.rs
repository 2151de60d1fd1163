//! In-memory [`SchemaSource`] used by the dump engine integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use dumpster_db::source::{CreateStatement, RowSet, SchemaSource};
use dumpster_db::DumpError;

/// One table as the fake server reports it.
#[derive(Debug, Clone)]
pub struct FakeTable {
    /// Name as listed by `SHOW TABLES` (`None` = null row).
    pub listed: Option<String>,
    /// Name echoed back by `SHOW CREATE TABLE`.
    pub echoed: Option<String>,
    pub ddl: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            listed: Some(name.to_string()),
            echoed: Some(name.to_string()),
            ddl: Some(format!("CREATE TABLE `{name}` (\n  `id` int NOT NULL\n)")),
            columns: vec!["id".to_string()],
            rows: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_row(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }
}

/// A scriptable stand-in for a MySQL schema.
pub struct FakeSource {
    pub database: Option<String>,
    pub version: Option<String>,
    pub tables: Vec<FakeTable>,
    /// `(listed name, original statement)` pairs.
    pub triggers: Vec<(Option<String>, Option<String>)>,
    /// Statement prefix that should fail with a query error.
    pub fail_on: Option<String>,
    /// Every statement issued, in order.
    pub log: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(database: &str) -> Self {
        Self {
            database: Some(database.to_string()),
            version: Some("8.0.36".to_string()),
            tables: Vec::new(),
            triggers: Vec::new(),
            fail_on: None,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_table(mut self, table: FakeTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_trigger(mut self, name: &str) -> Self {
        self.triggers.push((
            Some(name.to_string()),
            Some(format!(
                "CREATE TRIGGER {name} BEFORE INSERT ON orders FOR EACH ROW SET NEW.id = NEW.id"
            )),
        ));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn issue(&self, statement: String) -> Result<(), DumpError> {
        self.log.lock().unwrap().push(statement.clone());
        match &self.fail_on {
            Some(prefix) if statement.starts_with(prefix.as_str()) => Err(DumpError::query(
                statement,
                sqlx::Error::Protocol("simulated failure".into()),
            )),
            _ => Ok(()),
        }
    }

    fn table(&self, name: &str) -> Option<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.listed.as_deref() == Some(name))
    }
}

#[async_trait]
impl SchemaSource for FakeSource {
    async fn show_tables(&self) -> Result<Vec<Option<String>>, DumpError> {
        self.issue("SHOW TABLES".into())?;
        Ok(self.tables.iter().map(|t| t.listed.clone()).collect())
    }

    async fn show_triggers(&self) -> Result<Vec<Option<String>>, DumpError> {
        self.issue("SHOW TRIGGERS".into())?;
        Ok(self.triggers.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn select_version(&self) -> Result<Option<String>, DumpError> {
        self.issue("SELECT version()".into())?;
        Ok(self.version.clone())
    }

    async fn select_database(&self) -> Result<Option<String>, DumpError> {
        self.issue("SELECT DATABASE()".into())?;
        Ok(self.database.clone())
    }

    async fn show_create_table(&self, table: &str) -> Result<CreateStatement, DumpError> {
        self.issue(format!("SHOW CREATE TABLE {table}"))?;
        let found = self
            .table(table)
            .ok_or_else(|| DumpError::InvalidResult(format!("no table {table}")))?;
        Ok(CreateStatement {
            name: found.echoed.clone(),
            sql: found.ddl.clone(),
        })
    }

    async fn select_all(&self, table: &str) -> Result<RowSet, DumpError> {
        self.issue(format!("SELECT * FROM {table}"))?;
        let found = self
            .table(table)
            .ok_or_else(|| DumpError::InvalidResult(format!("no table {table}")))?;
        Ok(RowSet {
            columns: found.columns.clone(),
            rows: found.rows.clone(),
        })
    }

    async fn show_create_trigger(&self, trigger: &str) -> Result<Option<String>, DumpError> {
        self.issue(format!("SHOW CREATE TRIGGER {trigger}"))?;
        Ok(self
            .triggers
            .iter()
            .find(|(name, _)| name.as_deref() == Some(trigger))
            .and_then(|(_, sql)| sql.clone()))
    }
}
