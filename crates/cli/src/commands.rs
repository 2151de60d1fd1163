//! Command bodies. Each command resolves its inputs from [`DumpsterConfig`]
//! plus flag overrides, runs to completion and releases every resource it
//! acquired before returning.

use std::sync::Arc;

use anyhow::Context as _;
use dumpster_core::naming::{ddl_key, dump_key, DUMP_DIR};
use dumpster_core::snapshot::{DatabaseSnapshot, DumpMode};
use dumpster_db::assembler::DumpAssembler;
use dumpster_db::mysql::MySqlSource;
use dumpster_db::DumpError;
use dumpster_storage::{
    LocalStorage, PurgeReport, RetentionPurger, S3Config, S3Storage, Storage, StorageMetrics,
};

use crate::config::{ConnectionSource, DumpsterConfig};

/// Shared state for one invocation.
pub struct Context {
    pub config: DumpsterConfig,
    pub metrics: Arc<StorageMetrics>,
}

impl Context {
    pub fn new(config: DumpsterConfig) -> anyhow::Result<Self> {
        let metrics = StorageMetrics::new().context("failed to register storage metrics")?;
        Ok(Self {
            config,
            metrics: Arc::new(metrics),
        })
    }

    /// Open the S3 backend when a bucket is configured, the local one
    /// otherwise.
    async fn open_backend(&self, bucket_flag: Option<&str>) -> anyhow::Result<Arc<dyn Storage>> {
        match self.config.bucket(bucket_flag) {
            Some(bucket) => {
                let s3_config = S3Config {
                    bucket,
                    endpoint: self.config.s3_endpoint.clone(),
                };
                let storage = S3Storage::connect(&s3_config, self.metrics.clone())
                    .await
                    .context("failed to open S3 storage")?;
                Ok(Arc::new(storage))
            }
            None => {
                tracing::info!(root = %self.config.local_root.display(), "Using local storage");
                Ok(Arc::new(LocalStorage::new(
                    &self.config.local_root,
                    self.metrics.clone(),
                )))
            }
        }
    }

    fn purger(&self, backend: Arc<dyn Storage>) -> RetentionPurger {
        RetentionPurger::new(backend).with_local_dump_dir(self.config.local_root.join(DUMP_DIR))
    }

    /// Write the metrics text file if one is configured. Failures are logged
    /// and never change the command outcome.
    pub async fn flush_metrics(&self) {
        let Some(path) = &self.config.metrics_file else {
            return;
        };

        match self.metrics.render() {
            Ok(text) => {
                if let Err(e) = tokio::fs::write(path, text).await {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics file");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Full dump, stored as `dumps/<schema>/<timestamp>.sql`, optionally
/// followed by a retention purge.
pub async fn dump(
    ctx: &Context,
    db_conn: Option<&str>,
    bucket: Option<&str>,
    purge_days: Option<u32>,
) -> anyhow::Result<()> {
    let connection = ctx.config.connection_source(db_conn)?;
    let backend = ctx.open_backend(bucket).await?;

    let (snapshot, script) = snapshot(&connection, DumpMode::FullDump).await?;
    let key = dump_key(&snapshot.schema, snapshot.completed_at);
    store(backend.as_ref(), &key, script).await?;

    if let Some(days) = purge_days {
        let report = ctx.purger(backend).purge(days).await.context("retention purge failed")?;
        log_report(&report);
    }

    Ok(())
}

/// Schema-only export, stored as `ddl/<schema>.sql`.
pub async fn ddl(ctx: &Context, db_conn: Option<&str>, bucket: Option<&str>) -> anyhow::Result<()> {
    let connection = ctx.config.connection_source(db_conn)?;
    let backend = ctx.open_backend(bucket).await?;

    let (snapshot, script) = snapshot(&connection, DumpMode::DdlOnly).await?;
    store(backend.as_ref(), &ddl_key(&snapshot.schema), script).await
}

/// Standalone retention purge.
pub async fn purge(ctx: &Context, days: u32, bucket: Option<&str>, json: bool) -> anyhow::Result<()> {
    let backend = ctx.open_backend(bucket).await?;
    let report = ctx.purger(backend).purge(days).await.context("retention purge failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        log_report(&report);
    }
    Ok(())
}

pub fn version() -> String {
    format!(
        "dumpster {} ({}/{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Connect, snapshot and render. The pool is closed whether or not the
/// snapshot succeeds.
async fn snapshot(
    connection: &ConnectionSource,
    mode: DumpMode,
) -> anyhow::Result<(DatabaseSnapshot, String)> {
    let url = connection.connection_string()?;
    tracing::info!(database = %connection.describe(), mode = mode.as_str(), "Connecting to MySQL");

    let pool = dumpster_db::create_pool(&url)
        .await
        .context("failed to connect to MySQL")?;

    let result: Result<_, DumpError> = async {
        dumpster_db::health_check(&pool).await?;
        let source = MySqlSource::new(pool.clone());
        DumpAssembler::dump(&source, mode).await
    }
    .await;

    pool.close().await;
    result.context("snapshot failed")
}

async fn store(backend: &dyn Storage, key: &str, script: String) -> anyhow::Result<()> {
    let bytes = script.len();
    backend
        .save(key, script.into_bytes())
        .await
        .with_context(|| format!("failed to store {key}"))?;
    tracing::info!(key = %key, bytes, "Dump stored");
    Ok(())
}

fn log_report(report: &PurgeReport) {
    match report.cutoff {
        Some(cutoff) => tracing::info!(
            cutoff = %cutoff,
            local_removed = report.local_removed,
            backend_removed = report.backend_removed,
            "Retention purge finished"
        ),
        None => tracing::info!("Retention disabled (0 days), nothing purged"),
    }
}
