use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod logging;

use commands::Context;
use config::DumpsterConfig;
use logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "dumpster", version)]
#[command(about = "MySQL schema and data dumps with retention-managed storage")]
struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump schema and data of the connected database
    Dump {
        /// MySQL connection URL (overrides DUMPSTER_DB_CONN_STR)
        #[arg(long)]
        db_conn: Option<String>,
        /// Store in this S3 bucket instead of the local directory
        #[arg(long)]
        bucket: Option<String>,
        /// After storing, purge dumps older than this many days
        #[arg(long, value_name = "DAYS")]
        purge: Option<u32>,
    },
    /// Export the schema definition only
    Ddl {
        /// MySQL connection URL (overrides DUMPSTER_DB_CONN_STR)
        #[arg(long)]
        db_conn: Option<String>,
        /// Store in this S3 bucket instead of the local directory
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Delete dumps older than the retention window
    Purge {
        /// Retention window in days (0 keeps everything)
        #[arg(long)]
        days: u32,
        /// Purge this S3 bucket instead of the local directory
        #[arg(long)]
        bucket: Option<String>,
        /// Print the purge report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Print version and platform
    Version,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose, LogFormat::from_env());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let span = tracing::info_span!("dumpster", app = "dumpster");
    let _entered = span.enter();

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let ctx = Context::new(DumpsterConfig::from_env())?;

    let result = match &command {
        Commands::Dump {
            db_conn,
            bucket,
            purge,
        } => commands::dump(&ctx, db_conn.as_deref(), bucket.as_deref(), *purge).await,
        Commands::Ddl { db_conn, bucket } => {
            commands::ddl(&ctx, db_conn.as_deref(), bucket.as_deref()).await
        }
        Commands::Purge { days, bucket, json } => {
            commands::purge(&ctx, *days, bucket.as_deref(), *json).await
        }
        Commands::Version => {
            println!("{}", commands::version());
            Ok(())
        }
    };

    ctx.flush_metrics().await;
    result
}
