//! pg-schema-store CLI - forward-only PostgreSQL schema migrations.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pg_schema_store::error::EXIT_MIGRATION_FAILED;
use pg_schema_store::{
    Config, LifecycleRequest, MigrationLifecycle, MigrationProcessor, PgSessionProvider, SessionProvider,
    StoreError,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pg-schema-store")]
#[command(about = "Forward-only PostgreSQL schema migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the migration log if needed and apply pending steps
    Migrate,

    /// Show the migration log
    Status,

    /// List the configured steps without connecting to the database
    Plan,

    /// Handle a provisioning lifecycle request (Create, Update or Delete)
    Lifecycle {
        /// Request JSON file, or - for stdin
        #[arg(long, default_value = "-")]
        request: String,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<u8, StoreError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Plan => {
            let list = config.migration_list()?;
            if cli.output_json {
                let steps: Vec<_> = list.steps().collect();
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                println!("Configured migrations ({}):", list.len());
                for step in list.steps() {
                    println!("  {:>4}  {}", step.order, step.description);
                }
            }
            Ok(0)
        }

        Commands::Migrate => {
            let processor = MigrationProcessor::with_options(config.migration_list()?, config.processor_options())?;
            let provider = PgSessionProvider::new(&config.database)?;

            let session = provider.acquire().await?;
            let outcome = match processor.initialize(session.as_ref()).await {
                Ok(()) => processor.migrate(session.as_ref()).await,
                Err(e) => Err(e),
            };
            session.close().await;
            let result = outcome?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Migration {}", result);
            }
            Ok(if result.is_success() { 0 } else { EXIT_MIGRATION_FAILED })
        }

        Commands::Status => {
            let processor = MigrationProcessor::with_options(config.migration_list()?, config.processor_options())?;
            let provider = PgSessionProvider::new(&config.database)?;

            let session = provider.acquire().await?;
            let history = processor.history(session.as_ref()).await;
            session.close().await;
            let history = history?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                println!("Migration log ({}):", config.migrations.log_table);
                for record in &history {
                    let status = if record.successful { "OK" } else { "FAILED" };
                    let run_at = record
                        .run_timestamp
                        .map(|ts| ts.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {:>4}  {:<6}  {}  {}", record.creation_order, status, run_at, record.description);
                    if let Some(ref message) = record.message {
                        println!("        Error: {}", message);
                    }
                }
                let pending = processor
                    .migrations()
                    .pending_after(history.iter().filter(|r| r.successful).map(|r| r.creation_order).max().unwrap_or(0))
                    .count();
                println!("\n  Pending: {}", pending);
            }
            Ok(0)
        }

        Commands::Lifecycle { request } => {
            let raw = if request == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&request)?
            };
            let request: LifecycleRequest = serde_json::from_str(&raw)?;

            let processor = MigrationProcessor::with_options(config.migration_list()?, config.processor_options())?;
            let provider = PgSessionProvider::new(&config.database)?;
            let lifecycle = MigrationLifecycle::new(provider, processor);

            let response = lifecycle.handle(&request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_success() { 0 } else { EXIT_MIGRATION_FAILED })
        }

        Commands::HealthCheck => {
            let provider = PgSessionProvider::new(&config.database)?;
            let result = provider.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  PostgreSQL {}: {} ({}ms)",
                    provider.target(),
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref version) = result.server_version {
                    println!("    Server version: {}", version);
                }
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            match result.error {
                Some(err) if !result.connected => Err(StoreError::pool(err, "health check")),
                _ => Ok(0),
            }
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only command output.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
