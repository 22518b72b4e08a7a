//! pg2mssql CLI - PostgreSQL catalog to SQL Server DDL conversion.

use clap::{Parser, Subcommand};
use pg2mssql::{
    CatalogSnapshot, Config, ConversionResult, ConvertError, Converter, InMemoryCatalog,
    RunOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "pg2mssql")]
#[command(about = "Convert a PostgreSQL catalog into SQL Server DDL scripts")]
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
    /// Generate T-SQL scripts from the source catalog
    Generate {
        /// Override the output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Dry run: render scripts and report them without writing files
        #[arg(long)]
        dry_run: bool,

        /// Read the catalog from a JSON snapshot instead of the database
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Capture the source catalog into a JSON snapshot file
    Snapshot {
        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Test the source database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Generate {
            output_dir,
            dry_run,
            snapshot,
        } => {
            if let Some(dir) = output_dir {
                config.conversion.output_dir = dir;
            }

            let excluded = config.conversion.excluded_schema_list();
            let converter = Converter::new(config);

            let result = match snapshot {
                Some(path) => {
                    let reader = InMemoryCatalog::new(CatalogSnapshot::load(&path)?)
                        .excluding(excluded);
                    info!("Reading catalog from snapshot {:?}", path);
                    converter.run_with_reader(&reader, dry_run).await?
                }
                None => converter.run(dry_run).await?,
            };

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_summary(&result);
            }
        }

        Commands::Snapshot { output } => {
            let converter = Converter::new(config);
            let snapshot = converter.capture_snapshot().await?;
            snapshot.save(&output)?;

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "source": snapshot.source,
                        "path": output,
                        "columns": snapshot.columns.len(),
                        "sequences": snapshot.sequences.len(),
                        "indexes": snapshot.indexes.len(),
                        "foreign_keys": snapshot.foreign_keys.len(),
                    }))?
                );
            } else {
                println!("Snapshot written to {}", output.display());
                println!("  Source: {}", snapshot.source);
                println!("  Columns: {}", snapshot.columns.len());
                println!("  Sequences: {}", snapshot.sequences.len());
            }
        }

        Commands::HealthCheck => {
            let converter = Converter::new(config);
            let result = converter.health_check().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (PostgreSQL {}): {} ({}ms)",
                    result.source,
                    if result.healthy { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref version) = result.server_version {
                    println!("    Version: {}", version);
                }
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
            }

            if !result.healthy {
                return Err(ConvertError::Connection("Health check failed".to_string()));
            }
        }
    }

    Ok(())
}

fn print_summary(result: &ConversionResult) {
    let status_msg = match (result.outcome, result.dry_run) {
        (RunOutcome::NothingToProcess, _) => "Nothing to process: no tables found.",
        (RunOutcome::Generated, true) => "Dry run completed!",
        (RunOutcome::Generated, false) => "Scripts generated!",
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  Source: {}", result.source);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Tables: {} ({} columns)",
        result.counts.tables, result.counts.columns
    );
    println!(
        "  Sequences: {} ({} clamped)",
        result.counts.sequences, result.counts.sequences_clamped
    );
    for artifact in &result.artifacts {
        println!(
            "  {} ({} statements)",
            artifact.path.display(),
            artifact.statements
        );
    }
    if !result.diagnostics.is_empty() {
        println!("  Warnings: {}", result.diagnostics.len());
        for diagnostic in &result.diagnostics {
            println!("    {}", diagnostic);
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

    // stdout carries the result; logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
