//! CLI entry point for the metadata-driven cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use metaclean::reporting::{DEFAULT_OUTPUT_NAME, OutputWriter};
use metaclean::{CleaningResult, MetadataTable, Pipeline, PipelineConfig, RegexScope};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Metadata-driven data cleaning",
    long_about = "Cleans a CSV table as directed by a metadata CSV holding one row per column.\n\n\
                  EXAMPLES:\n  \
                  # Clean data.csv and write outputs/df_clean.csv\n  \
                  metaclean -i data.csv -m metadata.csv\n\n  \
                  # Also write a per-column description\n  \
                  metaclean -i data.csv -m metadata.csv --describe\n\n  \
                  # Print the run summary as JSON\n  \
                  metaclean -i data.csv -m metadata.csv --json"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the metadata CSV (one row per column, keyed by column_name)
    #[arg(short, long)]
    metadata: PathBuf,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Base name of the output files (without extension)
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    output_name: String,

    /// JSON file with pipeline configuration
    ///
    /// Command line flags override values read from the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Apply regex pairs only to the column whose row declares them
    #[arg(long)]
    per_column_regex: bool,

    /// Write a per-column description as <output-name>_description.csv
    #[arg(long)]
    describe: bool,

    /// Output the run summary as JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    for path in [&args.input, &args.metadata] {
        if !path.exists() {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
    }

    let config = load_config(&args)?;

    info!("Loading dataset from: {}", args.input.display());
    let data = load_data(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    info!("Loading metadata from: {}", args.metadata.display());
    let metadata = MetadataTable::from_dataframe(&load_metadata(&args.metadata)?)?;
    info!("Metadata loaded for {} columns", metadata.len());

    let pipeline = Pipeline::builder().config(config).build()?;

    match pipeline.process(&data, &metadata) {
        Ok(result) => handle_output(result, &args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Read the configuration file, if any, and apply command line overrides.
fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if args.per_column_regex {
        config.regex_scope = RegexScope::PerColumn;
    }
    if args.describe {
        config.describe_output = true;
    }

    config.validate()?;
    Ok(config)
}

/// Load the data table, parsing date columns.
fn load_data(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Load the metadata table with every column read as text.
fn load_metadata(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Write the outputs and print the summary.
fn handle_output(mut result: CleaningResult, args: &Args) -> Result<()> {
    let writer = OutputWriter::new(&args.output, Some(args.output_name.clone()));

    let table_path = writer.write_table(&mut result.table)?;
    if let Some(description) = result.description.as_mut() {
        writer.write_description(description)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
        return Ok(());
    }

    print_human_readable_summary(&result, &table_path, args);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` rather than logging: this is the primary output of the
/// command and stays visible regardless of the log level.
fn print_human_readable_summary(result: &CleaningResult, table_path: &Path, args: &Args) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input.display(),
        summary.rows_before,
        summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        table_path.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!("Duration: {}ms", summary.duration_ms);
    println!();

    let applied: Vec<_> = summary.applied_stages().collect();
    if applied.is_empty() {
        println!("No metadata flags set; table written unchanged.");
    } else {
        println!("Stages Applied:");
        for stage in applied {
            print!("  - {}: {}", stage.stage, stage.columns.join(", "));
            if stage.rows_removed() > 0 {
                print!(" ({} rows removed)", stage.rows_removed());
            }
            println!();
        }
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
