//! CRU temperature runner.
//!
//! Loads a run configuration, initializes the model from the configured
//! CRU dataset and steps it to the end date, logging per-step statistics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cru_common::time::parse_date;
use cru_temp::{CruTempModel, RunConfig};
use cru_temp_runner::{run_to, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "cru-temp-runner")]
#[command(about = "Step a CRU monthly temperature sub-window through a model run")]
struct Args {
    /// Run configuration file (YAML)
    #[arg(short, long, env = "CRU_CONFIG")]
    config: PathBuf,

    /// Stop date (YYYY-MM-DD); defaults to the configured model end date
    #[arg(long)]
    until: Option<String>,

    /// Directory holding the dataset file; overrides the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print a JSON run summary to stdout when done
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    info!(config = %args.config.display(), "Starting CRU temperature run");

    let mut config = RunConfig::from_yaml_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(dir) = &args.data_dir {
        config.data_directory = Some(dir.clone());
    }
    let until = args
        .until
        .as_deref()
        .map(parse_date)
        .transpose()
        .context("Invalid --until date")?;

    let dataset = config.dataset_path()?;
    info!(
        dataset = %dataset.display(),
        shape = %config.shape()?,
        timestep_days = config.timestep,
        "Loaded configuration"
    );

    let mut model = CruTempModel::initialize(&config)
        .with_context(|| format!("Failed to initialize from {}", dataset.display()))?;
    let steps = run_to(&mut model, until).context("Run failed")?;
    model.finalize()?;

    info!(
        steps = steps.len(),
        final_date = %model.current_date(),
        final_timestep = model.current_timestep(),
        "Run complete"
    );

    if args.summary {
        println!("{}", RunSummary::new(&model, steps).to_json()?);
    }

    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
