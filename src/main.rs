use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use measurement_processing::config::ProcessingConfig;
use measurement_processing::execution::{ExecutionOptions, PipelineExecutor};
use measurement_processing::export::{export, ExportFormat, ExportOptions};
use measurement_processing::ingestion::{load_from_path, LoadOptions};
use measurement_processing::pipeline::{FailureKind, PipelineParams, TracingObserver};
use measurement_processing::processing::compute_statistics;
use measurement_processing::DataProcessor;

#[derive(Parser)]
#[command(name = "measurement-processing")]
#[command(about = "Filter, clean and summarize measurement reports")]
#[command(version)]
struct Cli {
    /// TOML file overriding column names, separators and default parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the processing pipeline and export the result
    Process(ProcessArgs),
    /// Print row/column counts, memory use and first timestamp of a report
    Summary {
        input: PathBuf,
    },
}

/// Pipeline switches come in pairs so either setting can override the config file; the
/// last one given wins.
#[derive(Args)]
struct ProcessArgs {
    /// Report to read (.csv/.txt, or a workbook with the `excel` feature)
    input: PathBuf,
    /// Batch to keep (0 keeps every batch)
    #[arg(long)]
    lote: Option<u64>,
    /// Inclusive lower bound on the index column (0 disables it)
    #[arg(long)]
    min_index: Option<u64>,
    /// Inclusive upper bound on the index column (0 disables it)
    #[arg(long)]
    max_index: Option<u64>,
    /// Drop rows whose cells are all empty
    #[arg(long, overrides_with = "keep_nulls")]
    remove_nulls: bool,
    /// Keep rows whose cells are all empty
    #[arg(long, overrides_with = "remove_nulls")]
    keep_nulls: bool,
    /// Append min-max normalized columns
    #[arg(long, overrides_with = "no_normalize")]
    normalize: bool,
    /// Do not append normalized columns
    #[arg(long, overrides_with = "normalize")]
    no_normalize: bool,
    /// Append the numeric time-difference column
    #[arg(long, overrides_with = "no_time_difference")]
    time_difference: bool,
    /// Do not append the time-difference column
    #[arg(long, overrides_with = "time_difference")]
    no_time_difference: bool,
    /// Export destination; format follows the extension (.csv, .txt, .xlsx). Repeatable.
    #[arg(long, short)]
    output: Vec<PathBuf>,
    /// Print statistics as JSON instead of a table
    #[arg(long)]
    stats_json: bool,
    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    threads: Option<usize>,
}

impl ProcessArgs {
    /// Command-line values over `defaults`.
    fn resolve_params(&self, defaults: PipelineParams) -> PipelineParams {
        PipelineParams {
            lote_number: self.lote.unwrap_or(defaults.lote_number),
            min_index: self.min_index.unwrap_or(defaults.min_index),
            max_index: self.max_index.unwrap_or(defaults.max_index),
            remove_nulls: flag(self.remove_nulls, self.keep_nulls, defaults.remove_nulls),
            normalize: flag(self.normalize, self.no_normalize, defaults.normalize),
            time_difference: flag(
                self.time_difference,
                self.no_time_difference,
                defaults.time_difference,
            ),
        }
    }
}

fn flag(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ProcessingConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProcessingConfig::default(),
    };

    match cli.command {
        Commands::Process(args) => {
            let params = args.resolve_params(config.defaults);
            let ProcessArgs {
                input,
                output,
                stats_json,
                threads,
                ..
            } = args;

            let targets = output
                .into_iter()
                .map(|path| match ExportFormat::from_path(&path) {
                    Some(format) => Ok((path, format)),
                    None => bail!("unsupported output extension: {}", path.display()),
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let ds = load_from_path(&input, &LoadOptions::from_config(&config), &config)
                .with_context(|| format!("loading {}", input.display()))?;

            let export_opts = ExportOptions::from_config(&config);
            let executor = PipelineExecutor::new(ExecutionOptions { num_threads: threads }, config)?
                .with_observer(Arc::new(TracingObserver));

            let outcome = executor
                .submit(ds, params)
                .wait_with_progress(|c| info!(percent = c.percent(), "progress"));
            let processed = match outcome {
                Ok(ds) => ds,
                Err(failure) if failure.kind == FailureKind::NoData => {
                    eprintln!("{failure}");
                    std::process::exit(2);
                }
                Err(failure) => bail!(failure),
            };

            let report = compute_statistics(&processed);
            if stats_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }

            for (path, format) in targets {
                export(&processed, format, &path, &export_opts)?;
                println!("wrote {}", path.display());
            }
        }
        Commands::Summary { input } => {
            let mut processor =
                DataProcessor::new(&input, config.separator_byte()).with_config(config);
            processor
                .load()
                .with_context(|| format!("loading {}", input.display()))?;
            print!("{}", processor.get_summary()?);
        }
    }

    Ok(())
}
