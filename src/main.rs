use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use kato_sorter::config::SorterConfig;
use kato_sorter::model::RunSummary;
use kato_sorter::{KatoError, Result, pipeline};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| KatoError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let summary = pipeline::run(config, !cli.no_cleanup)?;

    if let Some(path) = &cli.summary {
        write_summary(path, &summary)?;
    }
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Regroup KATO-coded report workbooks into one workbook per area code."
)]
struct Cli {
    /// Root folder scanned for source workbooks. Defaults to the current folder.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Root folder for the per-region output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file with sorter settings; flags given here take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep previously generated folders instead of deleting them first.
    #[arg(long)]
    no_cleanup: bool,

    /// Write a JSON run summary to this path.
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<SorterConfig> {
        let mut config = match &self.config {
            Some(path) => SorterConfig::load(path)?,
            None => SorterConfig::default(),
        };
        if let Some(input) = &self.input {
            config = config.with_input(input);
        }
        if let Some(output) = &self.output {
            config = config.with_output(output);
        }
        Ok(config)
    }
}
