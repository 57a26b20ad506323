//! Sieve CLI
//!
//! Runs the daisy-chain prime sieve (or the sequential bitset sieve) and
//! prints the sampled primes in the requested format.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sieve_core::config::check_max_value;
use sieve_core::report::render;
use sieve_core::{
    Bound, ConfigOverrides, Eratosthenes, OutputFormat, PrimeSample, RunSummary, Sieve,
    SieveConfig,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default upper limit for the bitset sieve
const DEFAULT_SIEVE_MAX: u64 = 1000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sieve - daisy-chained concurrent prime sieve")]
struct Args {
    /// JSON config file (falls back to $SIEVE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run the concurrent daisy-chain sieve (default)
    Daisy(DaisyArgs),
    /// Run the sequential bitset sieve and list every prime up to --max
    Eratosthenes {
        /// Maximum number to search to
        #[arg(long, default_value_t = DEFAULT_SIEVE_MAX)]
        max: u64,
        /// Output format (text, csv, json, md)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
        /// File to write output to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Default)]
struct DaisyArgs {
    /// Number of primes to discover
    #[arg(short = 'n', long, conflicts_with = "max_value")]
    count: Option<usize>,
    /// Discover every prime up to this value instead
    #[arg(long)]
    max_value: Option<u64>,
    /// Percentage of discovered primes to print
    #[arg(short, long)]
    percent: Option<f64>,
    /// Buffer size of each inter-stage channel
    #[arg(long)]
    capacity: Option<usize>,
    /// Output format (text, csv, json, md)
    #[arg(short, long)]
    format: Option<OutputFormat>,
    /// File to write output to (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl DaisyArgs {
    fn overrides(&self) -> ConfigOverrides {
        let bound = match (self.count, self.max_value) {
            (Some(n), _) => Some(Bound::Count(n)),
            (None, Some(v)) => Some(Bound::MaxValue(v)),
            (None, None) => None,
        };
        ConfigOverrides {
            bound,
            sampling_percent: self.percent,
            channel_capacity: self.capacity,
            format: self.format,
        }
    }
}

/// Defaults, then the config file, then flags
async fn resolve_config(path: Option<&Path>, args: &DaisyArgs) -> Result<SieveConfig> {
    let mut config = match path {
        Some(path) => SieveConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SieveConfig::from_env()
            .await
            .context("Failed to load config from SIEVE_CONFIG")?
            .unwrap_or_default(),
    };
    config.apply(args.overrides());
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

async fn run_daisy(config_path: Option<&Path>, args: DaisyArgs) -> Result<()> {
    let config = resolve_config(config_path, &args).await?;
    let format = config.format;

    let outcome = Sieve::new(config)?.run().await.context("Sieve run failed")?;

    let mut out = open_output(args.output.as_deref())?;
    render(format, &outcome.samples, &outcome.summary, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run_eratosthenes(max: u64, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let limit = check_max_value(max).context("Invalid --max")?;
    let sieve = Eratosthenes::new(limit);

    let samples: Vec<PrimeSample> = sieve
        .primes()
        .enumerate()
        .map(|(i, prime)| PrimeSample {
            index: i + 1,
            prime,
        })
        .collect();
    let summary = RunSummary {
        bound: Bound::MaxValue(max),
        total_primes: samples.len(),
        sampled: samples.len(),
        sampling_percent: 100.0,
        largest_prime: samples.last().map(|s| s.prime),
        stages: 0,
    };
    tracing::info!(max, primes = summary.total_primes, "Bitset sieve finished");

    let mut out = open_output(output)?;
    render(format, &samples, &summary, &mut out)?;
    out.flush()?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        Some(CliCommand::Daisy(daisy)) => run_daisy(config_path, daisy).await,
        Some(CliCommand::Eratosthenes {
            max,
            format,
            output,
        }) => run_eratosthenes(max, format, output.as_deref()),
        None => run_daisy(config_path, DaisyArgs::default()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_daisy_flags() {
        let args = Args::try_parse_from([
            "sieve", "daisy", "-n", "10", "--percent", "50", "--format", "CSV",
        ])
        .unwrap();
        let Some(CliCommand::Daisy(daisy)) = args.command else {
            panic!("expected daisy subcommand");
        };
        let overrides = daisy.overrides();
        assert_eq!(overrides.bound, Some(Bound::Count(10)));
        assert_eq!(overrides.sampling_percent, Some(50.0));
        assert_eq!(overrides.format, Some(OutputFormat::Csv));
    }

    #[test]
    fn test_count_conflicts_with_max_value() {
        let result =
            Args::try_parse_from(["sieve", "daisy", "--count", "10", "--max-value", "100"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Args::try_parse_from(["sieve", "eratosthenes", "--format", "yaml"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sieve.json");
        std::fs::write(&path, r#"{ "sampling_percent": 10.0, "channel_capacity": 4 }"#).unwrap();

        let args = DaisyArgs {
            count: Some(20),
            percent: Some(25.0),
            ..DaisyArgs::default()
        };
        let config = resolve_config(Some(&path), &args).await.unwrap();
        assert_eq!(config.bound, Bound::Count(20));
        assert_eq!(config.sampling_percent, 25.0);
        assert_eq!(config.channel_capacity, 4);
    }

    #[tokio::test]
    async fn test_daisy_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("primes.csv");
        let args = DaisyArgs {
            count: Some(10),
            percent: Some(100.0),
            format: Some(OutputFormat::Csv),
            output: Some(output.clone()),
            ..DaisyArgs::default()
        };
        let config = dir.path().join("empty.json");
        std::fs::write(&config, "{}").unwrap();

        run_daisy(Some(&config), args).await.unwrap();

        let csv = std::fs::read_to_string(&output).unwrap();
        assert!(csv.starts_with("index,prime\n1,2\n"));
        assert!(csv.ends_with("10,29\n"));
    }

    #[test]
    fn test_eratosthenes_rejects_oversized_max() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("primes.txt");
        let result = run_eratosthenes(
            sieve_core::config::MAX_VALUE_BOUND + 1,
            OutputFormat::Text,
            Some(&output),
        );
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_daisy_rejects_oversized_max_value() {
        let args = DaisyArgs {
            max_value: Some(1_000_000_000_000_000_000),
            ..DaisyArgs::default()
        };
        let config = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(config.path(), "{}").unwrap();
        assert!(resolve_config(Some(config.path()), &args).await.is_err());
    }

    #[test]
    fn test_eratosthenes_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("primes.md");
        run_eratosthenes(30, OutputFormat::Markdown, Some(&output)).unwrap();

        let md = std::fs::read_to_string(&output).unwrap();
        assert!(md.contains("| 10 | 29 |"));
        assert!(md.ends_with("That was 100% of the 10 prime numbers up to 30.\n"));
    }
}
