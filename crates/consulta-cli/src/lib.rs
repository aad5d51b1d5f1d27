//! Consulta command-line shell
//!
//! Thin shell around the bulk engine: parses flags, loads configuration,
//! installs logging, wires Ctrl-C to run cancellation and writes the result
//! artifact. Business logic lives in the `crates/` libraries.

use anyhow::{Context, Result};
use clap::Parser;
use consulta_bulk::{BulkError, BulkRun, CsvCodec, Progress, RunReport, RunSettings};
use consulta_core::{AppConfig, IdentifierKind};
use consulta_lookup::{HttpLookupClient, LookupClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Exit status for input the engine refused before any lookup.
pub const EXIT_REJECTED: u8 = 2;

/// Bulk CPF, CNPJ and CEP lookup from a spreadsheet.
#[derive(Parser, Debug, Clone)]
#[command(name = "consulta", author, version, about, long_about = None)]
pub struct Cli {
    /// Identifier kind in the input column (cpf, cnpj or cep)
    #[arg(short, long)]
    pub kind: IdentifierKind,

    /// Input spreadsheet (CSV with a header row)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the result spreadsheet is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Config file to use instead of the default location
    #[arg(short, long, env = "CONSULTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Lookups per wave
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Maximum unique identifiers per run
    #[arg(long)]
    pub max_identifiers: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,consulta=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load settings from the config file and the process environment.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from_path(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env_overrides(|name| std::env::var(name).ok());
            Ok(config)
        }
        None => AppConfig::load_with_env().context("failed to load config"),
    }
}

/// Apply command-line overrides on top of `config` and check the result.
pub fn apply_flags(cli: &Cli, mut config: AppConfig) -> Result<AppConfig> {
    if let Some(batch_size) = cli.batch_size {
        config.bulk.batch_size = batch_size;
    }
    if let Some(max) = cli.max_identifiers {
        config.bulk.max_unique_identifiers = max;
    }
    if let Some(secs) = cli.timeout_secs {
        config.lookup.timeout_secs = secs;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Read the input, run it and write the artifact. Returns the report and the
/// path that was written.
pub async fn execute(
    cli: &Cli,
    config: &AppConfig,
    cancel: CancellationToken,
) -> Result<(RunReport, PathBuf)> {
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let client: Arc<dyn LookupClient> = Arc::new(
        HttpLookupClient::new(&config.lookup).context("failed to build lookup client")?,
    );

    let run = BulkRun::new(
        RunSettings::from_config(config),
        client,
        Arc::new(CsvCodec::new()),
    )
    .with_cancellation(cancel)
    .with_progress(Arc::new(|progress: Progress| info!("{}", progress)));

    let report = run.run_bytes(cli.kind, &bytes).await?;
    let path = write_artifact(&cli.output_dir, &report).await?;
    Ok((report, path))
}

async fn write_artifact(dir: &Path, report: &RunReport) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(&report.artifact.filename);
    tokio::fs::write(&path, &report.artifact.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

/// Entry point used by the binary.
pub async fn run(cli: Cli) -> Result<()> {
    info!("Starting Consulta v{}", env!("CARGO_PKG_VERSION"));

    let config = apply_flags(&cli, load_config(&cli)?)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, remaining lookups will be marked as cancelled");
            on_interrupt.cancel();
        }
    });

    let (report, path) = execute(&cli, &config, cancel).await?;
    let summary = &report.summary;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("Wrote {}", path.display());
        println!(
            "{} of {} unique {} looked up ({} rows, {} invalid, {} duplicates)",
            summary.processed,
            summary.unique,
            summary.kind,
            summary.input_rows,
            summary.invalid,
            summary.duplicates
        );
        println!(
            "found: {}  not found: {}  failed: {}  cancelled: {}",
            summary.outcomes.found,
            summary.outcomes.not_found,
            summary.outcomes.failed,
            summary.outcomes.cancelled
        );
        for invalid in &report.invalid {
            println!("skipped {invalid}");
        }
    }

    Ok(())
}

/// Process exit status for a failed run.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BulkError>() {
        Some(bulk) if bulk.is_preflight() => EXIT_REJECTED,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consulta_bulk::ValidationError;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("consulta").chain(args.iter().copied()))
            .expect("valid args")
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_parse_args() {
        let cli = parse(&["--kind", "CNPJ", "--input", "empresas.csv", "--batch-size", "3"]);
        assert_eq!(cli.kind, IdentifierKind::Cnpj);
        assert_eq!(cli.input, PathBuf::from("empresas.csv"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.batch_size, Some(3));
        assert!(!cli.json);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = Cli::try_parse_from(["consulta", "--kind", "rg", "--input", "x.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_env_and_file() {
        let file = config_file("[bulk]\nbatch_size = 8\n\n[lookup]\ntimeout_secs = 20\n");
        let path = file.path().to_str().expect("utf-8 path");
        let cli = parse(&[
            "--kind", "cpf", "--input", "in.csv", "--config", path, "--timeout-secs", "4",
        ]);

        let mut config = AppConfig::load_from_path(file.path()).expect("load config");
        config.apply_env_overrides(|name| match name {
            "CONSULTA_BATCH_SIZE" => Some("6".to_string()),
            "CONSULTA_TIMEOUT_SECS" => Some("9".to_string()),
            _ => None,
        });
        let config = apply_flags(&cli, config).expect("config");

        assert_eq!(config.bulk.batch_size, 6);
        assert_eq!(config.lookup.timeout_secs, 4);
        assert_eq!(config.bulk.max_unique_identifiers, 250);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let file = config_file("[bulk]\nbatch_size = 2\n");
        let path = file.path().to_str().expect("utf-8 path");
        let cli = parse(&["--kind", "cep", "--input", "in.csv", "--config", path, "--batch-size", "0"]);

        let config = AppConfig::load_from_path(file.path()).expect("load config");
        let err = apply_flags(&cli, config).unwrap_err();
        assert!(format!("{err:#}").contains("batch_size"));
    }

    #[test]
    fn test_exit_codes() {
        let rejected = anyhow::Error::new(BulkError::Validation(ValidationError::EmptyInput {
            kind: IdentifierKind::Cpf,
        }));
        assert_eq!(exit_code(&rejected), EXIT_REJECTED);

        let internal = anyhow::Error::new(BulkError::Internal("boom".to_string()));
        assert_eq!(exit_code(&internal), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("io")), 1);
    }
}
