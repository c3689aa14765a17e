//! Install Config - the cluster install-config asset.
//!
//! This library assembles a cluster's install config from resolved inputs or
//! loads a persisted one, upgrades old schema versions, applies defaults and
//! validates it structurally and against its target platform.

pub mod asset;
pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod validation;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::asset::InstallConfigAsset;
use crate::cli::{AssetDirArgs, Cli, Commands, CreateArgs, LogFormat};
use crate::config::{FsFetcher, InputsFile, Parents, ResolvedInputs, INSTALL_CONFIG_FILENAME};
use crate::error::{DependencyError, InstallConfigError};
use crate::platform::{PlatformKind, PlatformRegistry};
use crate::validation::report::format_report;
use crate::validation::ValidationResult;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "INSTALL_CONFIG_LOG";

/// Runs the command selected on the command line.
pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level(), cli.log_format)?;

    let asset = InstallConfigAsset::builtin();
    match cli.command {
        Commands::Create(args) => create(&asset, args).await,
        Commands::Validate(args) => validate(&asset, &args).await,
        Commands::Show(args) => show(&asset, &args).await,
        Commands::Platforms => list_platforms(&asset),
    }
}

/// Initializes the tracing subscriber for structured logging.
fn setup_logging(level: &str, format: LogFormat) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }

    Ok(())
}

/// Parent inputs for a create run without an inputs file.
struct NoInputs;

impl Parents for NoInputs {
    fn resolve(&self) -> Result<ResolvedInputs, DependencyError> {
        Err(DependencyError::Unavailable {
            name: "inputs".to_string(),
            message: "no install config found and no inputs file given (--inputs or INSTALL_CONFIG_INPUTS)"
                .to_string(),
        })
    }
}

/// Loads or generates the install config and writes it into the asset directory.
async fn create(asset: &InstallConfigAsset, args: CreateArgs) -> Result<()> {
    let fetcher = FsFetcher::new(args.asset.dir);

    let finished = match args.inputs {
        Some(path) => asset.resolve(&fetcher, &InputsFile::new(path)).await,
        None => asset.resolve(&fetcher, &NoInputs).await,
    }
    .map_err(report_issues)
    .context("failed to create install config")?;

    let artifact = finished.artifact();
    let path = write_artifact(fetcher.dir(), &artifact.filename, &artifact.data)?;
    info!(
        path = %path.display(),
        loaded = finished.loaded(),
        "Wrote install config"
    );

    println!("{}  {}", artifact.digest(), path.display());
    Ok(())
}

fn write_artifact(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create asset directory {}", dir.display()))?;
    let path = dir.join(filename);
    std::fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Validates the persisted install config and reports any issues.
async fn validate(asset: &InstallConfigAsset, args: &AssetDirArgs) -> Result<()> {
    let fetcher = FsFetcher::new(&args.dir);
    let finished = asset
        .load(&fetcher)
        .await
        .map_err(report_issues)?
        .with_context(|| no_config(fetcher.dir()))?;

    println!("Install config is valid.");
    if let Some(platform) = &finished.config().platform {
        println!("Platform: {}", platform.kind());
    }
    Ok(())
}

/// Displays the persisted install config after defaults.
async fn show(asset: &InstallConfigAsset, args: &AssetDirArgs) -> Result<()> {
    let fetcher = FsFetcher::new(&args.dir);
    let finished = asset
        .load(&fetcher)
        .await
        .map_err(report_issues)?
        .with_context(|| no_config(fetcher.dir()))?;

    print!("{}", String::from_utf8_lossy(&finished.artifact().data));
    Ok(())
}

/// Lists every platform with its registered capabilities.
fn list_platforms(asset: &InstallConfigAsset) -> Result<()> {
    for line in platform_lines(asset.registry()) {
        println!("{}", line);
    }
    Ok(())
}

fn platform_lines(registry: &PlatformRegistry) -> Vec<String> {
    let mut lines: Vec<String> = PlatformKind::ALL
        .iter()
        .map(|&kind| {
            let capability = match registry.entry(kind) {
                Some(entry) if entry.requires_client() => "client + validator",
                Some(_) => "local validator",
                None => "no semantic validation",
            };
            format!("{:<14} {}", kind.as_str(), capability)
        })
        .collect();
    lines.push(format!(
        "{} of {} platforms have semantic validation",
        registry.kinds().len(),
        PlatformKind::ALL.len()
    ));
    lines
}

fn no_config(dir: &Path) -> String {
    format!("no {} found in {}", INSTALL_CONFIG_FILENAME, dir.display())
}

/// Prints the full validation report for validation failures.
fn report_issues(err: InstallConfigError) -> InstallConfigError {
    if let Some(report) = issue_report(&err) {
        eprintln!("{}", report);
    }
    err
}

fn issue_report(err: &InstallConfigError) -> Option<String> {
    match err {
        InstallConfigError::Invalid { issues, .. }
        | InstallConfigError::SemanticValidation { issues, .. } => {
            let mut result = ValidationResult::new();
            for issue in issues {
                result.add(issue.clone());
            }
            Some(format_report(&result))
        }
        _ => None,
    }
}
