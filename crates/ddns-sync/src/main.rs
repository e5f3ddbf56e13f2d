// # ddns-sync - Run-once DDNS reconciler
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add business logic, DNS logic, or retry logic here
// - All reconciliation logic MUST be in ddns-core
//
// The ddns-sync binary is responsible for:
// 1. Resolving the config path and environment switches
// 2. Initializing logging and the runtime
// 3. Registering IP sources and building the Cloudflare provider
// 4. Running one IPv4 pass and one IPv6 pass, then exiting
//
// ## Configuration
//
// Records, credentials and IP sources live in a JSON file. The path is
// taken from the first argument, then `DDNS_CONFIG`, then `config.json`.
//
// Environment variables:
// - `DDNS_CONFIG`: Config file path when no argument is given
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
// - `DDNS_MODE`: `dry-run` performs lookups without writing anything
//
// ## Example
//
// ```bash
// DDNS_LOG_LEVEL=debug ddns-sync /etc/ddns/config.json
// ```

use anyhow::{Context, Result};
use ddns_core::traits::{IpFamily, IpSource};
use ddns_core::{AuditLog, DdnsConfig, Reconciler, RecordOutcome, RunReport, SourceRegistry};
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Config file used when neither an argument nor `DDNS_CONFIG` is given
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// - 0: Every attempted update succeeded (or none was needed)
/// - 1: Configuration or startup error
/// - 2: Runtime error (transport or audit failure aborted the run)
/// - 3: Partial failure (the provider rejected at least one update)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean run
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// Some updates were rejected
    PartialFailure = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn for_report(report: &RunReport) -> Self {
        if report.has_failed_updates() {
            DdnsExitCode::PartialFailure
        } else {
            DdnsExitCode::Success
        }
    }
}

/// Invocation settings resolved from arguments and environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    config_path: PathBuf,
    log_level: String,
    dry_run: bool,
}

impl Settings {
    /// Resolve settings from the process arguments and environment
    fn from_env() -> Self {
        Self::resolve(
            env::args().nth(1),
            env::var("DDNS_CONFIG").ok(),
            env::var("DDNS_LOG_LEVEL").ok(),
            env::var("DDNS_MODE").ok(),
        )
    }

    fn resolve(
        arg: Option<String>,
        config_env: Option<String>,
        log_level: Option<String>,
        mode: Option<String>,
    ) -> Self {
        let config_path = arg
            .filter(|s| !s.is_empty())
            .or(config_env.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        Self {
            config_path: PathBuf::from(config_path),
            log_level: log_level.unwrap_or_else(|| "info".to_string()),
            dry_run: mode.is_some_and(|m| m.trim().eq_ignore_ascii_case("dry-run")),
        }
    }
}

/// Parse a log level name
fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    // Initialize tracing
    let log_level = match parse_level(&settings.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Load and validate configuration
    let config = match DdnsConfig::load(&settings.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded from {}: {} zone(s)",
        settings.config_path.display(),
        config.domains.len()
    );
    if settings.dry_run {
        warn!("Dry-run mode: no record will be updated");
    }

    let (reconciler, sources) = match build(&config, settings.dry_run) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Single-threaded runtime: every request completes before the next
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = match rt.block_on(reconciler.run(&sources)) {
        Ok(report) => {
            info!(
                "Run complete: {} updated, {} failed, {} up to date, {} missing",
                report.count(RecordOutcome::Updated),
                report.count(RecordOutcome::UpdateFailed),
                report.count(RecordOutcome::UpToDate),
                report.count(RecordOutcome::NoRecord)
            );
            DdnsExitCode::for_report(&report)
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            DdnsExitCode::RuntimeError
        }
    };

    code.into()
}

/// Register all IP sources compiled into this binary
fn register_sources(registry: &SourceRegistry) {
    #[cfg(feature = "command")]
    ddns_ip_command::register(registry);

    #[cfg(feature = "http")]
    ddns_ip_http::register(registry);

    tracing::debug!("Registered IP sources: {:?}", registry.list_ip_sources());
}

/// Build the reconciler and one IP source per configured family
///
/// Sources are ordered IPv4 first, then IPv6.
fn build(config: &DdnsConfig, dry_run: bool) -> Result<(Reconciler, Vec<Box<dyn IpSource>>)> {
    let registry = SourceRegistry::new();
    register_sources(&registry);

    let mut sources = Vec::new();
    for family in [IpFamily::V4, IpFamily::V6] {
        match config.ip_source(family) {
            Some(source_config) => {
                let source = registry
                    .create_ip_source(&source_config)
                    .with_context(|| format!("Failed to create {} source", family))?;
                info!("{} source: {}", family, source.source_name());
                sources.push(source);
            }
            None => info!(
                "No {} source configured, {} records are not managed",
                family,
                family.record_type()
            ),
        }
    }

    let provider =
        CloudflareProvider::from_config(config).context("Failed to create Cloudflare provider")?;

    let reconciler = Reconciler::new(
        Box::new(provider),
        AuditLog::new(&config.logfile),
        config.domains.clone(),
    )
    .with_dry_run(dry_run);

    Ok((reconciler, sources))
}
