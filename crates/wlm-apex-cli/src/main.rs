// crates/wlm-apex-cli/src/main.rs
// ============================================================================
// Module: WLM Apex CLI Entry Point
// Description: Command dispatcher for the hourly slot high-water-mark report.
// Purpose: Provide a safe, localized CLI over the apex reporter and its config.
// Dependencies: clap, thiserror, wlm-apex-core, wlm-apex-config, wlm-apex-source-sqlite.
// ============================================================================

//! ## Overview
//! The `wlm-apex` binary loads `wlm-apex.toml`, applies command-line
//! overrides, opens the configured log source read-only, and prints the
//! hourly report as a text table, CSV, or canonical JSON. All user-facing
//! strings are routed through the i18n catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;
use wlm_apex_cli::i18n::Locale;
use wlm_apex_cli::i18n::set_locale;
use wlm_apex_cli::render::render_csv;
use wlm_apex_cli::render::render_json;
use wlm_apex_cli::render::render_text;
use wlm_apex_cli::t;
use wlm_apex_config::LogSinkType;
use wlm_apex_config::LoggingConfig;
use wlm_apex_config::SourceType;
use wlm_apex_config::WlmApexConfig;
use wlm_apex_core::ApexReport;
use wlm_apex_core::ApexReporter;
use wlm_apex_core::ConcurrencyMode;
use wlm_apex_core::FileEventSink;
use wlm_apex_core::InMemoryWlmLogSource;
use wlm_apex_core::NoopEventSink;
use wlm_apex_core::ReportEventSink;
use wlm_apex_core::ReportParams;
use wlm_apex_core::StderrEventSink;
use wlm_apex_core::TiePolicy;
use wlm_apex_core::Timestamp;
use wlm_apex_core::WlmLogSource;
use wlm_apex_source_sqlite::SqliteSourceConfig;
use wlm_apex_source_sqlite::SqliteWlmLogSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the output language.
const LANG_ENV: &str = "WLM_APEX_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "wlm-apex", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `WLM_APEX_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the hourly slot high-water-mark report.
    Report(ReportCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a wlm-apex configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `WLM_APEX_CONFIG` or `wlm-apex.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `report`.
#[derive(Args, Debug)]
struct ReportCommand {
    /// Config file path (defaults to `WLM_APEX_CONFIG` or `wlm-apex.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Read the WLM tables from a `SQLite` database.
    #[arg(long, value_name = "PATH", conflicts_with = "snapshot")]
    sqlite: Option<PathBuf>,
    /// Read the WLM tables from a JSON snapshot.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
    /// Lookback window in seconds.
    #[arg(long, value_name = "SECONDS")]
    window_seconds: Option<u64>,
    /// Sampling granularity in seconds.
    #[arg(long, value_name = "SECONDS")]
    granularity_seconds: Option<u64>,
    /// Only classes above this id are reported.
    #[arg(long, value_name = "ID")]
    min_service_class: Option<i64>,
    /// Only users above this id are counted.
    #[arg(long, value_name = "ID")]
    min_user_id: Option<i64>,
    /// Rows reported when several instants tie for an hourly maximum.
    #[arg(long, value_enum, value_name = "POLICY")]
    ties: Option<TieArg>,
    /// How configured concurrency is resolved for past instants.
    #[arg(long, value_enum, value_name = "MODE")]
    concurrency: Option<ConcurrencyArg>,
    /// Report anchor instant (RFC 3339); defaults to the current time.
    #[arg(long, value_name = "RFC3339")]
    now: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Lifecycle event log destination (overrides `[logging]`).
    #[arg(long, value_enum, value_name = "SINK")]
    log: Option<LogArg>,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

/// Tie policy selections.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum TieArg {
    /// Earliest instant reaching the maximum.
    First,
    /// Every instant reaching the maximum.
    All,
}

impl From<TieArg> for TiePolicy {
    fn from(value: TieArg) -> Self {
        match value {
            TieArg::First => Self::FirstInstant,
            TieArg::All => Self::AllInstants,
        }
    }
}

/// Concurrency mode selections.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ConcurrencyArg {
    /// Latest config row applies to every instant.
    Current,
    /// Config row in effect at each instant applies.
    Versioned,
}

impl From<ConcurrencyArg> for ConcurrencyMode {
    fn from(value: ConcurrencyArg) -> Self {
        match value {
            ConcurrencyArg::Current => Self::Current,
            ConcurrencyArg::Versioned => Self::Versioned,
        }
    }
}

/// Report output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Aligned text table.
    Text,
    /// Canonical JSON document.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Event log selections available on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogArg {
    /// Discard lifecycle events.
    None,
    /// JSON lines on stderr.
    Stderr,
}

/// Log source resolved from flags and config.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceChoice {
    /// `SQLite` database.
    Sqlite(SqliteSourceConfig),
    /// JSON snapshot file.
    Snapshot(PathBuf),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Report(command) => command_report(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = WlmApexConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Report Command
// ============================================================================

/// Executes `report`.
fn command_report(command: &ReportCommand) -> CliResult<ExitCode> {
    let output = report_output(command)?;
    write_stdout_bytes(output.as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs the report described by `command` and renders it.
fn report_output(command: &ReportCommand) -> CliResult<String> {
    let config = WlmApexConfig::load_or_default(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let params = resolve_params(&config, command);
    let events = resolve_event_sink(command.log, &config.logging)?;
    let now = resolve_now(command.now.as_deref())?;

    let report = match resolve_source(command, &config)? {
        SourceChoice::Sqlite(sqlite) => {
            let path = sqlite.path.clone();
            let source = SqliteWlmLogSource::open(sqlite).map_err(|err| {
                CliError::new(t!("report.source.open_failed", path = path.display(), error = err))
            })?;
            if params.concurrency_mode == ConcurrencyMode::Versioned
                && !source.has_versioned_configs()
            {
                let table = source.config().config_table.clone();
                write_stderr_line(&t!("report.warn.unversioned_configs", table = table))
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
            run_report(source, params, events, now)?
        }
        SourceChoice::Snapshot(path) => {
            let source = InMemoryWlmLogSource::open(&path).map_err(|err| {
                CliError::new(t!("report.source.open_failed", path = path.display(), error = err))
            })?;
            run_report(source, params, events, now)?
        }
    };
    render_report(&report, command.format)
}

/// Runs the reporter over a source.
fn run_report<S: WlmLogSource>(
    source: S,
    params: ReportParams,
    events: Arc<dyn ReportEventSink>,
    now: Timestamp,
) -> CliResult<ApexReport> {
    ApexReporter::new(source, params)
        .with_event_sink(events)
        .run(now)
        .map_err(|err| CliError::new(t!("report.failed", error = err)))
}

/// Renders a report in the requested format.
fn render_report(report: &ApexReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => render_json(report)
            .map_err(|err| CliError::new(t!("report.render_failed", error = err))),
        OutputFormat::Csv => render_csv(&report.rows)
            .map_err(|err| CliError::new(t!("report.render_failed", error = err))),
        OutputFormat::Text => {
            let mut output = if report.rows.is_empty() {
                let mut empty = t!("report.empty");
                empty.push('\n');
                empty
            } else {
                render_text(&report.rows)
            };
            output.push_str(&t!(
                "report.summary",
                rows = report.stats.rows,
                records = report.stats.records_eligible,
                configs = report.stats.configs,
                samples = report.stats.samples
            ));
            output.push('\n');
            Ok(output)
        }
    }
}

// ============================================================================
// SECTION: Resolution Helpers
// ============================================================================

/// Applies command-line overrides to the configured report params.
fn resolve_params(config: &WlmApexConfig, command: &ReportCommand) -> ReportParams {
    let mut params = config.report.to_params();
    if let Some(window_seconds) = command.window_seconds {
        params.window_seconds = window_seconds;
    }
    if let Some(granularity_seconds) = command.granularity_seconds {
        params.granularity_seconds = granularity_seconds;
    }
    if let Some(min_service_class) = command.min_service_class {
        params.min_service_class = min_service_class;
    }
    if let Some(min_user_id) = command.min_user_id {
        params.min_user_id = min_user_id;
    }
    if let Some(ties) = command.ties {
        params.tie_policy = ties.into();
    }
    if let Some(concurrency) = command.concurrency {
        params.concurrency_mode = concurrency.into();
    }
    params
}

/// Resolves the log source from flags, falling back to `[source]`.
fn resolve_source(command: &ReportCommand, config: &WlmApexConfig) -> CliResult<SourceChoice> {
    if let Some(path) = &command.sqlite {
        let configured = config.source.as_ref().and_then(|source| source.sqlite_config());
        let sqlite = match configured {
            Some(sqlite) => SqliteSourceConfig {
                path: path.clone(),
                ..sqlite
            },
            None => SqliteSourceConfig::new(path.clone()),
        };
        return Ok(SourceChoice::Sqlite(sqlite));
    }
    if let Some(path) = &command.snapshot {
        return Ok(SourceChoice::Snapshot(path.clone()));
    }
    let Some(source) = &config.source else {
        return Err(CliError::new(t!("report.source.missing")));
    };
    match source.source_type {
        SourceType::Sqlite => source
            .sqlite_config()
            .map(SourceChoice::Sqlite)
            .ok_or_else(|| CliError::new(t!("report.source.missing"))),
        SourceType::Snapshot => source
            .path
            .clone()
            .map(SourceChoice::Snapshot)
            .ok_or_else(|| CliError::new(t!("report.source.missing"))),
    }
}

/// Resolves the lifecycle event sink from `--log`, falling back to `[logging]`.
fn resolve_event_sink(
    log: Option<LogArg>,
    logging: &LoggingConfig,
) -> CliResult<Arc<dyn ReportEventSink>> {
    match log {
        Some(LogArg::None) => return Ok(Arc::new(NoopEventSink)),
        Some(LogArg::Stderr) => return Ok(Arc::new(StderrEventSink)),
        None => {}
    }
    match logging.sink {
        LogSinkType::None => Ok(Arc::new(NoopEventSink)),
        LogSinkType::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSinkType::File => {
            let path =
                logging.path.as_ref().ok_or_else(|| CliError::new(t!("report.log.path_missing")))?;
            let sink = FileEventSink::new(path).map_err(|err| {
                CliError::new(t!("report.log.open_failed", path = path.display(), error = err))
            })?;
            Ok(Arc::new(sink))
        }
    }
}

/// Resolves the report anchor from `--now` or the system clock.
fn resolve_now(value: Option<&str>) -> CliResult<Timestamp> {
    let Some(value) = value else {
        return Ok(Timestamp::now_utc());
    };
    Timestamp::parse_rfc3339(value)
        .map_err(|err| CliError::new(t!("report.now.invalid", value = value, error = err)))
}

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
