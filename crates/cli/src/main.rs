// cgrid - headless contact import: preview, commit, reconcile

mod exit_codes;
mod output;
mod sink;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use contactgrid_import::commit::CommitResponse;
use contactgrid_import::{CommitReport, ImportConfig, ImportError, Importer, PreviewSession, Workbook};
use contactgrid_io::{load_workbook, LoadError};
use tracing::{debug, info};

use exit_codes::{
    EXIT_COMMIT_FAILED, EXIT_COMMIT_UNRESOLVED, EXIT_CONFIG, EXIT_ERROR, EXIT_LOAD,
    EXIT_PREVIEW_BLOCKED, EXIT_PREVIEW_ISSUES, EXIT_SUCCESS, EXIT_USAGE,
};
use sink::HttpSink;

#[derive(Parser)]
#[command(name = "cgrid")]
#[command(about = "Validate, commit and reconcile bulk contact imports (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a spreadsheet and report what an import would do
    #[command(after_help = "\
Examples:
  cgrid preview contacts.xlsx
  cgrid preview batch.csv --json | jq '.errors'
  cgrid preview contacts.xlsx --config import.toml

Exit codes:
  0  ready to import
  3  blocked (no headers, only headers, missing required columns)
  4  rows have missing values, invalid formats or duplicates
  5  file could not be loaded
  6  config invalid")]
    Preview {
        /// Spreadsheet to import (csv, tsv, xlsx, xls, xlsb, ods)
        file: PathBuf,

        /// Import config (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Emit the full preview session as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Preview, then submit the batch to the contacts endpoint
    #[command(after_help = "\
Examples:
  cgrid commit contacts.xlsx --endpoint https://crm.example.com/api/contacts/bulk
  CGRID_ENDPOINT=https://crm.example.com/api/contacts/bulk cgrid commit batch.csv --json

The batch is submitted only when the preview is clean. The request is sent
once; a failed commit is never retried and nothing is reconciled.")]
    Commit {
        /// Spreadsheet to import
        file: PathBuf,

        /// Bulk-insert endpoint (overrides [commit].endpoint in the config)
        #[arg(long, env = "CGRID_ENDPOINT")]
        endpoint: Option<String>,

        /// Import config (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Emit the commit report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit 11 when any existing row cannot be traced to a source row
        #[arg(long)]
        strict: bool,
    },

    /// Map a saved server response back to the rows of a spreadsheet
    #[command(after_help = "\
Examples:
  cgrid reconcile contacts.xlsx --response response.json
  cgrid reconcile batch.csv --response response.json --json | jq '.existing.items'

The response file holds the JSON body the bulk-insert endpoint returned
(insertedCount, modifiedCount, invalidCount, alreadyExisting).")]
    Reconcile {
        /// Spreadsheet that was submitted
        file: PathBuf,

        /// Saved server response (JSON)
        #[arg(long, short = 'r')]
        response: PathBuf,

        /// Import config (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Emit the reconciliation report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit 11 when any existing row cannot be traced to a source row
        #[arg(long)]
        strict: bool,
    },

    /// Config file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate an import config
    #[command(after_help = "\
Examples:
  cgrid config validate import.toml")]
    Validate {
        /// Config file (TOML)
        file: PathBuf,

        /// Emit the result as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  contactgrid-import ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CGRID_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Preview { file, config, json } => cmd_preview(file, config, json),
        Commands::Commit { file, endpoint, config, json, strict } => {
            cmd_commit(file, endpoint, config, json, strict)
        }
        Commands::Reconcile { file, response, config, json, strict } => {
            cmd_reconcile(file, response, config, json, strict)
        }
        Commands::Config(ConfigCommands::Validate { file, json }) => cmd_config_validate(file, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Exit with a code but print nothing (the report already explained it).
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    pub fn load(path: &Path, err: LoadError) -> Self {
        let hint = match &err {
            LoadError::UnsupportedFormat(_) => {
                Some("save the sheet as .xlsx or .csv and try again".to_string())
            }
            LoadError::Excel(_) => Some("is the file password-protected or corrupt?".to_string()),
            LoadError::SheetTooLarge { .. } => {
                Some("split the sheet or delete stray cells far below or right of the data".to_string())
            }
            _ => None,
        };
        Self {
            code: EXIT_LOAD,
            message: format!("{}: {}", path.display(), err),
            hint,
        }
    }

    /// Create error from an import error with proper exit code.
    pub fn import(err: ImportError) -> Self {
        let code = match &err {
            ImportError::ConfigParse(_) | ImportError::ConfigValidation(_) => EXIT_CONFIG,
            ImportError::NotCommittable(_) => EXIT_PREVIEW_ISSUES,
            ImportError::Commit(_) => EXIT_COMMIT_FAILED,
            ImportError::NoSession | ImportError::CommitInProgress | ImportError::NoPendingCommit => {
                EXIT_ERROR
            }
        };
        Self { code, message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared plumbing
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<ImportConfig, CliError> {
    let Some(path) = path else {
        return Ok(ImportConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config {}: {}", path.display(), e)))?;
    let config = ImportConfig::from_toml(&text).map_err(|e| {
        let mut err = CliError::import(e);
        err.message = format!("{}: {}", path.display(), err.message);
        err
    })?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn load(path: &Path) -> Result<Workbook, CliError> {
    if !path.exists() {
        return Err(CliError::args(format!("file not found: {}", path.display())));
    }
    load_workbook(path).map_err(|e| CliError::load(path, e))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Exit code a finished preview maps to.
fn preview_exit(session: &PreviewSession) -> Result<(), CliError> {
    if session.blocked.is_some() {
        Err(CliError::silent(EXIT_PREVIEW_BLOCKED))
    } else if !session.can_commit {
        Err(CliError::silent(EXIT_PREVIEW_ISSUES))
    } else {
        Ok(())
    }
}

/// Preview and refuse to go further unless the batch is clean.
fn committable_importer(file: &Path, config: ImportConfig) -> Result<Importer, CliError> {
    let workbook = load(file)?;
    let mut importer = Importer::new(config);
    let session = importer.preview(&workbook);
    if !session.can_commit {
        output::print_preview(file, session);
        let code = if session.blocked.is_some() { EXIT_PREVIEW_BLOCKED } else { EXIT_PREVIEW_ISSUES };
        return Err(CliError {
            code,
            message: format!("preview is not committable: {}", session.message),
            hint: Some("run `cgrid preview` and fix the listed rows".to_string()),
        });
    }
    Ok(importer)
}

fn report_exit(report: &CommitReport, strict: bool) -> Result<(), CliError> {
    if strict && report.existing.unresolved > 0 {
        return Err(CliError {
            code: EXIT_COMMIT_UNRESOLVED,
            message: format!(
                "{} existing row(s) could not be traced to a source row",
                report.existing.unresolved
            ),
            hint: None,
        });
    }
    Ok(())
}

// ============================================================================
// preview
// ============================================================================

fn cmd_preview(file: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let workbook = load(&file)?;
    let session = PreviewSession::build(&workbook, &config);

    if json {
        print_json(&session)?;
    } else {
        output::print_preview(&file, &session);
    }
    preview_exit(&session)
}

// ============================================================================
// commit
// ============================================================================

fn cmd_commit(
    file: PathBuf,
    endpoint: Option<String>,
    config: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<(), CliError> {
    let mut config = load_config(config.as_deref())?;
    if endpoint.is_some() {
        config.commit.endpoint = endpoint;
    }
    let endpoint = config.commit.endpoint.clone().ok_or_else(|| {
        CliError::args("no commit endpoint configured")
            .with_hint("pass --endpoint, set CGRID_ENDPOINT, or add [commit] endpoint to the config")
    })?;
    let timeout = Duration::from_secs(config.commit.timeout_secs);

    let mut sink = HttpSink::new(&endpoint, timeout)?;
    let mut importer = committable_importer(&file, config)?;
    info!(endpoint = %endpoint, "committing");
    let report = importer.commit_with(&mut sink).map_err(CliError::import)?;

    if json {
        print_json(&report)?;
    } else {
        output::print_report(&report);
    }
    report_exit(&report, strict)
}

// ============================================================================
// reconcile
// ============================================================================

fn cmd_reconcile(
    file: PathBuf,
    response: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let text = std::fs::read_to_string(&response)
        .map_err(|e| CliError::args(format!("cannot read response {}: {}", response.display(), e)))?;
    let parsed: CommitResponse = serde_json::from_str(&text).map_err(|e| {
        CliError::args(format!("{}: not a valid commit response: {}", response.display(), e))
    })?;

    let mut importer = committable_importer(&file, config)?;
    let pending = importer.begin_commit().map_err(CliError::import)?;
    let report = importer.finish_commit(pending, Ok(parsed)).map_err(CliError::import)?;

    if json {
        print_json(&report)?;
    } else {
        output::print_report(&report);
    }
    report_exit(&report, strict)
}

// ============================================================================
// config validate
// ============================================================================

fn cmd_config_validate(file: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_config(Some(file.as_path()))?;
    if json {
        print_json(&serde_json::json!({
            "valid": true,
            "ignore_headers": config.ignore_headers,
            "fill_down": config.fill_down,
            "display_limit": config.display_limit,
            "commit": {
                "endpoint": config.commit.endpoint,
                "timeout_secs": config.commit.timeout_secs,
            },
        }))?;
    } else {
        eprintln!("{}: ok", file.display());
    }
    Ok(())
}
