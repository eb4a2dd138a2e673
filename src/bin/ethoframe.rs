//! Ethoframe CLI - Command-line interface for the Ethoframe engine
//!
//! Commands:
//! - bouts: Convert a behaviours frame table into its bout collection
//! - frames: Rebuild a behaviours frame table from a bout collection
//! - validate: Check a table against the schema of its kind
//! - aggregate: Summarise a table over the whole record and over time bins
//! - schema: Print the declared table schemas
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ethoframe::aggregate::Aggregator;
use ethoframe::config::AnalyseConfig;
use ethoframe::pipeline::{
    bouts_json_to_frames_json, frames_json_to_bouts_json, validate_table_json, FrameProcessor,
};
use ethoframe::schema::TableKind;
use ethoframe::{ComputeError, ETHOFRAME_VERSION};

/// Ethoframe - Frame/bout engine for animal behaviour classification tables
#[derive(Parser)]
#[command(name = "ethoframe")]
#[command(version = ETHOFRAME_VERSION)]
#[command(about = "Convert, validate and summarise behaviour classification tables", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a behaviours frame table into its bout collection
    Bouts {
        /// Input frame table (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output bout collection (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Rebuild a behaviours frame table from a bout collection
    Frames {
        /// Input bout collection (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output frame table (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Check a table against the schema of its kind
    Validate {
        /// Input table (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Table kind (keypoints, features, behaviours, analysis, ...)
        #[arg(short, long)]
        kind: TableKind,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarise a frame table over the whole record and over time bins
    Aggregate {
        /// Input frame table (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output analysis report (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Reduction applied per column (quantitative or behavioural)
        #[arg(short, long, default_value = "quantitative")]
        aggregator: Aggregator,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Frames per second (overrides the configuration)
        #[arg(long)]
        fps: Option<f64>,

        /// Fixed bin widths in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        bins: Option<Vec<f64>>,

        /// Custom bin edges in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        custom_bins: Option<Vec<f64>>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the declared table schemas
    Schema {
        /// Only print this table kind
        kind: Option<TableKind>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), EthoCliError> {
    match cli.command {
        Commands::Bouts {
            input,
            output,
            pretty,
        } => {
            let bouts_json = frames_json_to_bouts_json(&read_input(&input)?)?;
            write_output(&output, &bouts_json, pretty)
        }

        Commands::Frames {
            input,
            output,
            pretty,
        } => {
            let frames_json = bouts_json_to_frames_json(&read_input(&input)?)?;
            write_output(&output, &frames_json, pretty)
        }

        Commands::Validate { input, kind, json } => cmd_validate(&input, kind, json),

        Commands::Aggregate {
            input,
            output,
            aggregator,
            config,
            fps,
            bins,
            custom_bins,
            pretty,
        } => {
            let config = resolve_config(config.as_deref(), fps, bins, custom_bins)?;
            let mut processor = FrameProcessor::new(config);
            let report = processor.summarise(&read_input(&input)?, aggregator)?;
            write_output(&output, &report, pretty)
        }

        Commands::Schema { kind, json } => cmd_schema(kind, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_validate(input: &Path, kind: TableKind, json: bool) -> Result<(), EthoCliError> {
    let table_json = read_input(input)?;

    let report = match validate_table_json(&table_json, kind) {
        Ok(()) => ValidationReport {
            kind,
            valid: true,
            error: None,
        },
        Err(e) => ValidationReport {
            kind,
            valid: false,
            error: Some(e.to_string()),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Table kind: {}", report.kind);
        println!("Valid:      {}", report.valid);
        if let Some(error) = &report.error {
            println!("\nError:\n  {}", error);
        }
    }

    match report.error {
        Some(error) => Err(EthoCliError::ValidationFailed(error)),
        None => Ok(()),
    }
}

fn cmd_schema(kind: Option<TableKind>, json: bool) -> Result<(), EthoCliError> {
    let kinds: Vec<TableKind> = match kind {
        Some(kind) => vec![kind],
        None => TableKind::ALL.to_vec(),
    };
    let schemas: Vec<_> = kinds.iter().map(|k| k.schema()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
    } else {
        for schema in schemas {
            println!("{}", schema.kind);
            println!("  index:    {}", schema.index_names.join(", "));
            println!("  columns:  {}", schema.column_names.join(", "));
            println!("  nullable: {}", schema.nullable);
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), EthoCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "ethoframe_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Ethoframe version {}", ETHOFRAME_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schemas".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} table kinds declared", TableKind::ALL.len()),
    });

    if let Some(config_path) = config {
        let check = if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match AnalyseConfig::from_json(&content) {
                    Ok(config) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid ({} fps, {} fixed binnings, {} custom edges)",
                            config.fps,
                            config.bins_sec.len(),
                            config.custom_bins_sec.len()
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass tables with --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        version: ETHOFRAME_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Ethoframe Doctor Report");
        println!("=======================");
        println!("Version: {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(EthoCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(input: &Path) -> Result<String, EthoCliError> {
    if is_stdio(input) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, json: &str, pretty: bool) -> Result<(), EthoCliError> {
    let data = if pretty {
        let value: serde_json::Value = serde_json::from_str(json)?;
        serde_json::to_string_pretty(&value)?
    } else {
        json.to_string()
    };

    if is_stdio(output) {
        println!("{}", data);
    } else {
        fs::write(output, data + "\n")?;
        debug!(path = %output.display(), "wrote output");
    }
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied
fn resolve_config(
    path: Option<&Path>,
    fps: Option<f64>,
    bins: Option<Vec<f64>>,
    custom_bins: Option<Vec<f64>>,
) -> Result<AnalyseConfig, EthoCliError> {
    let mut config = match (path, fps) {
        (Some(path), _) => AnalyseConfig::from_json(&fs::read_to_string(path)?)?,
        (None, Some(fps)) => AnalyseConfig::with_fps(fps),
        (None, None) => return Err(EthoCliError::MissingFps),
    };
    if let Some(fps) = fps {
        config.fps = fps;
    }
    if let Some(bins) = bins {
        config.bins_sec = bins;
    }
    if let Some(custom_bins) = custom_bins {
        config.custom_bins_sec = custom_bins;
    }
    config.validate()?;
    Ok(config)
}

// Error types

#[derive(Debug)]
enum EthoCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(String),
    MissingFps,
    DoctorFailed,
}

impl From<io::Error> for EthoCliError {
    fn from(e: io::Error) -> Self {
        EthoCliError::Io(e)
    }
}

impl From<ComputeError> for EthoCliError {
    fn from(e: ComputeError) -> Self {
        EthoCliError::Compute(e)
    }
}

impl From<serde_json::Error> for EthoCliError {
    fn from(e: serde_json::Error) -> Self {
        EthoCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EthoCliError> for CliError {
    fn from(e: EthoCliError) -> Self {
        match e {
            EthoCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EthoCliError::Compute(ComputeError::Schema(e)) => CliError {
                code: "SCHEMA_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'ethoframe schema' to see the expected levels".to_string()),
            },
            EthoCliError::Compute(e @ ComputeError::InvalidParameter(_)) => CliError {
                code: "INVALID_PARAMETER".to_string(),
                message: e.to_string(),
                hint: Some("Check --fps, --bins and --custom-bins".to_string()),
            },
            EthoCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EthoCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            EthoCliError::ValidationFailed(message) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message,
                hint: Some("Fix the table levels or pick the matching --kind".to_string()),
            },
            EthoCliError::MissingFps => CliError {
                code: "MISSING_FPS".to_string(),
                message: "No frame rate given".to_string(),
                hint: Some("Pass --fps or --config <file>".to_string()),
            },
            EthoCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    kind: TableKind,
    valid: bool,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
