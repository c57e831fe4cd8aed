//! AgroStress CLI - command-line interface for the stress prediction engine
//!
//! Commands:
//! - predict: run the pipeline over JSON input (single record, array, or NDJSON)
//! - importance: per-feature importance of the trained ensemble
//! - info: classifier metadata
//! - doctor: diagnose engine health and determinism

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use agrostress::{
    PredictError, PredictionResult, RawInput, StressPredictor, DEFAULT_MODEL_SEED, ENGINE_VERSION,
};
use chrono::NaiveDate;

/// AgroStress - predict crop stress from crop metadata and weather observations
#[derive(Parser)]
#[command(name = "agrostress")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Predict crop stress from crop metadata and weather observations", long_about = None)]
struct Cli {
    /// Model seed; identical seeds train identical ensembles
    #[arg(long, global = true, default_value_t = DEFAULT_MODEL_SEED)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the prediction pipeline over JSON input
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Evaluation date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Print per-feature importance of the trained ensemble
    Importance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print classifier metadata
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and determinism
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// One JSON record or a JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Newline-delimited JSON (one result per line)
    Ndjson,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliErrorReport::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Predict {
            input,
            output,
            input_format,
            output_format,
            as_of,
        } => cmd_predict(cli.seed, &input, &output, input_format, output_format, as_of.as_deref()),
        Commands::Importance { json } => cmd_importance(cli.seed, json),
        Commands::Info { json } => cmd_info(cli.seed, json),
        Commands::Doctor { json } => cmd_doctor(cli.seed, json),
    }
}

fn cmd_predict(
    seed: u64,
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    as_of: Option<&str>,
) -> Result<(), CliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let inputs = parse_inputs(&input_data, &input_format)?;
    if inputs.is_empty() {
        return Err(CliError::NoInputs);
    }

    let predictor = StressPredictor::with_seed(seed);
    let results = match as_of {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| CliError::InvalidAsOf(raw.to_string()))?;
            predictor.batch_predict_at(&inputs, date)?
        }
        None => predictor.batch_predict(&inputs)?,
    };

    let output_data = format_output(&results, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_importance(seed: u64, json: bool) -> Result<(), CliError> {
    let predictor = StressPredictor::with_seed(seed);
    let importance = predictor.feature_importance();

    if json {
        let rows: Vec<serde_json::Value> = importance
            .iter()
            .map(|(feature, weight)| serde_json::json!({ "feature": feature, "weight": weight }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("Feature importance (seed {seed})");
        println!("================================");
        for (feature, weight) in importance {
            println!("  {feature:<22} {weight:.4}");
        }
    }

    Ok(())
}

fn cmd_info(seed: u64, json: bool) -> Result<(), CliError> {
    let predictor = StressPredictor::with_seed(seed);
    let info = predictor.model_info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Model:       {}", info.model_type);
        println!("Trees:       {}", info.n_trees);
        println!("Max depth:   {}", info.max_depth);
        println!("Features:    {}", info.features.join(", "));
        println!("Classes:     {}", info.stress_types.join(", "));
    }

    Ok(())
}

fn cmd_doctor(seed: u64, json: bool) -> Result<(), CliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("AgroStress version {ENGINE_VERSION}"),
    });

    // Train twice and compare: the ensemble must be bit-identical per seed.
    let first = StressPredictor::with_seed(seed);
    let second = StressPredictor::with_seed(seed);
    let deterministic = first
        .feature_importance()
        .iter()
        .zip(second.feature_importance())
        .all(|((_, a), (_, b))| a.to_bits() == b.to_bits());
    checks.push(DoctorCheck {
        name: "deterministic_training".to_string(),
        status: if deterministic { CheckStatus::Ok } else { CheckStatus::Error },
        message: if deterministic {
            format!("seed {seed} reproduces the ensemble")
        } else {
            format!("seed {seed} produced diverging ensembles")
        },
    });

    let importance_total: f64 = first.feature_importance().iter().map(|(_, w)| w).sum();
    let importance_ok = (importance_total - 1.0).abs() < 1e-6;
    checks.push(DoctorCheck {
        name: "feature_importance".to_string(),
        status: if importance_ok { CheckStatus::Ok } else { CheckStatus::Warning },
        message: format!("importance total {importance_total:.6}"),
    });

    // Smoke-test the full pipeline on a canned request.
    let sample = RawInput {
        crop_type: "wheat".to_string(),
        sowing_date: "2025-11-15".to_string(),
        soil_type: "loam".to_string(),
        season: "winter".to_string(),
        weather: agrostress::WeatherObservation {
            avg_temp: 32.0,
            rainfall: 2.0,
            rolling_7day_rainfall: 8.0,
            consecutive_dry_days: 10,
            temp_deviation_from_normal: 4.5,
        },
    };
    match first.predict(&sample) {
        Ok(result) if (0.0..=100.0).contains(&result.confidence) => {
            checks.push(DoctorCheck {
                name: "pipeline".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "sample prediction: {} ({}%)",
                    result.stress_type.as_str(),
                    result.confidence
                ),
            });
        }
        Ok(result) => {
            checks.push(DoctorCheck {
                name: "pipeline".to_string(),
                status: CheckStatus::Error,
                message: format!("confidence out of range: {}", result.confidence),
            });
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "pipeline".to_string(),
                status: CheckStatus::Error,
                message: format!("sample prediction failed: {e}"),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        engine: "agrostress".to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("AgroStress Doctor Report");
        println!("========================");
        println!("Engine:  {}", report.engine);
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn parse_inputs(data: &str, format: &InputFormat) -> Result<Vec<RawInput>, CliError> {
    match format {
        InputFormat::Json => {
            let trimmed = data.trim_start();
            if trimmed.starts_with('[') {
                Ok(serde_json::from_str(data)?)
            } else {
                let single: RawInput = serde_json::from_str(data)?;
                Ok(vec![single])
            }
        }
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(CliError::from))
            .collect(),
    }
}

fn format_output(
    results: &[PredictionResult],
    format: &OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

// Error types

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Json(serde_json::Error),
    Predict(PredictError),
    InvalidAsOf(String),
    NoInputs,
    DoctorFailed,
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<PredictError> for CliError {
    fn from(e: PredictError) -> Self {
        CliError::Predict(e)
    }
}

#[derive(serde::Serialize)]
struct CliErrorReport {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliError> for CliErrorReport {
    fn from(e: CliError) -> Self {
        match e {
            CliError::Io(e) => CliErrorReport {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliError::Json(e) => CliErrorReport {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax against the request schema".to_string()),
            },
            CliError::Predict(e) => CliErrorReport {
                code: "PREDICT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure sowing_date is YYYY-MM-DD or RFC 3339".to_string()),
            },
            CliError::InvalidAsOf(raw) => CliErrorReport {
                code: "INVALID_AS_OF".to_string(),
                message: format!("invalid --as-of date: {raw}"),
                hint: Some("Use YYYY-MM-DD".to_string()),
            },
            CliError::NoInputs => CliErrorReport {
                code: "NO_INPUTS".to_string(),
                message: "No prediction requests found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliError::DoctorFailed => CliErrorReport {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    engine: String,
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
