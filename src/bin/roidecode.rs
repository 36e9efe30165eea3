//! roidecode CLI - Command-line interface for the decoding pipeline
//!
//! Commands:
//! - decode: Run the full pipeline and emit a decode report
//! - align: Print the aligned, lag-shifted label timeline
//! - validate: Validate a stimulus timing file
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use roidecode::pipeline::{decode_session, RoiDecoder};
use roidecode::protocol::ScanProtocol;
use roidecode::schema::{RoiMatrix, TimingAdapter, TimingDocument, SCHEMA_VERSION};
use roidecode::{PRODUCER_NAME, REPORT_VERSION, ROIDECODE_VERSION};

/// roidecode - Run-wise MVPA decoding for event-related fMRI sessions
#[derive(Parser)]
#[command(name = "roidecode")]
#[command(version = ROIDECODE_VERSION)]
#[command(about = "Decode stimulus conditions from ROI activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and emit a decode report
    Decode {
        /// Scan protocol JSON file
        #[arg(short, long)]
        protocol: PathBuf,

        /// Stimulus timing file (use - for stdin)
        #[arg(short, long)]
        timing: PathBuf,

        /// ROI feature matrices: a JSON array of {roi, data} objects
        #[arg(short, long)]
        features: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Timing input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Session identifier; defaults to the timing file's session_id
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Print the aligned, lag-shifted label timeline
    Align {
        /// Scan protocol JSON file
        #[arg(short, long)]
        protocol: PathBuf,

        /// Stimulus timing file (use - for stdin)
        #[arg(short, long)]
        timing: PathBuf,

        /// Timing input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a stimulus timing file
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Single fmri.stim_event.v1 document
    Json,
    /// Newline-delimited JSON (one run-tagged event per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (fmri.stim_event.v1)
    Input,
    /// Output schema (decode.report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RoidecodeCliError> {
    match cli.command {
        Commands::Decode {
            protocol,
            timing,
            features,
            output,
            input_format,
            session_id,
        } => cmd_decode(
            &protocol,
            &timing,
            &features,
            &output,
            input_format,
            session_id,
        ),

        Commands::Align {
            protocol,
            timing,
            input_format,
            json,
        } => cmd_align(&protocol, &timing, input_format, json),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_decode(
    protocol_path: &Path,
    timing_path: &Path,
    features_path: &Path,
    output: &Path,
    input_format: InputFormat,
    session_id: Option<String>,
) -> Result<(), RoidecodeCliError> {
    let protocol = read_protocol(protocol_path)?;
    let (runs, timing_session) = read_timing(timing_path, input_format, protocol.num_runs)?;

    let features_data = fs::read_to_string(features_path)?;
    let rois: Vec<RoiMatrix> = serde_json::from_str(&features_data)?;
    if rois.is_empty() {
        return Err(RoidecodeCliError::NoRois);
    }

    let session_id = session_id
        .or(timing_session)
        .unwrap_or_else(|| "unknown".to_string());

    let report = decode_session(protocol, &session_id, &runs, &rois)?;

    if output.to_string_lossy() == "-" {
        println!("{report}");
    } else {
        fs::write(output, report)?;
    }

    Ok(())
}

fn cmd_align(
    protocol_path: &Path,
    timing_path: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), RoidecodeCliError> {
    let protocol = read_protocol(protocol_path)?;
    let (runs, _) = read_timing(timing_path, input_format, protocol.num_runs)?;

    let decoder = RoiDecoder::new(protocol);
    let timeline = decoder.labeled_timeline(&runs)?;
    let trs_per_run = decoder.protocol().trs_per_run;

    if json {
        println!("{}", serde_json::to_string(&timeline)?);
    } else {
        let labeled = timeline.iter().filter(|&&l| l != 0).count();
        println!("Aligned timeline");
        println!("================");
        println!("Total scans:   {}", timeline.len());
        println!("Labeled scans: {labeled}");
        println!("Lag (TRs):     {}", decoder.protocol().lag_trs());
        for (run, chunk) in timeline.chunks(trs_per_run).enumerate() {
            let rendered: Vec<String> = chunk.iter().map(u32::to_string).collect();
            println!("  run {run}: [{}]", rendered.join(", "));
        }
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), RoidecodeCliError> {
    let input_data = read_input(input)?;
    let document: TimingDocument = serde_json::from_str(&input_data)?;

    let issues = document.issues();
    let total_events: usize = document.runs.iter().map(Vec::len).sum();

    let report = ValidationReport {
        schema_version: document.schema_version.clone(),
        total_runs: document.runs.len(),
        total_events,
        issues: issues.iter().map(ToString::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema version: {}", report.schema_version);
        println!("Total runs:     {}", report.total_runs);
        println!("Total events:   {}", report.total_events);

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  - {issue}");
            }
        }
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(RoidecodeCliError::ValidationFailed(report.issues.len()))
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), RoidecodeCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {SCHEMA_VERSION}");
            println!();
            println!("A timing document carries all runs of one session:");
            println!();
            println!("- schema_version: \"{SCHEMA_VERSION}\"");
            println!("- session_id: optional session/subject identifier");
            println!("- runs: array of per-run event lists, each event:");
            println!("  - condition: positive label code (0 is reserved for rest)");
            println!("  - onset_seconds: onset relative to the event's own run");
            println!("  - duration_seconds: optional, carried for provenance");
            println!();
            println!("NDJSON form: one {{run, condition, onset_seconds}} per line.");
        }
        SchemaType::Output => {
            println!("Output Schema: {REPORT_VERSION}");
            println!();
            println!("A decode report contains:");
            println!();
            println!("- report_version: \"{REPORT_VERSION}\"");
            println!("- producer: {{ name, version, instance_id }}");
            println!("- provenance: {{ session_id, computed_at_utc }}");
            println!("- protocol: {{ tr_seconds, trs_per_run, num_runs, hemodynamic_lag_trs }}");
            println!("- rois: one entry per ROI:");
            println!("  - roi, n_samples, n_features");
            println!("  - folds: per held-out run {{ fold_id, accuracy }}");
            println!("  - mean_accuracy");
            println!();
            println!("Producer: {PRODUCER_NAME} {ROIDECODE_VERSION}");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(path: &Path) -> Result<String, RoidecodeCliError> {
    if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(RoidecodeCliError::StdinIsTty);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_protocol(path: &Path) -> Result<ScanProtocol, RoidecodeCliError> {
    let data = fs::read_to_string(path)?;
    let protocol: ScanProtocol = serde_json::from_str(&data)?;
    protocol.validate()?;
    Ok(protocol)
}

type RunEvents = Vec<Vec<roidecode::StimulusEvent>>;

fn read_timing(
    path: &Path,
    input_format: InputFormat,
    num_runs: usize,
) -> Result<(RunEvents, Option<String>), RoidecodeCliError> {
    let input_data = read_input(path)?;

    match input_format {
        InputFormat::Json => {
            let document = TimingAdapter::parse_document(&input_data)?;
            Ok((document.runs, document.session_id))
        }
        InputFormat::Ndjson => {
            let runs = TimingAdapter::parse_ndjson(&input_data, num_runs)?;
            Ok((runs, None))
        }
    }
}

// Error types

#[derive(Debug)]
enum RoidecodeCliError {
    Io(io::Error),
    Decode(roidecode::DecodeError),
    Json(serde_json::Error),
    NoRois,
    ValidationFailed(usize),
    StdinIsTty,
}

impl From<io::Error> for RoidecodeCliError {
    fn from(e: io::Error) -> Self {
        RoidecodeCliError::Io(e)
    }
}

impl From<roidecode::DecodeError> for RoidecodeCliError {
    fn from(e: roidecode::DecodeError) -> Self {
        RoidecodeCliError::Decode(e)
    }
}

impl From<serde_json::Error> for RoidecodeCliError {
    fn from(e: serde_json::Error) -> Self {
        RoidecodeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RoidecodeCliError> for CliError {
    fn from(e: RoidecodeCliError) -> Self {
        match e {
            RoidecodeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RoidecodeCliError::Decode(e) => CliError {
                code: "DECODE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check protocol, timing, and feature inputs".to_string()),
            },
            RoidecodeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RoidecodeCliError::NoRois => CliError {
                code: "NO_ROIS".to_string(),
                message: "No ROI feature matrices found in input".to_string(),
                hint: Some("Provide a JSON array of {roi, data} objects".to_string()),
            },
            RoidecodeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} validation issues found"),
                hint: Some("Fix the reported issues and retry".to_string()),
            },
            RoidecodeCliError::StdinIsTty => CliError {
                code: "STDIN_IS_TTY".to_string(),
                message: "stdin is a terminal; pipe input or pass a file path".to_string(),
                hint: Some("Use --timing <file> or pipe data into -".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_runs: usize,
    total_events: usize,
    issues: Vec<String>,
}
