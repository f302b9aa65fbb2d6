//! Pulse CLI - Command-line interface for Rapport Pulse
//!
//! Commands:
//! - seeds: Rank contacts by outreach urgency
//! - report: Build the dashboard report
//! - health: Classify a single last-contact date
//! - friction: Feed a funnel window to the friction detector
//! - streak: Record or inspect engagement streaks
//! - validate: Validate contact input
//! - doctor: Diagnose configuration and state files
//! - schema: Print schema information

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use rapport_pulse::decay::{classify_health, elapsed_days, garden_label_for};
use rapport_pulse::pipeline::FrictionResponse;
use rapport_pulse::report::{ReportEncoder, REPORT_VERSION};
use rapport_pulse::schema::{parse_contact_date, ContactAdapter, RawContact, SCHEMA_VERSION};
use rapport_pulse::store::{FileStore, KeyValueStore, ENGAGEMENT_STATE_KEY};
use rapport_pulse::types::{ContactEngagementRecord, SeedRecommendation};
use rapport_pulse::{
    FrictionWindow, OutreachContext, PulseConfig, PulseError, PulseProcessor, SeedScorer,
    PRODUCER_NAME, PULSE_VERSION,
};

/// Pulse - On-device scoring engine for relationship engagement
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Rapport Labs")]
#[command(version = PULSE_VERSION)]
#[command(about = "Score relationship decay, outreach priority, funnel friction and streaks", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank contacts by outreach urgency
    Seeds {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Maximum number of seeds (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Build the dashboard report for a batch of contacts
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Classify one contact's health and garden tier
    Health {
        /// Days since last contact
        #[arg(long, conflicts_with = "last_contact")]
        days: Option<i64>,

        /// Last contact date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        last_contact: Option<String>,

        /// Target contact frequency in days
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
        target: u32,
    },

    /// Feed a funnel window to the friction detector
    Friction {
        /// Daily outreach requests, oldest first (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        requests: Vec<u64>,

        /// Daily approvals, oldest first (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        approvals: Vec<u64>,

        /// Content of the last outreach
        #[arg(long)]
        content: Option<String>,

        /// Contact the last outreach was addressed to
        #[arg(long)]
        subject: Option<String>,

        /// Detector state file, loaded before and saved after evaluation
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Dismiss the active alert before evaluating
        #[arg(long)]
        dismiss: bool,
    },

    /// Record or inspect engagement streaks
    Streak {
        #[command(subcommand)]
        command: StreakCommand,
    },

    /// Validate contact input
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and state files
    Doctor {
        /// Engagement state directory to check
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Subcommand)]
enum StreakCommand {
    /// Record a completed engagement
    Record {
        /// Game or activity mode
        #[arg(long)]
        mode: String,

        /// Score earned (also granted as XP)
        #[arg(long)]
        score: u64,

        /// Directory holding the engagement record
        #[arg(long, default_value = ".pulse")]
        state_dir: PathBuf,
    },

    /// Show the stored engagement record
    Show {
        /// Directory holding the engagement record
        #[arg(long, default_value = ".pulse")]
        state_dir: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Detect from the first character (`[` means array)
    Auto,
    /// Newline-delimited JSON (one contact per line)
    Ndjson,
    /// JSON array of contacts
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one seed per line)
    Ndjson,
    /// JSON array of seeds
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input contact schema (rapport.contact.v1)
    Contact,
    /// Dashboard report schema (rapport.dashboard.v1)
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    // doctor reports a broken config instead of failing on it
    if let Commands::Doctor { state_dir, json } = &cli.command {
        return cmd_doctor(cli.config.as_deref(), state_dir.as_deref(), *json);
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Seeds {
            input,
            input_format,
            limit,
            output_format,
        } => cmd_seeds(&config, &input, input_format, limit, output_format),

        Commands::Report {
            input,
            input_format,
            pretty,
        } => cmd_report(&config, &input, input_format, pretty),

        Commands::Health {
            days,
            last_contact,
            target,
        } => cmd_health(days, last_contact.as_deref(), target),

        Commands::Friction {
            requests,
            approvals,
            content,
            subject,
            state_file,
            dismiss,
        } => {
            let window = FrictionWindow::new(requests, approvals);
            let context = (content.is_some() || subject.is_some()).then(|| OutreachContext {
                content,
                subject_id: subject,
            });
            let response = friction_step(
                config,
                &window,
                context.as_ref(),
                state_file.as_deref(),
                dismiss,
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }

        Commands::Streak { command } => match command {
            StreakCommand::Record {
                mode,
                score,
                state_dir,
            } => cmd_streak_record(config, &mode, score, &state_dir),
            StreakCommand::Show { state_dir } => cmd_streak_show(config, &state_dir),
        },

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { state_dir, json } => {
            cmd_doctor(cli.config.as_deref(), state_dir.as_deref(), json)
        }

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_seeds(
    config: &PulseConfig,
    input: &Path,
    input_format: InputFormat,
    limit: Option<usize>,
    output_format: OutputFormat,
) -> Result<(), PulseCliError> {
    let records = read_records(input, &input_format)?;
    let limit = limit.unwrap_or(config.seeds.limit);

    let seeds = SeedScorer::new(config.seeds.clone()).compute_seeds(&records, limit, Utc::now());
    print!("{}", format_seeds(&seeds, &output_format)?);
    Ok(())
}

fn cmd_report(
    config: &PulseConfig,
    input: &Path,
    input_format: InputFormat,
    pretty: bool,
) -> Result<(), PulseCliError> {
    let records = read_records(input, &input_format)?;
    let report = ReportEncoder::new()
        .with_seed_config(config.seeds.clone())
        .encode(&records, Utc::now());

    if pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn cmd_health(days: Option<i64>, last_contact: Option<&str>, target: u32) -> Result<(), PulseCliError> {
    let now = Utc::now();
    let last = match (days, last_contact) {
        (Some(days), _) if days < 0 => {
            return Err(PulseCliError::InvalidArgument(format!(
                "--days must not be negative, got {}",
                days
            )))
        }
        (Some(days), _) => Some(now - Duration::days(days)),
        (None, Some(raw)) => Some(
            parse_contact_date(raw)
                .ok_or_else(|| PulseError::DateParseError(format!("unrecognized date: {}", raw)))?,
        ),
        (None, None) => None,
    };

    let report = HealthReport {
        elapsed_days: last.map(|date| elapsed_days(date, now)),
        target_frequency_days: target,
        health: classify_health(last, target, now).as_str(),
        garden: garden_label_for(last, target, now).as_str(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Load detector state, optionally dismiss, evaluate the window and save state back
fn friction_step(
    config: PulseConfig,
    window: &FrictionWindow,
    context: Option<&OutreachContext>,
    state_file: Option<&Path>,
    dismiss: bool,
    now: DateTime<Utc>,
) -> Result<FrictionResponse, PulseCliError> {
    let mut processor = PulseProcessor::with_config(config)?;

    if let Some(path) = state_file {
        if path.exists() {
            processor.load_friction_state(&fs::read_to_string(path)?)?;
        }
    }

    if dismiss {
        processor.dismiss_alert();
    }

    let response = processor.observe_friction(window, context, now);

    if let Some(path) = state_file {
        fs::write(path, processor.save_friction_state()?)?;
    }

    Ok(response)
}

fn cmd_streak_record(
    config: PulseConfig,
    mode: &str,
    score: u64,
    state_dir: &Path,
) -> Result<(), PulseCliError> {
    let processor = PulseProcessor::with_config(config)?;
    let mut session = processor.open_engagement(FileStore::new(state_dir))?;
    let update = session.record_engagement(mode, score)?;

    println!("{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}

fn cmd_streak_show(config: PulseConfig, state_dir: &Path) -> Result<(), PulseCliError> {
    let processor = PulseProcessor::with_config(config)?;
    let session = processor.open_engagement(FileStore::new(state_dir))?;

    let summary = StreakSummary {
        state: serde_json::to_value(session.state())?,
        xp_to_next_level: session.tracker().xp_to_next_level(),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), PulseCliError> {
    let contacts = read_contacts(input, &input_format)?;
    let results = ContactAdapter::validate_contacts(&contacts);

    let report = ValidationReport {
        total_contacts: contacts.len(),
        valid_contacts: contacts.len() - results.len(),
        invalid_contacts: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                contact_id: r.contact_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total contacts:   {}", report.total_contacts);
        println!("Valid contacts:   {}", report.valid_contacts);
        println!("Invalid contacts: {}", report.invalid_contacts);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Contact {} (index {}): {}",
                    err.contact_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_contacts > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_contacts))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, state_dir: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck::new("pulse_version", CheckStatus::Ok, format!("Pulse version {}", PULSE_VERSION)),
        DoctorCheck::new(
            "schema_version",
            CheckStatus::Ok,
            format!("Input schema: {}, report: {}", SCHEMA_VERSION, REPORT_VERSION),
        ),
    ];

    if let Some(path) = config {
        checks.push(check_config(path));
    }

    if let Some(dir) = state_dir {
        checks.push(check_state_dir(dir));
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck::new("stdin", CheckStatus::Ok, stdin_message.to_string()));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
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

    if report.has_errors() {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_config(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck::new("config", CheckStatus::Error, "Config file does not exist".to_string());
    }

    match PulseConfig::from_file(path) {
        Ok(config) => DoctorCheck::new(
            "config",
            CheckStatus::Ok,
            format!(
                "Config valid (seed limit {}, friction window {}, {} levels)",
                config.seeds.limit,
                config.friction.window,
                config.levels.len()
            ),
        ),
        Err(e) => DoctorCheck::new("config", CheckStatus::Error, format!("Invalid config: {}", e)),
    }
}

fn check_state_dir(dir: &Path) -> DoctorCheck {
    let store = FileStore::new(dir);
    match store.get(ENGAGEMENT_STATE_KEY) {
        Ok(None) => DoctorCheck::new(
            "engagement_state",
            CheckStatus::Warning,
            "No engagement record yet (created on first streak record)".to_string(),
        ),
        Ok(Some(json)) => match serde_json::from_str::<serde_json::Value>(&json) {
            Ok(value) => DoctorCheck::new(
                "engagement_state",
                CheckStatus::Ok,
                format!(
                    "Engagement record valid (level {}, streak {})",
                    value.get("level").and_then(|v| v.as_u64()).unwrap_or(1),
                    value.get("current_streak").and_then(|v| v.as_u64()).unwrap_or(0)
                ),
            ),
            Err(e) => DoctorCheck::new(
                "engagement_state",
                CheckStatus::Error,
                format!("Invalid engagement record JSON: {}", e),
            ),
        },
        Err(e) => DoctorCheck::new(
            "engagement_state",
            CheckStatus::Error,
            format!("Cannot read engagement record: {}", e),
        ),
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), PulseCliError> {
    match schema_type {
        SchemaType::Contact => {
            if json_schema {
                println!("{}", get_contact_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Each contact is a JSON object; input is a JSON array or NDJSON.");
                println!();
                println!("- id (required): also accepted as contact_id, contactId");
                println!("- name: also display_name, displayName, full_name (defaults to id)");
                println!("- last contact: first parseable of last_contact_date, last_contacted_at,");
                println!("  last_interaction_at (RFC 3339 or YYYY-MM-DD; absent means never contacted)");
                println!("- importance: high, medium, low (case-insensitive; unknown means medium)");
                println!("- target_frequency_days: positive integer (missing or 0 means 30)");
            }
        }
        SchemaType::Report => {
            if json_schema {
                println!("{}", get_report_json_schema());
            } else {
                println!("Output Schema: {}", REPORT_VERSION);
                println!();
                println!("- report_version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc");
                println!("- tier_counts: {{ nurtured, drifting, neglected }}");
                println!("- contacts: per-contact {{ contact_id, name, importance, days_since_contact,");
                println!("  target_frequency_days, health, garden }}");
                println!("- seeds: top seeds {{ contact_id, name, importance, days_since_contact, score, reason }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<PulseConfig, PulseCliError> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Ok(PulseConfig::from_file(path)?)
        }
        None => Ok(PulseConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_contacts(input: &Path, input_format: &InputFormat) -> Result<Vec<RawContact>, PulseCliError> {
    let data = read_input(input)?;
    let contacts = match input_format {
        InputFormat::Auto => ContactAdapter::parse(&data)?,
        InputFormat::Ndjson => ContactAdapter::parse_ndjson(&data)?,
        InputFormat::Json => ContactAdapter::parse_array(&data)?,
    };
    tracing::debug!(count = contacts.len(), "contacts parsed");
    Ok(contacts)
}

fn read_records(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<ContactEngagementRecord>, PulseCliError> {
    let contacts = read_contacts(input, input_format)?;
    Ok(ContactAdapter::to_records(&contacts)?)
}

fn format_seeds(seeds: &[SeedRecommendation], format: &OutputFormat) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for seed in seeds {
                out.push_str(&serde_json::to_string(seed)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(seeds)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(seeds)? + "\n"),
    }
}

fn get_contact_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://rapport.dev/schemas/rapport.contact.v1.json",
        "title": SCHEMA_VERSION,
        "description": "Rapport contact engagement record",
        "type": "object",
        "required": ["id"],
        "properties": {
            "id": { "type": "string" },
            "name": { "type": "string" },
            "last_contact_date": { "type": "string" },
            "last_contacted_at": { "type": "string", "format": "date-time" },
            "last_interaction_at": { "type": "string", "format": "date-time" },
            "importance": { "type": "string", "enum": ["high", "medium", "low"] },
            "target_frequency_days": { "type": "integer", "minimum": 0 }
        }
    })
    .to_string()
}

fn get_report_json_schema() -> String {
    let tier = |values: &[&str]| serde_json::json!({ "type": "string", "enum": values });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://rapport.dev/schemas/rapport.dashboard.v1.json",
        "title": REPORT_VERSION,
        "description": "Rapport dashboard report",
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "tier_counts", "contacts", "seeds"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "tier_counts": {
                "type": "object",
                "properties": {
                    "nurtured": { "type": "integer" },
                    "drifting": { "type": "integer" },
                    "neglected": { "type": "integer" }
                }
            },
            "contacts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "health": tier(&["nurtured", "drifting", "neglected"]),
                        "garden": tier(&["blooming", "nourished", "thirsty", "fading"])
                    }
                }
            },
            "seeds": { "type": "array", "items": { "type": "object" } }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Pulse(PulseError),
    Json(serde_json::Error),
    InvalidArgument(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<PulseError> for PulseCliError {
    fn from(e: PulseError) -> Self {
        PulseCliError::Pulse(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Pulse(PulseError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'pulse doctor --config <file>' for details".to_string()),
            },
            PulseCliError::Pulse(PulseError::Store(msg)) => CliError {
                code: "STORE_ERROR".to_string(),
                message: msg,
                hint: Some("Check the --state-dir path".to_string()),
            },
            PulseCliError::Pulse(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", SCHEMA_VERSION)),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run with --help for usage".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} contacts failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct HealthReport {
    elapsed_days: Option<i64>,
    target_frequency_days: u32,
    health: &'static str,
    garden: &'static str,
}

#[derive(serde::Serialize)]
struct StreakSummary {
    state: serde_json::Value,
    xp_to_next_level: Option<u64>,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_contacts: usize,
    valid_contacts: usize,
    invalid_contacts: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    contact_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| matches!(c.status, CheckStatus::Error))
    }
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rapport_pulse::FrictionTransition;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_cli_parses_friction_lists() {
        let cli = Cli::try_parse_from([
            "pulse",
            "friction",
            "--requests",
            "10,12,9",
            "--approvals",
            "2,3,1",
        ])
        .unwrap();

        match cli.command {
            Commands::Friction {
                requests, approvals, ..
            } => {
                assert_eq!(requests, vec![10, 12, 9]);
                assert_eq!(approvals, vec![2, 3, 1]);
            }
            _ => panic!("expected friction command"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_target() {
        assert!(Cli::try_parse_from(["pulse", "health", "--days", "3", "--target", "0"]).is_err());
    }

    #[test]
    fn test_read_records_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.ndjson");
        fs::write(
            &path,
            "{\"id\": \"a\", \"importance\": \"HIGH\"}\n{\"contactId\": \"b\", \"lastContactDate\": \"2024-05-01\"}\n",
        )
        .unwrap();

        let records = read_records(&path, &InputFormat::Auto).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "b");
        assert!(records[1].last_contact.is_some());
    }

    #[test]
    fn test_friction_state_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("friction.json");
        let bad = FrictionWindow::new(vec![10, 10, 10], vec![1, 1, 1]);

        let first = friction_step(PulseConfig::default(), &bad, None, Some(&state), false, now()).unwrap();
        assert_eq!(first.transition, FrictionTransition::Raised);
        assert!(state.exists());

        let second = friction_step(PulseConfig::default(), &bad, None, Some(&state), false, now()).unwrap();
        assert_eq!(second.transition, FrictionTransition::Unchanged);

        // A dismissed alert is raised again on the next changed window
        let worse = FrictionWindow::new(vec![10, 10, 10, 10], vec![1, 1, 1, 0]);
        let reraised = friction_step(PulseConfig::default(), &worse, None, Some(&state), true, now()).unwrap();
        assert_eq!(reraised.transition, FrictionTransition::Raised);
    }

    #[test]
    fn test_format_seeds_ndjson() {
        let seeds = SeedScorer::default().compute_seeds(
            &[
                ContactEngagementRecord::new("a", "A"),
                ContactEngagementRecord::new("b", "B"),
            ],
            5,
            now(),
        );

        let out = format_seeds(&seeds, &OutputFormat::Ndjson).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_doctor_flags_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(format!("{}.json", ENGAGEMENT_STATE_KEY)), "{not json").unwrap();

        let check = check_state_dir(dir.path());
        assert!(matches!(check.status, CheckStatus::Error));

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(check_state_dir(empty.path()).status, CheckStatus::Warning));
    }
}
