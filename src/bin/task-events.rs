//! task-events CLI - Command-line interface for task-events
//!
//! Commands:
//! - convert: Convert a task log into per-run event tables
//! - frames: Dump the raw frames extracted from a log
//! - check-config: Validate a task configuration file

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use task_events::config::{ConfigSet, TaskConfig};
use task_events::pipeline::{extract_frames, read_log, LogConverter};
use task_events::VERSION;

/// task-events - Convert presentation task logs into event tables
#[derive(Parser)]
#[command(name = "task-events")]
#[command(version = VERSION)]
#[command(about = "Convert behavioral task logs into per-run event tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a task log into one TSV event table per run
    Convert {
        /// Input log (.txt key/value dump or delimited table)
        #[arg(short, long)]
        input: PathBuf,

        /// Task configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Directory for the event tables
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Base name for the outputs instead of the input file name
        #[arg(long)]
        name: Option<String>,

        /// Task config to use instead of matching on the input file name
        #[arg(long)]
        task: Option<String>,
    },

    /// Print the frames extracted from a log as NDJSON
    Frames {
        /// Input log
        #[arg(short, long)]
        input: PathBuf,

        /// Task configuration file; table and decoding options are taken from it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rows to skip before the table header (overrides the config)
        #[arg(long)]
        skip_rows: Option<usize>,
    },

    /// Validate every task config in a configuration file
    CheckConfig {
        /// Task configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
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

fn init_tracing() {
    // RUST_LOG=task_events=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> Result<(), TaskCliError> {
    match cli.command {
        Commands::Convert {
            input,
            config,
            output_dir,
            name,
            task,
        } => cmd_convert(&input, &config, &output_dir, name, task.as_deref()),

        Commands::Frames {
            input,
            config,
            skip_rows,
        } => cmd_frames(&input, config.as_deref(), skip_rows),

        Commands::CheckConfig { config, json } => cmd_check_config(&config, json),
    }
}

fn cmd_convert(
    input: &Path,
    config_path: &Path,
    output_dir: &Path,
    name: Option<String>,
    task: Option<&str>,
) -> Result<(), TaskCliError> {
    let configs = ConfigSet::from_path(config_path)?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let config = match task {
        Some(fragment) => configs
            .get(fragment)
            .ok_or_else(|| TaskCliError::UnknownTask(fragment.to_string()))?,
        None => configs.select(&file_name)?,
    };

    let mut converter = LogConverter::new(config.clone())?;
    if let Some(name) = name {
        converter = converter.with_base_name(name);
    }

    let conversion = converter.convert_file(input)?;
    if conversion.runs.is_empty() {
        return Err(TaskCliError::NoFrames);
    }
    println!("Found {} runs", conversion.runs.len());

    for path in converter.write(&conversion, output_dir)? {
        println!("Created {}", path.display());
    }
    Ok(())
}

fn cmd_frames(
    input: &Path,
    config_path: Option<&Path>,
    skip_rows: Option<usize>,
) -> Result<(), TaskCliError> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut config = match config_path {
        Some(path) => ConfigSet::from_path(path)?.select(&file_name)?.clone(),
        None => TaskConfig::default(),
    };
    if let Some(skip_rows) = skip_rows {
        config.skip_rows = skip_rows;
    }

    let content = read_log(input, &config)?;
    let frames = extract_frames(&content, &file_name, &config)?;
    if frames.is_empty() {
        return Err(TaskCliError::NoFrames);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for frame in &frames {
        // Sorted keys keep the dump diffable
        let sorted: std::collections::BTreeMap<_, _> = frame.iter().collect();
        writeln!(out, "{}", serde_json::to_string(&sorted)?)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_check_config(config_path: &Path, json: bool) -> Result<(), TaskCliError> {
    let configs = ConfigSet::from_path(config_path)?;

    let report = ConfigReport {
        total_tasks: configs.len(),
        tasks: configs
            .iter()
            .map(|(fragment, config)| TaskCheck {
                task: fragment.to_string(),
                events: config.events.clone(),
                error: config.validate().err().map(|e| e.to_string()),
            })
            .collect(),
    };
    let invalid = report.tasks.iter().filter(|t| t.error.is_some()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Config Report");
        println!("=============");
        println!("Tasks: {}", report.total_tasks);
        for task in &report.tasks {
            match &task.error {
                None => println!("  [OK]  {}: {}", task.task, task.events.join(", ")),
                Some(error) => println!("  [ERR] {}: {}", task.task, error),
            }
        }
    }

    if configs.is_empty() {
        Err(TaskCliError::NoTasks)
    } else if invalid > 0 {
        Err(TaskCliError::InvalidTasks(invalid))
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum TaskCliError {
    Io(io::Error),
    Convert(task_events::ConvertError),
    Json(serde_json::Error),
    NoFrames,
    NoTasks,
    UnknownTask(String),
    InvalidTasks(usize),
}

impl From<io::Error> for TaskCliError {
    fn from(e: io::Error) -> Self {
        TaskCliError::Io(e)
    }
}

impl From<task_events::ConvertError> for TaskCliError {
    fn from(e: task_events::ConvertError) -> Self {
        TaskCliError::Convert(e)
    }
}

impl From<serde_json::Error> for TaskCliError {
    fn from(e: serde_json::Error) -> Self {
        TaskCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TaskCliError> for CliError {
    fn from(e: TaskCliError) -> Self {
        use task_events::ConvertError;

        match e {
            TaskCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TaskCliError::Convert(ConvertError::NoMatchingConfig(name)) => CliError {
                code: "NO_CONFIG".to_string(),
                message: format!("No task configuration matches {name}"),
                hint: Some("Add a config keyed by part of the file name, or pass --task".to_string()),
            },
            TaskCliError::Convert(e @ ConvertError::InvalidConfig(_)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: e.to_string(),
                hint: Some("Run 'task-events check-config' for details".to_string()),
            },
            TaskCliError::Convert(e @ ConvertError::InvalidNumber { .. }) => CliError {
                code: "INVALID_NUMBER".to_string(),
                message: e.to_string(),
                hint: Some("Check that the log matches the task configuration".to_string()),
            },
            TaskCliError::Convert(e) => CliError {
                code: "CONVERT_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            TaskCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TaskCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No log frames found".to_string(),
                hint: Some("Make sure a valid log file was given".to_string()),
            },
            TaskCliError::NoTasks => CliError {
                code: "NO_TASKS".to_string(),
                message: "Configuration file holds no task configs".to_string(),
                hint: None,
            },
            TaskCliError::UnknownTask(task) => CliError {
                code: "UNKNOWN_TASK".to_string(),
                message: format!("No task config named {task}"),
                hint: Some("Run 'task-events check-config' to list tasks".to_string()),
            },
            TaskCliError::InvalidTasks(count) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: format!("{count} task configs failed validation"),
                hint: Some("Fix the reported configs and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ConfigReport {
    total_tasks: usize,
    tasks: Vec<TaskCheck>,
}

#[derive(serde::Serialize)]
struct TaskCheck {
    task: String,
    events: Vec<String>,
    error: Option<String>,
}
