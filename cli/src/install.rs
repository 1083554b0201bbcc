//! cpy-install - install an application onto a CircuitPython board
//!
//! Application files are always replaced. The settings file and library
//! modules are only copied when the board does not already have them.

mod shared;

use clap::{Parser, ValueEnum};
use cpytools::{CopyStats, Error as InstallError, InstallStats, Installer, PlanItem};
use serde_json::{Value, json};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// cpy-install - install an application onto a CircuitPython board
///
/// Usage:
///   cpy-install /Volumes/CIRCUITPY
#[derive(Parser, Debug)]
#[command(name = "cpy-install", version, about, long_about = None)]
struct Args {
    /// Mounted board to install onto
    destination: PathBuf,

    /// Directory holding the application [default: directory of this executable]
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Show what would be copied without writing anything
    #[arg(short = 'n', long = "plan", alias = "dry-run")]
    plan: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    output: OutputMode,

    /// Skip fsync before each rename
    ///
    /// Faster, but a board unplugged right after the install may lose files.
    #[arg(long)]
    no_sync: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only print errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// Human-readable output
    Human,
    /// A single JSON document on stdout
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Cannot locate the directory of this executable: {source}")]
    ExecutableDir { source: io::Error },

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("Failed to serialize JSON output: {source}")]
    JsonSerialize { source: serde_json::Error },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Install(error) => error.exit_code(),
            Self::ExecutableDir { .. } | Self::JsonSerialize { .. } => 1,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Install(error) if error.is_no_space() => Some(
                "the board is full; remove unused modules from lib/ and try again".to_owned(),
            ),
            Self::Install(InstallError::LibDirMissing(path)) => {
                Some(format!("create it first: mkdir {}", path.display()))
            }
            Self::ExecutableDir { .. } => Some("pass --source DIR".to_owned()),
            _ => None,
        }
    }
}

type CliResult<T> = std::result::Result<T, CliError>;

fn main() {
    let args: Args = shared::parse_args();
    shared::init_tracing(args.verbose, args.quiet);

    if let Err(error) = run(&args) {
        eprintln!("error: {error}");
        if let Some(hint) = error.hint() {
            eprintln!("hint: {hint}");
        }
        std::process::exit(error.exit_code());
    }
}

fn run(args: &Args) -> CliResult<()> {
    let source = match &args.source {
        Some(dir) => dir.clone(),
        None => executable_dir()?,
    };

    let mut installer = Installer::new(&source, &args.destination);
    if args.no_sync {
        installer = installer.no_sync();
    }

    if args.plan {
        let items = installer.plan()?;
        return emit_plan_output(args.output, &items);
    }

    let pb = (args.output == OutputMode::Human && !args.quiet).then(|| {
        shared::spinner(format!(
            "Installing onto {}...",
            args.destination.display()
        ))
    });
    let result = installer.run();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let stats = result?;

    match args.output {
        OutputMode::Human => {
            if !args.quiet {
                print_stats(&stats, args.verbose);
            }
            Ok(())
        }
        OutputMode::Json => {
            let payload = json!({
                "schema_version": "1.0",
                "mode": "execute",
                "source": display_path(&source),
                "destination": display_path(&stats.destination),
                "core": stats_json(&stats.core),
                "settings_copied": stats.settings_copied,
                "lib": stats_json(&stats.lib),
                "duration_ms": stats.duration.as_millis() as u64,
            });
            print_json_value(&payload)
        }
    }
}

fn executable_dir() -> CliResult<PathBuf> {
    let exe = std::env::current_exe().map_err(|source| CliError::ExecutableDir { source })?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn emit_plan_output(output_mode: OutputMode, items: &[PlanItem]) -> CliResult<()> {
    match output_mode {
        OutputMode::Human => {
            println!("Plan ({} items):", items.len());
            for item in items {
                println!(
                    "  {} {} -> {} ({})",
                    item.action,
                    item.source.display(),
                    item.destination.display(),
                    item.reason
                );
            }
            Ok(())
        }
        OutputMode::Json => {
            let payload = json!({
                "schema_version": "1.0",
                "mode": "plan",
                "items": items.iter().map(plan_item_json).collect::<Vec<Value>>(),
            });
            print_json_value(&payload)
        }
    }
}

fn plan_item_json(item: &PlanItem) -> Value {
    json!({
        "source": display_path(&item.source),
        "destination": display_path(&item.destination),
        "action": item.action.as_str(),
        "reason": item.reason,
    })
}

fn stats_json(stats: &CopyStats) -> Value {
    json!({
        "files_copied": stats.files_copied,
        "files_skipped": stats.files_skipped,
        "dirs_created": stats.dirs_created,
        "bytes_copied": stats.bytes_copied,
    })
}

fn print_stats(stats: &InstallStats, verbose: bool) {
    let total = stats.total();
    println!("Installed onto {}", stats.destination.display());
    println!("  Core files:  {} written", stats.core.files_copied);
    println!(
        "  Settings:    {}",
        if stats.settings_copied {
            "installed"
        } else {
            "kept existing"
        }
    );
    println!(
        "  Libraries:   {} added, {} already present",
        stats.lib.files_copied, stats.lib.files_skipped
    );
    if verbose {
        println!("  Directories: {}", stats.lib.dirs_created);
        println!("  Total size:  {}", format_bytes(total.bytes_copied));
        println!("  Took:        {:?}", stats.duration);
    }
}

fn print_json_value(value: &Value) -> CliResult<()> {
    let serialized =
        serde_json::to_string(value).map_err(|source| CliError::JsonSerialize { source })?;
    println!("{serialized}");
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
