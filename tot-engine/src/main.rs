//! Command-line front end for the exploration engine.
//!
//! Runs are in-memory and live only for one command; `replay` drives a fresh
//! registry from a JSON script and prints the outcome.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tot_engine::core::guide;
use tot_engine::core::levels::ExplorationLevel;
use tot_engine::exit_codes;
use tot_engine::io::config::{EngineConfig, load_config, write_config};
use tot_engine::io::report::render_report;
use tot_engine::io::script::load_script;
use tot_engine::logging;
use tot_engine::registry::Registry;
use tot_engine::replay::run_replay;

#[derive(Parser)]
#[command(
    name = "tot-engine",
    version,
    about = "Budgeted tree-of-thought exploration engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print exploration levels and depth scoring guidelines as JSON.
    Guide {
        /// Only print the entry for this level.
        #[arg(short, long)]
        level: Option<ExplorationLevel>,
    },
    /// Write the default engine configuration as TOML.
    InitConfig {
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Check a replay script against the schema and its label references.
    Validate { script: PathBuf },
    /// Run a replay script against a fresh engine and print the outcome.
    Replay {
        script: PathBuf,
        /// Engine configuration (TOML). Defaults apply when omitted or missing.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Guide { level } => cmd_guide(level),
        Command::InitConfig { path, force } => cmd_init_config(&path, force),
        Command::Validate { script } => cmd_validate(&script),
        Command::Replay {
            script,
            config,
            format,
        } => cmd_replay(&script, config.as_deref(), format),
    }
}

fn cmd_guide(level: Option<ExplorationLevel>) -> Result<i32> {
    match level {
        Some(level) => print_json(&guide::level_guide(level))?,
        None => print_json(&guide::exploration_guide())?,
    }
    Ok(exit_codes::OK)
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &EngineConfig::default())?;
    Ok(exit_codes::OK)
}

fn cmd_validate(script: &Path) -> Result<i32> {
    let script = load_script(script)?;
    println!("ok: {} round(s)", script.rounds.len());
    Ok(exit_codes::OK)
}

fn cmd_replay(script: &Path, config: Option<&Path>, format: OutputFormat) -> Result<i32> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let script = load_script(script)?;
    let mut registry = Registry::new(config)?;
    let outcome = run_replay(&mut registry, &script)?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Markdown => print!("{}", render_report(&outcome)?),
    }
    Ok(if outcome.enforcement_met() {
        exit_codes::OK
    } else {
        exit_codes::ENFORCEMENT_NOT_MET
    })
}

/// Print `value` as pretty JSON with a trailing newline.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
