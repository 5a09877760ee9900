//! Command-line interface module for huriwake.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Choosing between distribution and the configuration view
//! - Rule management (add, remove, reorder)
//! - Wiring the engine to the terminal prompt and progress bar

use crate::config::{ConfigError, ConfigLocation};
use crate::conflict::{ConflictDecision, DecisionProvider};
use crate::file_distributor::{FileDistributor, RunEvent};
use crate::output::OutputFormatter;
use crate::prompt::TerminalPrompt;
use crate::result_log::ResultLog;
use crate::rule::{Rule, RuleError, RuleKind, RuleSet};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Distribute files into folders by ordered extension, name and folder rules.
#[derive(Debug, Parser)]
#[command(name = "huriwake", version, about)]
pub struct Cli {
    /// Files or folders to distribute. Folders are scanned one level deep.
    /// Without paths the configured rules are shown.
    pub paths: Vec<PathBuf>,

    /// Configuration file to use instead of the default location.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Answer every name conflict this way instead of asking.
    #[arg(long, value_enum, value_name = "DECISION")]
    pub on_conflict: Option<ConflictDecision>,

    /// Show where files would go without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the results as JSON.
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage distribution rules.
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum RuleAction {
    /// List rules in match order.
    List,
    /// Add a rule, or change the destination of an identical one.
    Add {
        #[arg(value_enum)]
        kind: RuleKind,
        /// Extension (".pdf" or "pdf") or text to look for.
        pattern: String,
        /// Folder that matching files are moved into.
        destination: PathBuf,
    },
    /// Remove the rule with the given number.
    Remove { number: usize },
    /// Move a rule to another position.
    Move { from: usize, to: usize },
}

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),
    #[error("There is no rule number {number}; {count} rule(s) configured")]
    NoSuchRule { number: usize, count: usize },
    #[error("Could not encode results: {0}")]
    Report(#[from] serde_json::Error),
}

/// Runs the CLI application for parsed arguments.
///
/// This is the main entry point for CLI operations. With a `rules`
/// subcommand the rule list is edited, with paths they are distributed, and
/// with neither the configuration view is shown.
///
/// # Arguments
///
/// * `cli` - Parsed command-line arguments
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use huriwake::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["huriwake", "/home/me/Downloads"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), CliError> {
    let location = ConfigLocation::resolve(cli.config.as_deref());

    match &cli.command {
        Some(Command::Rules { action }) => manage_rules(&location, action),
        None if cli.paths.is_empty() => show_configuration(&location),
        None => {
            let decisions: Box<dyn DecisionProvider> = match cli.on_conflict {
                Some(decision) => Box::new(decision),
                None if std::io::stdin().is_terminal() => Box::new(TerminalPrompt::stdio()),
                None => Box::new(ConflictDecision::Cancel),
            };
            distribute_paths(&location, &cli.paths, decisions, cli.dry_run, cli.json)
        }
    }
}

/// Distributes `paths` using the rules stored at `location` and prints the
/// results.
///
/// This function:
/// 1. Loads the rule list
/// 2. Lists each input entry in turn
/// 3. Processes every listed file, asking `decisions` about conflicts
/// 4. Prints the result table, JSON, or a notice when nothing matched
///
/// # Arguments
///
/// * `location` - Configuration file holding the rules
/// * `paths` - Files and folders to distribute
/// * `decisions` - Answers name conflicts
/// * `dry_run` - Report planned moves without touching the disk
/// * `json` - Print the result log as JSON instead of a table
///
/// # Examples
///
/// ```no_run
/// use huriwake::cli::distribute_paths;
/// use huriwake::config::ConfigLocation;
/// use huriwake::conflict::ConflictDecision;
/// use std::path::PathBuf;
///
/// let location = ConfigLocation::new("/home/me/.config/huriwake/config.toml");
/// distribute_paths(
///     &location,
///     &[PathBuf::from("/home/me/Downloads")],
///     Box::new(ConflictDecision::RenameUnique),
///     false,
///     false,
/// )
/// .unwrap();
/// ```
pub fn distribute_paths(
    location: &ConfigLocation,
    paths: &[PathBuf],
    mut decisions: Box<dyn DecisionProvider>,
    dry_run: bool,
    json: bool,
) -> Result<(), CliError> {
    let config = location.load()?;
    if config.rules.is_empty() && !json {
        OutputFormatter::warning(&format!(
            "No rules configured in {}",
            location.path().display()
        ));
    }

    if dry_run && !json {
        OutputFormatter::dry_run_notice("Nothing will be moved.");
    }

    let log = run_with_progress(&config.rules, paths, decisions.as_mut(), dry_run);

    if json {
        println!("{}", log.to_json()?);
    } else {
        present(&log);
    }
    Ok(())
}

/// Runs the distributor over `paths` while keeping a progress bar current.
///
/// The bar is suspended while a conflict is being decided so prompts stay
/// readable.
fn run_with_progress(
    rules: &RuleSet,
    paths: &[PathBuf],
    decisions: &mut dyn DecisionProvider,
    dry_run: bool,
) -> ResultLog {
    let distributor = FileDistributor::new(rules).with_dry_run(dry_run);
    let pb = OutputFormatter::create_progress_bar();

    let mut suspended = |file_name: &str, destination: &Path| {
        pb.suspend(|| decisions.decide(file_name, destination))
    };

    let log = distributor.run_with(paths, &mut suspended, |event| match event {
        RunEvent::Listed(count) => pb.inc_length(count as u64),
        RunEvent::Started(task) => pb.set_message(task.file_name()),
        RunEvent::Finished(_) => pb.inc(1),
    });

    pb.finish_and_clear();
    log
}

fn present(log: &ResultLog) {
    if log.is_empty() {
        OutputFormatter::info("No files matched any rule.");
        OutputFormatter::plain("Only files matching a configured rule are moved.");
        return;
    }

    OutputFormatter::header("RESULTS");
    OutputFormatter::result_table(log);
    OutputFormatter::success("Distribution complete.");
}

/// Shows the configuration view: the config file location and its rules.
fn show_configuration(location: &ConfigLocation) -> Result<(), CliError> {
    let config = location.load()?;
    OutputFormatter::rule_table(location.path(), &config.rules);
    Ok(())
}

/// Applies a `rules` subcommand and saves the result.
///
/// # Arguments
///
/// * `location` - Configuration file to edit
/// * `action` - The edit to apply
fn manage_rules(location: &ConfigLocation, action: &RuleAction) -> Result<(), CliError> {
    let mut config = location.load()?;

    match action {
        RuleAction::List => {
            OutputFormatter::rule_table(location.path(), &config.rules);
            return Ok(());
        }
        RuleAction::Add {
            kind,
            pattern,
            destination,
        } => {
            let rule = Rule::new(*kind, pattern, destination.clone())?;
            let description = rule.to_string();
            let replaced = config.rules.push_or_replace(rule);
            location.save(&config)?;
            if replaced {
                OutputFormatter::success(&format!("Updated rule: {}", description));
            } else {
                OutputFormatter::success(&format!("Added rule: {}", description));
            }
        }
        RuleAction::Remove { number } => {
            let index = rule_index(*number, &config.rules)?;
            if let Some(removed) = config.rules.remove(index) {
                location.save(&config)?;
                OutputFormatter::success(&format!("Removed rule: {}", removed));
            }
        }
        RuleAction::Move { from, to } => {
            let from_index = rule_index(*from, &config.rules)?;
            let to_index = rule_index(*to, &config.rules)?;
            config.rules.move_rule(from_index, to_index);
            location.save(&config)?;
            OutputFormatter::success(&format!("Moved rule {} to position {}", from, to));
        }
    }

    OutputFormatter::rule_table(location.path(), &config.rules);
    Ok(())
}

/// Converts a 1-based rule number into an index.
fn rule_index(number: usize, rules: &RuleSet) -> Result<usize, CliError> {
    if number == 0 || number > rules.len() {
        return Err(CliError::NoSuchRule {
            number,
            count: rules.len(),
        });
    }
    Ok(number - 1)
}
