//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the progress bar shown while files are distributed, the result table and
//! the rule table of the configuration view.

use crate::result_log::{OutcomeStatus, ResultLog};
use crate::rule::RuleSet;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use huriwake::output::OutputFormatter;
    /// OutputFormatter::success("Distribution complete.");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use huriwake::output::OutputFormatter;
    /// OutputFormatter::error("Could not read configuration");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use huriwake::output::OutputFormatter;
    /// OutputFormatter::warning("No rules configured yet.");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar that grows as input folders are listed.
    ///
    /// Hidden automatically when stderr is not a terminal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use huriwake::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar();
    /// pb.inc_length(10);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the outcome of a run as a table followed by totals.
    ///
    /// Each file gets one row, in processing order, with the matched rule on
    /// a dimmed line below it.
    ///
    /// # Arguments
    ///
    /// * `log` - The records of a finished run
    ///
    /// # Example
    ///
    /// ```no_run
    /// use huriwake::conflict::ConflictDecision;
    /// use huriwake::file_distributor::FileDistributor;
    /// use huriwake::output::OutputFormatter;
    /// use huriwake::rule::RuleSet;
    ///
    /// let rules = RuleSet::new();
    /// let log = FileDistributor::new(&rules).run(["/tmp/inbox"], &mut ConflictDecision::Cancel);
    /// OutputFormatter::result_table(&log);
    /// ```
    pub fn result_table(log: &ResultLog) {
        print!("{}", Self::render_result_table(log));
    }

    /// Renders the result table.
    pub fn render_result_table(log: &ResultLog) -> String {
        let name_width = log
            .into_iter()
            .map(|r| r.file_name.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        let status_width = 7;

        let mut out = String::new();
        out.push_str(&format!(
            "{} | {} | {}\n",
            format!("{:<name_width$}", "File").bold(),
            format!("{:<status_width$}", "Status").bold(),
            "Destination / detail".bold(),
        ));
        out.push_str(&"-".repeat(name_width + status_width + 30));
        out.push('\n');

        for record in log {
            let status = format!("{:<status_width$}", record.status.label());
            let status = match record.status {
                OutcomeStatus::Moved => status.green(),
                OutcomeStatus::Skipped => status.yellow(),
                OutcomeStatus::Error => status.red(),
                OutcomeStatus::Planned => status.cyan(),
            };
            out.push_str(&format!(
                "{:<name_width$} | {} | {}\n",
                record.file_name, status, record.detail
            ));
            if let Some(rule) = &record.matched_rule {
                out.push_str(&format!(
                    "{:<name_width$} | {:<status_width$} | {}\n",
                    "",
                    "",
                    format!("rule: {}", rule).dimmed()
                ));
            }
        }

        out.push_str(&Self::summary_line(log));
        out.push('\n');
        out
    }

    /// One-line totals, e.g. `2 moved, 1 skipped, 0 errors`.
    pub fn summary_line(log: &ResultLog) -> String {
        let planned = log.count(OutcomeStatus::Planned);
        if planned > 0 {
            return format!(
                "{} planned, {} skipped, {} errors",
                planned,
                log.count(OutcomeStatus::Skipped),
                log.count(OutcomeStatus::Error)
            );
        }
        format!(
            "{} moved, {} skipped, {} errors",
            log.count(OutcomeStatus::Moved),
            log.count(OutcomeStatus::Skipped),
            log.count(OutcomeStatus::Error)
        )
    }

    /// Prints the configuration view: where rules live and what they are.
    ///
    /// # Arguments
    ///
    /// * `config_path` - The configuration file in use
    /// * `rules` - The rules loaded from it, in match order
    pub fn rule_table(config_path: &Path, rules: &RuleSet) {
        Self::header("HURIWAKE RULES");
        Self::plain(&format!("Configuration: {}", config_path.display()));
        println!();

        if rules.is_empty() {
            Self::warning("No rules configured yet.");
            Self::info("Add one with: huriwake rules add extension .pdf <FOLDER>");
            return;
        }

        print!("{}", Self::render_rule_table(rules));
        println!();
        Self::info("Drop files or folders onto huriwake (or pass them as arguments) to distribute them.");
    }

    /// Renders the numbered rule list in match order.
    pub fn render_rule_table(rules: &RuleSet) -> String {
        let pattern_width = rules
            .iter()
            .map(|r| r.pattern().chars().count())
            .max()
            .unwrap_or(0)
            .max(7);

        let mut out = format!(
            "{:>3}  {:<9}  {:<pattern_width$}  {}\n",
            "#",
            "Type",
            "Pattern",
            "Destination"
        );
        for (index, rule) in rules.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}  {:<9}  {:<pattern_width$}  {}\n",
                index + 1,
                rule.kind().label(),
                rule.pattern(),
                rule.destination().display()
            ));
        }
        out
    }

    /// Prints a dry-run notice message.
    ///
    /// # Arguments
    ///
    /// * `message` - The notice text, shown after a `[DRY RUN]` tag
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
