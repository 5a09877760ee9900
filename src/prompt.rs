//! Interactive conflict prompt for the terminal.

use crate::conflict::{ConflictDecision, DecisionProvider};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::warn;

/// Asks on a terminal what to do about a name conflict.
///
/// Blocks until a valid answer is read. End of input counts as cancel, the
/// same as closing a dialog.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, reading answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, file_name: &str, destination: &Path) -> io::Result<ConflictDecision> {
        let folder = destination.parent().unwrap_or(destination);
        writeln!(
            self.output,
            "{} \"{}\" already exists in {}",
            "⚠".yellow(),
            file_name.bold(),
            folder.display()
        )?;

        loop {
            write!(self.output, "  [o]verwrite / [r]ename / [c]ancel: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(ConflictDecision::Cancel);
            }

            match parse_answer(&line) {
                Some(decision) => return Ok(decision),
                None => writeln!(self.output, "  Please answer o, r or c.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionProvider for TerminalPrompt<R, W> {
    fn decide(&mut self, file_name: &str, destination: &Path) -> ConflictDecision {
        self.ask(file_name, destination).unwrap_or_else(|e| {
            warn!(error = %e, "conflict prompt failed, cancelling");
            ConflictDecision::Cancel
        })
    }
}

/// Parses a typed answer. Accepts the initial or the full word.
pub fn parse_answer(answer: &str) -> Option<ConflictDecision> {
    match answer.trim().to_lowercase().as_str() {
        "o" | "overwrite" => Some(ConflictDecision::Overwrite),
        "r" | "rename" => Some(ConflictDecision::RenameUnique),
        "c" | "cancel" | "s" | "skip" => Some(ConflictDecision::Cancel),
        _ => None,
    }
}
