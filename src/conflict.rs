//! Name-conflict handling at the destination.
//!
//! When a file with the same name already exists in the destination folder,
//! a [`DecisionProvider`] is asked what to do. The engine never talks to a
//! user directly; the terminal prompt, a fixed command-line answer and test
//! doubles are all providers.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Answer to a single name conflict. Each conflict is decided on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDecision {
    /// Replace the existing file.
    Overwrite,
    /// Keep both by giving the incoming file a `_N` suffix.
    #[serde(rename = "rename")]
    #[value(name = "rename")]
    RenameUnique,
    /// Leave the file where it is.
    Cancel,
}

/// Source of conflict decisions. Calls block until an answer is available.
pub trait DecisionProvider {
    /// Decides what to do with `file_name`, whose target `destination` exists.
    fn decide(&mut self, file_name: &str, destination: &Path) -> ConflictDecision;
}

/// A bare decision answers every conflict the same way.
impl DecisionProvider for ConflictDecision {
    fn decide(&mut self, _file_name: &str, _destination: &Path) -> ConflictDecision {
        *self
    }
}

impl<F> DecisionProvider for F
where
    F: FnMut(&str, &Path) -> ConflictDecision,
{
    fn decide(&mut self, file_name: &str, destination: &Path) -> ConflictDecision {
        self(file_name, destination)
    }
}

/// Replays canned decisions in order and remembers what it was asked.
///
/// Once the script runs out every further conflict is cancelled.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    script: VecDeque<ConflictDecision>,
    asked: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(script: impl IntoIterator<Item = ConflictDecision>) -> Self {
        Self {
            script: script.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// File names that were presented, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn decide(&mut self, file_name: &str, _destination: &Path) -> ConflictDecision {
        self.asked.push(file_name.to_string());
        self.script.pop_front().unwrap_or(ConflictDecision::Cancel)
    }
}

/// Where a file should end up after conflict handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Move the file to this path.
    Proceed(PathBuf),
    /// The user cancelled; the file stays put.
    Skipped,
}

/// Turns a desired destination path into the effective one.
pub struct ConflictPolicy;

impl ConflictPolicy {
    /// Resolves `desired` against what is already on disk.
    ///
    /// A free path is returned as is without consulting `decisions`.
    pub fn resolve_destination(
        desired: &Path,
        decisions: &mut dyn DecisionProvider,
    ) -> Resolution {
        if !desired.exists() {
            return Resolution::Proceed(desired.to_path_buf());
        }

        let file_name = desired
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match decisions.decide(&file_name, desired) {
            ConflictDecision::Overwrite => Resolution::Proceed(desired.to_path_buf()),
            ConflictDecision::RenameUnique => Resolution::Proceed(unique_path(desired)),
            ConflictDecision::Cancel => Resolution::Skipped,
        }
    }
}

/// Finds the first free sibling `stem_N.ext`, counting N up from 1.
///
/// # Examples
///
/// ```no_run
/// use huriwake::conflict::unique_path;
/// use std::path::Path;
///
/// // With /out/report.txt and /out/report_1.txt present:
/// assert_eq!(unique_path(Path::new("/out/report.txt")), Path::new("/out/report_2.txt"));
/// ```
pub fn unique_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let extension = path.extension();

    (1u64..)
        .map(|n| {
            let mut name = OsString::from(stem);
            name.push(format!("_{n}"));
            if let Some(extension) = extension {
                name.push(".");
                name.push(extension);
            }
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
