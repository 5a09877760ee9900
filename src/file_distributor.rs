//! Rule-driven file distribution.
//!
//! [`FileDistributor`] walks the input paths, picks a rule for every file,
//! settles name conflicts through a [`DecisionProvider`] and moves the file.
//! Every file it acts on produces one [`OutcomeRecord`]; per-file failures are
//! recorded and never stop the run.

use crate::conflict::{ConflictPolicy, DecisionProvider, Resolution};
use crate::result_log::{OutcomeRecord, OutcomeStatus, ResultLog};
use crate::rule::{Rule, RuleSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while distributing files.
#[derive(Debug, Error)]
pub enum DistributeError {
    /// Failed to create a destination folder.
    #[error("failed to create folder {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move a file to its destination.
    #[error("failed to move {} to {}: {error}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },
    /// An input folder exists but could not be listed.
    #[error("failed to read folder {}: {source}", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for distribution operations.
pub type DistributeResult<T> = Result<T, DistributeError>;

/// A path that was a regular file when it was enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    path: PathBuf,
}

impl FileTask {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name exactly as stored on disk.
    pub fn name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    /// The file name for display. Bytes that are not valid UTF-8 are replaced.
    pub fn file_name(&self) -> String {
        self.name().to_string_lossy().to_string()
    }
}

/// Progress notifications from [`FileDistributor::run_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent<'t> {
    /// An input was listed and contributed this many files.
    Listed(usize),
    /// The file is about to be processed.
    Started(&'t FileTask),
    /// The file has been handled, whether or not a rule matched.
    Finished(&'t FileTask),
}

/// Moves files into the destination of the first rule they match.
pub struct FileDistributor<'a> {
    rules: &'a RuleSet,
    dry_run: bool,
}

impl<'a> FileDistributor<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            dry_run: false,
        }
    }

    /// In a dry run nothing on disk changes and no decisions are requested;
    /// matched files are recorded as [`OutcomeStatus::Planned`].
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Distributes every file reachable from `inputs`.
    ///
    /// Folders contribute their immediate regular-file children, files are
    /// taken as they are, and anything else is ignored. Outcomes appear in
    /// the order the files were found.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use huriwake::conflict::ConflictDecision;
    /// use huriwake::file_distributor::FileDistributor;
    /// use huriwake::rule::{Rule, RuleKind, RuleSet};
    ///
    /// let rules = RuleSet::from(vec![
    ///     Rule::new(RuleKind::Extension, ".pdf", "/home/me/PDFs").unwrap(),
    /// ]);
    /// let log = FileDistributor::new(&rules)
    ///     .run(["/home/me/Downloads"], &mut ConflictDecision::RenameUnique);
    /// println!("{} file(s) handled", log.len());
    /// ```
    pub fn run<I>(&self, inputs: I, decisions: &mut dyn DecisionProvider) -> ResultLog
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        self.run_with(inputs, decisions, |_| {})
    }

    /// Like [`run`](Self::run), reporting progress to `on_event` as it goes.
    ///
    /// Each input is listed just before its files are processed, so the total
    /// grows while the run is underway.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Files and folders to distribute, in order
    /// * `decisions` - Asked once for every name conflict
    /// * `on_event` - Called when an input is listed and around each file
    pub fn run_with<I, F>(
        &self,
        inputs: I,
        decisions: &mut dyn DecisionProvider,
        mut on_event: F,
    ) -> ResultLog
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
        F: FnMut(RunEvent<'_>),
    {
        let mut log = ResultLog::new();

        for input in inputs {
            let tasks = match self.enumerate(input.as_ref()) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable input");
                    continue;
                }
            };
            on_event(RunEvent::Listed(tasks.len()));

            for task in &tasks {
                on_event(RunEvent::Started(task));
                if let Some(record) = self.process(task, decisions) {
                    log.push(record);
                }
                on_event(RunEvent::Finished(task));
            }
        }

        log
    }

    /// Lists the files one input entry stands for.
    ///
    /// Missing paths and entries that are neither files nor folders yield an
    /// empty list. Subfolders of a folder are not descended into.
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::Enumeration`] if an existing folder cannot
    /// be listed.
    pub fn enumerate(&self, entry: &Path) -> DistributeResult<Vec<FileTask>> {
        let entry = std::path::absolute(entry).unwrap_or_else(|_| entry.to_path_buf());

        let Ok(metadata) = fs::metadata(&entry) else {
            debug!(path = %entry.display(), "ignoring missing input");
            return Ok(Vec::new());
        };

        if metadata.is_file() {
            return Ok(vec![FileTask { path: entry }]);
        }

        if !metadata.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&entry).map_err(|e| DistributeError::Enumeration {
            path: entry.clone(),
            source: e,
        })?;

        Ok(entries
            .flatten()
            .map(|dir_entry| dir_entry.path())
            .filter(|path| path.is_file())
            .map(|path| FileTask { path })
            .collect())
    }

    /// Handles a single file.
    ///
    /// Returns `None` when no rule matches; such files are left alone and
    /// not reported.
    pub fn process(
        &self,
        task: &FileTask,
        decisions: &mut dyn DecisionProvider,
    ) -> Option<OutcomeRecord> {
        let Some(rule) = self.rules.resolve(task.path()) else {
            debug!(file = %task.path().display(), "no rule matched");
            return None;
        };
        debug!(file = %task.path().display(), rule = %rule, "rule matched");

        let record = if self.dry_run {
            Self::plan(task, rule)
        } else {
            Self::distribute(task, rule, decisions)
        };
        Some(record)
    }

    fn distribute(
        task: &FileTask,
        rule: &Rule,
        decisions: &mut dyn DecisionProvider,
    ) -> OutcomeRecord {
        let dest_dir = rule.destination();

        if let Err(e) = ensure_directory(dest_dir) {
            warn!(error = %e, "destination folder unavailable");
            return outcome(task, rule, OutcomeStatus::Error, e.to_string(), None);
        }

        let desired = dest_dir.join(task.name());
        if is_same_file(task.path(), &desired) {
            return outcome(
                task,
                rule,
                OutcomeStatus::Skipped,
                "already in destination folder".to_string(),
                None,
            );
        }

        let target = match ConflictPolicy::resolve_destination(&desired, decisions) {
            Resolution::Proceed(target) => target,
            Resolution::Skipped => {
                info!(file = %task.path().display(), "conflict cancelled");
                return outcome(
                    task,
                    rule,
                    OutcomeStatus::Skipped,
                    "cancelled at conflict prompt".to_string(),
                    None,
                );
            }
        };

        match move_file(task.path(), &target) {
            Ok(()) => {
                info!(
                    from = %task.path().display(),
                    to = %target.display(),
                    "moved"
                );
                outcome(
                    task,
                    rule,
                    OutcomeStatus::Moved,
                    dest_dir.display().to_string(),
                    Some(target),
                )
            }
            Err(e) => {
                warn!(error = %e, "move failed");
                outcome(task, rule, OutcomeStatus::Error, e.to_string(), None)
            }
        }
    }

    fn plan(task: &FileTask, rule: &Rule) -> OutcomeRecord {
        let dest_dir = rule.destination();
        let desired = dest_dir.join(task.name());
        let detail = if desired.exists() {
            format!("{} (a file with this name exists)", dest_dir.display())
        } else {
            dest_dir.display().to_string()
        };
        outcome(task, rule, OutcomeStatus::Planned, detail, Some(desired))
    }
}

fn outcome(
    task: &FileTask,
    rule: &Rule,
    status: OutcomeStatus,
    detail: String,
    destination: Option<PathBuf>,
) -> OutcomeRecord {
    OutcomeRecord {
        file_name: task.file_name(),
        source: task.path().to_path_buf(),
        matched_rule: Some(rule.to_string()),
        status,
        detail,
        destination,
    }
}

/// Creates `dir` and any missing parents.
fn ensure_directory(dir: &Path) -> DistributeResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| DistributeError::DirectoryCreationFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Renames `from` to `to`, replacing an existing file. Falls back to copy and
/// delete when the two paths are on different devices.
fn move_file(from: &Path, to: &Path) -> DistributeResult<()> {
    let failure = |error: io::Error| DistributeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying");
            fs::copy(from, to).map_err(failure)?;
            fs::remove_file(from).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}
