//! Per-file outcomes of a distribution run.
//!
//! The engine appends exactly one [`OutcomeRecord`] for every file it acted
//! on. Files that matched no rule never show up here.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The file was moved to its destination.
    Moved,
    /// The file was left in place (cancelled conflict, already in place).
    Skipped,
    /// Creating the destination or moving the file failed.
    Error,
    /// Dry run: the file would have been moved.
    Planned,
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Moved => "moved",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Error => "error",
            OutcomeStatus::Planned => "planned",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    /// Name of the file, without its folder.
    pub file_name: String,
    /// Where the file was when the run found it.
    pub source: PathBuf,
    /// Description of the rule that selected the destination.
    pub matched_rule: Option<String>,
    pub status: OutcomeStatus,
    /// Destination folder for moved files, otherwise the reason.
    pub detail: String,
    /// Final path of a moved (or planned) file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

/// Ordered outcomes of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultLog {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    records: Vec<OutcomeRecord>,
}

impl ResultLog {
    /// Creates an empty log stamped with the current time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Serializes the whole log as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ResultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a OutcomeRecord;
    type IntoIter = std::slice::Iter<'a, OutcomeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: OutcomeStatus) -> OutcomeRecord {
        OutcomeRecord {
            file_name: name.to_string(),
            source: PathBuf::from("/in").join(name),
            matched_rule: None,
            status,
            detail: String::new(),
            destination: None,
        }
    }

    #[test]
    fn test_records_keep_insertion_order() {
        let mut log = ResultLog::new();
        log.push(record("b.pdf", OutcomeStatus::Moved));
        log.push(record("a.pdf", OutcomeStatus::Skipped));

        let names: Vec<_> = log.into_iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_count_by_status() {
        let mut log = ResultLog::new();
        log.push(record("a", OutcomeStatus::Moved));
        log.push(record("b", OutcomeStatus::Moved));
        log.push(record("c", OutcomeStatus::Error));

        assert_eq!(log.count(OutcomeStatus::Moved), 2);
        assert_eq!(log.count(OutcomeStatus::Error), 1);
        assert_eq!(log.count(OutcomeStatus::Skipped), 0);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_json_shape() {
        let mut log = ResultLog::new();
        log.push(record("a.pdf", OutcomeStatus::Skipped));

        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert!(json["started_at"].is_string());
        assert_eq!(json["records"][0]["file_name"], "a.pdf");
        assert_eq!(json["records"][0]["status"], "skipped");
        assert!(json["records"][0]["matched_rule"].is_null());
        assert!(json["records"][0].get("destination").is_none());
    }
}
