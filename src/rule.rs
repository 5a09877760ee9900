//! Ordered distribution rules.
//!
//! A [`Rule`] pairs a match condition with a destination folder. A [`RuleSet`]
//! keeps rules in priority order and resolves a file to the first rule that
//! matches it; later rules are never consulted.
//!
//! # Examples
//!
//! ```
//! use huriwake::rule::{Rule, RuleKind, RuleSet};
//! use std::path::Path;
//!
//! let rules = RuleSet::from(vec![
//!     Rule::new(RuleKind::Extension, "PDF", "/archive/pdf").unwrap(),
//!     Rule::new(RuleKind::FilenameSubstring, "invoice", "/archive/invoices").unwrap(),
//! ]);
//!
//! let rule = rules.resolve(Path::new("/downloads/Invoice-42.pdf")).unwrap();
//! assert_eq!(rule.destination(), Path::new("/archive/pdf"));
//! assert!(rules.resolve(Path::new("/downloads/notes.txt")).is_none());
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised when a rule is built from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The pattern was empty after trimming.
    #[error("rule pattern must not be empty")]
    EmptyPattern,
    /// The destination folder was empty.
    #[error("rule destination must not be empty")]
    EmptyDestination,
    /// An extension pattern spans more than one dot and could never match.
    #[error("extension \"{0}\" has more than one dot and could never match")]
    CompoundExtension(String),
}

/// What part of a file path a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Exact match on the lower-cased extension, leading dot included.
    Extension,
    /// Substring of the lower-cased file name.
    #[serde(rename = "filename")]
    #[value(name = "filename")]
    FilenameSubstring,
    /// Substring of the lower-cased name of the parent folder.
    #[serde(rename = "folder")]
    #[value(name = "folder")]
    FolderNameSubstring,
}

impl RuleKind {
    /// Returns the short label used in tables and config files.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::Extension => "extension",
            RuleKind::FilenameSubstring => "filename",
            RuleKind::FolderNameSubstring => "folder",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single distribution rule.
///
/// Rules can only be built through [`Rule::new`], which normalizes the pattern
/// (trimmed, lower-cased, extension patterns prefixed with `.`) and rejects
/// empty input. Deserialization goes through the same constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    #[serde(rename = "type")]
    kind: RuleKind,
    pattern: String,
    destination: PathBuf,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(rename = "type")]
    kind: RuleKind,
    pattern: String,
    destination: PathBuf,
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Rule::new(raw.kind, &raw.pattern, raw.destination)
    }
}

impl Rule {
    /// Builds a rule, normalizing the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::EmptyPattern`] for a blank pattern,
    /// [`RuleError::CompoundExtension`] for an extension such as `.tar.gz`
    /// and [`RuleError::EmptyDestination`] for an empty destination path.
    ///
    /// # Examples
    ///
    /// ```
    /// use huriwake::rule::{Rule, RuleKind};
    ///
    /// let rule = Rule::new(RuleKind::Extension, " JPG ", "/photos").unwrap();
    /// assert_eq!(rule.pattern(), ".jpg");
    /// assert!(Rule::new(RuleKind::FilenameSubstring, "  ", "/x").is_err());
    /// ```
    pub fn new(
        kind: RuleKind,
        pattern: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<Self, RuleError> {
        let mut pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        if kind == RuleKind::Extension {
            if !pattern.starts_with('.') {
                pattern.insert(0, '.');
            }
            if pattern[1..].contains('.') {
                return Err(RuleError::CompoundExtension(pattern));
            }
        }

        let destination = destination.into();
        if destination.as_os_str().is_empty() {
            return Err(RuleError::EmptyDestination);
        }

        Ok(Self {
            kind,
            pattern,
            destination,
        })
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns true if this rule applies to the file at `path`.
    ///
    /// Only the path is inspected; the file does not need to exist.
    pub fn matches(&self, path: &Path) -> bool {
        match self.kind {
            RuleKind::Extension => extension_of(path).is_some_and(|ext| ext == self.pattern),
            RuleKind::FilenameSubstring => {
                lower_name(path.file_name()).is_some_and(|name| name.contains(&self.pattern))
            }
            RuleKind::FolderNameSubstring => {
                lower_name(path.parent().and_then(Path::file_name))
                    .is_some_and(|name| name.contains(&self.pattern))
            }
        }
    }

    /// Returns true if both rules look at the same thing with the same pattern.
    pub fn same_condition(&self, other: &Rule) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" -> {}",
            self.kind,
            self.pattern,
            self.destination.display()
        )
    }
}

/// Lower-cased extension of the final path segment, leading dot included.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

fn lower_name(name: Option<&std::ffi::OsStr>) -> Option<String> {
    name.map(|n| n.to_string_lossy().to_lowercase())
}

/// Rules in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Returns the first rule that matches `path`, if any.
    pub fn resolve(&self, path: &Path) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    /// Appends a rule, or replaces the destination of an existing rule with the
    /// same kind and pattern while keeping its position.
    ///
    /// Returns true if an existing rule was replaced.
    pub fn push_or_replace(&mut self, rule: Rule) -> bool {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.same_condition(&rule)) {
            *existing = rule;
            true
        } else {
            self.rules.push(rule);
            false
        }
    }

    /// Removes the rule at `index` (zero-based).
    pub fn remove(&mut self, index: usize) -> Option<Rule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    /// Moves the rule at `from` so that it ends up at `to` (both zero-based).
    ///
    /// Returns false if either index is out of range.
    pub fn move_rule(&mut self, from: usize, to: usize) -> bool {
        if from >= self.rules.len() || to >= self.rules.len() {
            return false;
        }
        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);
        true
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
