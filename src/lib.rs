//! huriwake - distribute files into folders by ordered rules
//!
//! This library matches files against an ordered list of rules (by extension,
//! file name or parent folder name), moves each file into the destination of
//! the first matching rule, settles name conflicts through a pluggable
//! decision provider and reports one outcome per file.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod file_distributor;
pub mod output;
pub mod prompt;
pub mod result_log;
pub mod rule;

pub use config::{AppConfig, ConfigError, ConfigFormat, ConfigLocation};
pub use conflict::{ConflictDecision, ConflictPolicy, DecisionProvider, Resolution, ScriptedDecisions};
pub use file_distributor::{DistributeError, FileDistributor, FileTask, RunEvent};
pub use result_log::{OutcomeRecord, OutcomeStatus, ResultLog};
pub use rule::{Rule, RuleError, RuleKind, RuleSet};

pub use cli::{Cli, run_cli};
