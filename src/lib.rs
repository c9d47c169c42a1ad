//! sortwatch - intake directory triage
//!
//! This library sweeps an intake directory once per invocation, classifies
//! every regular file by age, size and extension, moves it into the output,
//! archive or quarantine directory, and records the pass in a CSV report and
//! an append-only log.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod output;
pub mod relocate;
pub mod report;
pub mod scan;

pub use classifier::{Destination, Disposition, FileCandidate, Thresholds, classify};
pub use config::{ConfigError, FileErrorPolicy, WatchConfig};
pub use coordinator::{PlannedMove, RunCoordinator, RunSummary};
pub use error::{WatchError, WatchResult};
pub use relocate::Relocator;
pub use report::OutcomeRecord;
