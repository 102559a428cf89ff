//! Output module for generating harvest artifacts
//!
//! This module handles:
//! - The in-memory report of page records and its JSON artifact
//! - The flattened CSV export
//! - Run statistics and the markdown run summary

mod markdown;
mod report;
pub mod stats;
mod tabular;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use report::{PageRecord, Report};
pub use stats::{print_statistics, RunStatistics};
pub use tabular::{flatten_report, write_csv, TabularRow};
