//! Crawler module for page fetching and processing
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with the trailing-slash fallback and a connection cap
//! - Error-page classification
//! - Reference and image extraction
//! - Round-based retries and overall run coordination

mod classifier;
mod context;
mod coordinator;
mod fetcher;
mod parser;
mod pipeline;
mod retry;

pub use classifier::{Classifier, ErrorKind, ErrorRule, Rejection, RuleScope, Verdict, ERROR_RULES};
pub use context::RunContext;
pub use coordinator::{run_crawl, Coordinator, RunOutcome};
pub use fetcher::{build_http_client, build_image_client, FetchClient, FetchError, FetchOutcome};
pub use parser::extract_page;
pub use pipeline::{process_cached, process_fresh, PageFailure, TargetResult};
pub use retry::RetryCoordinator;
