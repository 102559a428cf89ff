//! Round-based retry bookkeeping
//!
//! Targets enter the failure set when their main-pass attempt fails. Each round takes
//! the whole set, and the coordinator feeds the round's results back before asking
//! for the next one. A target that succeeded never comes back.

use crate::state::TargetState;
use crate::url::CrawlTarget;
use std::collections::{BTreeSet, HashMap};

/// Owns the failure set and the per-target retry state
#[derive(Debug)]
pub struct RetryCoordinator {
    max_retries: u32,
    round: u32,
    failures: BTreeSet<CrawlTarget>,
    states: HashMap<CrawlTarget, TargetState>,
}

impl RetryCoordinator {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            round: 0,
            failures: BTreeSet::new(),
            states: HashMap::new(),
        }
    }

    /// Rounds started so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Targets that failed their latest attempt
    pub fn pending(&self) -> usize {
        self.failures.len()
    }

    pub fn state(&self, target: &CrawlTarget) -> Option<TargetState> {
        self.states.get(target).copied()
    }

    /// Records a failed attempt in the current round
    ///
    /// Ignored for a target that already succeeded.
    pub fn record_failure(&mut self, target: CrawlTarget) {
        if self.state(&target).is_some_and(|s| s.is_success()) {
            tracing::warn!("Ignoring failure for {}, it already succeeded", target);
            return;
        }
        self.states
            .insert(target.clone(), TargetState::Pending(self.round));
        self.failures.insert(target);
    }

    /// Records a successful attempt; the target leaves the failure set for good
    pub fn record_success(&mut self, target: &CrawlTarget) {
        self.failures.remove(target);
        if self.states.contains_key(target) {
            self.states.insert(target.clone(), TargetState::Succeeded);
        }
    }

    /// Starts the next round and hands out its batch
    ///
    /// Returns `None` when nothing failed, when every round is used up, or when the
    /// run was cancelled. The failure set is cleared; the round's results rebuild it.
    pub fn next_round(&mut self, cancelled: bool) -> Option<Vec<CrawlTarget>> {
        if self.failures.is_empty() || self.round >= self.max_retries || cancelled {
            return None;
        }

        self.round += 1;
        let batch: Vec<CrawlTarget> = std::mem::take(&mut self.failures).into_iter().collect();
        tracing::info!(
            "Retrying {} failed pages (round {}/{})",
            batch.len(),
            self.round,
            self.max_retries
        );
        Some(batch)
    }

    /// Marks everything still failing as terminally failed and returns it, sorted
    pub fn finish(&mut self) -> Vec<CrawlTarget> {
        let failed: Vec<CrawlTarget> = self.failures.iter().cloned().collect();
        for target in &failed {
            self.states.insert(target.clone(), TargetState::Failed);
        }
        failed
    }
}
