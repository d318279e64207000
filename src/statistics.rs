use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::requester::Outcome;

/// Counters shared between the scanner and its workers
///
/// Transport failures are never reported per candidate; these counts are the only place they
/// surface, in the end-of-scan summary.
#[derive(Debug, Default)]
pub struct Stats {
    /// candidates handed to the worker pool
    dispatched: AtomicUsize,

    /// individual request attempts, retries included
    requests: AtomicUsize,

    /// responses whose status was in the match set
    matches: AtomicUsize,

    /// responses whose status was not in the match set
    misses: AtomicUsize,

    /// candidates abandoned after every attempt failed
    exhausted: AtomicUsize,
}

impl Stats {
    /// a candidate was handed to the pool
    pub fn add_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// fold a finished request into the counters
    pub fn add_outcome(&self, outcome: &Outcome) {
        self.requests.fetch_add(outcome.attempts(), Ordering::Relaxed);

        let counter = match outcome {
            Outcome::Match { .. } => &self.matches,
            Outcome::NoMatch { .. } => &self.misses,
            Outcome::Exhausted { .. } => &self.exhausted,
        };

        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// copy out the current values
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Stats`]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub dispatched: usize,
    pub requests: usize,
    pub matches: usize,
    pub misses: usize,
    pub exhausted: usize,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidates, {} requests, {} matched, {} gave up after retries",
            self.dispatched, self.requests, self.matches, self.exhausted
        )
    }
}
