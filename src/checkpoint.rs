//! Resume support: persisting the set of words already attempted
//!
//! The store is a flat file, one raw word per line, rewritten in full on every update. Each
//! rewrite goes to a temporary file in the same directory which is then renamed over the
//! store, so an interrupted write never leaves a truncated file behind.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::wordlist::Candidate;

/// Point in a candidate's life at which its raw word is recorded as done
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkpoint {
    /// record once every candidate for the word has been handed to the worker pool; a crash
    /// while those requests are in flight means they are skipped on resume
    Dispatch,

    /// record once every candidate for the word has returned from the requester; requests in
    /// flight during a crash are simply made again on resume
    #[default]
    Completion,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Dispatch => write!(f, "dispatch"),
            Checkpoint::Completion => write!(f, "completion"),
        }
    }
}

impl FromStr for Checkpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dispatch" => Ok(Checkpoint::Dispatch),
            "completion" => Ok(Checkpoint::Completion),
            _ => Err(format!("Expected one of dispatch or completion; received {s}")),
        }
    }
}

/// Flat file holding the completed-word set
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// create a store backed by the given file; nothing is touched on disk until `save`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// read the persisted set, or an empty set when no store exists yet
    pub fn load(&self) -> Result<HashSet<String>> {
        log::trace!("enter: load({:?})", self.path);

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no progress file at {:?}, starting fresh", self.path);
                return Ok(HashSet::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Could not read progress file {}", self.path.display())
                })
            }
        };

        let words: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        log::trace!("exit: load -> {} words", words.len());
        Ok(words)
    }

    /// overwrite the store with the given set, one entry per line
    pub fn save(&self, words: &HashSet<String>) -> Result<()> {
        let mut sorted: Vec<&String> = words.iter().collect();
        sorted.sort_unstable();

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(directory).with_context(|| {
            format!(
                "Could not create temporary progress file in {}",
                directory.display()
            )
        })?;

        for word in sorted {
            writeln!(temp, "{word}")?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Could not write progress file {}", self.path.display()))?;

        Ok(())
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    /// raw words recorded as done, including those loaded from a previous run
    completed: HashSet<String>,

    /// number of candidates per raw word that have yet to reach the checkpoint
    remaining: HashMap<String, usize>,
}

/// Shared completed-word set that persists itself whenever a raw word reaches the checkpoint
///
/// A raw word expands to one candidate per suffix; the word is only recorded once all of its
/// candidates have been seen at the configured checkpoint.
#[derive(Debug)]
pub struct ProgressTracker {
    store: ProgressStore,
    checkpoint: Checkpoint,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    /// create a tracker seeded with previously completed words (empty when not resuming)
    pub fn new(store: ProgressStore, checkpoint: Checkpoint, completed: HashSet<String>) -> Self {
        Self {
            store,
            checkpoint,
            state: Mutex::new(TrackerState {
                completed,
                remaining: HashMap::new(),
            }),
        }
    }

    /// register the full candidate list so multi-candidate words are only recorded once whole
    pub fn register(&self, candidates: &[Candidate]) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("progress tracker lock poisoned"))?;

        for candidate in candidates {
            *state
                .remaining
                .entry(candidate.raw().to_string())
                .or_insert(0) += 1;
        }

        Ok(())
    }

    /// a candidate was handed to the worker pool
    pub fn dispatched(&self, candidate: &Candidate) -> Result<()> {
        self.advance(Checkpoint::Dispatch, candidate)
    }

    /// a candidate's request returned from the requester, whatever the outcome
    pub fn finished(&self, candidate: &Candidate) -> Result<()> {
        self.advance(Checkpoint::Completion, candidate)
    }

    /// snapshot of the completed-word set
    pub fn completed(&self) -> HashSet<String> {
        self.state
            .lock()
            .map(|state| state.completed.clone())
            .unwrap_or_default()
    }

    fn advance(&self, reached: Checkpoint, candidate: &Candidate) -> Result<()> {
        if reached != self.checkpoint {
            return Ok(());
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("progress tracker lock poisoned"))?;

        let raw = candidate.raw();

        // unregistered words are treated as a single candidate
        let remaining = state.remaining.entry(raw.to_string()).or_insert(1);
        *remaining = remaining.saturating_sub(1);

        let done = *remaining == 0;

        if done {
            state.remaining.remove(raw);
        }

        if done && state.completed.insert(raw.to_string()) {
            log::debug!("recording {raw} as complete ({reached})");
            // held across the write so concurrent updates land in order
            self.store.save(&state.completed)?;
        }

        Ok(())
    }
}
