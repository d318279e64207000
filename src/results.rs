//! De-duplicated, append-only record of matched urls

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use console::style;

use crate::progress;

/// A response whose status code was in the match set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// status code returned by the target
    pub status: u16,

    /// target url that produced the response
    pub url: String,
}

impl fmt::Display for Match {
    /// `[200] http://example.test/admin`, the same shape used in the output file
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.url)
    }
}

/// Owns the found-url set and the output file for a single scan
///
/// The output file is opened in append mode for each new match and closed again right away.
/// It isn't created until the first match is recorded.
#[derive(Debug)]
pub struct ResultSink {
    output: PathBuf,
    found: Mutex<HashSet<String>>,
    notify: bool,
}

impl ResultSink {
    /// create a sink that appends matches to `output`
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            found: Mutex::new(HashSet::new()),
            notify: true,
        }
    }

    /// whether to echo new matches to stdout (on by default)
    pub fn with_notifications(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    /// location of the output file
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// record a match, returning true if this is the first time `url` has been seen
    ///
    /// the found-url set and the file append happen under the same lock, so concurrent
    /// workers can never write the same url twice
    pub fn record(&self, status: u16, url: &str) -> Result<bool> {
        let mut found = self
            .found
            .lock()
            .map_err(|_| anyhow!("result sink lock poisoned"))?;

        if found.contains(url) {
            log::trace!("{url} already recorded, ignoring");
            return Ok(false);
        }

        let entry = Match {
            status,
            url: url.to_string(),
        };

        self.append(&entry)?;
        found.insert(entry.url.clone());

        log::info!("new match: {entry}");

        if self.notify {
            let status = style(format!("[{}]", entry.status)).green().bright();
            let line = format!("{status} {}", style(&entry.url).green());
            progress::println(&line);
        }

        Ok(true)
    }

    fn append(&self, entry: &Match) -> Result<()> {
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create {}", parent.display()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)
            .with_context(|| format!("Could not open output file {}", self.output.display()))?;

        writeln!(file, "{entry}")
            .with_context(|| format!("Could not write to {}", self.output.display()))?;

        Ok(())
    }
}
