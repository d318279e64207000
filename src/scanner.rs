//! The scan coordinator: feeds candidates to a bounded pool of request workers
//!
//! Submission follows candidate order; completion order is whatever the workers produce.
//! Each worker reports matches to the [`ResultSink`] and its completion to the
//! [`ProgressTracker`]. `run` returns once every submitted worker has finished.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use url::Url;

use crate::{
    checkpoint::ProgressTracker,
    progress::{add_bar, BarType},
    requester::Requester,
    results::ResultSink,
    statistics::{ScanSummary, Stats},
    wordlist::Candidate,
    DEFAULT_THREADS,
};

/// Base url containing a single placeholder token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
    placeholder: String,
}

impl UrlTemplate {
    /// validate and normalize a url template
    ///
    /// a missing scheme defaults to https; the template must contain the placeholder and, with
    /// the placeholder filled in, must be an absolute http(s) url with a host
    pub fn new(template: &str, placeholder: &str) -> Result<Self> {
        log::trace!("enter: UrlTemplate::new({template}, {placeholder})");

        if placeholder.is_empty() {
            bail!("The placeholder token cannot be empty");
        }

        let template = template.trim();
        let lowered = template.to_ascii_lowercase();

        let template = if lowered.starts_with("http://") || lowered.starts_with("https://") {
            template.to_string()
        } else {
            format!("https://{template}")
        };

        if !template.contains(placeholder) {
            bail!("The url {template} does not contain the placeholder {placeholder}");
        }

        let filled = template.replacen(placeholder, "pathferret", 1);

        let parsed =
            Url::parse(&filled).with_context(|| format!("Invalid URL format: {template}"))?;

        if parsed.host_str().is_none() {
            bail!("Invalid URL format: {template} has no host");
        }

        let result = Self {
            template,
            placeholder: placeholder.to_string(),
        };

        log::trace!("exit: UrlTemplate::new -> {result}");
        Ok(result)
    }

    /// replace the first occurrence of the placeholder with `word`
    pub fn substitute(&self, word: &str) -> String {
        self.template.replacen(&self.placeholder, word, 1)
    }

    /// host (and port) portion of the template, with `:` swapped for `_` so it can name a
    /// directory
    pub fn domain(&self) -> String {
        let after_scheme = self
            .template
            .split_once("//")
            .map_or(self.template.as_str(), |(_, rest)| rest);

        let end = after_scheme
            .find(&['/', '?', '#'][..])
            .unwrap_or(after_scheme.len());

        after_scheme[..end].replace(':', "_")
    }

    /// the normalized template
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}

/// Owns the worker pool for a single scan
#[derive(Debug)]
pub struct Scanner {
    template: UrlTemplate,
    requester: Arc<Requester>,
    sink: Arc<ResultSink>,
    tracker: Arc<ProgressTracker>,
    stats: Arc<Stats>,
    concurrency: usize,
    bar_type: BarType,
    completion_log: Option<PathBuf>,
}

impl Scanner {
    /// create a scanner with the default concurrency, no progress bar and no completion log
    pub fn new(
        template: UrlTemplate,
        requester: Requester,
        sink: Arc<ResultSink>,
        tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            template,
            requester: Arc::new(requester),
            sink,
            tracker,
            stats: Arc::new(Stats::default()),
            concurrency: DEFAULT_THREADS,
            bar_type: BarType::Hidden,
            completion_log: None,
        }
    }

    /// maximum number of requests in flight; a value of 0 is treated as 1
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// which kind of progress bar to draw while dispatching
    pub fn bar_type(mut self, bar_type: BarType) -> Self {
        self.bar_type = bar_type;
        self
    }

    /// file to which a completion line is appended once the scan drains
    pub fn completion_log(mut self, path: Option<PathBuf>) -> Self {
        self.completion_log = path;
        self
    }

    /// scan every candidate, returning once all submitted requests have finished
    pub async fn run(&self, candidates: Vec<Candidate>) -> Result<ScanSummary> {
        log::trace!("enter: run({} candidates)", candidates.len());

        self.tracker.register(&candidates)?;

        let bar = add_bar(self.template.as_str(), candidates.len() as u64, self.bar_type);

        let result = self.dispatch(candidates, &bar).await;

        bar.finish_and_clear();
        result?;

        if let Some(path) = &self.completion_log {
            append_completion_log(path, &self.template)?;
        }

        let summary = self.stats.summary();

        log::info!("scan of {} complete: {summary}", self.template);
        log::trace!("exit: run -> {summary:?}");

        Ok(summary)
    }

    async fn dispatch(&self, candidates: Vec<Candidate>, bar: &ProgressBar) -> Result<()> {
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for candidate in candidates {
            // a worker that failed to persist a match is fatal; check before submitting more
            while let Some(joined) = workers.try_join_next() {
                joined??;
            }

            // blocks until a worker is free, keeping submission in candidate order
            let permit = limiter.clone().acquire_owned().await?;

            let url = self.template.substitute(candidate.value());
            bar.set_message(url.clone());

            let requester = self.requester.clone();
            let sink = self.sink.clone();
            let tracker = self.tracker.clone();
            let stats = self.stats.clone();
            let submitted = candidate.clone();

            workers.spawn(async move {
                let outcome = requester.execute(&url).await;
                drop(permit);

                stats.add_outcome(&outcome);

                // file rewrites happen under a std mutex; keep them off the runtime threads
                task::spawn_blocking(move || -> Result<()> {
                    if let Some(status) = outcome.matched() {
                        sink.record(status, &url)?;
                    }

                    tracker.finished(&candidate)
                })
                .await?
            });

            self.stats.add_dispatched();

            let tracker = self.tracker.clone();
            task::spawn_blocking(move || tracker.dispatched(&submitted)).await??;

            bar.inc(1);
        }

        log::debug!("all candidates submitted, waiting on {} workers", workers.len());

        while let Some(joined) = workers.join_next().await {
            joined??;
        }

        Ok(())
    }
}

/// append a timestamped completion line for `template` to the log at `path`
pub fn append_completion_log(path: &Path, template: &UrlTemplate) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    writeln!(
        file,
        "Scan completed for {template} at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
    .with_context(|| format!("Could not write to log file {}", path.display()))?;

    Ok(())
}
