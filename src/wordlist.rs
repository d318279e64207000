//! Wordlist loading and candidate generation
//!
//! Raw wordlist lines are expanded by suffix and re-cased into the final
//! ordered list of candidates handed to the scanner. Resume exclusion is
//! applied to the raw word, never to the expanded candidate.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Case transformation applied uniformly to every candidate
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// leave candidates untouched
    #[default]
    None,

    /// ADMIN.PHP
    Uppercase,

    /// admin.php
    Lowercase,

    /// Admin.php
    Capitalize,
}

impl CaseMode {
    /// apply this transformation to a single string
    pub fn apply(&self, word: &str) -> String {
        match self {
            CaseMode::None => word.to_string(),
            CaseMode::Uppercase => word.to_uppercase(),
            CaseMode::Lowercase => word.to_lowercase(),
            CaseMode::Capitalize => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseMode::None => "none",
            CaseMode::Uppercase => "uppercase",
            CaseMode::Lowercase => "lowercase",
            CaseMode::Capitalize => "capitalize",
        };
        write!(f, "{name}")
    }
}

/// A fully transformed wordlist entry, ready for substitution into the url template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// the wordlist entry this candidate was derived from; progress is tracked against it
    raw: String,

    /// the value substituted into the url template
    value: String,
}

impl Candidate {
    /// create a candidate from its raw word and final value
    pub fn new(raw: &str, value: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: value.to_string(),
        }
    }

    /// raw wordlist entry that produced this candidate
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// transformed value
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Produce the ordered candidate list from raw words
///
/// - words found in `completed` are skipped before any expansion
/// - with suffixes, each word becomes one candidate per suffix and the bare word is dropped
/// - `case` is applied after suffix expansion
pub fn transform<S: AsRef<str>>(
    words: &[S],
    suffixes: &[String],
    case: CaseMode,
    completed: &HashSet<String>,
) -> Vec<Candidate> {
    log::trace!(
        "enter: transform({} words, {suffixes:?}, {case}, {} completed)",
        words.len(),
        completed.len()
    );

    let mut candidates = Vec::with_capacity(words.len() * suffixes.len().max(1));

    for word in words {
        let word = word.as_ref().trim();

        if completed.contains(word) {
            continue;
        }

        if suffixes.is_empty() {
            candidates.push(Candidate::new(word, &case.apply(word)));
        } else {
            for suffix in suffixes {
                let expanded = format!("{word}{suffix}");
                candidates.push(Candidate::new(word, &case.apply(&expanded)));
            }
        }
    }

    log::trace!("exit: transform -> {} candidates", candidates.len());
    candidates
}

/// Read a wordlist from disk, one word per line
///
/// utf-8 is attempted first, falling back to latin-1 when the file isn't valid utf-8. Lines
/// are trimmed and blank lines are dropped.
pub fn read_wordlist(path: &str) -> Result<Vec<String>> {
    log::trace!("enter: read_wordlist({path})");

    let bytes = match fs::read(Path::new(path)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("Wordlist file not found ({path}). Please check the path and try again.")
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Error reading the wordlist file {path}"));
        }
    };

    let contents = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("{path} is not valid utf-8 ({e}), decoding as latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    };

    let words: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    log::trace!("exit: read_wordlist -> {} words", words.len());
    Ok(words)
}
