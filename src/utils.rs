use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use console::style;

/// Takes in a string and colors it red, prefixing it with ERROR:
pub fn fmt_err(msg: &str) -> String {
    format!("{}: {}", style("ERROR").red().bright(), msg)
}

/// Timestamp used to name a scan's output file (ex: 20240131_174502)
pub fn scan_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Directory holding every result file for `domain` under `base` (current directory when empty)
pub fn results_directory(base: &str, domain: &str) -> PathBuf {
    let base = if base.is_empty() {
        Path::new(".")
    } else {
        Path::new(base)
    };

    base.join(domain)
}

/// `<directory>/output_<timestamp>.txt`
pub fn output_file(directory: &Path, timestamp: &str) -> PathBuf {
    directory.join(format!("output_{timestamp}.txt"))
}
