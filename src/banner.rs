use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use console::style;

use crate::{config::Configuration, wordlist::CaseMode, VERSION};

/// Initial visual indentation size used in formatting banner entries
const INDENT: usize = 3;

/// Column width used in formatting banner entries
const COL_WIDTH: usize = 22;

/// Represents a single line on the banner
#[derive(Debug, Default)]
struct BannerEntry {
    /// emoji used in the banner entry
    emoji: String,

    /// title used in the banner entry
    title: String,

    /// value passed in via config/cli/defaults
    value: String,
}

impl BannerEntry {
    /// Create a new banner entry from given fields
    fn new(emoji: &str, title: &str, value: &str) -> Self {
        BannerEntry {
            emoji: emoji.to_string(),
            title: title.to_string(),
            value: value.to_string(),
        }
    }

    /// Simple wrapper for emoji or fallback when terminal doesn't support emoji
    fn format_emoji(&self) -> String {
        console::Emoji(&self.emoji, " ").to_string()
    }
}

impl fmt::Display for BannerEntry {
    /// Display formatter for the given banner entry
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "\u{0020}{:\u{0020}<indent$}{:\u{0020}<width$}\u{2502}\u{0020}{}",
            self.format_emoji(),
            self.title,
            style(&self.value).cyan(),
            indent = INDENT,
            width = COL_WIDTH
        )
    }
}

/// Summary of the scan about to run, printed to stderr before scanning
#[derive(Debug, Default)]
pub struct Banner {
    targets: Vec<BannerEntry>,
    settings: Vec<BannerEntry>,
}

impl Banner {
    /// Create a new Banner from a Configuration, the normalized target and the scan's size
    pub fn new(config: &Configuration, target: &str, candidates: usize, output: &Path) -> Self {
        let mut banner = Banner::default();

        banner
            .targets
            .push(BannerEntry::new("🎯", "Target Url", target));

        let codes: Vec<String> = config.match_codes.iter().map(|c| c.to_string()).collect();

        banner.settings.extend([
            BannerEntry::new("🚀", "Threads", &config.threads.to_string()),
            BannerEntry::new("📖", "Wordlist", &config.wordlist),
            BannerEntry::new("🧮", "Candidates", &candidates.to_string()),
            BannerEntry::new("👌", "Match Codes", &format!("[{}]", codes.join(", "))),
            BannerEntry::new("💥", "Timeout (secs)", &config.timeout.to_string()),
            BannerEntry::new("🔁", "Attempts", &config.retries.to_string()),
            BannerEntry::new("🦡", "User-Agent", &config.user_agent),
            BannerEntry::new("💾", "Output File", &output.display().to_string()),
            BannerEntry::new("📌", "Progress File", &config.progress_file),
        ]);

        if !config.config.is_empty() {
            banner
                .settings
                .push(BannerEntry::new("💉", "Config File", &config.config));
        }

        if !config.suffixes.is_empty() {
            banner.settings.push(BannerEntry::new(
                "💲",
                "Suffixes",
                &format!("[{}]", config.suffixes.join(", ")),
            ));
        }

        if config.case != CaseMode::None {
            banner
                .settings
                .push(BannerEntry::new("🔠", "Case", &config.case.to_string()));
        }

        if config.resume {
            banner.settings.push(BannerEntry::new(
                "🚦",
                "Resuming",
                &format!("true (checkpoint: {})", config.checkpoint),
            ));
        }

        if config.redirects {
            banner
                .settings
                .push(BannerEntry::new("📍", "Follow Redirects", "true"));
        }

        if !config.log_file.is_empty() {
            banner
                .settings
                .push(BannerEntry::new("📝", "Log File", &config.log_file));
        }

        if !config.debug_log.is_empty() {
            banner
                .settings
                .push(BannerEntry::new("🪲", "Debugging Log", &config.debug_log));
        }

        if config.verbosity > 0 {
            banner.settings.push(BannerEntry::new(
                "🔎",
                "Verbosity",
                &config.verbosity.to_string(),
            ));
        }

        banner
    }

    /// get a fancy header for the banner
    fn header(&self) -> String {
        let artwork = format!(
            r#"
 ┌─┐┌─┐┌┬┐┬ ┬┌─┐┌─┐┬─┐┬─┐┌─┐┌┬┐
 ├─┘├─┤ │ ├─┤├┤ ├┤ ├┬┘├┬┘├┤  │
 ┴  ┴ ┴ ┴ ┴ ┴└  └─┘┴└─┴└─└─┘ ┴   ver: {VERSION}
"#
        );

        let top = "───────────────────────────┬──────────────────────";

        format!("{artwork}{top}")
    }

    /// get a fancy footer for the banner
    fn footer(&self) -> String {
        let bottom = "───────────────────────────┴──────────────────────";
        let instructions = format!(
            " 🏁  Interrupt with {} and pick the scan back up with {}",
            style("Ctrl+C").yellow(),
            style("--resume").yellow(),
        );

        format!("{bottom}\n{instructions}\n{bottom}")
    }

    /// Writes the banner to the given writer
    pub fn print_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(&mut writer, "{}", self.header())?;

        for target in &self.targets {
            write!(&mut writer, "{target}")?;
        }

        for setting in &self.settings {
            write!(&mut writer, "{setting}")?;
        }

        writeln!(&mut writer, "{}", self.footer())?;

        Ok(())
    }
}
