use super::utils::{
    case, checkpoint, determine_output_level, match_codes, placeholder, progress_file, retries,
    threads, timeout, user_agent, OutputLevel,
};
use crate::{
    checkpoint::Checkpoint, parser, update_config_if_present, wordlist::CaseMode,
    DEFAULT_CONFIG_NAME,
};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use serde::Deserialize;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// Represents the final, global configuration of the program.
///
/// This struct is the combination of the following:
/// - default configuration values
/// - plus overrides read from a configuration file
/// - plus command-line options
///
/// In that order.
///
/// Inspired by and derived from https://github.com/PhilipDaniels/rust-config-example
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    /// Path to the config file used, if any
    #[serde(skip)]
    pub config: String,

    /// Target url template, containing the placeholder token
    #[serde(default)]
    pub url: String,

    /// Path to the wordlist
    #[serde(default)]
    pub wordlist: String,

    /// Number of concurrent requests
    #[serde(default = "threads")]
    pub threads: usize,

    /// Status codes that count as a match
    #[serde(default = "match_codes")]
    pub match_codes: Vec<u16>,

    /// Token in `url` that each candidate replaces
    #[serde(default = "placeholder")]
    pub placeholder: String,

    /// Skip words recorded in `progress_file` by a previous run
    #[serde(default)]
    pub resume: bool,

    /// Suffixes appended to every word; the bare word is not requested when any are given
    #[serde(default)]
    pub suffixes: Vec<String>,

    /// Case transformation applied to every candidate
    #[serde(default = "case")]
    pub case: CaseMode,

    /// File to which a completion line is appended when the scan finishes
    #[serde(default)]
    pub log_file: String,

    /// File holding the words already attempted
    #[serde(default = "progress_file")]
    pub progress_file: String,

    /// Base directory for results (default: current directory)
    #[serde(default)]
    pub output_dir: String,

    /// Seconds before a single attempt times out
    #[serde(default = "timeout")]
    pub timeout: u64,

    /// Total attempts per url
    #[serde(default = "retries")]
    pub retries: usize,

    /// When a word gets recorded in `progress_file`
    #[serde(default = "checkpoint")]
    pub checkpoint: Checkpoint,

    /// User-Agent sent with every request
    #[serde(default = "user_agent")]
    pub user_agent: String,

    /// Follow redirects instead of reporting the 3xx itself
    #[serde(default)]
    pub redirects: bool,

    /// Level of logging verbosity, derived from number of -v's
    #[serde(default)]
    pub verbosity: u8,

    /// Hide the banner and progress bar
    #[serde(default)]
    pub quiet: bool,

    /// Only print matches, no logging
    #[serde(default)]
    pub silent: bool,

    /// File to which log entries are written
    #[serde(default)]
    pub debug_log: String,

    /// Overall output level, derived from quiet/silent
    #[serde(skip)]
    pub output_level: OutputLevel,
}

impl Default for Configuration {
    /// Builds the default Configuration
    fn default() -> Self {
        Configuration {
            config: String::new(),
            url: String::new(),
            wordlist: String::new(),
            threads: threads(),
            match_codes: match_codes(),
            placeholder: placeholder(),
            resume: false,
            suffixes: Vec::new(),
            case: case(),
            log_file: String::new(),
            progress_file: progress_file(),
            output_dir: String::new(),
            timeout: timeout(),
            retries: retries(),
            checkpoint: checkpoint(),
            user_agent: user_agent(),
            redirects: false,
            verbosity: 0,
            quiet: false,
            silent: false,
            debug_log: String::new(),
            output_level: OutputLevel::Default,
        }
    }
}

impl Configuration {
    /// Creates a [Configuration](struct.Configuration.html) object with the following
    /// built-in default values
    ///
    /// - **url**: `None`
    /// - **wordlist**: `None`
    /// - **threads**: `30`
    /// - **match_codes**: `200, 204, 301, 302, 307, 403, 500, 502, 503`
    /// - **placeholder**: `FUZZ`
    /// - **resume**: `false`
    /// - **suffixes**: `None`
    /// - **case**: `none`
    /// - **log_file**: `None`
    /// - **progress_file**: `scan_progress.txt`
    /// - **output_dir**: current directory
    /// - **timeout**: `10` seconds
    /// - **retries**: `3`
    /// - **checkpoint**: `completion`
    /// - **user_agent**: `pathferret/VERSION`
    /// - **redirects**: `false`
    /// - **verbosity**: `0` (warnings only)
    /// - **quiet**: `false`
    /// - **silent**: `false`
    /// - **debug_log**: `None`
    ///
    /// After which, any values found in a config file (`--config FILE`, or `pathferret.toml`
    /// in the current directory) overwrite the defaults, and finally any values given on the
    /// command line overwrite both.
    pub fn new() -> Result<Self> {
        let args = parser::initialize().get_matches();
        Self::from_matches(&args)
    }

    /// Build a configuration from already-parsed command line arguments
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let mut config = match args.get_one::<String>("config") {
            Some(path) => Self::parse_config(Path::new(path))?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);

                if default_path.exists() {
                    Self::parse_config(&default_path)?
                } else {
                    Configuration::default()
                }
            }
        };

        config.merge_cli_args(args);
        config.output_level = determine_output_level(config.quiet, config.silent);
        config.validate()?;

        Ok(config)
    }

    /// Given a configuration file's location, attempt to deserialize its contents
    pub fn parse_config(config_file: &Path) -> Result<Self> {
        let content = read_to_string(config_file).with_context(|| {
            format!("Could not read config file {}", config_file.display())
        })?;

        let mut config: Self = toml::from_str(&content).with_context(|| {
            format!("Could not parse config file {}", config_file.display())
        })?;

        config.config = config_file.display().to_string();

        Ok(config)
    }

    /// Overwrite values with any that were actually supplied on the command line
    fn merge_cli_args(&mut self, args: &ArgMatches) {
        update_config_if_present!(&mut self.url, args, "url", String);
        update_config_if_present!(&mut self.wordlist, args, "wordlist", String);
        update_config_if_present!(&mut self.threads, args, "threads", usize);
        update_config_if_present!(&mut self.placeholder, args, "placeholder", String);
        update_config_if_present!(&mut self.log_file, args, "log_file", String);
        update_config_if_present!(&mut self.progress_file, args, "progress_file", String);
        update_config_if_present!(&mut self.output_dir, args, "output_dir", String);
        update_config_if_present!(&mut self.timeout, args, "timeout", u64);
        update_config_if_present!(&mut self.retries, args, "retries", usize);
        update_config_if_present!(&mut self.checkpoint, args, "checkpoint", Checkpoint);
        update_config_if_present!(&mut self.user_agent, args, "user_agent", String);
        update_config_if_present!(&mut self.debug_log, args, "debug_log", String);

        if let Some(codes) = args.get_many::<u16>("match_codes") {
            self.match_codes = codes.copied().collect();
        }

        if let Some(suffixes) = args.get_many::<String>("suffixes") {
            self.suffixes = suffixes.cloned().collect();
        }

        if args.get_flag("uppercase") {
            self.case = CaseMode::Uppercase;
        } else if args.get_flag("lowercase") {
            self.case = CaseMode::Lowercase;
        } else if args.get_flag("capital") {
            self.case = CaseMode::Capitalize;
        }

        if args.get_flag("resume") {
            self.resume = true;
        }

        if args.get_flag("redirects") {
            self.redirects = true;
        }

        if args.get_flag("quiet") {
            self.quiet = true;
        }

        if args.get_flag("silent") {
            self.silent = true;
        }

        let verbosity = args.get_count("verbosity");

        if verbosity > 0 {
            self.verbosity = verbosity;
        }
    }

    /// Reject combinations that can never produce a working scan
    fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("A target url is required (-u|--url)");
        }

        if self.wordlist.is_empty() {
            bail!("A wordlist is required (-w|--wordlist)");
        }

        if self.threads == 0 {
            bail!("--threads must be at least 1");
        }

        if self.retries == 0 {
            bail!("--retries must be at least 1");
        }

        if self.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }

        if self.match_codes.is_empty() {
            bail!("At least one status code is required in --match-codes");
        }

        if self.placeholder.is_empty() {
            bail!("--placeholder cannot be empty");
        }

        if self.progress_file.is_empty() {
            bail!("--progress-file cannot be empty");
        }

        Ok(())
    }
}
