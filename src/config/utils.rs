use crate::{
    checkpoint::Checkpoint, wordlist::CaseMode, DEFAULT_PLACEHOLDER, DEFAULT_PROGRESS_FILE,
    DEFAULT_RETRIES, DEFAULT_STATUS_CODES, DEFAULT_THREADS, DEFAULT_TIMEOUT, VERSION,
};
use serde::Deserialize;

/// simple helper to stay DRY, trys to get the first value of the given arg and parse it into the
/// given type; when present, the result overwrites the existing config value
#[macro_export]
macro_rules! update_config_if_present {
    ($conf_val:expr, $matches:ident, $arg_name:expr, $arg_type:ty) => {
        if let Some(value) = $matches.get_one::<$arg_type>($arg_name) {
            *$conf_val = value.to_owned();
        }
    };
}

/// default number of concurrent requests
pub(super) fn threads() -> usize {
    DEFAULT_THREADS
}

/// default set of interesting status codes
pub(super) fn match_codes() -> Vec<u16> {
    DEFAULT_STATUS_CODES.to_vec()
}

/// default placeholder token
pub(super) fn placeholder() -> String {
    String::from(DEFAULT_PLACEHOLDER)
}

/// default progress file
pub(super) fn progress_file() -> String {
    String::from(DEFAULT_PROGRESS_FILE)
}

/// default per-attempt timeout in seconds
pub(super) fn timeout() -> u64 {
    DEFAULT_TIMEOUT
}

/// default number of attempts per url
pub(super) fn retries() -> usize {
    DEFAULT_RETRIES
}

/// default case transformation
pub(super) fn case() -> CaseMode {
    CaseMode::None
}

/// default checkpoint policy
pub(super) fn checkpoint() -> Checkpoint {
    Checkpoint::Completion
}

/// default user-agent
pub(super) fn user_agent() -> String {
    format!("pathferret/{VERSION}")
}

/// enum representing the three possible states for informational output (not logging verbosity)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum OutputLevel {
    /// normal output: banner, progress bar and matches
    #[default]
    Default,

    /// matches only, no banner or progress bar
    Quiet,

    /// matches only, logging disabled too
    Silent,
}

/// given the current settings for quiet and silent, determine output_level (DRY helper)
pub fn determine_output_level(quiet: bool, silent: bool) -> OutputLevel {
    if silent {
        // silent trumps quiet
        OutputLevel::Silent
    } else if quiet {
        OutputLevel::Quiet
    } else {
        OutputLevel::Default
    }
}
