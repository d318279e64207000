#![deny(clippy::all)]
pub mod banner;
pub mod checkpoint;
pub mod config;
pub mod logger;
pub mod parser;
pub mod progress;
pub mod requester;
pub mod results;
pub mod scanner;
pub mod statistics;
pub mod utils;
pub mod wordlist;

/// Version pulled from Cargo.toml at compile time
pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker replaced by each candidate within the target url template
pub const DEFAULT_PLACEHOLDER: &str = "FUZZ";

/// Default number of concurrent requests in flight
pub const DEFAULT_THREADS: usize = 30;

/// Number of seconds before a single request attempt is abandoned
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Total number of attempts made for a single target url
pub const DEFAULT_RETRIES: usize = 3;

/// File to which the set of attempted words is written
pub const DEFAULT_PROGRESS_FILE: &str = "scan_progress.txt";

/// Name of the optional configuration file searched for in the current directory
pub const DEFAULT_CONFIG_NAME: &str = "pathferret.toml";

/// Default set of status codes that are considered interesting
pub const DEFAULT_STATUS_CODES: [u16; 9] = [200, 204, 301, 302, 307, 403, 500, 502, 503];
