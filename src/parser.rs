use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgGroup, Command, ValueHint,
};
use lazy_static::lazy_static;
use std::env;
use std::process;

use crate::checkpoint::Checkpoint;

lazy_static! {
    /// help string for user agent, your guess is as good as mine as to why this is required...
    static ref DEFAULT_USER_AGENT: String = format!(
        "Sets the User-Agent (default: pathferret/{})",
        crate_version!()
    );
}

/// Create and return an instance of [clap::Command](https://docs.rs/clap/latest/clap/struct.Command.html), i.e. the Command Line Interface's configuration
pub fn initialize() -> Command {
    let app = Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!());

    /////////////////////////////////////////////////////////////////////
    // group - target selection
    /////////////////////////////////////////////////////////////////////
    let app = app
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .num_args(1)
                .value_hint(ValueHint::Url)
                .help_heading("Target selection")
                .help("Target URL; the placeholder marks where each word goes (ex: http://example.com/FUZZ)"),
        )
        .arg(
            Arg::new("placeholder")
                .long("placeholder")
                .value_name("TOKEN")
                .num_args(1)
                .help_heading("Target selection")
                .help("Token in the URL replaced by each word (default: FUZZ)"),
        );

    /////////////////////////////////////////////////////////////////////
    // group - wordlist settings
    /////////////////////////////////////////////////////////////////////
    let app = app
        .arg(
            Arg::new("wordlist")
                .short('w')
                .long("wordlist")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .num_args(1)
                .help_heading("Wordlist settings")
                .help("Path to the wordlist"),
        )
        .arg(
            Arg::new("suffixes")
                .long("suffixes")
                .value_name("SUFFIX")
                .num_args(1..)
                .action(ArgAction::Append)
                .use_value_delimiter(true)
                .help_heading("Wordlist settings")
                .help("Suffix(es) appended to every word; bare words are no longer requested (ex: --suffixes .php,.bak)"),
        )
        .arg(
            Arg::new("uppercase")
                .short('U')
                .long("uppercase")
                .action(ArgAction::SetTrue)
                .help_heading("Wordlist settings")
                .help("Uppercase every word"),
        )
        .arg(
            Arg::new("lowercase")
                .short('L')
                .long("lowercase")
                .action(ArgAction::SetTrue)
                .help_heading("Wordlist settings")
                .help("Lowercase every word"),
        )
        .arg(
            Arg::new("capital")
                .short('C')
                .long("capital")
                .action(ArgAction::SetTrue)
                .help_heading("Wordlist settings")
                .help("Capitalize every word (first letter upper, the rest lower)"),
        );

    /////////////////////////////////////////////////////////////////////
    // group - response filters
    /////////////////////////////////////////////////////////////////////
    let app = app.arg(
        Arg::new("match_codes")
            .short('s')
            .long("match-codes")
            .visible_alias("status-codes")
            .value_name("STATUS_CODE")
            .num_args(1..)
            .action(ArgAction::Append)
            .use_value_delimiter(true)
            .value_parser(value_parser!(u16))
            .help_heading("Response filters")
            .help(
                "Status Codes to report (default: 200,204,301,302,307,403,500,502,503)",
            ),
    );

    /////////////////////////////////////////////////////////////////////
    // group - client settings
    /////////////////////////////////////////////////////////////////////
    let app = app
        .arg(
            Arg::new("timeout")
                .short('T')
                .long("timeout")
                .value_name("SECONDS")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help_heading("Client settings")
                .help("Number of seconds before a single request attempt times out (default: 10)"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_name("ATTEMPTS")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help_heading("Client settings")
                .help("Total attempts per URL before giving up on it silently (default: 3)"),
        )
        .arg(
            Arg::new("user_agent")
                .short('a')
                .long("user-agent")
                .value_name("USER_AGENT")
                .num_args(1)
                .help_heading("Client settings")
                .help(&**DEFAULT_USER_AGENT),
        )
        .arg(
            Arg::new("redirects")
                .long("redirects")
                .action(ArgAction::SetTrue)
                .help_heading("Client settings")
                .help("Allow client to follow redirects"),
        );

    /////////////////////////////////////////////////////////////////////
    // group - scan settings
    /////////////////////////////////////////////////////////////////////
    let app = app
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("THREADS")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help_heading("Scan settings")
                .help("Number of concurrent requests (default: 30)"),
        )
        .arg(
            Arg::new("resume")
                .short('r')
                .long("resume")
                .action(ArgAction::SetTrue)
                .help_heading("Scan settings")
                .help("Resume a scan, skipping words recorded in the progress file"),
        )
        .arg(
            Arg::new("progress_file")
                .long("progress-file")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .num_args(1)
                .help_heading("Scan settings")
                .help("File used to track attempted words (default: scan_progress.txt)"),
        )
        .arg(
            Arg::new("checkpoint")
                .long("checkpoint")
                .value_name("WHEN")
                .num_args(1)
                .value_parser(valid_checkpoint)
                .help_heading("Scan settings")
                .help("Record a word as done once its requests are [completion] or merely [dispatch]ed (default: completion)"),
        );

    /////////////////////////////////////////////////////////////////////
    // group - output settings
    /////////////////////////////////////////////////////////////////////
    let app = app
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .action(ArgAction::Count)
                .conflicts_with("silent")
                .help_heading("Output settings")
                .help("Increase verbosity level (use -vv or more for greater effect. [CAUTION] 4 -v's is probably too much)"),
        )
        .arg(
            Arg::new("silent")
                .long("silent")
                .action(ArgAction::SetTrue)
                .help_heading("Output settings")
                .help("Only print matches + turn off logging (good for piping a list of urls to other commands)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help_heading("Output settings")
                .help("Hide progress bar and banner (good for tmux windows w/ notifications)"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .value_hint(ValueHint::DirPath)
                .num_args(1)
                .help_heading("Output settings")
                .help("Base directory for results; each scan writes <DIR>/<domain>/output_<timestamp>.txt (default: .)"),
        )
        .arg(
            Arg::new("log_file")
                .long("log")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .num_args(1)
                .help_heading("Output settings")
                .help("Append a line to FILE when the scan completes"),
        )
        .arg(
            Arg::new("debug_log")
                .long("debug-log")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .num_args(1)
                .help_heading("Output settings")
                .help("Output file to write log entries"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .num_args(1)
                .help_heading("Output settings")
                .help("Read settings from a TOML file (default: ./pathferret.toml, if present)"),
        );

    /////////////////////////////////////////////////////////////////////
    // group - miscellaneous
    /////////////////////////////////////////////////////////////////////
    let mut app = app
        .group(
            ArgGroup::new("case_mode")
                .args(["uppercase", "lowercase", "capital"])
                .multiple(false),
        )
        .group(
            ArgGroup::new("output_limiters")
                .args(["quiet", "silent"])
                .multiple(false),
        )
        .after_long_help(EPILOGUE);

    /////////////////////////////////////////////////////////////////////
    // end parser
    /////////////////////////////////////////////////////////////////////
    for arg in env::args() {
        // when an incorrect flag/option is used alongside -h|--help, clap errors out on the bad
        // flag/option and never shows the full help message. This code addresses that behavior
        if arg == "--help" {
            let _ = app.print_long_help();
            println!(); // just a newline to mirror original --help output
            process::exit(0);
        } else if arg == "-h" {
            // same for -h, just shorter
            let _ = app.print_help();
            println!();
            process::exit(0);
        }
    }

    app
}

/// Validate that a string names a checkpoint policy (dispatch or completion)
fn valid_checkpoint(value: &str) -> Result<Checkpoint, String> {
    value.parse::<Checkpoint>()
}

const EPILOGUE: &str = r#"NOTE:
    Every word is substituted into the placeholder of --url and requested with GET. Responses
    whose status is in --match-codes are printed and appended to
    <output-dir>/<domain>/output_<timestamp>.txt. Attempted words are tracked in the progress
    file so that an interrupted scan can be picked up again with --resume.

EXAMPLES:
    Basic usage:
        ./pathferret -u http://127.1/FUZZ -w words.txt

    Look for php and backup files, lowercased, with 50 concurrent requests:
        ./pathferret -u http://127.1/FUZZ -w words.txt --suffixes .php,.bak -L -t 50

    Only report 200s and 403s:
        ./pathferret -u http://127.1/FUZZ -w words.txt -s 200,403

    Fuzz a subdomain with a custom placeholder:
        ./pathferret -u https://THS.example.com/ -w subdomains.txt --placeholder THS

    Pick up where an interrupted scan left off:
        ./pathferret -u http://127.1/FUZZ -w words.txt --resume
    "#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// initialize parser, expect a clap::Command returned
    fn parser_initialize_gives_defaults() {
        let app = initialize();
        assert_eq!(app.get_name(), "pathferret");
    }

    #[test]
    /// comma separated match codes and suffixes are split into individual values
    fn parser_splits_delimited_values() {
        let matches = initialize()
            .try_get_matches_from([
                "pathferret",
                "-u",
                "http://example.test/FUZZ",
                "-s",
                "200,403",
                "--suffixes",
                ".php,.bak",
            ])
            .unwrap();

        let codes: Vec<u16> = matches
            .get_many::<u16>("match_codes")
            .unwrap()
            .copied()
            .collect();
        assert_eq!(codes, [200, 403]);

        let suffixes: Vec<String> = matches
            .get_many::<String>("suffixes")
            .unwrap()
            .cloned()
            .collect();
        assert_eq!(suffixes, [".php".to_string(), ".bak".to_string()]);
    }

    #[test]
    /// case flags are mutually exclusive
    fn parser_rejects_multiple_case_flags() {
        let result = initialize().try_get_matches_from(["pathferret", "-U", "-L"]);
        assert!(result.is_err());
    }

    #[test]
    /// non-numeric status codes are rejected by the parser
    fn parser_rejects_bad_match_codes() {
        let result = initialize().try_get_matches_from(["pathferret", "-s", "200,abc"]);
        assert!(result.is_err());
    }

    #[test]
    /// sanity checks that valid_checkpoint accepts both policies and nothing else
    fn validate_valid_checkpoint() {
        assert_eq!(valid_checkpoint("dispatch"), Ok(Checkpoint::Dispatch));
        assert_eq!(valid_checkpoint("COMPLETION"), Ok(Checkpoint::Completion));
        assert!(valid_checkpoint("sometimes").is_err());
        assert!(valid_checkpoint("").is_err());
    }
}
