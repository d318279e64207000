use std::{
    collections::HashSet,
    fs::create_dir_all,
    io::stderr,
    path::PathBuf,
    process::exit,
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use chrono::Local;

use pathferret::{
    banner::Banner,
    checkpoint::{ProgressStore, ProgressTracker},
    config::{Configuration, OutputLevel},
    logger,
    progress::{self, BarType},
    requester::{initialize_client, Requester},
    results::ResultSink,
    scanner::{Scanner, UrlTemplate},
    utils::{fmt_err, output_file, results_directory, scan_timestamp},
    wordlist::{read_wordlist, transform},
};

/// async main called from real main, broken out in this way to allow for some synchronous code
/// to be executed before bringing the tokio runtime online
async fn wrapped_main(config: Arc<Configuration>) -> Result<()> {
    log::trace!("enter: wrapped_main({config:?})");

    // everything that can fail because of bad input happens before the first request
    let template = UrlTemplate::new(&config.url, &config.placeholder)?;
    let words = read_wordlist(&config.wordlist)?;

    let started = Local::now();
    let directory = results_directory(&config.output_dir, &template.domain());

    create_dir_all(&directory)
        .with_context(|| format!("Could not create output directory {}", directory.display()))?;

    let output = output_file(&directory, &scan_timestamp(&started));

    let store = ProgressStore::new(&config.progress_file);

    let completed = if config.resume {
        let completed = store.load()?;
        log::info!(
            "resuming: {} words already attempted according to {}",
            completed.len(),
            store.path().display()
        );
        completed
    } else {
        HashSet::new()
    };

    let candidates = transform(&words, &config.suffixes, config.case, &completed);

    log::info!(
        "{} words in {} produced {} candidates",
        words.len(),
        config.wordlist,
        candidates.len()
    );

    if matches!(config.output_level, OutputLevel::Default) {
        // only print banner if output level is default (no banner on --quiet|--silent)
        let banner = Banner::new(&config, template.as_str(), candidates.len(), &output);

        if banner.print_to(stderr()).is_err() {
            bail!(fmt_err("Could not print banner"));
        }
    }

    let client = initialize_client(&config.user_agent, config.redirects)?;

    let requester = Requester::new(client, &config.match_codes)
        .timeout(Duration::from_secs(config.timeout))
        .retries(config.retries);

    let sink = Arc::new(ResultSink::new(output.clone()));
    let tracker = Arc::new(ProgressTracker::new(store, config.checkpoint, completed));

    let bar_type = match config.output_level {
        OutputLevel::Default => BarType::Default,
        OutputLevel::Quiet | OutputLevel::Silent => BarType::Hidden,
    };

    let completion_log = if config.log_file.is_empty() {
        None
    } else {
        Some(PathBuf::from(&config.log_file))
    };

    let scanner = Scanner::new(template, requester, sink, tracker)
        .concurrency(config.threads)
        .bar_type(bar_type)
        .completion_log(completion_log);

    let summary = scanner.run(candidates).await?;

    if !matches!(config.output_level, OutputLevel::Silent) {
        progress::eprintln(&format!(
            "\nScan completed. Results saved in '{}'.\n{summary}",
            directory.display()
        ));
    }

    log::trace!("exit: wrapped_main");
    Ok(())
}

fn main() {
    let config = match Configuration::new() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("{}", fmt_err(&format!("Could not create Configuration: {e:#}")));
            exit(1);
        }
    };

    // setup logging based on the number of -v's used
    if !matches!(config.output_level, OutputLevel::Silent) {
        // don't log on --silent
        if let Err(e) = logger::initialize(&config) {
            eprintln!("{}", fmt_err(&format!("{e:#}")));
            exit(1);
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", fmt_err(&format!("Could not start the async runtime: {e}")));
            exit(1);
        }
    };

    if let Err(e) = runtime.block_on(wrapped_main(config)) {
        eprintln!("{}", fmt_err(&format!("{e:#}")));
        exit(1);
    }

    log::trace!("exit: main");
}
