use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use anyhow::{Context, Result};
use console::{style, Color};
use env_logger::Builder;
use log::{Level, LevelFilter};

use crate::{config::Configuration, progress::PROGRESS_BAR};

/// map the number of -v's to a log level
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// colored, fixed-width label for a log level
fn level_label(level: Level) -> String {
    let (label, color) = match level {
        Level::Error => ("ERR", Color::Red),
        Level::Warn => ("WRN", Color::Red),
        Level::Info => ("INF", Color::Cyan),
        Level::Debug => ("DBG", Color::Yellow),
        Level::Trace => ("TRC", Color::Magenta),
    };

    style(label).fg(color).to_string()
}

/// Create a customized instance of
/// [env_logger::Logger](https://docs.rs/env_logger/latest/env_logger/struct.Logger.html)
/// with timer offset/color and set the log level based on `verbosity`
///
/// `RUST_LOG`, when set, takes precedence over the -v count
pub fn initialize(config: &Configuration) -> Result<()> {
    let start = Instant::now();
    let mut builder = Builder::new();

    builder.filter_module(
        env!("CARGO_CRATE_NAME"),
        level_from_verbosity(config.verbosity),
    );

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    let locked_file = if !config.debug_log.is_empty() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.debug_log)
            .with_context(|| format!("Could not open {}", config.debug_log))?;

        Some(Arc::new(RwLock::new(BufWriter::new(file))))
    } else {
        None
    };

    builder
        .format(move |_, record| {
            let t = start.elapsed().as_secs_f32();

            let log_entry = format!(
                "{} {:10.03} {} {}",
                level_label(record.level()),
                t,
                record.module_path().unwrap_or("unknown"),
                record.args()
            );

            PROGRESS_BAR.suspend(|| eprintln!("{log_entry}"));

            if let Some(buffered_file) = locked_file.clone() {
                if let Ok(mut unlocked) = buffered_file.write() {
                    let plain = format!(
                        "{} {:10.03} {} {}",
                        record.level(),
                        t,
                        record.module_path().unwrap_or("unknown"),
                        record.args()
                    );
                    writeln!(unlocked, "{plain}")?;
                    unlocked.flush()?;
                }
            }

            Ok(())
        })
        .try_init()
        .with_context(|| "Could not initialize logger")?;

    Ok(())
}
