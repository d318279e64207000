use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use lazy_static::lazy_static;

lazy_static! {
    /// Global progress bar that houses other progress bars
    pub static ref PROGRESS_BAR: MultiProgress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
}

/// Types of ProgressBars that can be added to `PROGRESS_BAR`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BarType {
    /// no bar at all, used with --quiet / --silent
    Hidden,

    /// dispatched/total bar with the current url as its message
    Default,
}

/// Add an [indicatif::ProgressBar](https://docs.rs/indicatif/latest/indicatif/struct.ProgressBar.html)
/// to the global [PROGRESS_BAR](../progress/struct.PROGRESS_BAR.html)
pub fn add_bar(prefix: &str, length: u64, bar_type: BarType) -> ProgressBar {
    let pb = match bar_type {
        BarType::Hidden => return ProgressBar::hidden(),
        BarType::Default => ProgressBar::new(length),
    };

    let style = ProgressStyle::default_bar()
        .template("[{bar:.cyan/blue}] - {elapsed:<4} {pos:>7}/{len:7} {per_sec:7} {prefix} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = PROGRESS_BAR.add(pb);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());

    pb
}

/// Print a line to stdout without tearing any active bars
pub fn println(msg: &str) {
    PROGRESS_BAR.suspend(|| println!("{msg}"));
}

/// Print a line to stderr without tearing any active bars
pub fn eprintln(msg: &str) {
    PROGRESS_BAR.suspend(|| eprintln!("{msg}"));
}
