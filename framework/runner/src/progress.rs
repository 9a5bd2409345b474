use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use time_it_summary_model::RunDataPoint;

/// How run progress is shown on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// A progress bar with the completed runs and the number of failures
    #[default]
    Bar,
    /// A `.` for every successful run and an `x` for every failed run.
    ///
    /// Recommended for CI/CD environments where a progress bar just adds noise to the logs.
    Plain,
    Hidden,
}

/// Progress display for one phase of a scenario, such as the warm-up.
pub(crate) enum PhaseProgress {
    Bar {
        label: &'static str,
        bar: ProgressBar,
        failures: usize,
    },
    Plain,
    Hidden,
}

impl PhaseProgress {
    pub(crate) fn start(mode: ProgressMode, label: &'static str, total: usize) -> Self {
        match mode {
            ProgressMode::Bar => {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(
                    ProgressStyle::with_template(
                        "  {prefix:<10} [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .expect("Failed to set progress style")
                    .progress_chars("#>-"),
                );
                bar.set_prefix(label);
                PhaseProgress::Bar {
                    label,
                    bar,
                    failures: 0,
                }
            }
            ProgressMode::Plain => {
                print!("  {label} ");
                flush();
                PhaseProgress::Plain
            }
            ProgressMode::Hidden => PhaseProgress::Hidden,
        }
    }

    pub(crate) fn record(&mut self, point: &RunDataPoint) {
        match self {
            PhaseProgress::Bar { bar, failures, .. } => {
                if point.is_error() {
                    *failures += 1;
                    bar.set_message(format!("failures: {failures}"));
                }
                bar.inc(1);
            }
            PhaseProgress::Plain => {
                print!("{}", if point.is_error() { "x" } else { "." });
                flush();
            }
            PhaseProgress::Hidden => {}
        }
    }

    pub(crate) fn finish(self, elapsed: Duration) {
        match self {
            PhaseProgress::Bar {
                label,
                bar,
                failures,
            } => {
                bar.finish_and_clear();
                println!(
                    "  {label:<10} {} runs, {failures} failed    Duration: {elapsed:?}",
                    bar.position()
                );
            }
            PhaseProgress::Plain => println!("    Duration: {elapsed:?}"),
            PhaseProgress::Hidden => {}
        }
    }
}

fn flush() {
    if let Err(e) = std::io::stdout().flush() {
        log::trace!("Failed to flush progress output: {e:?}");
    }
}
