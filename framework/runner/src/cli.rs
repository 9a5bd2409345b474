use std::path::PathBuf;

use clap::Parser;

use crate::progress::ProgressMode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct TimeItCli {
    /// Path to the benchmark configuration file, JSON or TOML
    pub config: PathBuf,

    /// Do not show a progress bar on the CLI.
    ///
    /// Prints a `.` for each successful run and an `x` for each failed run instead. This is
    /// recommended for CI/CD environments where the progress bar isn't being looked at by anyone
    /// and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Write the JSON export to this path, overriding `jsonExporterFilePath` from the configuration
    #[clap(long)]
    pub json_output: Option<PathBuf>,
}

impl TimeItCli {
    pub fn progress_mode(&self) -> ProgressMode {
        if self.no_progress {
            ProgressMode::Plain
        } else {
            ProgressMode::Bar
        }
    }
}
