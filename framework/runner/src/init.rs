use crate::cli::TimeItCli;
use clap::Parser;

/// Initialise the CLI and logging for the time_it runner.
pub fn init() -> TimeItCli {
    env_logger::init();

    TimeItCli::parse()
}
