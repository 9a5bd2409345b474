mod cli;
mod config;
mod definition;
mod executor;
mod harvest;
mod init;
mod process;
mod progress;
mod run;
mod scenario;
mod types;

pub mod prelude {
    pub use crate::cli::TimeItCli;
    pub use crate::config::{
        load_config, Arguments, GlobalConfig, ProcessConfig, ScenarioConfig, TimeoutConfig,
    };
    pub use crate::definition::{EffectiveScenario, KillCommand, NoProcessConfigured, TimeoutSpec};
    pub use crate::executor::Executor;
    pub use crate::harvest::{harvest, parse_metrics, Harvest};
    pub use crate::init::init;
    pub use crate::process::ProcessSupervisor;
    pub use crate::progress::ProgressMode;
    pub use crate::run::{report, run, run_with_resolver};
    pub use crate::scenario::{ScenarioRunOutput, ScenarioRunner};
    pub use crate::types::TimeItResult;

    pub use time_it_core::prelude::VariableResolver;
    pub use time_it_instruments::{
        JsonFileReportCollector, OutlierPolicy, ReportCollector, TableReportCollector,
        TraceReportCollector,
    };
    pub use time_it_summary_model::{RunDataPoint, RunError, RunSummary, ScenarioResult};
}
