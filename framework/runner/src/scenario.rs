use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use time_it_core::prelude::VariableResolver;
use time_it_summary_model::RunDataPoint;

use crate::definition::EffectiveScenario;
use crate::executor::Executor;
use crate::process::ProcessSupervisor;
use crate::progress::{PhaseProgress, ProgressMode};

/// The runs of one scenario, warm-up and measured.
#[derive(Debug, Clone)]
pub struct ScenarioRunOutput {
    /// Number of warm-up runs that were executed, their data points are discarded
    pub warm_up_runs: usize,
    pub warm_up_elapsed: Duration,
    /// The measured runs in the order they were executed
    pub data: Vec<RunDataPoint>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Executes the runs of a scenario one after another.
#[derive(Debug)]
pub struct ScenarioRunner {
    executor: Arc<Executor>,
    supervisor: ProcessSupervisor,
    progress: ProgressMode,
}

impl ScenarioRunner {
    pub fn new(
        executor: Arc<Executor>,
        resolver: VariableResolver,
        progress: ProgressMode,
    ) -> Self {
        Self {
            executor,
            supervisor: ProcessSupervisor::new(resolver),
            progress,
        }
    }

    /// Run `warm_up_count` discarded runs followed by `count` measured runs.
    ///
    /// Either phase stops early when a run reports that the scenario cannot continue, in which
    /// case that run is the last one recorded.
    pub fn run(
        &self,
        scenario: &EffectiveScenario,
        warm_up_count: usize,
        count: usize,
    ) -> ScenarioRunOutput {
        let warm_up_start = Instant::now();
        let warm_up = self.run_phase(scenario, "Warming up", warm_up_count);
        let warm_up_elapsed = warm_up_start.elapsed();
        let warm_up_runs = warm_up.len();
        drop(warm_up);

        let started_at = Utc::now();
        let start = Instant::now();
        let data = self.run_phase(scenario, "Run", count);
        let elapsed = start.elapsed();

        ScenarioRunOutput {
            warm_up_runs,
            warm_up_elapsed,
            data,
            started_at,
            ended_at: Utc::now(),
            elapsed,
        }
    }

    fn run_phase(
        &self,
        scenario: &EffectiveScenario,
        label: &'static str,
        count: usize,
    ) -> Vec<RunDataPoint> {
        let start = Instant::now();
        let mut progress = PhaseProgress::start(self.progress, label, count);

        let mut data = Vec::with_capacity(count);
        for run in 0..count {
            let point = self
                .executor
                .execute_in_place(self.supervisor.run_once(scenario));
            progress.record(&point);

            let should_continue = point.should_continue;
            if let Some(error) = &point.error {
                log::debug!("{label} {run} of scenario {} failed: {error}", scenario.name);
            }
            data.push(point);

            if !should_continue {
                log::warn!(
                    "Stopping scenario {} after {} runs, it cannot continue",
                    scenario.name,
                    run + 1
                );
                break;
            }
        }

        progress.finish(start.elapsed());
        data
    }
}
