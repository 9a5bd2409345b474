use std::sync::Arc;

use chrono::Utc;
use time_it_core::prelude::VariableResolver;
use time_it_instruments::{aggregate, finalize_all, ReportCollector};
use time_it_summary_model::{RunSummary, ScenarioResult, ScenarioStatistics};

use crate::config::{GlobalConfig, ScenarioConfig};
use crate::definition::EffectiveScenario;
use crate::executor::Executor;
use crate::progress::ProgressMode;
use crate::scenario::ScenarioRunner;
use crate::types::TimeItResult;

/// Run every configured scenario, one after another, and summarise the results.
///
/// Scenarios that fail are recorded in the summary with their error, they do not stop the
/// remaining scenarios from running.
pub fn run(config: &GlobalConfig, progress: ProgressMode) -> TimeItResult<RunSummary> {
    run_with_resolver(config, progress, VariableResolver::new())
}

/// Like [run] but with a caller provided resolver for `$(CWD)`.
pub fn run_with_resolver(
    config: &GlobalConfig,
    progress: ProgressMode,
    resolver: VariableResolver,
) -> TimeItResult<RunSummary> {
    let run_id = nanoid::nanoid!();
    log::info!("Starting run {run_id} from {}", config.source.file_path.display());

    if progress != ProgressMode::Hidden {
        println!("Warmup count: {}", config.warm_up_count);
        println!("Count: {}", config.count);
        println!("Number of scenarios: {}\n", config.scenarios.len());
    }

    let executor = Arc::new(Executor::new()?);
    let runner = ScenarioRunner::new(executor, resolver.clone(), progress);

    let mut summary = RunSummary::new(
        run_id,
        Utc::now(),
        config.source.clone(),
        config.warm_up_count,
        config.count,
        env!("CARGO_PKG_VERSION").to_string(),
    );

    for scenario in &config.scenarios {
        if progress != ProgressMode::Hidden {
            println!("Scenario: {}", scenario.name);
        }

        let result = run_scenario(config, scenario, &runner, &resolver);
        log::info!(
            "Scenario {} completed {} runs, {} failed",
            result.name,
            result.data.len(),
            result.failed_runs()
        );
        if let Some(error) = &result.error {
            log::error!("Scenario {} failed: {error}", result.name);
        }
        summary.add_scenario(result);

        if progress != ProgressMode::Hidden {
            println!();
        }
    }

    Ok(summary)
}

fn run_scenario(
    config: &GlobalConfig,
    scenario: &ScenarioConfig,
    runner: &ScenarioRunner,
    resolver: &VariableResolver,
) -> ScenarioResult {
    let effective = match EffectiveScenario::resolve(config, scenario, resolver) {
        Ok(effective) => effective,
        Err(e) => {
            let now = Utc::now();
            return ScenarioResult {
                name: scenario.name.clone(),
                process_name: String::new(),
                process_arguments: Vec::new(),
                working_directory: None,
                tags: Default::default(),
                started_at: now,
                ended_at: now,
                warm_up_runs: 0,
                data: Vec::new(),
                statistics: ScenarioStatistics::default(),
                error: Some(e.to_string()),
            };
        }
    };

    // Without measured runs there is nothing to warm up for
    let warm_up_count = if config.count == 0 {
        0
    } else {
        config.warm_up_count
    };
    let output = runner.run(&effective, warm_up_count, config.count);
    log::debug!(
        "Scenario {} finished {} warm-up runs in {:?} and {} runs in {:?}",
        effective.name,
        output.warm_up_runs,
        output.warm_up_elapsed,
        output.data.len(),
        output.elapsed
    );

    let aggregate = aggregate(&output.data, config.outliers);

    ScenarioResult {
        name: effective.name,
        process_name: effective.process_name,
        process_arguments: effective.process_arguments,
        working_directory: effective
            .working_directory
            .map(|dir| dir.display().to_string()),
        tags: effective.tags,
        started_at: output.started_at,
        ended_at: output.ended_at,
        warm_up_runs: output.warm_up_runs,
        data: output.data,
        statistics: aggregate.statistics,
        error: aggregate.error,
    }
}

/// Hand a finished run to the report collectors.
///
/// When every scenario failed nothing is reported, the error of each scenario is printed instead
/// and `false` is returned so that the caller can exit with a failure code.
pub fn report(summary: &RunSummary, collectors: &[Box<dyn ReportCollector>]) -> bool {
    if summary.all_failed() {
        for (index, scenario) in summary.scenarios.iter().enumerate() {
            if let Some(error) = &scenario.error {
                println!("Error in Scenario: {index} ({})", scenario.name);
                println!("{error}");
            }
        }
        if summary.scenarios.is_empty() {
            println!("No scenarios were run");
        }

        return false;
    }

    let failed = finalize_all(collectors, summary);
    if failed > 0 {
        log::warn!("{failed} report collectors failed");
    }

    true
}
