//! Reduce the raw data points of a scenario into [ScenarioStatistics].

use crate::stats::outliers::{detect_outliers, OutlierPolicy};
use crate::stats::percentiles::{max, mean, min, percentile, std_dev, std_err};
use std::collections::BTreeMap;
use time_it_summary_model::{RunDataPoint, ScenarioStatistics, Statistics};

/// The statistics for a scenario together with its aggregate error, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub statistics: ScenarioStatistics,
    pub error: Option<String>,
}

/// Aggregate the measured runs of one scenario.
///
/// Every run contributes a duration sample, failed runs included. Outliers are only removed from
/// durations, custom metrics are summarized as reported. Standard errors divide by the number of
/// measured runs, also for a metric that only some runs reported.
pub fn aggregate(data: &[RunDataPoint], policy: OutlierPolicy) -> Aggregate {
    let durations = data.iter().map(RunDataPoint::duration_ns).collect::<Vec<_>>();

    let mut metric_samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for point in data {
        for (key, value) in &point.metrics {
            metric_samples.entry(key.clone()).or_default().push(*value);
        }
    }

    Aggregate {
        statistics: ScenarioStatistics {
            duration: summarize_durations(&durations, policy),
            metrics: metric_samples
                .into_iter()
                .map(|(key, samples)| (key, summarize(&samples, data.len())))
                .collect(),
        },
        error: aggregate_errors(data),
    }
}

/// Distinct error messages across all runs, one per line, in order of first occurrence.
///
/// Timeouts are not included, a timed out run still counts as a measurement.
pub fn aggregate_errors(data: &[RunDataPoint]) -> Option<String> {
    let mut messages: Vec<String> = Vec::new();
    for error in data.iter().filter_map(|point| point.error.as_ref()) {
        if error.is_timeout() {
            continue;
        }

        let message = error.to_string();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}

/// Summarize duration samples, removing outliers under `policy`.
///
/// Every sample equal to a detected outlier value is removed. The mean of what remains is then
/// appended once per removed sample, so the returned series always has the same length as the
/// input and the spread and percentiles are not skewed by the outliers.
pub fn summarize_durations(samples: &[f64], policy: OutlierPolicy) -> Statistics {
    summarize_with(samples, policy, samples.len())
}

/// Summarize samples without any outlier removal.
///
/// The standard error divides by `run_count` rather than the number of samples.
pub fn summarize(samples: &[f64], run_count: usize) -> Statistics {
    summarize_with(samples, OutlierPolicy::None, run_count)
}

fn summarize_with(samples: &[f64], policy: OutlierPolicy, run_count: usize) -> Statistics {
    let outliers = detect_outliers(samples, policy);

    let mut series = samples
        .iter()
        .copied()
        .filter(|sample| !outliers.contains(sample))
        .collect::<Vec<_>>();

    let trimmed_mean = mean(&series);
    let trimmed_min = min(&series);
    let trimmed_max = max(&series);

    series.resize(samples.len(), trimmed_mean);

    let std_dev = std_dev(&series);
    Statistics {
        sample_count: samples.len(),
        mean: trimmed_mean,
        min: trimmed_min,
        max: trimmed_max,
        std_dev,
        std_err: std_err(std_dev, run_count),
        p90: percentile(&series, 90.0),
        p95: percentile(&series, 95.0),
        p99: percentile(&series, 99.0),
        outliers,
        series,
    }
}
