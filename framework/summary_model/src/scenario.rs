use crate::data_point::RunDataPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics over one sample series.
///
/// Durations are in nanoseconds, custom metrics are in whatever unit the process reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of samples in the original series, before any outlier removal
    pub sample_count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    /// `std_dev / sqrt(sample_count)`
    pub std_err: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    /// Sample values that were removed as outliers
    pub outliers: Vec<f64>,
    /// The series the statistics were computed over, in run order
    ///
    /// For durations this is the trimmed series padded back to `sample_count` with the trimmed
    /// mean, so it can be displayed by run index.
    pub series: Vec<f64>,
}

impl Statistics {
    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }
}

/// Statistics for a scenario: durations plus one entry per custom metric key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStatistics {
    pub duration: Statistics,
    /// Keyed by metric name, iteration order is lexicographic
    pub metrics: BTreeMap<String, Statistics>,
}

/// Everything that is known about a scenario once all of its runs have completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub process_name: String,
    pub process_arguments: Vec<String>,
    pub working_directory: Option<String>,
    /// User supplied tags, global tags merged with the scenario's own
    pub tags: BTreeMap<String, String>,
    /// Wall clock start of the measured phase
    pub started_at: DateTime<Utc>,
    /// Wall clock end of the measured phase
    pub ended_at: DateTime<Utc>,
    /// Number of warm-up runs that were executed and discarded
    pub warm_up_runs: usize,
    /// Measured runs in invocation order
    pub data: Vec<RunDataPoint>,
    pub statistics: ScenarioStatistics,
    /// Distinct, non-timeout run errors, one per line
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Number of measured runs that reported any error, timeouts included.
    pub fn failed_runs(&self) -> usize {
        self.data.iter().filter(|point| point.is_error()).count()
    }
}
