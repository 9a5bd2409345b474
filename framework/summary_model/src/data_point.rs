use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Why a single run did not finish cleanly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunError {
    /// The run exceeded its configured maximum duration and was killed.
    #[error("Process timed out after {max_duration_s}s")]
    Timeout { max_duration_s: u64 },

    /// The process could not be spawned or exited with a non-zero status.
    ///
    /// `output` is the combined stdout and stderr captured while the process ran.
    #[error("\n{output}{reason}")]
    ProcessFailed { output: String, reason: String },

    /// A metrics file was configured but did not exist once the process finished.
    #[error("MetricsFilePath '{path}' not found.")]
    MetricsFileNotFound { path: String },
}

impl RunError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::Timeout { .. })
    }
}

/// The record of one execution of a scenario's process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDataPoint {
    /// Wall clock time just before the process was spawned
    pub started_at: DateTime<Utc>,
    /// Wall clock time just after the process finished or was killed
    pub ended_at: DateTime<Utc>,
    /// Elapsed time measured with a monotonic clock
    ///
    /// This is not `ended_at - started_at`, the wall clock timestamps are only for reporting.
    #[serde(rename = "duration_ns", with = "duration_nanos")]
    pub duration: Duration,
    /// The PID of the child, if it was spawned
    pub pid: Option<u32>,
    pub error: Option<RunError>,
    /// Custom metrics harvested from the metrics file(s) after the run
    pub metrics: BTreeMap<String, f64>,
    /// When false, no further runs should be issued for the scenario
    pub should_continue: bool,
}

impl RunDataPoint {
    /// The duration as a floating point number of nanoseconds, the unit used for statistics.
    pub fn duration_ns(&self) -> f64 {
        self.duration.as_nanos() as f64
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_nanos(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failure_message_carries_output() {
        let err = RunError::ProcessFailed {
            output: "boom\n".to_string(),
            reason: "exit status: 3".to_string(),
        };

        assert_eq!("\nboom\nexit status: 3", err.to_string());
        assert!(!err.is_timeout());
    }

    #[test]
    fn metrics_not_found_message() {
        let err = RunError::MetricsFileNotFound {
            path: "/tmp/metrics.json".to_string(),
        };

        assert_eq!("MetricsFilePath '/tmp/metrics.json' not found.", err.to_string());
    }

    #[test]
    fn duration_is_serialized_as_nanoseconds() {
        let point = RunDataPoint {
            started_at: DateTime::UNIX_EPOCH,
            ended_at: DateTime::UNIX_EPOCH,
            duration: Duration::from_micros(1500),
            pid: Some(12),
            error: Some(RunError::Timeout { max_duration_s: 2 }),
            metrics: BTreeMap::new(),
            should_continue: true,
        };

        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(1_500_000, value["duration_ns"].as_u64().unwrap());
        assert_eq!("timeout", value["error"]["kind"].as_str().unwrap());
        assert_eq!(1_500_000.0, point.duration_ns());
    }
}
