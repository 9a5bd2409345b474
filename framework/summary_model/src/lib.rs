use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

mod data_point;
mod scenario;

pub use data_point::{RunDataPoint, RunError};
pub use scenario::{ScenarioResult, ScenarioStatistics, Statistics};

/// Where the configuration for a run was loaded from.
///
/// Only used to tag exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSource {
    /// The path as it was given on the command line
    pub file_path: PathBuf,
    /// The directory containing the configuration file
    pub directory: PathBuf,
    pub file_name: String,
}

impl ConfigSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            file_path: path.to_path_buf(),
            directory: path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Summary of a complete benchmark run across all scenarios
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The time the run started
    pub started_at: DateTime<Utc>,
    /// The configuration file the run was loaded from
    pub config: ConfigSource,
    /// Number of discarded warm-up runs configured per scenario
    pub warm_up_count: usize,
    /// Number of measured runs configured per scenario
    pub count: usize,
    /// One result per configured scenario, in configuration order
    pub scenarios: Vec<ScenarioResult>,
    /// The version of time_it that produced this summary
    pub time_it_version: String,
}

impl RunSummary {
    /// Create a new run summary with no scenario results yet
    pub fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        config: ConfigSource,
        warm_up_count: usize,
        count: usize,
        time_it_version: String,
    ) -> Self {
        Self {
            run_id,
            started_at,
            config,
            warm_up_count,
            count,
            scenarios: Vec::new(),
            time_it_version,
        }
    }

    pub fn add_scenario(&mut self, result: ScenarioResult) {
        self.scenarios.push(result);
    }

    /// Scenarios that finished without an aggregate error
    pub fn succeeded(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.scenarios.iter().filter(|s| !s.is_failed())
    }

    /// True when no scenario finished without an aggregate error.
    ///
    /// A summary with no scenarios at all counts as failed.
    pub fn all_failed(&self) -> bool {
        self.succeeded().next().is_none()
    }

    /// Compute a fingerprint for the benchmark configuration
    ///
    /// The fingerprint identifies runs of the same configuration so that exports can be grouped.
    /// It uses the
    ///     - Scenario names, processes and arguments
    ///     - Warm-up and measured run counts
    ///     - time_it version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        self.scenarios
            .iter()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .for_each(|s| {
                Digest::update(&mut hasher, s.name.as_bytes());
                Digest::update(&mut hasher, s.process_name.as_bytes());
                s.process_arguments
                    .iter()
                    .for_each(|arg| Digest::update(&mut hasher, arg.as_bytes()));
            });
        Digest::update(&mut hasher, (self.warm_up_count as u64).to_le_bytes());
        Digest::update(&mut hasher, (self.count as u64).to_le_bytes());
        Digest::update(&mut hasher, self.time_it_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Serialize the run summary to a writer as pretty printed JSON
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, run_summary)?;
    Ok(())
}

/// Write the run summary to a file, replacing any existing file
pub fn write_run_summary(run_summary: &RunSummary, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}
