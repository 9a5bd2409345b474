use crate::report::ReportCollector;
use anyhow::Context;
use std::path::PathBuf;
use time_it_summary_model::{write_run_summary, RunSummary};

/// Writes the complete [RunSummary] to a JSON file.
///
/// Disabled when no output path is configured.
#[derive(Debug, Default)]
pub struct JsonFileReportCollector {
    path: Option<PathBuf>,
}

impl JsonFileReportCollector {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ReportCollector for JsonFileReportCollector {
    fn name(&self) -> &'static str {
        "json"
    }

    fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create export directory '{}'", parent.display())
            })?;
        }

        write_run_summary(summary, path)
            .with_context(|| format!("Failed to export json to '{}'", path.display()))?;
        println!("The Json file '{}' was exported.", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_it_summary_model::{load_run_summary, ConfigSource};

    #[test]
    fn disabled_without_path() {
        assert!(!JsonFileReportCollector::new(None).is_enabled());
    }

    #[test]
    fn writes_summary_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let summary = RunSummary::new(
            "run".to_string(),
            chrono::Utc::now(),
            ConfigSource::from_path("config.json"),
            1,
            3,
            "0.1.0".to_string(),
        );

        let collector = JsonFileReportCollector::new(Some(path.clone()));
        assert!(collector.is_enabled());
        collector.finalize(&summary).unwrap();

        let loaded = load_run_summary(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(summary, loaded);
    }
}
