mod json_file_reporter;
mod table_reporter;
mod trace_reporter;

use time_it_summary_model::RunSummary;

pub use json_file_reporter::JsonFileReportCollector;
pub use table_reporter::{format_duration, format_metric, TableReportCollector};
pub use trace_reporter::{run_tags, scenario_tags, TagValue, TraceReportCollector};

/// Receives the finished [RunSummary] once every scenario has completed.
pub trait ReportCollector {
    fn name(&self) -> &'static str;

    /// Collectors that are disabled by configuration are skipped by [finalize_all].
    fn is_enabled(&self) -> bool {
        true
    }

    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Pass the summary to every enabled collector.
///
/// A failing collector is logged and does not prevent the remaining collectors from running.
/// Returns the number of collectors that failed.
pub fn finalize_all(collectors: &[Box<dyn ReportCollector>], summary: &RunSummary) -> usize {
    let mut failed = 0;
    for collector in collectors.iter().filter(|c| c.is_enabled()) {
        log::debug!("Finalizing report collector: {}", collector.name());
        if let Err(e) = collector.finalize(summary) {
            log::error!("Report collector {} failed: {e:?}", collector.name());
            failed += 1;
        }
    }

    failed
}
