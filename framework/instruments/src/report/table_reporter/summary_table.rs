use crate::report::table_reporter::{format_duration, format_metric};
use tabled::Tabled;
use time_it_summary_model::Statistics;

#[derive(Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "StdDev")]
    pub std_dev: String,
    #[tabled(rename = "StdErr")]
    pub std_err: String,
    #[tabled(rename = "P99")]
    pub p99: String,
    #[tabled(rename = "P95")]
    pub p95: String,
    #[tabled(rename = "P90")]
    pub p90: String,
    #[tabled(rename = "Outliers")]
    pub outliers: String,
}

impl SummaryRow {
    pub fn for_duration(name: &str, stats: &Statistics) -> Self {
        Self {
            name: name.to_string(),
            mean: format_duration(stats.mean),
            std_dev: format_duration(stats.std_dev),
            std_err: format_duration(stats.std_err),
            p99: format_duration(stats.p99),
            p95: format_duration(stats.p95),
            p90: format_duration(stats.p90),
            outliers: stats.outlier_count().to_string(),
        }
    }

    /// A custom metric row, drawn as a branch below its scenario.
    pub fn for_metric(key: &str, stats: &Statistics, is_last: bool) -> Self {
        let branch = if is_last { "└>" } else { "├>" };
        Self {
            name: format!("{branch}{key}"),
            mean: format_metric(stats.mean),
            std_dev: format_metric(stats.std_dev),
            std_err: format_metric(stats.std_err),
            p99: format_metric(stats.p99),
            p95: format_metric(stats.p95),
            p90: format_metric(stats.p90),
            outliers: String::new(),
        }
    }

    pub fn blank() -> Self {
        Self {
            name: String::new(),
            mean: String::new(),
            std_dev: String::new(),
            std_err: String::new(),
            p99: String::new(),
            p95: String::new(),
            p90: String::new(),
            outliers: String::new(),
        }
    }
}
