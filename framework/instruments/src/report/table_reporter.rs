mod summary_table;

use crate::report::table_reporter::summary_table::SummaryRow;
use crate::report::ReportCollector;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Table;
use time_it_summary_model::RunSummary;

/// Prints the per-run durations, the outliers and the summary statistics as markdown tables.
#[derive(Debug, Default)]
pub struct TableReportCollector;

impl TableReportCollector {
    pub fn new() -> Self {
        Self
    }

    /// One column per scenario, one row per measured run.
    ///
    /// Uses the trimmed series, so removed outliers show up as the trimmed mean. Scenarios that
    /// stopped early are padded with `-`.
    pub fn render_results(summary: &RunSummary) -> String {
        let columns = summary
            .scenarios
            .iter()
            .map(|s| {
                s.statistics
                    .duration
                    .series
                    .iter()
                    .map(|v| format_duration(*v))
                    .collect()
            })
            .collect::<Vec<Vec<String>>>();

        Self::render_columns(summary, columns)
    }

    /// One column per scenario listing the removed outlier values.
    pub fn render_outliers(summary: &RunSummary) -> String {
        let columns = summary
            .scenarios
            .iter()
            .map(|s| {
                s.statistics
                    .duration
                    .outliers
                    .iter()
                    .map(|v| format_duration(*v))
                    .collect()
            })
            .collect::<Vec<Vec<String>>>();

        Self::render_columns(summary, columns)
    }

    /// One row per scenario, followed by one row per custom metric in key order.
    pub fn render_summary(summary: &RunSummary) -> String {
        let mut rows = Vec::new();
        for scenario in &summary.scenarios {
            rows.push(SummaryRow::for_duration(
                &scenario.name,
                &scenario.statistics.duration,
            ));

            let metrics = &scenario.statistics.metrics;
            if metrics.is_empty() {
                continue;
            }

            for (idx, (key, stats)) in metrics.iter().enumerate() {
                rows.push(SummaryRow::for_metric(key, stats, idx == metrics.len() - 1));
            }
            rows.push(SummaryRow::blank());
        }

        let mut table = Table::new(rows);
        table.with(Style::markdown());
        table.to_string()
    }

    fn render_columns(summary: &RunSummary, columns: Vec<Vec<String>>) -> String {
        let mut builder = Builder::default();
        builder.push_record(summary.scenarios.iter().map(|s| s.name.clone()));

        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        for idx in 0..rows {
            builder.push_record(
                columns
                    .iter()
                    .map(|column| column.get(idx).cloned().unwrap_or_else(|| " - ".to_string())),
            );
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }
}

impl ReportCollector for TableReportCollector {
    fn name(&self) -> &'static str {
        "table"
    }

    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        if summary.scenarios.is_empty() {
            return Ok(());
        }

        println!("\n### Results\n");
        println!("{}", Self::render_results(summary));
        println!("\n### Outliers\n");
        println!("{}", Self::render_outliers(summary));
        println!("\n### Summary\n");
        println!("{}", Self::render_summary(summary));
        println!();

        Ok(())
    }
}

/// Format a nanosecond value with the most suitable unit, e.g. `1.5ms`.
pub fn format_duration(nanos: f64) -> String {
    format!("{:?}", Duration::from_nanos(nanos.max(0.0).round() as u64))
}

/// Format a custom metric value rounded to 6 decimal places.
pub fn format_metric(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    format!("{rounded}")
}
