mod report;
mod stats;

pub use report::{
    finalize_all, format_duration, format_metric, run_tags, scenario_tags, JsonFileReportCollector,
    ReportCollector, TableReportCollector, TagValue, TraceReportCollector,
};
pub use stats::{
    aggregate, aggregate_errors, detect_outliers, max, mean, min, percentile, quartile_outliers,
    std_dev, std_err, summarize, summarize_durations, Aggregate, OutlierPolicy, QuartileOutliers,
    EXTREME_IQR_MULTIPLIER, MILD_IQR_MULTIPLIER,
};
