mod aggregate;
mod outliers;
mod percentiles;

pub use aggregate::{aggregate, aggregate_errors, summarize, summarize_durations, Aggregate};
pub use outliers::{
    detect_outliers, quartile_outliers, OutlierPolicy, QuartileOutliers, EXTREME_IQR_MULTIPLIER,
    MILD_IQR_MULTIPLIER,
};
pub use percentiles::{max, mean, min, percentile, std_dev, std_err};
