//! Quartile based (Tukey fence) outlier detection.

use crate::stats::percentiles::percentile;
use serde::{Deserialize, Serialize};

/// Which samples are treated as outliers and removed from the duration series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Remove samples beyond 3 x IQR from the nearest quartile
    #[default]
    Extreme,
    /// Remove samples beyond 1.5 x IQR from the nearest quartile, extreme ones included
    Mild,
    /// Keep every sample
    None,
}

impl OutlierPolicy {
    /// The IQR multiplier used for the fences, `None` when detection is disabled.
    pub fn iqr_multiplier(&self) -> Option<f64> {
        match self {
            OutlierPolicy::Extreme => Some(EXTREME_IQR_MULTIPLIER),
            OutlierPolicy::Mild => Some(MILD_IQR_MULTIPLIER),
            OutlierPolicy::None => None,
        }
    }
}

pub const MILD_IQR_MULTIPLIER: f64 = 1.5;
pub const EXTREME_IQR_MULTIPLIER: f64 = 3.0;

/// Result of classifying samples against the inner (mild) and outer (extreme) fences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuartileOutliers {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Samples beyond the inner fences but within the outer fences, ascending
    pub mild: Vec<f64>,
    /// Samples beyond the outer fences, ascending
    pub extreme: Vec<f64>,
}

/// Classify samples using the quartiles of the sample itself.
pub fn quartile_outliers(samples: &[f64]) -> QuartileOutliers {
    if samples.is_empty() {
        return QuartileOutliers::default();
    }

    let q1 = percentile(samples, 25.0);
    let q3 = percentile(samples, 75.0);
    let iqr = q3 - q1;

    let inner = (q1 - MILD_IQR_MULTIPLIER * iqr, q3 + MILD_IQR_MULTIPLIER * iqr);
    let outer = (q1 - EXTREME_IQR_MULTIPLIER * iqr, q3 + EXTREME_IQR_MULTIPLIER * iqr);

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut mild = Vec::new();
    let mut extreme = Vec::new();
    for sample in sorted {
        if sample < outer.0 || sample > outer.1 {
            extreme.push(sample);
        } else if sample < inner.0 || sample > inner.1 {
            mild.push(sample);
        }
    }

    QuartileOutliers {
        q1,
        q3,
        iqr,
        mild,
        extreme,
    }
}

/// The outlier values to remove from `samples` under `policy`, ascending.
pub fn detect_outliers(samples: &[f64], policy: OutlierPolicy) -> Vec<f64> {
    let Some(multiplier) = policy.iqr_multiplier() else {
        return Vec::new();
    };

    let QuartileOutliers { q1, q3, iqr, .. } = quartile_outliers(samples);
    let (lower, upper) = (q1 - multiplier * iqr, q3 + multiplier * iqr);

    let mut outliers = samples
        .iter()
        .copied()
        .filter(|sample| *sample < lower || *sample > upper)
        .collect::<Vec<_>>();
    outliers.sort_by(f64::total_cmp);
    outliers
}
