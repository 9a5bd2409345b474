//! Basic descriptive statistics over `f64` samples.
//!
//! Every function returns `0.0` for an empty input rather than failing, so that reporting for a
//! scenario with no runs still works.

/// Compute a single percentile from samples
///
/// Uses linear interpolation between closest ranks, `rank = p * (n - 1)`.
pub fn percentile(samples: &[f64], percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let p = (percentile / 100.0).clamp(0.0, 1.0);

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation, dividing by `n`.
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mean = mean(samples);
    let variance =
        samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// `std_dev / sqrt(n)`, where `n` is supplied by the caller.
pub fn std_err(std_dev: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }

    std_dev / (n as f64).sqrt()
}

pub fn min(samples: &[f64]) -> f64 {
    samples.iter().copied().min_by(f64::total_cmp).unwrap_or(0.0)
}

pub fn max(samples: &[f64]) -> f64 {
    samples.iter().copied().max_by(f64::total_cmp).unwrap_or(0.0)
}
