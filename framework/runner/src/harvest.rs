//! Collect the custom metrics a benchmarked process writes to JSON files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// The metrics read from every file matching a metrics file pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Harvest {
    pub metrics: BTreeMap<String, f64>,
    /// Set when the pattern matched nothing, or a matched file disappeared before it was read
    pub missing: Option<String>,
}

/// Read the metrics from every file matching `pattern`.
///
/// Relative patterns are resolved against `working_dir`. Files are read in sorted path order and
/// the last file to define a key wins.
pub fn harvest(pattern: &str, working_dir: &Path) -> Harvest {
    let pattern = Path::new(pattern);
    let full_pattern = if pattern.is_absolute() {
        pattern.to_path_buf()
    } else {
        working_dir.join(pattern)
    };
    let full_pattern = full_pattern.to_string_lossy().to_string();

    let mut result = Harvest::default();
    let paths = resolve_pattern(&full_pattern);
    if paths.is_empty() {
        result.missing = Some(full_pattern);
        return result;
    }

    for path in paths {
        if !path.exists() {
            result.missing = Some(path.display().to_string());
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                log::trace!("Reading metrics from {}", path.display());
                result.metrics.extend(parse_metrics(&content));
            }
            Err(e) => log::debug!("Failed to read metrics file {}: {e}", path.display()),
        }
    }

    result
}

fn resolve_pattern(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    log::debug!("Skipping unreadable metrics path: {e}");
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::warn!("Invalid metrics file pattern '{pattern}': {e}");
            Vec::new()
        }
    }
}

/// Parse a metrics file, a JSON array of objects.
///
/// Finite numbers and strings holding one are kept, every other value is dropped. Content that
/// is not an array of objects yields no metrics.
pub fn parse_metrics(content: &str) -> BTreeMap<String, f64> {
    let records: Vec<Map<String, Value>> = match serde_json::from_str(content) {
        Ok(records) => records,
        Err(e) => {
            log::debug!("Ignoring invalid metrics file: {e}");
            return BTreeMap::new();
        }
    };

    let mut metrics = BTreeMap::new();
    for (key, value) in records.into_iter().flatten() {
        let number = match value {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        if let Some(number) = number.filter(|n| n.is_finite()) {
            metrics.insert(key, number);
        }
    }

    metrics
}
