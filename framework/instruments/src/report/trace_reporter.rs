use crate::report::ReportCollector;
use opentelemetry_api::trace::{Span, Status, TraceContextExt, Tracer};
use opentelemetry_api::{global, Context, KeyValue, Value};
use std::fmt::{Display, Formatter};
use std::time::SystemTime;
use time_it_summary_model::{RunDataPoint, RunSummary, ScenarioResult};

const TRACER_NAME: &str = "time_it";
const FRAMEWORK: &str = "time-it";

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<usize> for TagValue {
    fn from(value: usize) -> Self {
        TagValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

impl From<TagValue> for Value {
    fn from(value: TagValue) -> Self {
        match value {
            TagValue::Str(s) => Value::from(s),
            TagValue::Int(i) => Value::from(i),
            TagValue::Float(f) => Value::from(f),
        }
    }
}

impl Display for TagValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Str(s) => write!(f, "{s}"),
            TagValue::Int(i) => write!(f, "{i}"),
            TagValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Build the ordered list of tags describing a scenario.
///
/// Fixed `benchmark.*`, `process.*` and `test.*` tags come first, then the user's tags, then one
/// tag per statistic of each custom metric, e.g. `benchmark.latency.p99`.
pub fn scenario_tags(summary: &RunSummary, scenario: &ScenarioResult) -> Vec<(String, TagValue)> {
    let duration = &scenario.statistics.duration;
    let mut tags: Vec<(String, TagValue)> = vec![
        ("benchmark.job.description".into(), scenario.name.as_str().into()),
        ("benchmark.runs".into(), summary.count.into()),
        ("benchmark.warmup_count".into(), summary.warm_up_count.into()),
        ("benchmark.duration.mean".into(), duration.mean.into()),
        ("benchmark.statistics.n".into(), duration.sample_count.into()),
        ("benchmark.statistics.mean".into(), duration.mean.into()),
        ("benchmark.statistics.max".into(), duration.max.into()),
        ("benchmark.statistics.min".into(), duration.min.into()),
        ("benchmark.statistics.std_dev".into(), duration.std_dev.into()),
        ("benchmark.statistics.std_err".into(), duration.std_err.into()),
        ("benchmark.statistics.p90".into(), duration.p90.into()),
        ("benchmark.statistics.p95".into(), duration.p95.into()),
        ("benchmark.statistics.p99".into(), duration.p99.into()),
        ("benchmark.statistics.outliers".into(), duration.outlier_count().into()),
        ("benchmark.fingerprint".into(), summary.fingerprint().into()),
        ("process.name".into(), scenario.process_name.as_str().into()),
        ("process.arguments".into(), scenario.process_arguments.join(" ").into()),
        ("test.file.path".into(), summary.config.directory.display().to_string().into()),
        ("test.file.name".into(), summary.config.file_name.as_str().into()),
        ("test.file.file_path".into(), summary.config.file_path.display().to_string().into()),
        ("test.scenario".into(), scenario.name.as_str().into()),
        ("test.framework".into(), FRAMEWORK.into()),
    ];

    for (key, value) in &scenario.tags {
        tags.push((key.clone(), value.as_str().into()));
    }

    for (key, stats) in &scenario.statistics.metrics {
        let values = [
            ("mean", stats.mean),
            ("max", stats.max),
            ("min", stats.min),
            ("std_dev", stats.std_dev),
            ("std_err", stats.std_err),
            ("p99", stats.p99),
            ("p95", stats.p95),
            ("p90", stats.p90),
        ];
        for (stat, value) in values {
            tags.push((format!("benchmark.{key}.{stat}"), value.into()));
        }
    }

    tags
}

/// Tags for the child span of a single run.
pub fn run_tags(index: usize, point: &RunDataPoint) -> Vec<(String, TagValue)> {
    let mut tags: Vec<(String, TagValue)> = vec![
        ("benchmark.run.index".into(), index.into()),
        ("benchmark.run.duration".into(), point.duration_ns().into()),
    ];
    if let Some(pid) = point.pid {
        tags.push(("process.pid".into(), TagValue::Int(i64::from(pid))));
    }
    for (key, value) in &point.metrics {
        tags.push((format!("benchmark.{key}"), (*value).into()));
    }

    tags
}

fn key_values(tags: Vec<(String, TagValue)>) -> Vec<KeyValue> {
    tags.into_iter()
        .map(|(key, value)| KeyValue::new(key, value))
        .collect()
}

/// Sends one span per scenario, and optionally one child span per run, to the global
/// OpenTelemetry tracer.
///
/// Which backend receives the spans depends on the tracer provider installed by the host
/// application. Without one the spans are dropped.
#[derive(Debug, Default)]
pub struct TraceReportCollector {
    enabled: bool,
    run_spans: bool,
}

impl TraceReportCollector {
    pub fn new(enabled: bool, run_spans: bool) -> Self {
        Self { enabled, run_spans }
    }

    fn send_scenario(&self, summary: &RunSummary, scenario: &ScenarioResult) {
        let tracer = global::tracer(TRACER_NAME);

        let tags = scenario_tags(summary, scenario);
        log::debug!(
            "Scenario span {}: {}",
            scenario.name,
            tags.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let span = tracer
            .span_builder(format!("{FRAMEWORK}.{}", scenario.name))
            .with_start_time(SystemTime::from(scenario.started_at))
            .with_attributes(key_values(tags))
            .start(&tracer);
        let cx = Context::current_with_span(span);

        if self.run_spans {
            for (index, point) in scenario.data.iter().enumerate() {
                let mut run_span = tracer
                    .span_builder(format!("{FRAMEWORK}.{}.run", scenario.name))
                    .with_start_time(SystemTime::from(point.started_at))
                    .with_attributes(key_values(run_tags(index, point)))
                    .start_with_context(&tracer, &cx);
                if let Some(error) = &point.error {
                    run_span.set_status(Status::error(error.to_string()));
                }
                run_span.end_with_timestamp(SystemTime::from(point.ended_at));
            }
        }

        let span = cx.span();
        if let Some(error) = &scenario.error {
            span.set_status(Status::error(error.clone()));
        }
        span.end_with_timestamp(SystemTime::from(scenario.ended_at));
    }
}

impl ReportCollector for TraceReportCollector {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        for scenario in &summary.scenarios {
            self.send_scenario(summary, scenario);
        }

        log::info!("Sent trace data for {} scenarios", summary.scenarios.len());
        Ok(())
    }
}
