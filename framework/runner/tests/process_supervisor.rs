#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use time_it_runner::prelude::{
    EffectiveScenario, KillCommand, ProcessSupervisor, RunError, TimeoutSpec, VariableResolver,
};

fn shell(name: &str, script: &str, dir: &Path) -> EffectiveScenario {
    EffectiveScenario {
        name: name.to_string(),
        process_name: "sh".to_string(),
        process_arguments: vec!["-c".to_string(), script.to_string()],
        working_directory: Some(dir.to_path_buf()),
        environment: BTreeMap::new(),
        timeout: TimeoutSpec::default(),
        tags: BTreeMap::new(),
        metrics_file_path: None,
    }
}

fn supervisor(dir: &Path) -> ProcessSupervisor {
    ProcessSupervisor::new(VariableResolver::with_working_dir(dir.display().to_string()))
}

#[tokio::test]
async fn clean_exit_has_no_error() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = shell("ok", "echo hello", dir.path());

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(None, point.error);
    assert!(point.should_continue);
    assert!(point.pid.is_some());
    assert!(point.duration > Duration::ZERO);
    assert!(point.ended_at >= point.started_at);
}

#[tokio::test]
async fn non_zero_exit_captures_output() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = shell("fails", "echo out; echo err >&2; exit 3", dir.path());

    let point = supervisor(dir.path()).run_once(&scenario).await;

    match point.error {
        Some(RunError::ProcessFailed { output, reason }) => {
            assert!(output.contains("out"), "{output}");
            assert!(output.contains("err"), "{output}");
            assert!(reason.contains('3'), "{reason}");
        }
        other => panic!("Expected a process failure, got {other:?}"),
    }
    assert!(point.should_continue);
}

#[tokio::test]
async fn spawn_failure_is_a_process_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell("missing", "", dir.path());
    scenario.process_name = "/definitely/not/a/binary".to_string();
    scenario.process_arguments.clear();

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert!(matches!(point.error, Some(RunError::ProcessFailed { .. })));
    assert_eq!(None, point.pid);
}

#[tokio::test]
async fn environment_overrides_reach_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell(
        "env",
        r#"printf '%s' "$TIME_IT_MODE" > mode.txt; test -n "$PATH""#,
        dir.path(),
    );
    scenario
        .environment
        .insert("TIME_IT_MODE".to_string(), "scenario".to_string());

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(None, point.error);
    assert_eq!(
        "scenario",
        std::fs::read_to_string(dir.path().join("mode.txt")).unwrap()
    );
}

#[tokio::test]
async fn timeout_kills_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell("slow", "sleep 30", dir.path());
    scenario.timeout.max_duration = Duration::from_secs(1);

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(Some(RunError::Timeout { max_duration_s: 1 }), point.error);
    assert!(point.duration >= Duration::from_secs(1));
    assert!(point.duration < Duration::from_secs(20), "{:?}", point.duration);
    assert!(point.should_continue);
}

#[tokio::test]
async fn timeout_runs_kill_command_with_pid() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid.txt");
    let mut scenario = shell("slow", "sleep 30", dir.path());
    scenario.timeout = TimeoutSpec {
        max_duration: Duration::from_secs(1),
        kill_command: Some(KillCommand {
            process_name: "sh".to_string(),
            process_arguments: vec![
                "-c".to_string(),
                format!("echo %pid% > {}; kill -9 %pid%", pid_file.display()),
            ],
        }),
    };

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(Some(RunError::Timeout { max_duration_s: 1 }), point.error);
    let pid = std::fs::read_to_string(&pid_file).unwrap();
    assert_eq!(point.pid.unwrap().to_string(), pid.trim());
}

#[tokio::test]
async fn failing_kill_command_still_kills_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell("slow", "sleep 30", dir.path());
    scenario.timeout = TimeoutSpec {
        max_duration: Duration::from_secs(1),
        kill_command: Some(KillCommand {
            process_name: "/no/such/kill".to_string(),
            process_arguments: vec!["%pid%".to_string()],
        }),
    };

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(Some(RunError::Timeout { max_duration_s: 1 }), point.error);
    assert!(point.duration < Duration::from_secs(20), "{:?}", point.duration);
    assert!(point.should_continue);
}

#[tokio::test]
async fn fast_process_is_not_timed_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell("fast", "exit 0", dir.path());
    scenario.timeout.max_duration = Duration::from_secs(5);

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(None, point.error);
    assert!(point.duration < Duration::from_secs(5));
}

#[tokio::test]
async fn metrics_file_is_harvested_after_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell(
        "metrics",
        r#"printf '%s' '[{"latency":"12.5"},{"latency":"abc"}]' > metrics.json"#,
        dir.path(),
    );
    scenario.metrics_file_path = Some("metrics.json".to_string());

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert_eq!(None, point.error);
    assert_eq!(BTreeMap::from([("latency".to_string(), 12.5)]), point.metrics);
    assert!(point.should_continue);
}

#[tokio::test]
async fn missing_metrics_file_stops_the_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = shell("no-metrics", "exit 0", dir.path());
    scenario.metrics_file_path = Some("metrics-*.json".to_string());

    let point = supervisor(dir.path()).run_once(&scenario).await;

    assert!(matches!(point.error, Some(RunError::MetricsFileNotFound { .. })));
    assert!(!point.should_continue);
}
