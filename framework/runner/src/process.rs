use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use time_it_core::prelude::{CancelHandle, VariableResolver};
use time_it_summary_model::{RunDataPoint, RunError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::definition::{EffectiveScenario, KillCommand};
use crate::harvest::harvest;

/// How long to keep reading output after a failed process has exited.
///
/// Processes started by the child can keep the pipes open after the child itself has exited.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

type OutputBuffer = Arc<Mutex<Vec<u8>>>;

/// Runs a scenario's process once and records the outcome.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    resolver: VariableResolver,
}

enum Outcome {
    SpawnFailed(std::io::Error),
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
}

impl ProcessSupervisor {
    pub fn new(resolver: VariableResolver) -> Self {
        Self { resolver }
    }

    /// Run the process once, racing it against the configured timeout.
    ///
    /// Failures are recorded on the returned data point rather than returned as errors. When a
    /// metrics file is configured it is harvested after the process has finished.
    pub async fn run_once(&self, scenario: &EffectiveScenario) -> RunDataPoint {
        let mut command = Command::new(&scenario.process_name);
        command
            .args(&scenario.process_arguments)
            .envs(&scenario.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &scenario.working_directory {
            command.current_dir(dir);
        }

        log::trace!(
            "Running {} {:?} in {:?}",
            scenario.process_name,
            scenario.process_arguments,
            scenario.working_directory
        );

        let output: OutputBuffer = Arc::new(Mutex::new(Vec::new()));
        let started_at = Utc::now();
        let start = Instant::now();

        let (outcome, pid, readers) = match command.spawn() {
            Ok(mut child) => {
                let pid = child.id();
                let readers = [
                    capture(child.stdout.take(), output.clone()),
                    capture(child.stderr.take(), output.clone()),
                ];
                let outcome = self.supervise(scenario, &mut child, pid).await;
                (outcome, pid, readers)
            }
            Err(e) => (Outcome::SpawnFailed(e), None, [None, None]),
        };

        let duration = start.elapsed();
        let ended_at = Utc::now();

        let error = match outcome {
            Outcome::TimedOut => {
                abort_readers(readers);
                Some(RunError::Timeout {
                    max_duration_s: scenario.timeout.max_duration.as_secs(),
                })
            }
            Outcome::SpawnFailed(e) => Some(RunError::ProcessFailed {
                output: String::new(),
                reason: e.to_string(),
            }),
            Outcome::Exited(Ok(status)) if status.success() => {
                abort_readers(readers);
                None
            }
            Outcome::Exited(result) => {
                drain_readers(readers).await;
                let reason = match result {
                    Ok(status) => status.to_string(),
                    Err(e) => e.to_string(),
                };
                Some(RunError::ProcessFailed {
                    output: String::from_utf8_lossy(&output.lock()).to_string(),
                    reason,
                })
            }
        };

        let mut point = RunDataPoint {
            started_at,
            ended_at,
            duration,
            pid,
            error,
            metrics: Default::default(),
            should_continue: true,
        };

        if let Some(pattern) = &scenario.metrics_file_path {
            let harvested = harvest(pattern, &scenario.base_directory(&self.resolver));
            point.metrics = harvested.metrics;
            if let Some(path) = harvested.missing {
                point.error = Some(RunError::MetricsFileNotFound { path });
                point.should_continue = false;
            }
        }

        point
    }

    async fn supervise(
        &self,
        scenario: &EffectiveScenario,
        child: &mut Child,
        pid: Option<u32>,
    ) -> Outcome {
        if !scenario.timeout.is_enabled() {
            return Outcome::Exited(child.wait().await);
        }

        let handle = CancelHandle::new();
        let mut listener = handle.new_listener();
        let timer = tokio::spawn({
            let handle = handle.clone();
            let max_duration = scenario.timeout.max_duration;
            let kill_command = scenario.timeout.kill_command.clone();
            let resolver = self.resolver.clone();
            async move {
                tokio::time::sleep(max_duration).await;
                handle.expire();
                match (kill_command, pid) {
                    (Some(kill_command), Some(pid)) => {
                        run_kill_command(&kill_command, pid, &resolver, max_duration).await;
                    }
                    (Some(_), None) => {
                        log::warn!("Not running kill command, the process id is unknown");
                    }
                    _ => {}
                }
                handle.cancel();
            }
        });

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = listener.wait_for_cancel() => None,
        };

        if handle.is_expired() {
            // Let a kill command that is still running finish before the process is killed
            if let Err(e) = timer.await {
                log::warn!("Timeout task failed: {e:?}");
            }
            if status.is_none() {
                if let Err(e) = child.start_kill() {
                    log::debug!("Failed to kill timed out process: {e:?}");
                }
                if let Err(e) = child.wait().await {
                    log::debug!("Failed to wait for killed process: {e:?}");
                }
            }
            return Outcome::TimedOut;
        }

        timer.abort();
        match status {
            Some(status) => Outcome::Exited(status),
            // Only the timer cancels, and it expires the handle first
            None => Outcome::TimedOut,
        }
    }
}

/// Run the kill command for a timed out process. Failures are logged and otherwise ignored.
async fn run_kill_command(
    kill_command: &KillCommand,
    pid: u32,
    resolver: &VariableResolver,
    max_duration: Duration,
) {
    let name = resolver.resolve_with_pid(&kill_command.process_name, pid);
    let args = kill_command
        .process_arguments
        .iter()
        .map(|arg| resolver.resolve_with_pid(arg, pid))
        .collect::<Vec<_>>();

    log::warn!("Process {pid} timed out, running kill command: {name} {args:?}");

    let result = tokio::time::timeout(
        max_duration,
        Command::new(&name)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await;

    match result {
        Ok(Ok(output)) if output.status.success() => {
            log::debug!("Kill command for process {pid} completed");
        }
        Ok(Ok(output)) => {
            log::warn!(
                "Kill command for process {pid} failed with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(Err(e)) => log::warn!("Failed to run kill command for process {pid}: {e}"),
        Err(_) => log::warn!("Kill command for process {pid} did not finish in time"),
    }
}

fn capture<R>(reader: Option<R>, buffer: OutputBuffer) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = reader?;
    Some(tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.lock().extend_from_slice(&chunk[..n]),
                Err(e) => {
                    log::trace!("Stopped reading process output: {e:?}");
                    break;
                }
            }
        }
    }))
}

fn abort_readers(readers: [Option<JoinHandle<()>>; 2]) {
    readers.into_iter().flatten().for_each(|reader| reader.abort());
}

async fn drain_readers(readers: [Option<JoinHandle<()>>; 2]) {
    for reader in readers.into_iter().flatten() {
        let abort = reader.abort_handle();
        if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, reader).await.is_err() {
            log::debug!("Process output still open after exit, stopped reading");
            abort.abort();
        }
    }
}
