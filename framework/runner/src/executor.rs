use std::future::Future;

use anyhow::Context;

use crate::types::TimeItResult;

/// Owns the async runtime used to supervise child processes.
///
/// Scenarios and runs are driven from a single thread which blocks on each run in turn, the
/// runtime only provides the timer and output reader tasks of the run in progress.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
}

impl Executor {
    pub fn new() -> TimeItResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("time-it-worker")
            .build()
            .context("Failed to create Tokio runtime")?;

        Ok(Self { runtime })
    }

    /// Run async code in place, blocking until it completes.
    pub fn execute_in_place<T>(&self, fut: impl Future<Output = T>) -> T {
        self.runtime.block_on(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_futures_to_completion() {
        let executor = Executor::new().unwrap();
        let value = executor.execute_in_place(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            42
        });

        assert_eq!(42, value);
    }
}
