//! `SupervisedWait` primitive: wait on a spawned worker process up to a wall-clock budget,
//! escalating to `shutdown_child` on timeout. The Job Monitor (scanner-http) interprets the
//! returned [`ProcessOutcome`] and writes the corresponding status record — this module only owns
//! the process-supervision mechanics.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

use crate::shutdown::shutdown_child;

/// Result of supervising one worker process to completion.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited on its own within the budget.
    Exited(ExitStatus),
    /// The process exceeded `timeout` and was killed.
    TimedOut,
}

/// Wait on `child` for up to `timeout`; kill it (terminate-then-kill via [`shutdown_child`]) if it
/// hasn't exited by then.
pub async fn supervised_wait(child: Child, timeout: Duration) -> io::Result<ProcessOutcome> {
    let mut child = child;
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => Ok(ProcessOutcome::Exited(status?)),
        Err(_elapsed) => {
            shutdown_child(child).await?;
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    async fn exits_normally_within_budget() {
        let child = Command::new("echo").arg("hi").spawn().unwrap();
        let outcome = supervised_wait(child, Duration::from_secs(5)).await.unwrap();
        assert!(matches!(outcome, ProcessOutcome::Exited(status) if status.success()));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn kills_process_exceeding_budget() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let outcome = supervised_wait(child, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut));
    }
}
