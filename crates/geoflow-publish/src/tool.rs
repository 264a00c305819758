//! One-shot invocation of the external publishing tool.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{PublishError, PublishResult};

/// Output of a finished tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, -1 when killed by a signal.
    pub exit_code: i32,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`PublishError::ToolFailed`].
    pub fn check(self) -> PublishResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(PublishError::ToolFailed {
                status: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run `command` with `args`, capturing output, bounded by `limit`.
///
/// The child is killed if the limit elapses.
pub(crate) async fn run(
    command: &str,
    args: &[OsString],
    limit: Duration,
) -> PublishResult<ToolOutput> {
    let mut cmd = Command::new(command);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    debug!(command, ?args, "running publishing tool");

    match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }),
        Ok(Err(source)) => Err(PublishError::ToolSpawn {
            command: command.to_string(),
            source,
        }),
        Err(_) => Err(PublishError::ToolTimeout(limit)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let output = run("sh", &args(&["-c", "echo hello; echo oops >&2"]), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails_check() {
        let output = run("sh", &args(&["-c", "echo bad >&2; exit 3"]), Duration::from_secs(5))
            .await
            .unwrap();
        match output.check() {
            Err(PublishError::ToolFailed { status, stderr }) => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "bad");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = run("/nonexistent/geopub", &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::ToolSpawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = run("sleep", &args(&["5"]), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::ToolTimeout(_)));
    }
}
