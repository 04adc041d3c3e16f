//! Blocking subprocess execution with captured output and an optional deadline.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// How a run ended when it did not produce [`CapturedOutput`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Spawn(std::io::Error),
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("failed waiting for process: {0}")]
    Wait(std::io::Error),
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// Both pipes are drained on helper threads while the child runs. With a
/// timeout, the child is killed once it has run longer than `timeout`.
pub fn run_captured(
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, RunError> {
    let start = Instant::now();
    debug!("Running {:?}", cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RunError::Spawn)?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        Some(limit) => wait_with_deadline(&mut child, start, limit)?,
        None => child.wait().map_err(RunError::Wait)?,
    };

    let output = CapturedOutput {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
        duration: start.elapsed(),
    };
    debug!(
        "Process exited with {} after {:.2}s",
        output.status,
        output.duration.as_secs_f64()
    );
    Ok(output)
}

fn wait_with_deadline(
    child: &mut Child,
    start: Instant,
    limit: Duration,
) -> Result<ExitStatus, RunError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() > limit => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::TimedOut(limit));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(RunError::Wait(e)),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
#[path = "process_tests.rs"]
mod tests;
