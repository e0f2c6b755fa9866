//! Runs one external process under a deadline.
//!
//! The child lives in its own task that reports through a single-slot
//! `oneshot`. The caller races that slot against a timer; on expiry it asks
//! the task to kill the child and waits (bounded) for the kill to be reaped.
//! Dropping the returned future aborts that task, which kills the child.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, warn};

/// How long to wait for a killed child to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Captured result of a process that exited on its own.
#[derive(Debug, Clone)]
pub(crate) struct ProcessExit {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum ProcessRun {
    Exited(ProcessExit),
    /// Spawning or waiting failed.
    Failed(std::io::Error),
    /// The deadline fired first. `killed` is false if reaping did not finish
    /// within the grace period. Output holds whatever was read before the kill.
    TimedOut {
        killed: bool,
        stdout: String,
        stderr: String,
    },
}

/// Pipe contents collected so far, readable after the reader is aborted.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn push(&self, bytes: &[u8]) {
        if let Ok(mut buf) = self.0.lock() {
            buf.extend_from_slice(bytes);
        }
    }

    fn text(&self) -> String {
        match self.0.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => String::new(),
        }
    }
}

/// Spawns `command` and waits for it, at most `limit`.
pub(crate) async fn run_with_timeout(mut command: Command, limit: Duration) -> ProcessRun {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ProcessRun::Failed(e),
    };
    let pid = child.id();

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_buf = Captured::default();
    let stderr_buf = Captured::default();

    let (done_tx, mut done_rx) = oneshot::channel::<std::io::Result<ProcessExit>>();
    let (kill_tx, kill_rx) = oneshot::channel::<()>();

    let (out, err) = (stdout_buf.clone(), stderr_buf.clone());
    let worker = AbortOnDropHandle::new(tokio::spawn(async move {
        let stdout_reader = AbortOnDropHandle::new(tokio::spawn(read_pipe(stdout, out.clone())));
        let stderr_reader = AbortOnDropHandle::new(tokio::spawn(read_pipe(stderr, err.clone())));

        tokio::select! {
            status = child.wait() => {
                let result = match status {
                    Ok(status) => {
                        let _ = stdout_reader.await;
                        let _ = stderr_reader.await;
                        Ok(ProcessExit {
                            success: status.success(),
                            exit_code: status.code(),
                            stdout: out.text(),
                            stderr: err.text(),
                        })
                    }
                    Err(e) => {
                        stdout_reader.abort();
                        stderr_reader.abort();
                        Err(e)
                    }
                };
                let _ = done_tx.send(result);
            }
            _ = kill_rx => {
                // Descendants may still hold the pipes open
                stdout_reader.abort();
                stderr_reader.abort();
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill process {:?}: {}", pid, e);
                }
                let _ = done_tx.send(Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "killed after timeout",
                )));
            }
        }
    }));

    let run = match timeout(limit, &mut done_rx).await {
        Ok(Ok(Ok(exit))) => ProcessRun::Exited(exit),
        Ok(Ok(Err(e))) => ProcessRun::Failed(e),
        Ok(Err(_)) => ProcessRun::Failed(std::io::Error::other("process worker stopped")),
        Err(_) => {
            debug!("Process {:?} exceeded {:?}, killing", pid, limit);
            let _ = kill_tx.send(());
            let killed = matches!(timeout(KILL_GRACE, &mut done_rx).await, Ok(Ok(_)));
            if !killed {
                warn!("Process {:?} was not reaped within {:?}", pid, KILL_GRACE);
            }
            ProcessRun::TimedOut {
                killed,
                stdout: stdout_buf.text(),
                stderr: stderr_buf.text(),
            }
        }
    };

    // Dropping the child (kill_on_drop) is the last resort
    drop(worker);
    run
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, sink: Captured) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => sink.push(&chunk[..n]),
            Err(e) => {
                debug!("Failed to read process output: {}", e);
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn test_captures_output_and_status() {
        let run = run_with_timeout(sh("echo out; echo err >&2; exit 3"), Duration::from_secs(5)).await;
        match run {
            ProcessRun::Exited(exit) => {
                assert!(!exit.success);
                assert_eq!(exit.exit_code, Some(3));
                assert_eq!(exit.stdout.trim(), "out");
                assert_eq!(exit.stderr.trim(), "err");
            }
            other => panic!("unexpected run: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let run = run_with_timeout(
            Command::new("/nonexistent/definitely-not-a-tool"),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(run, ProcessRun::Failed(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let start = Instant::now();
        let run = run_with_timeout(sh("exec sleep 30"), Duration::from_millis(200)).await;
        assert!(matches!(run, ProcessRun::TimedOut { killed: true, .. }));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_timeout_with_orphaned_pipe_holder() {
        // The background sleep inherits stdout and outlives the shell
        let run = run_with_timeout(sh("sleep 30 & sleep 30"), Duration::from_millis(200)).await;
        assert!(matches!(run, ProcessRun::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_timeout_keeps_output_read_before_kill() {
        let run = run_with_timeout(
            sh("echo '[download] Destination: out/a.mp4'; exec sleep 30"),
            Duration::from_millis(300),
        )
        .await;
        match run {
            ProcessRun::TimedOut { stdout, .. } => {
                assert_eq!(stdout.trim(), "[download] Destination: out/a.mp4");
            }
            other => panic!("unexpected run: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropping_the_run_kills_the_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());

        let run = tokio::spawn(run_with_timeout(sh(&script), Duration::from_secs(30)));
        let mut pid = None;
        for _ in 0..100 {
            if let Ok(text) = std::fs::read_to_string(&pid_file) {
                if !text.trim().is_empty() {
                    pid = Some(text.trim().to_string());
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let pid = pid.expect("child never started");

        run.abort();
        let _ = run.await;

        #[cfg(target_os = "linux")]
        {
            // An unreaped child shows up as a zombie
            let stat = std::path::PathBuf::from(format!("/proc/{}/stat", pid));
            let mut gone = false;
            for _ in 0..100 {
                let state = std::fs::read_to_string(&stat).unwrap_or_default();
                if state.is_empty() || state.contains(") Z") {
                    gone = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            assert!(gone, "process {} survived the dropped run", pid);
        }
        #[cfg(not(target_os = "linux"))]
        let _ = pid;
    }
}
