//! Helpers for running child processes with timeouts and bounded output.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How long to keep draining pipes after a timed-out child is killed.
/// Grandchildren that inherited the pipes can hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

const STDOUT: usize = 0;
const STDERR: usize = 1;

type StreamResult = Result<(Vec<u8>, usize)>;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    /// Last `max_bytes` of stderr (or stdout when stderr is empty), trimmed.
    pub fn diagnostic_tail(&self, max_bytes: usize) -> String {
        let source = if self.stderr.iter().all(u8::is_ascii_whitespace) {
            &self.stdout
        } else {
            &self.stderr
        };
        let text = String::from_utf8_lossy(source);
        let text = text.trim();
        if text.len() <= max_bytes {
            return text.to_string();
        }
        let mut start = text.len() - max_bytes;
        while !text.is_char_boundary(start) {
            start += 1;
        }
        format!("...{}", &text[start..])
    }
}

/// Run `argv` in `workdir` with a timeout, capturing stdout/stderr without
/// risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// After a timeout, output still unread once [`DRAIN_GRACE`] elapses is abandoned so the call
/// returns even when a grandchild keeps the pipes open.
#[instrument(skip_all, fields(program = %argv.first().map(String::as_str).unwrap_or(""), timeout_secs = timeout.as_secs()))]
pub fn run_command_with_timeout(
    argv: &[String],
    workdir: &Path,
    env: &[(String, String)],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("command must be a non-empty array"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(workdir)
        .envs(env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn command {argv:?}"));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (tx, rx) = mpsc::channel();
    spawn_reader(STDOUT, stdout, output_limit_bytes, tx.clone());
    spawn_reader(STDERR, stderr, output_limit_bytes, tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let drain_deadline = timed_out.then(|| Instant::now() + DRAIN_GRACE);
    let [stdout, stderr] = collect_streams(&rx, drain_deadline)?;
    let (stdout, stdout_truncated) = stdout;
    let (stderr, stderr_truncated) = stderr;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: usize,
    reader: R,
    limit: usize,
    tx: mpsc::Sender<(usize, StreamResult)>,
) {
    thread::spawn(move || {
        // The receiver is gone once the caller stops draining.
        let _ = tx.send((stream, read_stream_limited(reader, limit)));
    });
}

/// Gather both streams, waiting at most until `deadline` when one is given.
/// Streams not finished by then come back empty.
fn collect_streams(
    rx: &mpsc::Receiver<(usize, StreamResult)>,
    deadline: Option<Instant>,
) -> Result<[(Vec<u8>, usize); 2]> {
    let mut streams = [(Vec::new(), 0), (Vec::new(), 0)];
    for _ in 0..2 {
        let received = match deadline {
            None => rx
                .recv()
                .map_err(|_| anyhow!("output reader thread panicked"))?,
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(received) => received,
                    Err(_) => {
                        warn!("pipes still open after kill, abandoning remaining output");
                        break;
                    }
                }
            }
        };
        let (stream, result) = received;
        streams[stream] = result.context(if stream == STDOUT {
            "read stdout"
        } else {
            "read stderr"
        })?;
    }
    Ok(streams)
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn captures_output_and_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = run_command_with_timeout(
            &sh("echo out; echo err >&2; exit 3"),
            temp.path(),
            &[],
            Duration::from_secs(10),
            1_000,
        )
        .expect("run");
        assert!(!output.succeeded());
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(output.diagnostic_tail(100), "err");
    }

    #[test]
    fn truncates_output_beyond_limit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = run_command_with_timeout(
            &sh("printf 0123456789"),
            temp.path(),
            &[],
            Duration::from_secs(10),
            4,
        )
        .expect("run");
        assert_eq!(output.stdout, b"0123");
        assert_eq!(output.stdout_truncated, 6);
    }

    #[test]
    fn kills_command_on_timeout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = run_command_with_timeout(
            &sh("exec sleep 5"),
            temp.path(),
            &[],
            Duration::from_millis(100),
            1_000,
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(!output.succeeded());
    }

    #[test]
    fn timeout_returns_while_grandchild_holds_pipes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let start = Instant::now();
        let output = run_command_with_timeout(
            &sh("echo before; sleep 4; true"),
            temp.path(),
            &[],
            Duration::from_millis(200),
            1_000,
        )
        .expect("run");
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "returned after {:?}",
            start.elapsed()
        );
        assert!(output.timed_out);
        assert!(!output.succeeded());
    }

    #[test]
    fn passes_env_to_child() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = run_command_with_timeout(
            &sh("printf \"$STATEGRAPH_TEST_VALUE\""),
            temp.path(),
            &[("STATEGRAPH_TEST_VALUE".to_string(), "hello".to_string())],
            Duration::from_secs(10),
            1_000,
        )
        .expect("run");
        assert_eq!(output.stdout, b"hello");
    }
}
