//! Shell command execution for `exec` bindings.
//!
//! Commands run under the user's login shell on a blocking thread. A command
//! that outlives its timeout receives SIGTERM, then SIGKILL if it is still
//! running shortly after.

use std::{
    env,
    io::Read,
    os::unix::process::CommandExt,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Upper bound on the runtime of one command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Time to wait for graceful exit after SIGTERM before escalating.
const TERM_WAIT_TIMEOUT_MS: u64 = 300;
/// Poll interval while waiting for the child.
const TERM_POLL_INTERVAL_MS: u64 = 10;

/// Result of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutcome {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Standard output followed by standard error, without leading or
    /// trailing blank lines.
    pub output: String,
    /// The command was terminated after exceeding its timeout.
    pub timed_out: bool,
}

impl ShellOutcome {
    /// True when the command exited with status zero in time.
    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }
}

/// Signal the child's whole process group; the shell may have forked.
#[inline]
fn signal_group(pid: libc::pid_t, sig: libc::c_int) {
    unsafe {
        libc::kill(-pid, sig);
    }
}

fn default_shell() -> String {
    if Path::new("/bin/zsh").exists() {
        "/bin/zsh".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

fn wait_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => thread::sleep(Duration::from_millis(TERM_POLL_INTERVAL_MS)),
            Err(_) => break,
        }
    }
    None
}

fn terminate(child: &mut Child) -> Option<ExitStatus> {
    let pid = child.id() as libc::pid_t;
    signal_group(pid, libc::SIGTERM);
    if let Some(status) = wait_exit(child, Duration::from_millis(TERM_WAIT_TIMEOUT_MS)) {
        return Some(status);
    }
    warn!("shell command ignored SIGTERM; escalating to SIGKILL");
    signal_group(pid, libc::SIGKILL);
    if let Err(e) = child.kill() {
        warn!("failed to kill shell command: {}", e);
    }
    child.wait().ok()
}

fn drain(src: Option<impl Read + Send + 'static>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut s) = src {
            let _ = s.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join stdout and stderr and drop blank lines at both ends.
fn combine_output(out: &str, err: &str) -> String {
    let mut combined = String::new();
    if !out.is_empty() {
        combined.push_str(out);
    }
    if !err.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(err);
    }
    let lines: Vec<&str> = combined.lines().collect();
    let first_nonblank = lines.iter().position(|l| !l.trim().is_empty());
    let last_nonblank = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first_nonblank, last_nonblank) {
        (Some(s), Some(e)) if s <= e => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

/// Run `command` with `$SHELL -lc`, blocking the calling thread.
pub fn run_shell_blocking(command: &str, timeout: Duration) -> Result<ShellOutcome> {
    if command.trim().is_empty() {
        return Err(Error::EmptyCommand);
    }
    info!("executing shell command: {}", command);
    let shell_path = env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_shell);
    let mut child = Command::new(&shell_path)
        .arg("-lc")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()?;
    let out = drain(child.stdout.take());
    let err = drain(child.stderr.take());

    let (status, timed_out) = match wait_exit(&mut child, timeout) {
        Some(status) => (Some(status), false),
        None => {
            warn!("shell command timed out after {:?}: {}", timeout, command);
            (terminate(&mut child), true)
        }
    };
    let out = out.join().unwrap_or_default();
    let err = err.join().unwrap_or_default();
    let outcome = ShellOutcome {
        code: status.and_then(|s| s.code()),
        output: combine_output(&out, &err),
        timed_out,
    };
    debug!("shell command finished: {:?}", outcome.code);
    Ok(outcome)
}

/// Run `command` on the blocking pool.
pub async fn run_shell(command: String, timeout: Duration) -> Result<ShellOutcome> {
    tokio::task::spawn_blocking(move || run_shell_blocking(&command, timeout))
        .await
        .map_err(|e| Error::Msg(format!("shell task failed: {e}")))?
}
