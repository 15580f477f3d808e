//! Elevated shell session — the `PrivilegedShell` implementation.
//!
//! One `SuSession` owns at most one live `su` process. Commands are written
//! to its stdin line by line; a background task accumulates stdout into a
//! shared buffer. `execute` waits a fixed settle delay and then takes
//! whatever has been buffered — there is no per-command framing and no way
//! to detect command completion, so output from a slow command can be
//! truncated or show up in a later call. Inherited protocol; kept behind
//! this type so a framed replacement would not touch any caller.

use std::process::Stdio;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;

use crate::application::ports::PrivilegedShell;

/// Elevation program spawned for the interactive session and the probe.
const ELEVATE_PROGRAM: &str = "su";

/// Settle delay between writing a command and draining buffered output.
/// Empirically tuned against slow devices.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Root-identity marker expected in the elevation probe's output.
const ROOT_MARKER: &str = "uid=0";

/// The single shared elevated shell session.
///
/// The internal async mutex serializes `execute`, giving each command
/// exclusive use of the shell (there is no multiplexing to fall back on).
/// The session is created lazily on first use and recreated after `close`.
pub struct SuSession {
    program: String,
    settle: Duration,
    shell: Mutex<Option<ShellHandle>>,
}

struct ShellHandle {
    child: Child,
    stdin: ChildStdin,
    captured: Arc<StdMutex<Vec<u8>>>,
    reader: tokio::task::JoinHandle<()>,
}

impl SuSession {
    /// Session over the device's `su` with the tuned settle delay.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(ELEVATE_PROGRAM, SETTLE_DELAY)
    }

    /// Session over an arbitrary shell program (for testing).
    #[must_use]
    pub fn with_program(program: &str, settle: Duration) -> Self {
        Self {
            program: program.to_string(),
            settle,
            shell: Mutex::new(None),
        }
    }

    fn spawn_shell(program: &str) -> Option<ShellHandle> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .ok()?;
        let stdin = child.stdin.take()?;
        let mut stdout = child.stdout.take()?;
        let captured = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let reader = tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            loop {
                match stdout.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });
        Some(ShellHandle {
            child,
            stdin,
            captured,
            reader,
        })
    }
}

impl Default for SuSession {
    fn default() -> Self {
        Self::new()
    }
}

async fn send_line(handle: &mut ShellHandle, line: &str) -> bool {
    handle.stdin.write_all(line.as_bytes()).await.is_ok()
        && handle.stdin.flush().await.is_ok()
}

impl PrivilegedShell for SuSession {
    async fn execute(&self, command: &str) -> String {
        let mut slot = self.shell.lock().await;
        if slot.is_none() {
            *slot = Self::spawn_shell(&self.program);
        }
        let line = format!("{command}\n");
        let sent = match slot.as_mut() {
            Some(handle) => send_line(handle, &line).await,
            None => return String::new(),
        };
        if !sent {
            // Dead shell; drop it so the next call respawns.
            if let Some(dead) = slot.take() {
                dead.reader.abort();
            }
            return String::new();
        }
        tokio::time::sleep(self.settle).await;
        let Some(handle) = slot.as_ref() else {
            return String::new();
        };
        let drained = handle
            .captured
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default();
        String::from_utf8_lossy(&drained).into_owned()
    }

    async fn elevated(&self) -> bool {
        let output = Command::new(&self.program)
            .arg("-c")
            .arg("id")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;
        match output {
            Ok(out) => {
                out.status.success()
                    && String::from_utf8_lossy(&out.stdout).contains(ROOT_MARKER)
            }
            Err(_) => false,
        }
    }

    async fn close(&self) {
        let mut slot = self.shell.lock().await;
        if let Some(mut handle) = slot.take() {
            let _ = handle.stdin.write_all(b"exit\n").await;
            let _ = handle.stdin.flush().await;
            let _ = handle.stdin.shutdown().await;
            let _ = handle.child.kill().await;
            handle.reader.abort();
        }
    }
}
