//! Agent server lifecycle: install, uninstall, start, stop, state probes.
//!
//! Every operation delegates byte-level work to the injected
//! [`PrivilegedShell`] and re-probes actual device state before reporting
//! success — the probes are the sole source of truth, never the commands
//! that preceded them. Safe to retry naively for the same reason.

use std::path::Path;
use std::time::Duration;

use crate::application::ports::PrivilegedShell;
use crate::domain::error::AgentError;
use crate::domain::release::SERVER_PROCESS;

/// Fixed privileged path of the installed server binary.
pub const SERVER_BINARY_PATH: &str = "/data/local/tmp/frida-server";

/// Fixed privileged path of the installed-version marker file.
pub const VERSION_MARKER_PATH: &str = "/data/local/tmp/frida-version.txt";

/// Settle delay after launching the server, before the running re-probe.
const START_SETTLE: Duration = Duration::from_millis(1500);

/// Ordered termination ladder: increasingly blunt strategies, each followed
/// by its own settle delay and a running re-probe. Ordering and delays
/// encode empirically tuned device-compatibility behavior — do not reorder.
const KILL_LADDER: [(&str, Duration); 4] = [
    (
        "kill -9 $(ps -A | grep frida-server | awk '{ print $2 }')",
        Duration::from_millis(500),
    ),
    (
        "kill -9 $(ps | grep frida-server | awk '{ print $2 }')",
        Duration::from_millis(300),
    ),
    ("kill -9 $(pidof frida-server)", Duration::from_millis(300)),
    ("pkill -9 -f frida-server", Duration::from_millis(500)),
];

/// Marker emitted by `ls` for a missing path.
const NO_SUCH_FILE: &str = "No such file";

// ── State probes ──────────────────────────────────────────────────────────────

/// Whether the server binary exists at its fixed privileged path.
///
/// The version marker is advisory only; installed-ness is decided by the
/// binary's presence.
pub async fn is_installed(shell: &impl PrivilegedShell) -> bool {
    let listing = shell.execute(&format!("ls -la {SERVER_BINARY_PATH}")).await;
    listing.contains(SERVER_BINARY_PATH) && !listing.contains(NO_SUCH_FILE)
}

/// Whether a server process is currently alive.
///
/// Probes the full process list, the current-session process list, then a
/// pid-by-exact-name lookup, short-circuiting on the first positive.
/// Never cached — computed against the process table on every call.
pub async fn is_running(shell: &impl PrivilegedShell) -> bool {
    let full = shell
        .execute(&format!("ps -A | grep {SERVER_PROCESS}"))
        .await;
    if full.contains(SERVER_PROCESS) {
        return true;
    }
    let session = shell.execute(&format!("ps | grep {SERVER_PROCESS}")).await;
    if session.contains(SERVER_PROCESS) {
        return true;
    }
    let pid = shell.execute(&format!("pidof {SERVER_PROCESS}")).await;
    !pid.trim().is_empty()
}

/// Fail fast when no elevated access is available.
///
/// # Errors
///
/// Returns `AgentError::PrivilegeUnavailable` when the one-shot probe does
/// not confirm root identity.
pub async fn ensure_elevated(shell: &impl PrivilegedShell) -> Result<(), AgentError> {
    if shell.elevated().await {
        Ok(())
    } else {
        Err(AgentError::PrivilegeUnavailable)
    }
}

// ── Lifecycle operations ──────────────────────────────────────────────────────

/// Copy `local` to the privileged path, make it executable, record
/// `version`, then re-probe.
///
/// # Errors
///
/// Returns `AgentError::InstallUnverified` when the re-probe does not see
/// the binary — copy success alone is never trusted.
pub async fn install(
    shell: &impl PrivilegedShell,
    local: &Path,
    version: &str,
) -> Result<(), AgentError> {
    shell
        .execute(&format!("cp {} {SERVER_BINARY_PATH}", local.display()))
        .await;
    shell
        .execute(&format!("chmod 755 {SERVER_BINARY_PATH}"))
        .await;
    save_version(shell, version).await;
    if is_installed(shell).await {
        Ok(())
    } else {
        Err(AgentError::InstallUnverified)
    }
}

/// Stop the server if running (best-effort), remove binary and version
/// marker, then re-probe.
///
/// # Errors
///
/// Returns `AgentError::RemovalUnverified` when the binary is still
/// present afterwards.
pub async fn uninstall(shell: &impl PrivilegedShell) -> Result<(), AgentError> {
    if is_running(shell).await {
        // Proceed with removal regardless of the stop outcome.
        let _ = stop(shell).await;
    }
    shell.execute(&format!("rm -f {SERVER_BINARY_PATH}")).await;
    shell.execute(&format!("rm -f {VERSION_MARKER_PATH}")).await;
    if is_installed(shell).await {
        Err(AgentError::RemovalUnverified)
    } else {
        Ok(())
    }
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A server process was already alive; nothing was launched.
    AlreadyRunning,
    /// The server was launched and the re-probe confirmed it.
    Started,
}

/// Launch the server detached, with `flags` appended verbatim.
///
/// Flags are not validated or escaped — they are the caller's
/// responsibility. Standard streams are discarded. After a fixed settle
/// delay the running state is re-probed and decides the result.
///
/// # Errors
///
/// Returns `AgentError::NotRunningAfterStart` when the re-probe finds no
/// server process.
pub async fn start(
    shell: &impl PrivilegedShell,
    flags: &str,
) -> Result<StartOutcome, AgentError> {
    if is_running(shell).await {
        return Ok(StartOutcome::AlreadyRunning);
    }
    let command = if flags.trim().is_empty() {
        format!("nohup {SERVER_BINARY_PATH} > /dev/null 2>&1 &")
    } else {
        format!("nohup {SERVER_BINARY_PATH} {flags} > /dev/null 2>&1 &")
    };
    shell.execute(&command).await;
    tokio::time::sleep(START_SETTLE).await;
    if is_running(shell).await {
        Ok(StartOutcome::Started)
    } else {
        Err(AgentError::NotRunningAfterStart)
    }
}

/// Terminate the server through the fallback ladder.
///
/// An already-stopped server short-circuits before any strategy runs.
/// Otherwise each ladder rung fires, settles, and re-probes; the first
/// clean re-probe wins.
///
/// # Errors
///
/// Returns `AgentError::StillRunning` when every strategy has fired and a
/// server process is still alive.
pub async fn stop(shell: &impl PrivilegedShell) -> Result<(), AgentError> {
    if !is_running(shell).await {
        return Ok(());
    }
    for (command, settle) in KILL_LADDER {
        shell.execute(command).await;
        tokio::time::sleep(settle).await;
        if !is_running(shell).await {
            return Ok(());
        }
    }
    Err(AgentError::StillRunning)
}

// ── Version store ─────────────────────────────────────────────────────────────

/// Overwrite the version marker with `version`.
pub async fn save_version(shell: &impl PrivilegedShell, version: &str) {
    shell
        .execute(&format!("echo '{version}' > {VERSION_MARKER_PATH}"))
        .await;
}

/// Read the recorded version, trimmed.
///
/// A missing marker or empty content is `None` — a valid post-uninstall or
/// never-installed state, not an error. The existence check runs first and
/// wins over whatever the read command printed.
pub async fn installed_version(shell: &impl PrivilegedShell) -> Option<String> {
    let listing = shell
        .execute(&format!("ls -la {VERSION_MARKER_PATH}"))
        .await;
    if !listing.contains(VERSION_MARKER_PATH) || listing.contains(NO_SUCH_FILE) {
        return None;
    }
    let content = shell.execute(&format!("cat {VERSION_MARKER_PATH}")).await;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
