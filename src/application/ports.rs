//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

// ── Privileged Shell Port ─────────────────────────────────────────────────────

/// One shared elevated shell session.
///
/// Implementations own at most one live shell process and must serialize
/// `execute` internally: the protocol has no per-command framing, so two
/// overlapping commands would interleave their responses. Callers must still
/// treat `execute` as at-most-once with no completion barrier — the session
/// waits a fixed settle delay and drains whatever output has arrived, so
/// slow commands can be truncated or carried over into the next call.
#[allow(async_fn_in_trait)]
pub trait PrivilegedShell {
    /// Run `command` in the elevated shell and return captured stdout.
    ///
    /// Best-effort: returns an empty string on any failure, including
    /// "no elevated access available". Never panics, never errors.
    async fn execute(&self, command: &str) -> String;

    /// One-shot probe for elevated access, independent of the live session.
    ///
    /// Returns `true` only when the probe command exits successfully and
    /// its output carries the root identity marker.
    async fn elevated(&self) -> bool;

    /// Tear down the live session: send the exit directive, close the
    /// command stream and terminate the process. A later `execute`
    /// recreates the session from scratch.
    async fn close(&self);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
