//! Application context — unified state passed to every command handler.

use std::path::PathBuf;

use crate::infra::download::HttpFetcher;
use crate::infra::github::GithubReleaseIndex;
use crate::infra::session::SuSession;
use crate::output::OutputContext;
use crate::output::reporter::TerminalReporter;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Enable JSON output mode.
    pub json: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Disable ANSI color output.
    pub no_color: bool,
}

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// When `true`, emit machine-readable JSON instead of styled lines.
    pub json: bool,
    /// The one shared elevated shell session.
    pub session: SuSession,
    /// Release index client.
    pub index: GithubReleaseIndex,
    /// Asset download client.
    pub fetcher: HttpFetcher,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            json: flags.json,
            session: SuSession::new(),
            index: GithubReleaseIndex::new(),
            fetcher: HttpFetcher::new(work_dir()),
        }
    }

    /// Reporter rendering service progress to this context's terminal.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}

/// Local unprivileged working directory for downloaded artifacts.
fn work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fridactl")
}
