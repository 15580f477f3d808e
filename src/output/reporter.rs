//! Bridges the `ProgressReporter` port to the terminal.

use std::cell::RefCell;

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Renders service progress as a spinner on a TTY, as plain info lines
/// otherwise.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.show_progress() {
            let mut active = self.active.borrow_mut();
            match active.as_ref() {
                Some(pb) => pb.set_message(message.to_string()),
                None => *active = Some(progress::spinner(message)),
            }
        } else {
            self.ctx.info(message);
        }
    }

    fn success(&self, message: &str) {
        if let Some(pb) = self.active.borrow_mut().take() {
            progress::finish_ok(&pb, message);
        } else {
            self.ctx.success(message);
        }
    }

    fn warn(&self, message: &str) {
        if let Some(pb) = self.active.borrow_mut().take() {
            progress::finish_warn(&pb, message);
        } else {
            self.ctx.warn(message);
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        // A spinner left behind by an error path must not keep ticking
        // over the error message.
        if let Some(pb) = self.active.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}
