//! Host-level reporting.
//!
//! Every failure path reports through a [`Reporter`] exactly once before the
//! error is handed back to the caller, so callers never have to re-derive
//! the reason a host was skipped.

use log::{debug, error};

use crate::error::Error;

/// Sink for per-host failure and progress messages.
pub trait Reporter: Send + Sync {
    /// Record a failure for `subject` (normally the host name).
    fn log_failure(&self, subject: &str, message: &str);

    /// Record a progress message.
    fn log_debug(&self, message: &str);
}

/// Reporter that forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn log_failure(&self, subject: &str, message: &str) {
        error!("{}: {}", subject, message);
    }

    fn log_debug(&self, message: &str) {
        debug!("{}", message);
    }
}

/// Report `err` against `subject` and return it.
pub(crate) fn fail(reporter: &dyn Reporter, subject: &str, err: impl Into<Error>) -> Error {
    let err = err.into();
    reporter.log_failure(subject, &err.to_string());
    err
}
