//! Reporting sink for notable archive events
//!
//! Archive handles and builders hold their own reporter; nothing here is
//! process-global. Correctness never depends on what a reporter does.

use std::fmt;
use std::sync::Arc;

/// Severity of a reported event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// Progress and informational events
    Info,
    /// Skipped entries and redundant calls
    Warn,
    /// Failures, reported before the error propagates
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warn => f.write_str("warn"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Receiver of `(level, message)` events
pub trait Reporter: Send + Sync {
    /// Handle one event
    fn report(&self, level: ReportLevel, message: &str);
}

/// Shared reporter handle
pub type SharedReporter = Arc<dyn Reporter>;

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => tracing::info!("{message}"),
            ReportLevel::Warn => tracing::warn!("{message}"),
            ReportLevel::Error => tracing::error!("{message}"),
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _level: ReportLevel, _message: &str) {}
}

impl<F> Reporter for F
where
    F: Fn(ReportLevel, &str) + Send + Sync,
{
    fn report(&self, level: ReportLevel, message: &str) {
        self(level, message);
    }
}

/// Default reporter used when none is supplied
pub fn default_reporter() -> SharedReporter {
    Arc::new(TracingReporter)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter: SharedReporter = Arc::new(move |level: ReportLevel, msg: &str| {
            sink.lock().unwrap().push(format!("{level}: {msg}"));
        });

        reporter.report(ReportLevel::Warn, "entry missing");
        NullReporter.report(ReportLevel::Error, "dropped");

        assert_eq!(*seen.lock().unwrap(), vec!["warn: entry missing".to_string()]);
    }
}
