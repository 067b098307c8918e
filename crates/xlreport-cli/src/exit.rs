//! Process exit codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: every task completed, or the export file was written |
//! | 1 | Failure: a task failed, an export failed, or the store was unreachable |
//! | 2 | Configuration error: unreadable config, unknown environment, empty allow-list |

use std::process;

use xlreport_core::{ConfigError, DispatchError};
use xlreport_dispatch::BatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    ConfigError = 2,
}

impl ExitCode {
    pub fn from_summary(summary: &BatchSummary) -> Self {
        if summary.is_success() {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }

    /// Exit code for an error that stopped the command.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let misconfigured = err.downcast_ref::<ConfigError>().is_some()
            || matches!(
                err.downcast_ref::<DispatchError>(),
                Some(DispatchError::MissingAllowList(_))
            );
        if misconfigured {
            ExitCode::ConfigError
        } else {
            ExitCode::Failure
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}
