//! Command execution status shared by the generation passes and the binary.

use std::fmt;

/// Outcome of a generation pass that can fail because of user configuration.
///
/// Internal invariant violations are not represented here; those are
/// returned as [`InternalError`](crate::InternalError).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecStatus {
    /// The pass completed.
    Success,
    /// The pass refused to run; the reason was reported as a diagnostic.
    FatalError,
}

impl ExecStatus {
    /// Returns `true` for [`ExecStatus::Success`].
    pub fn is_success(self) -> bool {
        self == ExecStatus::Success
    }

    /// Process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            ExecStatus::Success => 0,
            ExecStatus::FatalError => 1,
        }
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecStatus::Success => write!(f, "success"),
            ExecStatus::FatalError => write!(f, "fatal error"),
        }
    }
}
