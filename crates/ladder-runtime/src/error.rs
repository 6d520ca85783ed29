//! Runtime errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::validate::ValidationReport;

/// Errors surfaced to callers of the ladder runtime.
///
/// Structural problems that have a sane default (an element without a tag,
/// a read of an unknown tag) never show up here; they are handled inside the
/// scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Serialized program is not a well-formed sequence of rung records.
    #[error("malformed program: {0}")]
    MalformedProgram(SmolStr),

    /// Pre-run check found blocking issues.
    #[error("program failed pre-run check: {0}")]
    Validation(ValidationReport),

    /// Periodic scanning is already active.
    #[error("scan already running")]
    AlreadyRunning,

    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),

    /// Thread spawn error.
    #[error("thread spawn error '{0}'")]
    ThreadSpawn(SmolStr),
}

impl RuntimeError {
    pub(crate) fn malformed(message: impl Into<SmolStr>) -> Self {
        Self::MalformedProgram(message.into())
    }
}
