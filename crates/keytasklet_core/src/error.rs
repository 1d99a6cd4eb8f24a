//! Error taxonomy for collaborators and the button module.
//!
//! # Invariants
//! - Every error here is recovered locally: it is reported and logged, and
//!   never aborts startup or a deferred run.

use crate::model::source::{LineId, TriggerId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures surfaced by a line controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    AlreadyClaimed(LineId),
    InvalidLine(LineId),
    NotAcquired(LineId),
    Hardware { line: LineId, message: String },
}

impl Display for LineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyClaimed(line) => write!(f, "{line} is already claimed"),
            Self::InvalidLine(line) => write!(f, "{line} does not exist"),
            Self::NotAcquired(line) => write!(f, "{line} is not held by this module"),
            Self::Hardware { line, message } => write!(f, "{line} hardware fault: {message}"),
        }
    }
}

impl Error for LineError {}

/// Failures surfaced by an interrupt controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrqError {
    TriggerBusy(TriggerId),
    InvalidTrigger(TriggerId),
}

impl Display for IrqError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TriggerBusy(trigger) => write!(f, "{trigger} already has a handler"),
            Self::InvalidTrigger(trigger) => write!(f, "{trigger} cannot be bound"),
        }
    }
}

impl Error for IrqError {}

/// Recoverable failures of the button module, keyed by source name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonError {
    ResourceUnavailable { name: &'static str, err: LineError },
    RegistrationFailed { name: &'static str, err: IrqError },
    StateQueryFailed { name: &'static str, err: LineError },
}

impl ButtonError {
    /// Name of the source the failure belongs to.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::ResourceUnavailable { name, .. }
            | Self::RegistrationFailed { name, .. }
            | Self::StateQueryFailed { name, .. } => name,
        }
    }

    /// Stable metadata code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ResourceUnavailable { .. } => "resource_unavailable",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::StateQueryFailed { .. } => "state_query_failed",
        }
    }
}

impl Display for ButtonError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceUnavailable { name, err } => {
                write!(f, "{name}: line unavailable: {err}")
            }
            Self::RegistrationFailed { name, err } => {
                write!(f, "{name}: handler registration failed: {err}")
            }
            Self::StateQueryFailed { name, err } => {
                write!(f, "{name}: line state query failed: {err}")
            }
        }
    }
}

impl Error for ButtonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ResourceUnavailable { err, .. } | Self::StateQueryFailed { err, .. } => Some(err),
            Self::RegistrationFailed { err, .. } => Some(err),
        }
    }
}

/// Misuse of the lifecycle manager itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    AlreadyStarted,
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "button module is already started"),
        }
    }
}

impl Error for LifecycleError {}

#[cfg(test)]
mod tests {
    use super::{ButtonError, IrqError, LineError};
    use crate::model::source::{LineId, TriggerId};
    use std::error::Error;

    #[test]
    fn button_errors_chain_collaborator_cause() {
        let err = ButtonError::ResourceUnavailable {
            name: "KEY_UP",
            err: LineError::AlreadyClaimed(LineId(0)),
        };
        assert_eq!(err.code(), "resource_unavailable");
        assert_eq!(err.source_name(), "KEY_UP");
        assert_eq!(
            err.to_string(),
            "KEY_UP: line unavailable: line0 is already claimed"
        );
        let cause = err.source().expect("cause is chained");
        assert_eq!(cause.to_string(), "line0 is already claimed");
    }

    #[test]
    fn registration_failure_names_trigger() {
        let err = ButtonError::RegistrationFailed {
            name: "KEY_DOWN",
            err: IrqError::TriggerBusy(TriggerId(1)),
        };
        assert!(err.to_string().contains("irq1 already has a handler"));
    }
}
