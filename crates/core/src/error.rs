use thiserror::Error;

use crate::model::{RunState, StepId, StepStatus};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbeError {
    #[error("probe unavailable on this platform: {0}")]
    Unavailable(String),
    #[error("`{command}` failed: {message}")]
    Command { command: String, message: String },
    #[error("failed to parse {source_name} output: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("protocol violation: expected resume for {expected:?} while {state:?}, got {supplied}")]
    ProtocolViolation {
        expected: Option<StepId>,
        supplied: StepId,
        state: RunState,
    },
    #[error("outcome for {outcome} cannot resume step {step}")]
    OutcomeMismatch { step: StepId, outcome: StepId },
    #[error("session already started (state {0:?})")]
    NotIdle(RunState),
    #[error("detection run is not complete (state {0:?})")]
    IncompleteRun(RunState),
    #[error("step {step} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        step: StepId,
        from: StepStatus,
        to: StepStatus,
    },
    #[error("measurement for {0} already recorded in this run")]
    MeasurementAlreadyRecorded(StepId),
}
