//! Pipeline failure taxonomy.

use thiserror::Error;

use crate::rpc::RpcError;

/// Errors surfaced by an operation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required pipeline input was missing or empty. No remote call was issued.
    #[error("Invalid input: {code}")]
    InvalidInput { code: &'static str },

    /// A step's remote call failed.
    #[error("{code} (step `{step}`): {source}")]
    RemoteCallFailed {
        step: &'static str,
        code: &'static str,
        #[source]
        source: RpcError,
    },

    /// The step graph itself is malformed.
    #[error("Invalid step graph `{pipeline}`: {reason}")]
    InvalidGraph { pipeline: &'static str, reason: String },

    /// A step read a dependency output it did not declare, or with the wrong type.
    #[error("Step `{step}` could not read output of `{dependency}`")]
    MissingOutput {
        step: &'static str,
        dependency: &'static str,
    },
}

/// Coarse failure class, used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 400: the caller sent bad input.
    InvalidInput,
    /// 503: the node could not serve the request.
    RemoteUnavailable,
    /// 500: anything else.
    Internal,
}

impl FailureClass {
    pub fn status_code(&self) -> u16 {
        match self {
            FailureClass::InvalidInput => 400,
            FailureClass::RemoteUnavailable => 503,
            FailureClass::Internal => 500,
        }
    }
}

impl PipelineError {
    pub fn invalid_input(code: &'static str) -> Self {
        PipelineError::InvalidInput { code }
    }

    /// Build a `map_err` adapter tagging an [`RpcError`] with the failing step.
    pub fn remote(step: &'static str, code: &'static str) -> impl Fn(RpcError) -> Self + Copy {
        move |source| PipelineError::RemoteCallFailed { step, code, source }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            PipelineError::InvalidInput { .. } => FailureClass::InvalidInput,
            PipelineError::RemoteCallFailed { .. } => FailureClass::RemoteUnavailable,
            PipelineError::InvalidGraph { .. } | PipelineError::MissingOutput { .. } => {
                FailureClass::Internal
            }
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput { code } => *code,
            PipelineError::RemoteCallFailed { code, .. } => *code,
            PipelineError::InvalidGraph { .. } => "InvalidPipelineGraph",
            PipelineError::MissingOutput { .. } => "MissingStepOutput",
        }
    }

    /// Name of the failing step, when the failure came from one.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            PipelineError::RemoteCallFailed { step, .. } => Some(*step),
            PipelineError::MissingOutput { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
