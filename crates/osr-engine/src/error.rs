#![forbid(unsafe_code)]

//! Engine-side error types.

use crate::browser::FrameId;

/// A remote command or message exchange failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine rejected or failed to deliver a command.
    #[error("{command} failed: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },
    /// The browser (or its process) no longer exists.
    #[error("browser is gone")]
    BrowserGone,
    /// A process message payload did not match its kind.
    #[error("invalid {kind} message: {reason}")]
    Codec { kind: &'static str, reason: String },
}

impl EngineError {
    /// Shorthand for [`EngineError::CommandFailed`].
    #[must_use]
    pub fn command(command: &'static str, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command,
            reason: reason.into(),
        }
    }
}

/// Why a script evaluation did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// The script threw inside the renderer.
    #[error("script threw: {message}")]
    Script { message: String },
    /// The frame's script context went away while the evaluation was in flight.
    #[error("context of frame {frame_id} was released")]
    FrameInvalidated { frame_id: FrameId },
    /// The browser was torn down while the evaluation was in flight.
    #[error("browser was destroyed before the evaluation completed")]
    BrowserDestroyed,
    /// The bridge was dropped without answering.
    #[error("evaluation was abandoned")]
    Abandoned,
    /// The result did not deserialize into the requested type.
    #[error("could not decode evaluation result: {0}")]
    Decode(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Native object registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("an object named `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("`{0}` is not a valid object name")]
    InvalidName(String),
}

/// Failures while invoking a native object method on behalf of script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectCallError {
    #[error("no object named `{0}` is registered")]
    UnknownObject(String),
    #[error("`{object}` has no method `{method}`")]
    UnknownMethod { object: String, method: String },
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_wraps_into_evaluation_error() {
        let err: EvaluationError = EngineError::BrowserGone.into();
        assert_eq!(err.to_string(), "browser is gone");
    }

    #[test]
    fn command_shorthand() {
        let err = EngineError::command("was_resized", "ipc closed");
        assert_eq!(err.to_string(), "was_resized failed: ipc closed");
    }

    #[test]
    fn frame_invalidated_mentions_frame() {
        let err = EvaluationError::FrameInvalidated { frame_id: 7 };
        assert!(err.to_string().contains('7'));
    }
}
