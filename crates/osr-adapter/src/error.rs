#![forbid(unsafe_code)]

//! Adapter error taxonomy.

use osr_backend::HostError;
use osr_engine::{EngineError, RegistryError};

/// A fault raised inside the engine's browser process and reported through
/// the unhandled-exception system message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("browser process raised {exception_type}: {message}")]
pub struct RemoteException {
    pub exception_type: String,
    pub message: String,
    pub stack_trace: String,
}

/// Everything the adapter can report, to a caller or through the
/// unhandled-exception event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A handler panicked; the panic was caught at the fail-soft boundary.
    #[error("panicked: {message}")]
    Panic { message: String },
    /// Originated in the remote browser process.
    #[error(transparent)]
    RemoteProcess(#[from] RemoteException),
}

impl AdapterError {
    /// True if the fault happened in the remote process.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteProcess(_))
    }

    #[must_use]
    pub fn as_remote(&self) -> Option<&RemoteException> {
        match self {
            Self::RemoteProcess(remote) => Some(remote),
            _ => None,
        }
    }
}
