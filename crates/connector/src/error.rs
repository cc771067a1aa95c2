use dayabase_core::{EngineKind, UnsupportedEngine};
use thiserror::Error;

/// Failures from the backend connector. Engine messages are carried verbatim.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Unsupported database type: {0}")]
    UnsupportedEngine(String),

    /// Invalid profile for the engine, detected before any I/O.
    #[error("{0}")]
    Config(String),

    #[error("{message}")]
    Connect { engine: EngineKind, message: String },

    #[error("{message}")]
    Execute { engine: EngineKind, message: String },

    #[error("{message}")]
    Close { engine: EngineKind, message: String },
}

impl ConnectorError {
    pub(crate) fn connect(engine: EngineKind, err: impl std::fmt::Display) -> Self {
        Self::Connect {
            engine,
            message: err.to_string(),
        }
    }

    pub(crate) fn execute(engine: EngineKind, err: impl std::fmt::Display) -> Self {
        Self::Execute {
            engine,
            message: err.to_string(),
        }
    }

    pub(crate) fn close(engine: EngineKind, err: impl std::fmt::Display) -> Self {
        Self::Close {
            engine,
            message: err.to_string(),
        }
    }

    pub(crate) fn closed(engine: EngineKind) -> Self {
        Self::execute(engine, format!("{} connection is already closed", engine))
    }
}

impl From<UnsupportedEngine> for ConnectorError {
    fn from(err: UnsupportedEngine) -> Self {
        Self::UnsupportedEngine(err.0)
    }
}
