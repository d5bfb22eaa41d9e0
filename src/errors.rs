use std::{io, path::Path, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DenseGraphError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("contract violation: {0}")]
    Contract(String),
    #[error("io error on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("corrupt matrix {origin}: {reason}")]
    Format { origin: String, reason: String },
    #[error("cannot allocate a {vertices}x{vertices} matrix")]
    Allocation { vertices: usize },
    #[error("level {level} barrier timed out after {waited:?} with {pending} workers pending")]
    RoundTimeout {
        level: usize,
        pending: usize,
        waited: Duration,
    },
    #[error("worker failure: {0}")]
    Worker(String),
}

impl DenseGraphError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        DenseGraphError::Config(msg.into())
    }

    pub fn contract<T: Into<String>>(msg: T) -> Self {
        DenseGraphError::Contract(msg.into())
    }

    pub fn io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        DenseGraphError::Io {
            target: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn stream(source: io::Error) -> Self {
        DenseGraphError::Io {
            target: "stream".to_string(),
            source,
        }
    }

    pub fn format<O: Into<String>, R: Into<String>>(origin: O, reason: R) -> Self {
        DenseGraphError::Format {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub fn worker<T: Into<String>>(msg: T) -> Self {
        DenseGraphError::Worker(msg.into())
    }

    pub fn is_format(&self) -> bool {
        matches!(self, DenseGraphError::Format { .. })
    }
}
