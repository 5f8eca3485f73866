use reqwest::StatusCode;
use strum::Display;
use thiserror::Error;

/// Remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("title is required")]
    Validation,

    #[error("{operation} returned HTTP {status}")]
    Status {
        operation: Operation,
        status: StatusCode,
        body: Option<String>,
    },

    #[error("{operation} request could not be completed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} response could not be decoded: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
}

impl NotesError {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            NotesError::Validation => None,
            NotesError::Status { operation, .. }
            | NotesError::Transport { operation, .. }
            | NotesError::Decode { operation, .. } => Some(*operation),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, NotesError::Validation)
    }
}
