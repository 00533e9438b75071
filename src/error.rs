use thiserror::Error;

use crate::records::RecordKind;

/// Failure at the loader boundary. The metrics engine itself never fails.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Local source could not be read.
    #[error("I/O error reading '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// Remote source could not be fetched.
    #[error("HTTP error fetching '{id}': {source}")]
    Http {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Remote source answered with a non-success status.
    #[error("'{id}' returned HTTP status {status}")]
    Status { id: String, status: u16 },

    #[error("invalid source url for '{id}': {source}")]
    InvalidUrl {
        id: String,
        #[source]
        source: url::ParseError,
    },

    /// Source has no header row at all.
    #[error("'{id}' has no header row")]
    MissingHeader { id: String },

    /// Header lacks the column every row of this kind needs.
    #[error("'{id}' is missing required {} column '{column}'", .kind.as_str())]
    MissingColumn {
        id: String,
        kind: RecordKind,
        column: &'static str,
    },
}

impl LoadError {
    pub fn source_id(&self) -> &str {
        match self {
            LoadError::Io { id, .. }
            | LoadError::Http { id, .. }
            | LoadError::Status { id, .. }
            | LoadError::InvalidUrl { id, .. }
            | LoadError::MissingHeader { id }
            | LoadError::MissingColumn { id, .. } => id,
        }
    }
}
