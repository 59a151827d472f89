use thiserror::Error;

use crate::competition::EventKind;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Selection aborted for {kind} (competition {competition_id:?}): {source}")]
    SelectionAborted {
        kind: EventKind,
        competition_id: Option<u64>,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Failed to encode {what}: {source}")]
    Encoding {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Wraps an error raised while selecting a competition for `kind`.
    pub fn aborted(kind: EventKind, competition_id: Option<u64>, source: SyncError) -> Self {
        SyncError::SelectionAborted {
            kind,
            competition_id,
            source: Box::new(source),
        }
    }
}
