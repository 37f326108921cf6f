use std::io;

use thiserror::Error;

/// Structural problems with an analysis payload. Raised before anything is
/// installed into a session, so derived views never see a partial result.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("analysis payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("analysis payload has the wrong shape: {0}")]
    Structure(#[source] serde_json::Error),
    #[error("record {index} is malformed: {reason}")]
    BadRecord { index: usize, reason: String },
    #[error("history entry {index} is malformed: {reason}")]
    BadHistory { index: usize, reason: String },
}

/// Any failure talking to the analysis service. The session treats every
/// variant the same way: back to idle with a notice.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read dataset '{path}': {source}")]
    Dataset { path: String, source: io::Error },
    #[error("analysis service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis service returned status {0}")]
    Status(u16),
    #[error("upload worker stopped before finishing")]
    Interrupted,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not persist report: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("config file '{path}' is invalid: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("please select a file first")]
    NoFileSelected,
    #[error("an upload is already in progress")]
    UploadInFlight,
    #[error("no analysis result is loaded")]
    NoAnalysis,
    #[error("upload was superseded by a newer request")]
    Superseded,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Malformed(#[from] ModelError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
