//! Error types for the verification harness

use thiserror::Error;

/// Errors that stop the harness before any scenario runs
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Failures inside a single transport attempt.
///
/// These never leave the correlator: every transport turns them into an
/// error-tagged body with status 0.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write request body: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("failed waiting for transport process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
