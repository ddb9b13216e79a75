//! Error types for readaid

use std::io;
use thiserror::Error;

/// Main error type for readaid
///
/// Nothing here is fatal to the process. The playback controller returns to a
/// state that accepts a new `speak()` after any of these.
#[derive(Error, Debug)]
pub enum ReadAidError {
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Speech engine is already driven by another session")]
    EngineBusy,

    #[error("No text to speak")]
    EmptyInput,

    #[error("Invalid highlight mode: {0:?} (expected \"word\" or \"line\")")]
    InvalidMode(String),

    #[error("Invalid speech rate: {0} wpm")]
    InvalidRate(i64),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for readaid operations
pub type Result<T> = std::result::Result<T, ReadAidError>;

impl From<String> for ReadAidError {
    fn from(s: String) -> Self {
        ReadAidError::Other(s)
    }
}

impl From<&str> for ReadAidError {
    fn from(s: &str) -> Self {
        ReadAidError::Other(s.to_string())
    }
}
