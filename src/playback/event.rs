//! Values exchanged between the controller and its observer

use crate::{ReadAidError, Result};
use log::warn;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Granularity of highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    #[default]
    Word,
    Line,
}

impl HighlightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightMode::Word => "word",
            HighlightMode::Line => "line",
        }
    }

    /// Parse a mode, falling back to `Word` for anything unrecognized
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e| {
            warn!("{}; using word highlighting", e);
            HighlightMode::Word
        })
    }
}

impl FromStr for HighlightMode {
    type Err = ReadAidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(HighlightMode::Word),
            "line" => Ok(HighlightMode::Line),
            _ => Err(ReadAidError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for HighlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    /// Nothing started, or the last utterance finished on its own
    Idle,
    Speaking,
    Paused,
    /// The last utterance was cut short by `stop()`
    Stopped,
}

impl PlaybackState {
    /// Whether a session is in flight
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Speaking | PlaybackState::Paused)
    }
}

/// Position change reported to the observer
///
/// Word-mode events leave `line_index` empty and line-mode events leave the
/// word fields empty, so the observer never paints a partial highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightEvent {
    pub word_index: Option<usize>,
    pub word_text: Option<String>,
    pub line_index: Option<usize>,
}

impl HighlightEvent {
    pub fn word(index: usize, text: impl Into<String>) -> Self {
        Self {
            word_index: Some(index),
            word_text: Some(text.into()),
            line_index: None,
        }
    }

    pub fn line(index: usize) -> Self {
        Self {
            word_index: None,
            word_text: None,
            line_index: Some(index),
        }
    }
}
