//! Per-utterance position tracking

use super::event::{HighlightEvent, HighlightMode};
use crate::text::SegmentIndexTable;
use log::debug;
use std::sync::Arc;

/// Position bookkeeping for one playback session
pub(crate) struct Session {
    pub id: u64,
    pub table: Arc<SegmentIndexTable>,
    last_word: Option<usize>,
    last_line: Option<usize>,
}

impl Session {
    pub fn new(id: u64, table: Arc<SegmentIndexTable>) -> Self {
        Self {
            id,
            table,
            last_word: None,
            last_line: None,
        }
    }

    pub fn last_word(&self) -> Option<usize> {
        self.last_word
    }

    pub fn last_line(&self) -> Option<usize> {
        self.last_line
    }

    /// Map an engine word index to the event for `mode`
    ///
    /// Indices past the word table, or behind the last reported word, yield
    /// nothing.
    pub fn advance(&mut self, index: usize, mode: HighlightMode) -> Option<HighlightEvent> {
        let Some(word) = self.table.word(index) else {
            debug!(
                "Engine index {} beyond {} words, ignored",
                index,
                self.table.words.len()
            );
            return None;
        };

        if self.last_word.map_or(false, |last| index < last) {
            debug!("Engine index {} behind last reported word, ignored", index);
            return None;
        }

        let line = self.table.line_index_for_word(index);
        self.last_word = Some(index);
        self.last_line = line;

        match mode {
            HighlightMode::Word => Some(HighlightEvent::word(index, word.text.as_str())),
            HighlightMode::Line => line.map(HighlightEvent::line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::segment;

    fn session(text: &str) -> Session {
        Session::new(1, Arc::new(segment(text)))
    }

    #[test]
    fn test_word_mode_event() {
        let mut s = session("The quick brown fox");
        assert_eq!(
            s.advance(2, HighlightMode::Word),
            Some(HighlightEvent::word(2, "brown"))
        );
        assert_eq!(s.last_word(), Some(2));
        assert_eq!(s.last_line(), Some(0));
    }

    #[test]
    fn test_line_mode_event() {
        let mut s = session("Line one\nLine two");
        assert_eq!(s.advance(1, HighlightMode::Line), Some(HighlightEvent::line(0)));
        assert_eq!(s.advance(2, HighlightMode::Line), Some(HighlightEvent::line(1)));
    }

    #[test]
    fn test_line_mode_after_paragraph_break() {
        let mut s = session("First paragraph here.\n\nSecond one\nthird line");
        assert_eq!(s.advance(2, HighlightMode::Line), Some(HighlightEvent::line(0)));
        assert_eq!(s.advance(3, HighlightMode::Line), Some(HighlightEvent::line(2)));
        assert_eq!(s.advance(5, HighlightMode::Line), Some(HighlightEvent::line(3)));
        assert_eq!(s.last_line(), Some(3));
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut s = session("one two");
        assert_eq!(s.advance(7, HighlightMode::Word), None);
        assert_eq!(s.last_word(), None);
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut s = session("a b c d");
        assert!(s.advance(2, HighlightMode::Word).is_some());
        assert_eq!(s.advance(1, HighlightMode::Word), None);
        // Repeating the current word after a resume is fine
        assert!(s.advance(2, HighlightMode::Word).is_some());
        assert!(s.advance(3, HighlightMode::Word).is_some());
    }

    #[test]
    fn test_mode_switch_between_events() {
        let mut s = session("a b\nc d");
        assert_eq!(s.advance(0, HighlightMode::Word), Some(HighlightEvent::word(0, "a")));
        assert_eq!(s.advance(2, HighlightMode::Line), Some(HighlightEvent::line(1)));
    }
}
