//! Utterance segmentation into words and lines
//!
//! Offsets and lengths are counted in chars from the start of the utterance.
//!
//! Word offsets follow a single-space reconstruction: word `i` starts at the
//! summed length of the words before it plus one separator per prior word.
//! When the source separates words with more than one whitespace char (or has
//! leading whitespace) these offsets run ahead of the true source position.
//! Line offsets are exact: lines are split on `'\n'` only, so joining them back
//! with `'\n'` reproduces the input. Each word also records its exact line and
//! column, which is what line lookups and painting go through.

/// A word or line with its position in the utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub start: usize,
    pub len: usize,
}

impl Segment {
    /// Char offset one past the last char of this segment
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Where a word sits in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordPlacement {
    pub line: usize,
    /// Char offset from the start of the line
    pub column: usize,
}

/// Word and line tables for one utterance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentIndexTable {
    pub words: Vec<Segment>,
    pub lines: Vec<Segment>,
    /// One entry per word, parallel to `words`
    pub placements: Vec<WordPlacement>,
}

/// Split `text` into its word and line tables
pub fn segment(text: &str) -> SegmentIndexTable {
    SegmentIndexTable {
        words: offsets_with_separator(text.split_whitespace()),
        lines: offsets_with_separator(text.split('\n')),
        placements: word_placements(text),
    }
}

/// Exact line and column of every word, in reading order
fn word_placements(text: &str) -> Vec<WordPlacement> {
    let mut placements = Vec::new();
    for (line, line_text) in text.split('\n').enumerate() {
        let mut in_word = false;
        for (column, ch) in line_text.chars().enumerate() {
            if ch.is_whitespace() {
                in_word = false;
            } else if !in_word {
                in_word = true;
                placements.push(WordPlacement { line, column });
            }
        }
    }
    placements
}

/// Lay out pieces as if joined with a single one-char separator
fn offsets_with_separator<'a>(pieces: impl Iterator<Item = &'a str>) -> Vec<Segment> {
    let mut offset = 0;
    pieces
        .map(|piece| {
            let len = piece.chars().count();
            let segment = Segment {
                text: piece.to_string(),
                start: offset,
                len,
            };
            offset += len + 1;
            segment
        })
        .collect()
}

impl SegmentIndexTable {
    pub fn word(&self, idx: usize) -> Option<&Segment> {
        self.words.get(idx)
    }

    pub fn line(&self, idx: usize) -> Option<&Segment> {
        self.lines.get(idx)
    }

    /// True when there is nothing to speak
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn placement(&self, word_idx: usize) -> Option<WordPlacement> {
        self.placements.get(word_idx).copied()
    }

    /// Line index holding word `word_idx`
    pub fn line_index_for_word(&self, word_idx: usize) -> Option<usize> {
        self.placement(word_idx).map(|place| place.line)
    }

    /// Words joined with single spaces (whitespace runs collapse)
    pub fn join_words(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lines joined with `'\n'`; equal to the segmented text
    pub fn join_lines(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_offsets() {
        let table = segment("The quick brown fox");
        let starts: Vec<usize> = table.words.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 4, 10, 16]);
        assert_eq!(table.word(2).unwrap().text, "brown");
        assert_eq!(table.word(2).unwrap().len, 5);
        assert!(table.word(4).is_none());
    }

    #[test]
    fn test_word_offsets_collapse_runs() {
        // Offsets follow the single-space layout, not the source
        let table = segment("a   b\tc");
        let starts: Vec<usize> = table.words.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 2, 4]);
    }

    #[test]
    fn test_line_offsets() {
        let table = segment("Line one\nLine two\n\nend");
        assert_eq!(table.lines.len(), 4);
        assert_eq!(table.line(1).unwrap().start, 9);
        assert_eq!(table.line(2).unwrap().len, 0);
        assert_eq!(table.line(3).unwrap().start, 19);
    }

    #[test]
    fn test_offsets_count_chars() {
        let table = segment("café naïve\nüber");
        assert_eq!(table.word(1).unwrap().start, 5);
        assert_eq!(table.word(1).unwrap().len, 5);
        assert_eq!(table.line(1).unwrap().start, 11);
    }

    #[test]
    fn test_line_for_word() {
        let table = segment("Line one\nLine two");
        assert_eq!(table.line_index_for_word(0), Some(0));
        assert_eq!(table.line_index_for_word(1), Some(0));
        assert_eq!(table.line_index_for_word(2), Some(1));
        assert_eq!(table.line_index_for_word(3), Some(1));
        assert_eq!(table.line_index_for_word(4), None);
    }

    #[test]
    fn test_line_for_word_across_paragraphs() {
        let table = segment("First paragraph here.\n\nSecond one\nthird line");
        let lines: Vec<usize> = (0..table.words.len())
            .filter_map(|i| table.line_index_for_word(i))
            .collect();
        assert_eq!(lines, vec![0, 0, 0, 2, 2, 3, 3]);
    }

    #[test]
    fn test_placements_follow_source() {
        let table = segment("  a  bb\n\tc");
        assert_eq!(table.placements.len(), table.words.len());
        assert_eq!(table.placement(0), Some(WordPlacement { line: 0, column: 2 }));
        assert_eq!(table.placement(1), Some(WordPlacement { line: 0, column: 5 }));
        assert_eq!(table.placement(2), Some(WordPlacement { line: 1, column: 1 }));
        assert_eq!(table.placement(3), None);
    }

    #[test]
    fn test_empty_text() {
        let table = segment("");
        assert!(table.is_empty());
        assert_eq!(table.lines.len(), 1);
        assert_eq!(table.join_lines(), "");

        let blank = segment("  \n\t ");
        assert!(blank.is_empty());
        assert_eq!(blank.join_lines(), "  \n\t ");
    }

    #[test]
    fn test_crlf_kept_in_line() {
        let table = segment("one\r\ntwo");
        assert_eq!(table.line(0).unwrap().text, "one\r");
        assert_eq!(table.join_lines(), "one\r\ntwo");
    }
}
