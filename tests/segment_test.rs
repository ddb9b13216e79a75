//! Segmentation round-trip tests
//!
//! Lines must rebuild the input exactly; words rebuild it with whitespace
//! runs collapsed to single spaces.

use readaid::text::{preprocess, segment};

const SAMPLES: &[&str] = &[
    "",
    "single",
    "The quick brown fox",
    "Line one\nLine two",
    "  leading and trailing  ",
    "tabs\tand   runs\n\nof  space",
    "trailing newline\n",
    "\n\nstarts blank",
    "windows\r\nline\r\nendings",
    "Accents: café naïve\nCJK: 你好 世界\nEmoji 🎤 here",
];

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_lines_round_trip_exactly() {
    for sample in SAMPLES {
        assert_eq!(segment(sample).join_lines(), *sample, "sample {:?}", sample);
    }
}

#[test]
fn test_words_round_trip_collapsed() {
    for sample in SAMPLES {
        assert_eq!(segment(sample).join_words(), collapse(sample), "sample {:?}", sample);
    }
}

#[test]
fn test_offsets_monotonic() {
    for sample in SAMPLES {
        let table = segment(sample);
        for pair in table.words.windows(2) {
            assert!(pair[0].start <= pair[1].start, "sample {:?}", sample);
        }
        for pair in table.lines.windows(2) {
            assert!(pair[0].end() < pair[1].start, "sample {:?}", sample);
        }
    }
}

#[test]
fn test_line_offsets_match_source() {
    for sample in SAMPLES {
        let chars: Vec<char> = sample.chars().collect();
        for line in segment(sample).lines {
            let slice: String = chars[line.start..line.end()].iter().collect();
            assert_eq!(slice, line.text, "sample {:?}", sample);
        }
    }
}

#[test]
fn test_word_offsets_exact_after_preprocess() {
    // Single-space text keeps the approximate word offsets on target
    let text = preprocess("The  quick\tbrown   fox jumps");
    let chars: Vec<char> = text.chars().collect();
    for word in segment(&text).words {
        let slice: String = chars[word.start..word.end()].iter().collect();
        assert_eq!(slice, word.text);
    }
}

#[test]
fn test_word_offsets_drift_with_runs() {
    // Documented: offsets follow the single-space layout, not the source
    let table = segment("a    b");
    assert_eq!(table.word(1).unwrap().start, 2);
}

#[test]
fn test_placements_locate_every_word() {
    for sample in SAMPLES {
        let table = segment(sample);
        assert_eq!(table.placements.len(), table.words.len(), "sample {:?}", sample);
        for (word, place) in table.words.iter().zip(&table.placements) {
            let line: Vec<char> = table.line(place.line).unwrap().text.chars().collect();
            let slice: String = line[place.column..place.column + word.len].iter().collect();
            assert_eq!(slice, word.text, "sample {:?}", sample);
        }
    }
}

#[test]
fn test_paragraph_break_keeps_words_on_their_lines() {
    let text = preprocess("First paragraph here.\n\n\n\nSecond one\nthird line");
    let table = segment(&text);
    assert_eq!(table.line_index_for_word(3), Some(2));
    assert_eq!(table.line(2).unwrap().text, "Second one");
    assert_eq!(table.line_index_for_word(5), Some(3));
}
