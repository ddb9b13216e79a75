//! Display side of highlighting
//!
//! Turns highlight events into character spans over the utterance and paints
//! them in the terminal, or serializes them as JSON lines for other tools.
//! Painted lines carry the reading style: word and letter spacing widen the
//! text, and the background and text colors cover the whole line.

use crate::config::{Settings, DEFAULT_BG_COLOR, DEFAULT_FG_COLOR, DEFAULT_HIGHLIGHT_COLOR};
use crate::playback::HighlightEvent;
use crate::text::SegmentIndexTable;
use crate::Result;
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;

/// Range of chars to paint, counted from the start of the utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub len: usize,
}

/// Line and column range painted for `event`
fn locate(event: &HighlightEvent, table: &SegmentIndexTable) -> Option<(usize, usize, usize)> {
    match (event.word_index, event.line_index) {
        (Some(word), _) => {
            let place = table.placement(word)?;
            let len = table.word(word)?.len;
            Some((place.line, place.column, place.column + len))
        }
        (None, Some(line)) => Some((line, 0, table.line(line)?.len)),
        (None, None) => None,
    }
}

/// Span covered by `event`: its word if it names one, else its line
pub fn highlight_span(event: &HighlightEvent, table: &SegmentIndexTable) -> Option<HighlightSpan> {
    let (line, from, to) = locate(event, table)?;
    Some(HighlightSpan {
        start: table.line(line)?.start + from,
        len: to - from,
    })
}

/// Parse `#rrggbb` into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    event: &'a HighlightEvent,
    span: Option<HighlightSpan>,
}

#[derive(Serialize)]
struct StyleLine<'a> {
    style: &'a Settings,
}

fn background(rgb: (u8, u8, u8)) -> String {
    format!("\x1b[48;2;{};{};{}m", rgb.0, rgb.1, rgb.2)
}

fn foreground(rgb: (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{};{};{}m", rgb.0, rgb.1, rgb.2)
}

/// Terminal renderer for one utterance
#[derive(Clone)]
pub struct TerminalView {
    table: Arc<SegmentIndexTable>,
    settings: Settings,
    highlight: (u8, u8, u8),
    bg: (u8, u8, u8),
    fg: (u8, u8, u8),
    json: bool,
}

impl TerminalView {
    /// Colors that fail to parse fall back to the stock palette
    pub fn new(table: Arc<SegmentIndexTable>, settings: &Settings) -> Self {
        let color = |value: &str, default: &str| {
            parse_hex_color(value)
                .or_else(|| parse_hex_color(default))
                .unwrap_or((0, 0, 0))
        };
        Self {
            table,
            highlight: color(&settings.highlight_color, DEFAULT_HIGHLIGHT_COLOR),
            bg: color(&settings.bg_color, DEFAULT_BG_COLOR),
            fg: color(&settings.fg_color, DEFAULT_FG_COLOR),
            settings: settings.clone(),
            json: false,
        }
    }

    /// Emit JSON lines instead of painted text
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// JSON record with the reading style, sent ahead of the events so a
    /// front end can lay the text out before highlighting it
    pub fn style_line(&self) -> Result<String> {
        Ok(serde_json::to_string(&StyleLine {
            style: &self.settings,
        })?)
    }

    /// Render one event as a single output line
    pub fn render(&self, event: &HighlightEvent) -> Result<String> {
        if self.json {
            let span = highlight_span(event, &self.table);
            return Ok(serde_json::to_string(&JsonLine { event, span })?);
        }
        Ok(locate(event, &self.table)
            .map(|(line, from, to)| self.paint(line, from..to))
            .unwrap_or_default())
    }

    /// Line `line` with no highlight, as shown once reading pauses or stops
    pub fn render_plain(&self, line: usize) -> String {
        self.paint(line, 0..0)
    }

    /// Line `line` in the reading style, with the chars in `marked` highlighted
    fn paint(&self, line: usize, marked: Range<usize>) -> String {
        let Some(line) = self.table.line(line) else {
            return String::new();
        };

        let chars: Vec<char> = line.text.chars().collect();
        let word_gap = " ".repeat(self.settings.word_spacing as usize);
        let letter_gap = " ".repeat(self.settings.letter_spacing as usize);
        let plain = background(self.bg);
        let lit = background(self.highlight);

        let mut out = format!("{}{}", plain, foreground(self.fg));
        for (i, &ch) in chars.iter().enumerate() {
            if i == marked.start && !marked.is_empty() {
                out.push_str(&lit);
            }
            out.push(ch);
            let next = chars.get(i + 1);
            if ch.is_whitespace() {
                if next.map_or(false, |c| !c.is_whitespace()) {
                    out.push_str(&word_gap);
                }
            } else if next.map_or(false, |c| !c.is_whitespace()) && i + 1 != marked.end {
                out.push_str(&letter_gap);
            }
            if i + 1 == marked.end && !marked.is_empty() {
                out.push_str(&plain);
                if next.map_or(false, |c| !c.is_whitespace()) {
                    out.push_str(&letter_gap);
                }
            }
        }
        out.push_str("\x1b[0m");
        out
    }
}
