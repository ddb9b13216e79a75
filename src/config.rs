//! Configuration management
//!
//! Reading preferences persist in an INI file at `~/.readaid.cfg`. Values that
//! are missing, unparsable or out of range fall back to (or are clamped
//! toward) the defaults, so a hand-edited file never stops the reader.

use crate::display::parse_hex_color;
use crate::playback::HighlightMode;
use crate::speech::engine::{clamp_rate, DEFAULT_RATE_WPM};
use crate::{ReadAidError, Result};
use ini::Ini;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_FONT_FAMILY: &str = "OpenDyslexic";
pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const DEFAULT_WORD_SPACING: u32 = 1;
pub const DEFAULT_LETTER_SPACING: u32 = 0;
pub const DEFAULT_BG_COLOR: &str = "#fff7ef";
pub const DEFAULT_FG_COLOR: &str = "#47342c";
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffe599";

/// Reading preferences backed by an INI file
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.readaid.cfg)
    path: PathBuf,
}

/// Resolved settings, as the reader uses them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub font_family: String,
    pub font_size: u32,
    pub word_spacing: u32,
    pub letter_spacing: u32,
    pub bg_color: String,
    pub fg_color: String,
    pub highlight_color: String,
    pub highlight_mode: HighlightMode,
    pub rate: u32,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| ReadAidError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| ReadAidError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| ReadAidError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.readaid.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readaid.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("display"))
            .set("font_family", DEFAULT_FONT_FAMILY)
            .set("font_size", DEFAULT_FONT_SIZE.to_string())
            .set("word_spacing", DEFAULT_WORD_SPACING.to_string())
            .set("letter_spacing", DEFAULT_LETTER_SPACING.to_string())
            .set("bg_color", DEFAULT_BG_COLOR)
            .set("fg_color", DEFAULT_FG_COLOR)
            .set("highlight_color", DEFAULT_HIGHLIGHT_COLOR);

        ini.with_section(Some("reading"))
            .set("highlight_mode", HighlightMode::default().as_str())
            .set("rate", DEFAULT_RATE_WPM.to_string());

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Integer setting clamped into `min..=max`
    fn get_clamped(&self, section: &str, key: &str, default: u32, min: u32, max: u32) -> u32 {
        let raw = self.get_int(section, key, default as i64);
        let clamped = raw.clamp(min as i64, max as i64) as u32;
        if clamped as i64 != raw {
            warn!("{} = {} out of range, using {}", key, raw, clamped);
        }
        clamped
    }

    /// Color setting, falling back to `default` unless it is `#rrggbb`
    fn get_color(&self, key: &str, default: &str) -> String {
        let value = self.get_string("display", key, default);
        if parse_hex_color(&value).is_some() {
            value
        } else {
            warn!("{} = {:?} is not a #rrggbb color, using {}", key, value, default);
            default.to_string()
        }
    }

    pub fn font_family(&self) -> String {
        self.get_string("display", "font_family", DEFAULT_FONT_FAMILY)
    }

    /// Font size in points (12-32)
    pub fn font_size(&self) -> u32 {
        self.get_clamped("display", "font_size", DEFAULT_FONT_SIZE, 12, 32)
    }

    /// Extra space between words (0-8)
    pub fn word_spacing(&self) -> u32 {
        self.get_clamped("display", "word_spacing", DEFAULT_WORD_SPACING, 0, 8)
    }

    /// Extra space between letters (0-4)
    pub fn letter_spacing(&self) -> u32 {
        self.get_clamped("display", "letter_spacing", DEFAULT_LETTER_SPACING, 0, 4)
    }

    pub fn bg_color(&self) -> String {
        self.get_color("bg_color", DEFAULT_BG_COLOR)
    }

    pub fn fg_color(&self) -> String {
        self.get_color("fg_color", DEFAULT_FG_COLOR)
    }

    pub fn highlight_color(&self) -> String {
        self.get_color("highlight_color", DEFAULT_HIGHLIGHT_COLOR)
    }

    /// Highlight granularity; unknown values mean word
    pub fn highlight_mode(&self) -> HighlightMode {
        HighlightMode::parse_lenient(&self.get_string("reading", "highlight_mode", "word"))
    }

    pub fn set_highlight_mode(&mut self, mode: HighlightMode) {
        self.set("reading", "highlight_mode", mode.as_str());
    }

    /// Speech rate in words per minute, clamped to the supported range
    pub fn rate(&self) -> u32 {
        clamp_rate(self.get_int("reading", "rate", DEFAULT_RATE_WPM as i64))
    }

    pub fn set_rate(&mut self, wpm: u32) {
        self.set("reading", "rate", &clamp_rate(wpm as i64).to_string());
    }

    /// All settings resolved at once
    pub fn snapshot(&self) -> Settings {
        Settings {
            font_family: self.font_family(),
            font_size: self.font_size(),
            word_spacing: self.word_spacing(),
            letter_spacing: self.letter_spacing(),
            bg_color: self.bg_color(),
            fg_color: self.fg_color(),
            highlight_color: self.highlight_color(),
            highlight_mode: self.highlight_mode(),
            rate: self.rate(),
        }
    }
}
