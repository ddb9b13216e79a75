//! Configuration loading tests
//!
//! Settings load from a fresh file with defaults, survive a save/load cycle
//! and clamp hand-edited values instead of failing.

use readaid::config::{Config, DEFAULT_HIGHLIGHT_COLOR};
use readaid::playback::HighlightMode;
use std::fs;

#[test]
fn test_config_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readaid.cfg");

    let config = Config::load_from(&path).expect("Failed to load config");
    assert!(path.exists());

    let settings = config.snapshot();
    assert_eq!(settings.font_family, "OpenDyslexic");
    assert_eq!(settings.font_size, 16);
    assert_eq!(settings.word_spacing, 1);
    assert_eq!(settings.letter_spacing, 0);
    assert_eq!(settings.highlight_color, DEFAULT_HIGHLIGHT_COLOR);
    assert_eq!(settings.highlight_mode, HighlightMode::Word);
    assert_eq!(settings.rate, 170);
}

#[test]
fn test_config_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readaid.cfg");

    let mut config = Config::load_from(&path).unwrap();
    config.set_highlight_mode(HighlightMode::Line);
    config.set_rate(210);
    config.set("display", "highlight_color", "#a0c4ff");
    config.save().unwrap();

    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded.highlight_mode(), HighlightMode::Line);
    assert_eq!(reloaded.rate(), 210);
    assert_eq!(reloaded.highlight_color(), "#a0c4ff");
}

#[test]
fn test_config_clamps_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readaid.cfg");
    fs::write(
        &path,
        "[display]\nfont_size=99\nword_spacing=-3\nletter_spacing=oops\nfg_color=blue\n\
         [reading]\nhighlight_mode=sentence\nrate=20\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.font_size(), 32);
    assert_eq!(config.word_spacing(), 0);
    assert_eq!(config.letter_spacing(), 0);
    assert_eq!(config.fg_color(), "#47342c");
    assert_eq!(config.highlight_mode(), HighlightMode::Word);
    assert_eq!(config.rate(), 120);
}

#[test]
fn test_config_rate_setter_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::load_from(dir.path().join("readaid.cfg")).unwrap();
    config.set_rate(900);
    assert_eq!(config.get_int("reading", "rate", 0), 250);
}

#[test]
fn test_settings_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path().join("readaid.cfg")).unwrap();
    let json = serde_json::to_value(config.snapshot()).unwrap();
    assert_eq!(json["highlight_mode"], "word");
    assert_eq!(json["rate"], 170);
    assert_eq!(json["bg_color"], "#fff7ef");
}
