//! Text acquisition and export
//!
//! Files, standard input and the system clipboard all come back as one plain
//! string; nothing downstream cares where the text came from.

use crate::{ReadAidError, Result};
use arboard::Clipboard;
use log::debug;
use std::io::Read;
use std::path::Path;

/// Read a UTF-8 text file
pub fn read_file(path: &Path) -> Result<String> {
    debug!("Reading text from {:?}", path);
    let bytes = std::fs::read(path)
        .map_err(|e| ReadAidError::Input(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(String::from_utf8(bytes)?)
}

/// Read all of standard input
pub fn read_stdin() -> Result<String> {
    debug!("Reading text from stdin");
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

/// Get text from system clipboard
pub fn read_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| ReadAidError::Input(format!("Failed to open clipboard: {}", e)))?;

    clipboard
        .get_text()
        .map_err(|e| ReadAidError::Input(format!("No text in clipboard: {}", e)))
}

/// Write text to a file, replacing it
pub fn export_file(path: &Path, text: &str) -> Result<()> {
    debug!("Exporting {} chars to {:?}", text.len(), path);
    std::fs::write(path, text)
        .map_err(|e| ReadAidError::Input(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.txt");
        export_file(&path, "Line one\nLine two").unwrap();
        assert_eq!(read_file(&path).unwrap(), "Line one\nLine two");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ReadAidError::Input(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(read_file(&path), Err(ReadAidError::Utf8(_))));
    }
}
