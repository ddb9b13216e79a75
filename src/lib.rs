//! readaid - reading aid with speech-synchronized highlighting
//!
//! Text is split into words and lines, read aloud by a speech engine on a
//! background thread, and every spoken position is reported back to the
//! display layer as a highlight event.

pub mod config;
pub mod display;
pub mod error;
pub mod playback;
pub mod source;
pub mod speech;
pub mod text;

pub use error::{ReadAidError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "readaid";
