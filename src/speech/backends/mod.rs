//! Speech backends

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// Silent backend that only paces word positions
pub mod paced;
