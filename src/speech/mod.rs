//! Speech synthesis system

pub mod backends;
pub mod engine;

pub use engine::{
    clamp_rate, EngineHandle, EngineLease, SessionEnd, SpeechEngine, SpeechJob,
    TransportCommand, DEFAULT_RATE_WPM, MAX_RATE_WPM, MIN_RATE_WPM,
};

use backends::native::NativeEngine;
use backends::paced::PacedEngine;
use log::info;

/// Create the process-wide speech engine handle
///
/// `silent` selects the paced backend, which keeps time without audio.
/// Otherwise the native backend is used; whether it can actually speak is
/// checked on the first `speak()`, which fails with `EngineUnavailable`
/// if not.
pub fn create_engine(silent: bool) -> EngineHandle {
    if silent {
        info!("Using silent paced speech backend");
        return EngineHandle::new(PacedEngine::new());
    }

    info!(
        "Using native speech backend for platform: {}",
        std::env::consts::OS
    );
    EngineHandle::new(NativeEngine::new())
}
