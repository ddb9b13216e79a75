//! Native TTS backend using the tts crate
//!
//! The `tts` crate gives one interface over Speech Dispatcher on Linux,
//! AVFoundation on macOS and WinRT/SAPI on Windows. None of those report word
//! boundaries through it, so word positions are paced by the session rate.
//! The crate also has no pause, so pausing stops the utterance and resuming
//! speaks again from the word that was current.

use crate::speech::engine::{
    Beat, Pacer, SessionEnd, SpeechEngine, SpeechJob, TransportCommand, DEFAULT_RATE_WPM,
};
use crate::{ReadAidError, Result};
use log::{debug, error, info, warn};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tts::Tts as TtsCrate;

/// How often the tail of an utterance is polled for completion
const TAIL_POLL: Duration = Duration::from_millis(50);

/// Native TTS backend using the tts crate
///
/// The backend is created lazily on the first `prepare`, so a missing speech
/// service surfaces as `EngineUnavailable` from `speak()` rather than at
/// startup.
#[derive(Default)]
pub struct NativeEngine {
    /// The tts crate's TTS instance
    tts: Option<TtsCrate>,

    /// Rate last pushed to the backend (wpm)
    applied_rate: Option<u32>,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn tts(&mut self) -> Result<&mut TtsCrate> {
        self.tts
            .as_mut()
            .ok_or_else(|| ReadAidError::EngineUnavailable("TTS not initialized".to_string()))
    }

    /// Push a words-per-minute rate to the backend
    fn apply_rate(&mut self, wpm: u32) -> Result<()> {
        if self.applied_rate == Some(wpm) {
            return Ok(());
        }
        let tts = self.tts()?;

        let features = tts.supported_features();
        if !features.rate {
            warn!("Rate control not supported on this platform");
            return Ok(());
        }

        let converted = convert_rate(wpm, tts.min_rate(), tts.normal_rate(), tts.max_rate());
        debug!("Setting rate to {} wpm (backend rate {})", wpm, converted);
        tts.set_rate(converted)
            .map_err(|e| ReadAidError::Speech(format!("Failed to set rate: {}", e)))?;
        self.applied_rate = Some(wpm);
        Ok(())
    }

    /// Speak `words[from..]` as one utterance, replacing anything queued
    fn speak_from(&mut self, words: &[&str], from: usize) -> Result<()> {
        let text = words[from..].join(" ");
        if text.is_empty() {
            return Ok(());
        }
        debug!("Speaking from word {}: {} chars", from, text.len());
        self.tts()?.speak(text, true).map_err(|e| {
            error!("Failed to speak: {}", e);
            ReadAidError::Speech(format!("Speak failed: {}", e))
        })?;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        debug!("Halting speech");
        self.tts()?.stop().map_err(|e| {
            error!("Failed to stop speech: {}", e);
            ReadAidError::Speech(format!("Stop failed: {}", e))
        })?;
        Ok(())
    }

    fn is_speaking(&mut self) -> bool {
        match self.tts() {
            Ok(tts) if tts.supported_features().is_speaking => tts.is_speaking().unwrap_or(false),
            _ => false,
        }
    }

    /// Wait for the backend to finish the last words after the clock ran out
    fn drain_tail(
        &mut self,
        control: &Receiver<TransportCommand>,
        words: &[&str],
    ) -> Result<SessionEnd> {
        while self.is_speaking() {
            match control.recv_timeout(TAIL_POLL) {
                Ok(TransportCommand::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    self.halt()?;
                    return Ok(SessionEnd::Stopped);
                }
                Ok(TransportCommand::Pause) => {
                    self.halt()?;
                    let mut pacer = Pacer::new(control, DEFAULT_RATE_WPM);
                    if !pacer.wait_resume() {
                        return Ok(SessionEnd::Stopped);
                    }
                    self.speak_from(words, words.len().saturating_sub(1))?;
                }
                Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            }
        }
        Ok(SessionEnd::Completed)
    }
}

/// Convert a words-per-minute rate to the backend's rate scale
///
/// The backend's normal rate is taken to be `DEFAULT_RATE_WPM`.
fn convert_rate(wpm: u32, min: f32, normal: f32, max: f32) -> f32 {
    (normal * wpm as f32 / DEFAULT_RATE_WPM as f32).clamp(min, max)
}

impl SpeechEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn prepare(&mut self) -> Result<()> {
        if self.tts.is_some() {
            return Ok(());
        }

        debug!("Creating native TTS backend");
        let tts = TtsCrate::default().map_err(|e| {
            ReadAidError::EngineUnavailable(format!("Failed to initialize TTS: {}", e))
        })?;
        info!("Native TTS backend initialized");
        self.tts = Some(tts);
        self.applied_rate = None;
        Ok(())
    }

    fn run(
        &mut self,
        job: &SpeechJob,
        control: &Receiver<TransportCommand>,
        progress: &mut dyn FnMut(usize),
    ) -> Result<SessionEnd> {
        let words: Vec<&str> = job.text.split_whitespace().collect();
        let mut pacer = Pacer::new(control, job.rate_wpm);

        self.apply_rate(job.rate_wpm)?;
        self.speak_from(&words, 0)?;

        let mut idx = 0;
        while idx < words.len() {
            progress(idx);
            match pacer.hold() {
                Beat::Next => idx += 1,
                Beat::Paused => {
                    self.halt()?;
                    if !pacer.wait_resume() {
                        return Ok(SessionEnd::Stopped);
                    }
                    // Rate changes made while paused apply from here on
                    self.apply_rate(pacer.rate_wpm())?;
                    self.speak_from(&words, idx)?;
                }
                Beat::Stopped => {
                    self.halt()?;
                    return Ok(SessionEnd::Stopped);
                }
            }
        }

        self.drain_tail(control, &words)
    }
}
