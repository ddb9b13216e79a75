//! Silent backend that only keeps time
//!
//! Walks the utterance word by word at the session rate without producing
//! audio. Used for `--silent` runs and wherever a deterministic engine is
//! needed.

use crate::speech::engine::{Beat, Pacer, SessionEnd, SpeechEngine, SpeechJob, TransportCommand};
use crate::Result;
use log::debug;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Silent, rate-paced engine
#[derive(Debug, Default)]
pub struct PacedEngine {
    /// Overrides the rate-derived time per word
    word_duration: Option<Duration>,
}

impl PacedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every word for `duration` regardless of rate
    pub fn with_word_duration(duration: Duration) -> Self {
        Self {
            word_duration: Some(duration),
        }
    }
}

impl SpeechEngine for PacedEngine {
    fn name(&self) -> &str {
        "paced"
    }

    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(
        &mut self,
        job: &SpeechJob,
        control: &Receiver<TransportCommand>,
        progress: &mut dyn FnMut(usize),
    ) -> Result<SessionEnd> {
        let count = job.text.split_whitespace().count();
        debug!("Paced engine: {} words at {} wpm", count, job.rate_wpm);

        let mut pacer = Pacer::new(control, job.rate_wpm).with_fixed_duration(self.word_duration);
        let mut idx = 0;
        while idx < count {
            progress(idx);
            match pacer.hold() {
                Beat::Next => idx += 1,
                Beat::Paused => {
                    if !pacer.wait_resume() {
                        return Ok(SessionEnd::Stopped);
                    }
                }
                Beat::Stopped => return Ok(SessionEnd::Stopped),
            }
        }

        Ok(SessionEnd::Completed)
    }
}
