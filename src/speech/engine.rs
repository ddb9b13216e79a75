//! Speech engine abstraction
//!
//! A speech engine runs one utterance at a time on a worker thread. It reads
//! transport commands from a channel and reports the index of every word it
//! starts speaking. The engine instance is shared by the whole process, so it
//! lives behind an [`EngineHandle`] and a session must hold an [`EngineLease`]
//! to drive it.

use crate::{ReadAidError, Result};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Slowest accepted speech rate in words per minute
pub const MIN_RATE_WPM: u32 = 120;

/// Fastest accepted speech rate in words per minute
pub const MAX_RATE_WPM: u32 = 250;

/// Rate used when nothing else is configured
pub const DEFAULT_RATE_WPM: u32 = 170;

/// Clamp a requested rate into `MIN_RATE_WPM..=MAX_RATE_WPM`
pub fn clamp_rate(wpm: i64) -> u32 {
    let clamped = wpm.clamp(MIN_RATE_WPM as i64, MAX_RATE_WPM as i64) as u32;
    if clamped as i64 != wpm {
        warn!(
            "Rate {} wpm out of range, using {} wpm ({}-{})",
            wpm, clamped, MIN_RATE_WPM, MAX_RATE_WPM
        );
    }
    clamped
}

/// Strict rate check for callers that want to reject bad input
pub fn validate_rate(wpm: i64) -> Result<u32> {
    if (MIN_RATE_WPM as i64..=MAX_RATE_WPM as i64).contains(&wpm) {
        Ok(wpm as u32)
    } else {
        Err(ReadAidError::InvalidRate(wpm))
    }
}

/// Time one word takes at `wpm`
pub fn word_duration(wpm: u32) -> Duration {
    Duration::from_secs_f64(60.0 / wpm.max(1) as f64)
}

/// Commands sent from the controller to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Pause,
    Resume,
    Stop,
    /// Best effort; engines may only honor it for the next utterance
    SetRate(u32),
}

/// One utterance handed to an engine
#[derive(Debug, Clone)]
pub struct SpeechJob {
    pub text: String,
    pub rate_wpm: u32,
}

/// How a session's `run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The engine reached the end of the utterance
    Completed,
    /// A stop command (or a dropped controller) ended it early
    Stopped,
}

/// Speech engine trait
///
/// `run` blocks the calling worker thread until the utterance finishes or a
/// `Stop` arrives. Word indices passed to `progress` are the engine's own and
/// must not go backwards except to repeat the current word after a resume.
pub trait SpeechEngine: Send {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Make sure the backend can speak
    ///
    /// Fails with `EngineUnavailable` when the backend is missing.
    fn prepare(&mut self) -> Result<()>;

    /// Speak one utterance
    fn run(
        &mut self,
        job: &SpeechJob,
        control: &Receiver<TransportCommand>,
        progress: &mut dyn FnMut(usize),
    ) -> Result<SessionEnd>;
}

/// Shared handle to the process-wide speech engine
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<Mutex<Box<dyn SpeechEngine>>>,
    leased: Arc<AtomicBool>,
}

impl EngineHandle {
    pub fn new<E: SpeechEngine + 'static>(engine: E) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    pub fn from_boxed(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            leased: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take exclusive use of the engine
    ///
    /// Fails with `EngineBusy` while another lease is alive.
    pub fn acquire(&self) -> Result<EngineLease> {
        self.leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReadAidError::EngineBusy)?;
        debug!("Engine lease acquired");
        Ok(EngineLease {
            handle: self.clone(),
        })
    }

    /// Whether some session currently holds the engine
    pub fn is_leased(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }
}

/// Exclusive right to drive the engine; released on drop
pub struct EngineLease {
    handle: EngineHandle,
}

impl EngineLease {
    /// Run `f` against the leased engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Box<dyn SpeechEngine>) -> R) -> R {
        // A panicking session must not lock everyone else out of speech
        let mut engine = self
            .handle
            .engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut engine)
    }
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        self.handle.leased.store(false, Ordering::Release);
        debug!("Engine lease released");
    }
}

/// What a [`Pacer`] saw while holding a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// The word's time ran out
    Next,
    Paused,
    Stopped,
}

/// Word clock shared by the backends
///
/// Holds each word for `60 / wpm` seconds while watching the control channel.
pub struct Pacer<'a> {
    control: &'a Receiver<TransportCommand>,
    rate_wpm: u32,
    fixed: Option<Duration>,
}

impl<'a> Pacer<'a> {
    pub fn new(control: &'a Receiver<TransportCommand>, rate_wpm: u32) -> Self {
        Self {
            control,
            rate_wpm,
            fixed: None,
        }
    }

    /// Use a fixed per-word duration instead of the rate
    pub fn with_fixed_duration(mut self, duration: Option<Duration>) -> Self {
        self.fixed = duration;
        self
    }

    pub fn rate_wpm(&self) -> u32 {
        self.rate_wpm
    }

    fn duration(&self) -> Duration {
        self.fixed.unwrap_or_else(|| word_duration(self.rate_wpm))
    }

    /// Hold the current word, returning early on pause or stop
    pub fn hold(&mut self) -> Beat {
        let deadline = Instant::now() + self.duration();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Beat::Next;
            }
            match self.control.recv_timeout(remaining) {
                Ok(TransportCommand::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    return Beat::Stopped
                }
                Ok(TransportCommand::Pause) => return Beat::Paused,
                Ok(TransportCommand::Resume) => {}
                Ok(TransportCommand::SetRate(wpm)) => {
                    debug!("Rate change to {} wpm takes effect on the next word", wpm);
                    self.rate_wpm = wpm;
                }
                Err(RecvTimeoutError::Timeout) => return Beat::Next,
            }
        }
    }

    /// Block while paused; true when resumed, false when stopped
    pub fn wait_resume(&mut self) -> bool {
        loop {
            match self.control.recv() {
                Ok(TransportCommand::Resume) => return true,
                Ok(TransportCommand::Stop) | Err(_) => return false,
                Ok(TransportCommand::SetRate(wpm)) => self.rate_wpm = wpm,
                Ok(TransportCommand::Pause) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct NullEngine;

    impl SpeechEngine for NullEngine {
        fn name(&self) -> &str {
            "null"
        }

        fn prepare(&mut self) -> Result<()> {
            Ok(())
        }

        fn run(
            &mut self,
            _job: &SpeechJob,
            _control: &Receiver<TransportCommand>,
            _progress: &mut dyn FnMut(usize),
        ) -> Result<SessionEnd> {
            Ok(SessionEnd::Completed)
        }
    }

    #[test]
    fn test_clamp_rate() {
        assert_eq!(clamp_rate(10), MIN_RATE_WPM);
        assert_eq!(clamp_rate(-5), MIN_RATE_WPM);
        assert_eq!(clamp_rate(180), 180);
        assert_eq!(clamp_rate(1000), MAX_RATE_WPM);
    }

    #[test]
    fn test_validate_rate() {
        assert_eq!(validate_rate(200).unwrap(), 200);
        assert!(matches!(validate_rate(50), Err(ReadAidError::InvalidRate(50))));
    }

    #[test]
    fn test_word_duration() {
        assert_eq!(word_duration(120), Duration::from_millis(500));
        assert_eq!(word_duration(0), Duration::from_secs(60));
    }

    #[test]
    fn test_lease_is_exclusive() {
        let handle = EngineHandle::new(NullEngine);
        let lease = handle.acquire().unwrap();
        assert!(handle.is_leased());
        assert!(matches!(handle.acquire(), Err(ReadAidError::EngineBusy)));

        let other = handle.clone();
        assert!(matches!(other.acquire(), Err(ReadAidError::EngineBusy)));

        drop(lease);
        assert!(!handle.is_leased());
        assert!(handle.acquire().is_ok());
    }

    #[test]
    fn test_lease_moves_to_thread() {
        let handle = EngineHandle::new(NullEngine);
        let lease = handle.acquire().unwrap();
        let name = std::thread::spawn(move || lease.with_engine(|e| e.name().to_string()))
            .join()
            .unwrap();
        assert_eq!(name, "null");
        assert!(!handle.is_leased());
    }

    #[test]
    fn test_pacer_stop() {
        let (tx, rx) = mpsc::channel();
        tx.send(TransportCommand::Stop).unwrap();
        let mut pacer = Pacer::new(&rx, 120);
        assert_eq!(pacer.hold(), Beat::Stopped);
    }

    #[test]
    fn test_pacer_pause_resume() {
        let (tx, rx) = mpsc::channel();
        tx.send(TransportCommand::SetRate(200)).unwrap();
        tx.send(TransportCommand::Pause).unwrap();
        tx.send(TransportCommand::Resume).unwrap();
        let mut pacer = Pacer::new(&rx, 120);
        assert_eq!(pacer.hold(), Beat::Paused);
        assert_eq!(pacer.rate_wpm(), 200);
        assert!(pacer.wait_resume());
    }

    #[test]
    fn test_pacer_elapses() {
        let (_tx, rx) = mpsc::channel();
        let mut pacer = Pacer::new(&rx, 120).with_fixed_duration(Some(Duration::from_millis(1)));
        assert_eq!(pacer.hold(), Beat::Next);
    }

    #[test]
    fn test_pacer_disconnected_stops() {
        let (tx, rx) = mpsc::channel::<TransportCommand>();
        drop(tx);
        let mut pacer = Pacer::new(&rx, 120);
        assert_eq!(pacer.hold(), Beat::Stopped);
        assert!(!pacer.wait_resume());
    }
}
