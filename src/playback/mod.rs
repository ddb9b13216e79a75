//! Playback controller
//!
//! Drives one speech session at a time against the shared engine and turns
//! engine word positions into highlight events.
//!
//! The controller lives on the interaction thread. Each session runs the
//! engine on its own worker thread, which reports back over a channel. The
//! observer is only ever called from [`PlaybackController::dispatch_pending`]
//! or [`PlaybackController::wait_and_dispatch`], so it runs on the interaction
//! thread too and never races with `stop()` or `speak()`: once `stop()`
//! returns the worker has been joined and its queued signals dropped.

pub mod event;
mod session;

pub use event::{HighlightEvent, HighlightMode, PlaybackState};

use crate::speech::engine::{
    clamp_rate, EngineHandle, EngineLease, SessionEnd, SpeechJob, TransportCommand,
    DEFAULT_RATE_WPM,
};
use crate::text::{segment, SegmentIndexTable};
use crate::{ReadAidError, Result};
use log::{debug, error, info, warn};
use session::Session;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Observer invoked with every highlight event
type Observer = Box<dyn FnMut(&HighlightEvent)>;

/// Messages from a session worker to the controller
#[derive(Debug)]
enum SessionSignal {
    Word { session: u64, index: usize },
    Finished { session: u64, end: SessionEnd },
    Failed { session: u64, error: String },
}

/// Worker thread running one session
struct Worker {
    control: Sender<TransportCommand>,
    thread: JoinHandle<()>,
}

/// Owner of the active playback session
pub struct PlaybackController {
    engine: EngineHandle,
    state: PlaybackState,
    rate_wpm: u32,
    mode: HighlightMode,

    /// Active session; `None` once stopped or finished
    session: Option<Session>,

    /// Index table of the most recent utterance, kept after it ends
    table: Option<Arc<SegmentIndexTable>>,

    worker: Option<Worker>,
    signal_tx: Sender<SessionSignal>,
    signal_rx: Receiver<SessionSignal>,
    observer: Option<Observer>,
    next_session: u64,
}

impl PlaybackController {
    /// Create a controller driving `engine`
    pub fn new(engine: EngineHandle) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel();
        Self {
            engine,
            state: PlaybackState::Idle,
            rate_wpm: DEFAULT_RATE_WPM,
            mode: HighlightMode::default(),
            session: None,
            table: None,
            worker: None,
            signal_tx,
            signal_rx,
            observer: None,
            next_session: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn rate(&self) -> u32 {
        self.rate_wpm
    }

    pub fn highlight_mode(&self) -> HighlightMode {
        self.mode
    }

    /// Word and line tables of the current (or last) utterance
    pub fn table(&self) -> Option<Arc<SegmentIndexTable>> {
        self.table.clone()
    }

    /// Last word index reported in the active session
    pub fn last_word_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.last_word())
    }

    /// Last line index reported in the active session
    pub fn last_line_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.last_line())
    }

    /// Register the observer, replacing any previous one
    pub fn set_callback<F>(&mut self, observer: F)
    where
        F: FnMut(&HighlightEvent) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_callback(&mut self) {
        self.observer = None;
    }

    /// Set the speech rate in words per minute
    ///
    /// Out-of-range values are clamped. The rate is guaranteed to apply from
    /// the next `speak()`; an utterance already in flight is only told about
    /// it, and whether it changes speed depends on the engine.
    pub fn set_rate(&mut self, wpm: u32) -> u32 {
        self.rate_wpm = clamp_rate(wpm as i64);
        debug!("Rate set to {} wpm", self.rate_wpm);
        if let Some(worker) = &self.worker {
            let _ = worker.control.send(TransportCommand::SetRate(self.rate_wpm));
        }
        self.rate_wpm
    }

    /// Switch highlight granularity from the next event on
    pub fn set_highlight_mode(&mut self, mode: HighlightMode) {
        debug!("Highlight mode set to {}", mode);
        self.mode = mode;
    }

    /// Switch highlight granularity by name; unknown names mean `word`
    pub fn set_highlight_mode_str(&mut self, mode: &str) -> HighlightMode {
        let mode = HighlightMode::parse_lenient(mode);
        self.set_highlight_mode(mode);
        mode
    }

    /// Start speaking `text`, ending any session in flight first
    pub fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            warn!("Nothing to speak");
            return Err(ReadAidError::EmptyInput);
        }

        if self.state.is_active() {
            info!("New utterance replaces the active session");
        }
        self.halt_session();

        let lease = match self.acquire_engine() {
            Ok(lease) => lease,
            Err(e) => {
                self.state = PlaybackState::Idle;
                return Err(e);
            }
        };

        let table = Arc::new(segment(text));
        self.next_session += 1;
        let id = self.next_session;
        let job = SpeechJob {
            text: text.to_string(),
            rate_wpm: self.rate_wpm,
        };

        let (control, control_rx) = mpsc::channel();
        let signals = self.signal_tx.clone();
        let thread = thread::Builder::new()
            .name(format!("readaid-session-{}", id))
            .spawn(move || run_session(id, lease, job, control_rx, signals))
            .map_err(|e| {
                self.state = PlaybackState::Idle;
                ReadAidError::Speech(format!("Failed to start speech thread: {}", e))
            })?;

        info!(
            "Session {} started: {} words, {} lines at {} wpm",
            id,
            table.words.len(),
            table.lines.len(),
            self.rate_wpm
        );
        self.session = Some(Session::new(id, Arc::clone(&table)));
        self.table = Some(table);
        self.worker = Some(Worker { control, thread });
        self.state = PlaybackState::Speaking;
        Ok(())
    }

    /// Suspend the active session
    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Speaking {
            debug!("Pause ignored in state {:?}", self.state);
            return Ok(());
        }
        self.send(TransportCommand::Pause);
        self.state = PlaybackState::Paused;
        info!("Playback paused");
        Ok(())
    }

    /// Continue a paused session from the engine's resume point
    pub fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            debug!("Resume ignored in state {:?}", self.state);
            return Ok(());
        }
        self.send(TransportCommand::Resume);
        self.state = PlaybackState::Speaking;
        info!("Playback resumed");
        Ok(())
    }

    /// End the active session
    ///
    /// When this returns the engine has been halted and no event from the
    /// session will reach the observer.
    pub fn stop(&mut self) -> Result<()> {
        if !self.state.is_active() {
            debug!("Stop ignored in state {:?}", self.state);
            return Ok(());
        }
        self.halt_session();
        self.state = PlaybackState::Stopped;
        info!("Playback stopped");
        Ok(())
    }

    /// Deliver every queued signal without blocking
    ///
    /// Returns the number of events handed to the observer.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(signal) = self.signal_rx.try_recv() {
            if self.handle_signal(signal) {
                delivered += 1;
            }
        }
        self.reap_dead_worker();
        delivered
    }

    /// Wait up to `timeout` for a signal, then deliver everything queued
    pub fn wait_and_dispatch(&mut self, timeout: Duration) -> usize {
        match self.signal_rx.recv_timeout(timeout) {
            Ok(signal) => {
                let first = usize::from(self.handle_signal(signal));
                first + self.dispatch_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.reap_dead_worker();
                0
            }
        }
    }

    fn acquire_engine(&self) -> Result<EngineLease> {
        let lease = self.engine.acquire()?;
        lease
            .with_engine(|engine| engine.prepare())
            .map_err(|e| match e {
                ReadAidError::EngineUnavailable(_) => e,
                other => ReadAidError::EngineUnavailable(other.to_string()),
            })?;
        Ok(lease)
    }

    fn send(&self, cmd: TransportCommand) {
        if let Some(worker) = &self.worker {
            if worker.control.send(cmd).is_err() {
                debug!("Session worker already gone, {:?} dropped", cmd);
            }
        }
    }

    /// Stop and join the worker, then drop everything it queued
    fn halt_session(&mut self) {
        self.session = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.control.send(TransportCommand::Stop);
            if worker.thread.join().is_err() {
                error!("Speech thread panicked");
            }
        }
        let mut dropped = 0;
        while self.signal_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Discarded {} signals from the halted session", dropped);
        }
    }

    /// Handle one worker signal; true when an event reached the observer
    fn handle_signal(&mut self, signal: SessionSignal) -> bool {
        let active = self.session.as_ref().map(|s| s.id);
        match signal {
            SessionSignal::Word { session, index } => {
                if active != Some(session) || self.state != PlaybackState::Speaking {
                    debug!(
                        "Word {} of session {} discarded in state {:?}",
                        index, session, self.state
                    );
                    return false;
                }
                let Some(event) = self
                    .session
                    .as_mut()
                    .and_then(|s| s.advance(index, self.mode))
                else {
                    return false;
                };
                match self.observer.as_mut() {
                    Some(observer) => {
                        observer(&event);
                        true
                    }
                    None => false,
                }
            }
            SessionSignal::Finished { session, end } if active == Some(session) => {
                info!("Session {} finished ({:?})", session, end);
                self.finish_session();
                false
            }
            SessionSignal::Failed { session, error } if active == Some(session) => {
                error!("Session {} failed: {}", session, error);
                self.finish_session();
                false
            }
            other => {
                debug!("Stale signal discarded: {:?}", other);
                false
            }
        }
    }

    /// Return to `Idle` after the worker ended on its own
    fn finish_session(&mut self) {
        self.session = None;
        if let Some(worker) = self.worker.take() {
            if worker.thread.join().is_err() {
                error!("Speech thread panicked");
            }
        }
        self.state = PlaybackState::Idle;
    }

    /// Recover from a worker that died without reporting back
    fn reap_dead_worker(&mut self) {
        let dead = self
            .worker
            .as_ref()
            .map_or(false, |worker| worker.thread.is_finished());
        if dead && self.state.is_active() {
            // The final signal may have been queued after the last drain
            while let Ok(signal) = self.signal_rx.try_recv() {
                self.handle_signal(signal);
            }
            if self.worker.is_some() {
                warn!("Speech thread exited without reporting, returning to idle");
                self.finish_session();
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.halt_session();
    }
}

/// Body of a session worker thread
fn run_session(
    id: u64,
    lease: EngineLease,
    job: SpeechJob,
    control: Receiver<TransportCommand>,
    signals: Sender<SessionSignal>,
) {
    let outcome = {
        let mut progress = |index: usize| {
            let _ = signals.send(SessionSignal::Word { session: id, index });
        };
        lease.with_engine(|engine| {
            debug!("Session {} running on {} engine", id, engine.name());
            engine.run(&job, &control, &mut progress)
        })
    };
    // Release the engine before the controller can observe the end
    drop(lease);

    let signal = match outcome {
        Ok(end) => SessionSignal::Finished { session: id, end },
        Err(e) => SessionSignal::Failed {
            session: id,
            error: e.to_string(),
        },
    };
    let _ = signals.send(signal);
}
