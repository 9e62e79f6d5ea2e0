//! Continuous voice-capture session state machine
//!
//! Wraps the external speech capability and governs start, stop, supervised
//! auto-restart and error handling. Recognized text lands in the pending
//! input buffer, which the controller drains at submission time.

use super::engine::{EngineEvent, SpeechCapability, SpeechEngine};
use crate::{CoachError, Result};
use tracing::{debug, warn};

/// Voice capture state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// No capture in progress
    #[default]
    Idle,
    /// An engine run is (or should be) live and feeding the input buffer
    Listening,
    /// Permission or service denied; the microphone control is frozen
    Denied,
}

impl VoiceState {
    pub fn is_idle(&self) -> bool {
        matches!(self, VoiceState::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, VoiceState::Listening)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, VoiceState::Denied)
    }
}

impl std::fmt::Display for VoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
            VoiceState::Denied => write!(f, "Denied"),
        }
    }
}

/// Voice capture session
///
/// Owns at most one live engine instance at a time. Every transition out of
/// `Listening` other than a successful supervised restart stops the current
/// instance.
pub struct VoiceSession {
    capability: Box<dyn SpeechCapability>,
    engine: Option<Box<dyn SpeechEngine>>,
    state: VoiceState,
    buffer: String,
    restart_attempts: u32,
    max_restarts: u32,
}

impl VoiceSession {
    pub fn new(capability: Box<dyn SpeechCapability>) -> Self {
        Self {
            capability,
            engine: None,
            state: VoiceState::Idle,
            buffer: String::new(),
            restart_attempts: 0,
            max_restarts: crate::config::CoachConfig::default().max_engine_restarts,
        }
    }

    /// Set the bound on consecutive unexpected-end restarts
    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = max;
        self
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Recognized-but-unsubmitted text, if any
    pub fn pending_input(&self) -> Option<&str> {
        if self.buffer.trim().is_empty() {
            None
        } else {
            Some(&self.buffer)
        }
    }

    /// Drain the pending input buffer
    pub fn take_input(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.buffer);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Flip between Idle and Listening
    ///
    /// From `Denied` this is a no-op: denial freezes the microphone control
    /// without ending the authenticated session.
    pub fn toggle(&mut self) -> Result<VoiceState> {
        match self.state {
            VoiceState::Idle => self.start()?,
            VoiceState::Listening => self.stop(),
            VoiceState::Denied => debug!("voice toggle ignored while denied"),
        }
        Ok(self.state)
    }

    /// Start capturing, creating exactly one engine instance
    pub fn start(&mut self) -> Result<()> {
        if !self.state.is_idle() {
            return Ok(());
        }
        if !self.capability.is_supported() {
            warn!("speech capture unavailable in this environment");
            return Err(CoachError::UnsupportedEnvironment);
        }

        self.engine = Some(self.capability.start_engine()?);
        self.restart_attempts = 0;
        self.state = VoiceState::Listening;
        debug!("voice capture started");
        Ok(())
    }

    /// Stop capturing; no restart follows
    ///
    /// Also called when a command submission forces capture off, and on
    /// session teardown so no background capture outlives the session.
    pub fn stop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
        }
        if self.state.is_listening() {
            self.state = VoiceState::Idle;
            debug!("voice capture stopped");
        }
    }

    /// Single entry point for the engine's asynchronous event stream
    ///
    /// Events that arrive after capture has left `Listening` are dropped,
    /// so a completed stop is final with respect to the input buffer.
    pub fn on_event(&mut self, event: EngineEvent) {
        if !self.state.is_listening() {
            debug!(state = %self.state, "dropping engine event after stop");
            return;
        }

        match event {
            EngineEvent::Partial { segments } => {
                let joined = segments.concat();
                if joined.trim().is_empty() {
                    debug!("ignoring empty partial transcript");
                    return;
                }
                // Full replace: the event carries every segment of this run
                self.buffer = joined;
                self.restart_attempts = 0;
            }
            EngineEvent::Fatal(reason) => {
                warn!("speech capture denied: {reason}");
                if let Some(mut engine) = self.engine.take() {
                    engine.stop();
                }
                self.state = VoiceState::Denied;
            }
            EngineEvent::Recoverable(reason) => {
                warn!("transient speech engine error: {reason}");
            }
            EngineEvent::Ended => self.restart(),
        }
    }

    /// Supervised restart after an unexpected session end
    ///
    /// Bounded: once the budget of consecutive attempts is spent, or a
    /// replacement engine cannot be started, capture gives up and returns
    /// to `Idle` rather than spinning in a restart loop.
    fn restart(&mut self) {
        self.engine = None;

        if self.restart_attempts >= self.max_restarts {
            warn!(
                attempts = self.restart_attempts,
                "engine keeps ending unexpectedly; giving up"
            );
            self.state = VoiceState::Idle;
            return;
        }

        self.restart_attempts += 1;
        match self.capability.start_engine() {
            Ok(engine) => {
                self.engine = Some(engine);
                debug!(attempt = self.restart_attempts, "engine restarted");
            }
            Err(e) => {
                warn!("engine restart failed: {e}");
                self.state = VoiceState::Idle;
            }
        }
    }
}
