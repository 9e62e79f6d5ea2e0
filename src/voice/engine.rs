//! Speech-capture capability contracts
//!
//! The underlying engine is an external collaborator that delivers an
//! asynchronous, error-prone event stream. These traits keep the state
//! machine in [`session`](super::session) independent of whether events are
//! scheduled through a callback, a channel, or a future: whatever the
//! plumbing, everything arrives through a single `on_event` entry point.

use crate::Result;

/// One live run of the underlying speech engine
pub trait SpeechEngine: Send {
    /// Tell the engine to halt the current run
    fn stop(&mut self);
}

/// Factory side of the speech capability
pub trait SpeechCapability: Send {
    /// Whether speech capture exists on this platform at all
    fn is_supported(&self) -> bool;

    /// Start a fresh engine run
    fn start_engine(&mut self) -> Result<Box<dyn SpeechEngine>>;
}

/// Events delivered by a live engine run
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// Every result segment recognized in the current run so far
    Partial { segments: Vec<String> },

    /// Permission or service denial; the run is dead and must not be recreated
    Fatal(String),

    /// Transient engine error; logged only, no transition
    Recoverable(String),

    /// The run ended without an explicit stop
    Ended,
}

/// Capability for platforms without speech capture
#[derive(Debug, Default)]
pub struct NoSpeech;

impl SpeechCapability for NoSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn start_engine(&mut self) -> Result<Box<dyn SpeechEngine>> {
        Err(crate::CoachError::UnsupportedEnvironment)
    }
}
