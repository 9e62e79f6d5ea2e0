pub mod engine;
pub mod session;

pub use engine::{EngineEvent, NoSpeech, SpeechCapability, SpeechEngine};
pub use session::{VoiceSession, VoiceState};
