pub mod intent;
pub mod mood;
pub mod transcript;

pub use intent::{classify_intent, Intent};
pub use mood::{classify_mood, Mood};
pub use transcript::{ChatMessage, Transcript};
