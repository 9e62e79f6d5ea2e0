//! Configuration for the coach core
//!
//! Centralizes the knobs shared by the controller and the voice session.

/// Configuration for a [`Coach`](crate::coach::Coach) instance
#[derive(Clone, Debug)]
pub struct CoachConfig {
    /// First coach message seeded into the transcript
    pub greeting: String,

    /// Bound on consecutive engine restarts after unexpected session ends
    pub max_engine_restarts: u32,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello! I'm your FinCoach. I can help you track expenses, \
                       set goals, or analyze your spending."
                .to_string(),
            max_engine_restarts: 5,
        }
    }
}

impl CoachConfig {
    /// Set the greeting message
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Set the voice restart bound
    pub fn with_max_engine_restarts(mut self, max: u32) -> Self {
        self.max_engine_restarts = max;
        self
    }
}
