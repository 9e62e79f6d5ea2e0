pub mod chat;
pub mod coach;
pub mod config;
pub mod dashboard;
pub mod service;
pub mod session;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CoachError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Voice capture is not supported in this environment")]
    UnsupportedEnvironment,

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Capability error: {0}")]
    Capability(String),
}

impl CoachError {
    /// Check if this error must tear down the authenticated session
    pub fn forces_logout(&self) -> bool {
        matches!(self, CoachError::Unauthenticated(_))
    }

    /// Get a user-friendly description, suitable for the transcript
    pub fn user_message(&self) -> String {
        match self {
            CoachError::Unauthenticated(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            CoachError::UnsupportedEnvironment => {
                "Voice input is not supported in this browser. Try Chrome.".to_string()
            }
            CoachError::ParseFailure(_) => {
                "I couldn't parse that. Try: 'Paid Rs 500 at Starbucks'".to_string()
            }
            CoachError::Capability(_) => {
                "Something went wrong reaching the service. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;
