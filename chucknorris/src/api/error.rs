use thiserror::Error;

/// Everything that can go wrong while looking up a joke. None of these are
/// retried; they are reported to the caller as they happen.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API returned HTTP {status} {reason}")]
    UpstreamStatus { status: u16, reason: String },

    #[error("Failed to decode joke: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response body exceeds the {limit} byte limit")]
    ResponseTooLarge { limit: usize },

    #[error("invalid joke_id: {0}")]
    InvalidJokeId(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Lookup cancelled")]
    Cancelled,
}

impl LookupError {
    /// Short diagnostic summary for this class of failure
    pub fn summary(&self) -> &'static str {
        match self {
            LookupError::Transport(_) => "Can't take a joke",
            LookupError::UpstreamStatus { .. } => "Failed to fetch joke",
            LookupError::Decode(_) => "Failed to decode joke",
            LookupError::ResponseTooLarge { .. } => "Joke response too large",
            LookupError::InvalidJokeId(_) => "Invalid joke_id",
            LookupError::Configuration(_) => "Provider not configured",
            LookupError::Cancelled => "Joke lookup cancelled",
        }
    }
}
