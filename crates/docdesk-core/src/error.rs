use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("{endpoint} answered HTTP {code}")]
    Status { endpoint: String, code: u16 },

    /// The collaborator answered, but not with the JSON shape we expect.
    #[error("Malformed response from {endpoint}: {note}")]
    Decode { endpoint: String, note: String },

    #[error("Query too long ({len} chars, max {max})")]
    QueryTooLong { len: usize, max: usize },
}

impl Error {
    /// Short operator-facing note for recoverable failures.
    pub fn note(&self) -> String {
        match self {
            Self::Decode { endpoint, note } => format!("{endpoint}: unexpected response ({note})"),
            other => other.to_string(),
        }
    }

    pub fn is_decode(&self) -> bool { matches!(self, Self::Decode { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
