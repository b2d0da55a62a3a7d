use shared::ValidationError;
use thiserror::Error;

/// Failures surfaced by the client slices. Nothing is retried automatically;
/// the message is shown to the user, who re-triggers the action.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Old password is incorrect")]
    WrongOldPassword,

    #[error("Email already in use")]
    EmailTaken,

    #[error("{0} not found")]
    NotFound(String),

    #[error("List {0} has not been shared")]
    NotShared(String),

    #[error("Request failed (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Malformed session token")]
    MalformedToken,

    #[error("Local storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Remote { status: 404, .. })
    }
}
