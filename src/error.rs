//! Error types for the intake bot.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Messaging transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send prompt on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Record store (persistence collaborator) errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record store unreachable: {0}")]
    Connectivity(String),

    #[error("Record store authentication failed: {0}")]
    Auth(String),

    #[error("Record store quota exceeded: {0}")]
    Quota(String),

    #[error("Record store rejected the row: {0}")]
    Rejected(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Dialogue state machine faults.
///
/// User input problems are not errors; they surface as
/// [`crate::questionnaire::AnswerOutcome::Rejected`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
