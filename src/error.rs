//! Error types for the checkout funnel.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Acceptance error: {0}")]
    Acceptance(#[from] AcceptanceError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store not configured, missing: {}", missing.join(", "))]
    NotConfigured { missing: Vec<String> },

    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store command {command} failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Acceptance recording errors.
#[derive(Debug, thiserror::Error)]
pub enum AcceptanceError {
    #[error("All fields are required (missing: {})", missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Wizard transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Cannot {action} while in step {step}")]
    InvalidTransition { step: String, action: String },

    #[error("Please fill in all required fields (missing: {})", missing.join(", "))]
    MissingDetails { missing: Vec<&'static str> },

    #[error("Service agreement must be read before accepting")]
    AgreementNotRead,

    #[error("Recording the acceptance failed: {0}")]
    Recording(String),
}

/// Errors from submitting an acceptance to the backend.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Submission rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Acceptance(#[from] AcceptanceError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
