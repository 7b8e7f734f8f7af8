//! Error types for parley.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParleyError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing API key: set the {env} environment variable")]
    MissingApiKey { env: String },

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Live session errors
    #[error("Live session connect failed: {message}")]
    LiveConnect { message: String },

    #[error("Live session stream error: {message}")]
    LiveStream { message: String },

    #[error("Malformed live session event: {message}")]
    LiveEvent { message: String },

    // Translation errors
    #[error("Translation request failed: {message}")]
    Translation { message: String },

    // Batch transcription errors
    #[error("Unsupported audio format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Transcription request failed: {message}")]
    Transcription { message: String },

    // Ledger errors
    #[error("Ledger write failed: {message}")]
    Ledger { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ParleyError>;
