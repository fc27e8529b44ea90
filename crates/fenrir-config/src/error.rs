//! Configuration error types.

/// Errors that can occur when loading, saving, or parsing tuning files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the tuning file from disk.
    #[error("failed to read tuning file: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the tuning file to disk.
    #[error("failed to write tuning file: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse tuning file: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize tuning to RON.
    #[error("failed to serialize tuning: {0}")]
    SerializeError(#[source] ron::Error),
}
