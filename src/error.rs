//! Error types for the htd-serial library.

use thiserror::Error;

/// The main error type for htd-serial operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Source selection outside the device's 1-6 input range.
    #[error("source {value} out of range 1-6")]
    InvalidSource { value: String },

    /// Zone identifier that is not a number in 0-255.
    #[error("invalid zone: {value}")]
    InvalidZone { value: String },

    /// Bus topic that does not have the expected shape.
    #[error("unexpected topic: {topic}")]
    InvalidTopic { topic: String },

    /// Bus action name with no matching device command.
    #[error("unknown action: {action}")]
    UnknownAction { action: String },

    /// The dispatcher is no longer running.
    #[error("channel closed")]
    ChannelClosed,
}

/// Frame-specific errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Packet shorter than its command type requires.
    #[error("incomplete frame: expected {expected} bytes, got {got}")]
    Incomplete { expected: usize, got: usize },

    /// Packet does not start with the sync marker.
    #[error("bad sync byte: {0:#04x}")]
    BadSync(u8),
}

/// Result type alias for htd-serial operations.
pub type Result<T> = std::result::Result<T, Error>;
