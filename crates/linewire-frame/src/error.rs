use crate::msg_type::MsgType;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The length header is not a non-negative decimal integer.
    #[error("malformed length header {header:?}")]
    MalformedLength { header: String },

    /// The length header disagrees with the characters that follow it.
    ///
    /// Signals a truncated read or a corrupted line, not a different message.
    #[error("incomplete message (header says {expected} chars, got {actual})")]
    IncompleteMessage { expected: usize, actual: usize },

    /// The type tag is not one of the known message types.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The type tag is valid but not the one this receive path accepts.
    #[error("unexpected message type {actual} (expected {expected})")]
    UnexpectedType { expected: MsgType, actual: MsgType },

    /// A line exceeded the configured maximum length.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// An I/O error occurred while reading or writing lines.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete line was received.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
