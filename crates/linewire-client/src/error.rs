/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] linewire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] linewire_frame::FrameError),

    /// The connection was closed locally or lost.
    #[error("not connected")]
    NotConnected,

    /// The background receive thread could not be started.
    #[error("failed to spawn receive thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
