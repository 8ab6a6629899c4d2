use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use linewire_transport::NetStream;
use tracing::trace;

use crate::codec::{decode_line, parse_message, FrameConfig, MessageDecoder, WireMessage};
use crate::error::{FrameError, Result};
use crate::msg_type::MsgType;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete lines from any `Read` stream.
///
/// Partial reads are buffered internally; callers always get whole lines.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete line (blocking), without its terminator.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, even
    /// if a partial line is buffered.
    pub fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = decode_line(&mut self.buf, self.config.max_line_length)? {
                return Ok(line);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    trace!(pending = self.buf.len(), "eof with partial line buffered");
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next line and parse it into a [`WireMessage`] of any type.
    pub fn read_wire_message(&mut self) -> Result<WireMessage> {
        let line = self.read_line()?;
        parse_message(&line)
    }

    /// Read the next line and return its body, accepting only `expected`.
    pub fn read_message(&mut self, expected: MsgType) -> Result<String> {
        let line = self.read_line()?;
        MessageDecoder::new(expected).decode(&line)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current line reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl LineReader<NetStream> {
    /// Create a line reader for `NetStream` and apply read timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: linewire_transport::TransportError) -> FrameError {
    match err {
        linewire_transport::TransportError::Io(io)
        | linewire_transport::TransportError::Accept(io) => FrameError::Io(io),
        linewire_transport::TransportError::Bind { source, .. }
        | linewire_transport::TransportError::Connect { source, .. }
        | linewire_transport::TransportError::Resolve { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
