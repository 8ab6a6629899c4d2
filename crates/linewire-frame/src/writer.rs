use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use linewire_transport::NetStream;

use crate::codec::{encode_line, encode_message, FrameConfig, WireMessage};
use crate::error::{FrameError, Result};
use crate::msg_type::MsgType;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete message lines to any `Write` stream.
///
/// Every send is flushed before returning.
pub struct LineWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> LineWriter<T> {
    /// Create a new line writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new line writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode `fields` (type first) and send them as one line.
    pub fn send<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let message = encode_message(fields);
        self.write_line(&message)
    }

    /// Send a message of `msg_type` followed by `parts`.
    pub fn send_typed<S: AsRef<str>>(&mut self, msg_type: MsgType, parts: &[S]) -> Result<()> {
        let mut fields = Vec::with_capacity(parts.len() + 1);
        fields.push(msg_type.as_str());
        fields.extend(parts.iter().map(AsRef::as_ref));
        self.send(&fields)
    }

    /// Send an already-built message.
    pub fn write_message(&mut self, message: &WireMessage) -> Result<()> {
        self.write_line(&message.encode())
    }

    /// Write an encoded message followed by a newline.
    pub fn write_line(&mut self, message: &str) -> Result<()> {
        if message.len() > self.config.max_line_length {
            return Err(FrameError::LineTooLong {
                size: message.len(),
                max: self.config.max_line_length,
            });
        }

        self.buf.clear();
        encode_line(message, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if self.should_retry(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if self.should_retry(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// An expired write timeout shows up as `WouldBlock` on Unix, so that
    /// kind is only retried when no timeout is configured.
    fn should_retry(&self, err: &std::io::Error) -> bool {
        match err.kind() {
            ErrorKind::Interrupted => true,
            ErrorKind::WouldBlock => self.config.write_timeout.is_none(),
            _ => false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current line writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl LineWriter<NetStream> {
    /// Create a line writer for `NetStream` and apply write timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
