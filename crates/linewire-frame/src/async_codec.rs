//! `tokio_util::codec` adapter for line-framed messages.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_line, encode_line, parse_message, WireMessage, DEFAULT_MAX_LINE_LENGTH};
use crate::error::FrameError;

/// Codec for use with `FramedRead`/`FramedWrite`.
///
/// Decodes each line into a [`WireMessage`] of any type; callers that accept
/// a single type check `msg_type` themselves.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_line_length: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = WireMessage;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match decode_line(src, self.max_line_length)? {
            Some(line) => parse_message(&line).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(message) => Ok(Some(message)),
            None if buf.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<WireMessage> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: WireMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        <Self as Encoder<&WireMessage>>::encode(self, &item, dst)
    }
}

impl Encoder<&WireMessage> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &WireMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.encode();
        if line.len() > self.max_line_length {
            return Err(FrameError::LineTooLong {
                size: line.len(),
                max: self.max_line_length,
            });
        }
        encode_line(&line, dst);
        Ok(())
    }
}
