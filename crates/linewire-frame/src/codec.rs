use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::msg_type::{MsgType, MSG_DELIMITER};

/// Default maximum line length: 1 MiB.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// A decoded message: type tag plus the optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// The message type.
    pub msg_type: MsgType,
    /// Everything after `TYPE###`, or `None` when the line ended at the tag.
    pub body: Option<String>,
}

impl WireMessage {
    /// Create a message carrying a body.
    pub fn new(msg_type: MsgType, body: impl Into<String>) -> Self {
        Self {
            msg_type,
            body: Some(body.into()),
        }
    }

    /// Create a message with no body field (e.g. `START`).
    pub fn bare(msg_type: MsgType) -> Self {
        Self {
            msg_type,
            body: None,
        }
    }

    /// The body, or `""` when absent.
    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Encode into a wire line (without the trailing newline).
    pub fn encode(&self) -> String {
        match &self.body {
            Some(body) => encode_message(&[self.msg_type.as_str(), body.as_str()]),
            None => encode_message(&[self.msg_type.as_str()]),
        }
    }
}

/// Encode fields into one wire line.
///
/// Wire format:
/// ```text
/// <len>###<TYPE>###<field>###<field>...
/// ```
/// `len` is the character count of everything after the first `###`.
///
/// Fields are not escaped. A field containing [`MSG_DELIMITER`] shifts the
/// field boundaries the receiver sees.
pub fn encode_message<S: AsRef<str>>(fields: &[S]) -> String {
    let inner = fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(MSG_DELIMITER);
    let len = inner.chars().count();
    format!("{len}{MSG_DELIMITER}{inner}")
}

/// Parse a wire line into its type and body, checking the length header.
///
/// Does not check the type against any expectation; see [`MessageDecoder`].
pub fn parse_message(line: &str) -> Result<WireMessage> {
    let (header, rest) = match line.split_once(MSG_DELIMITER) {
        Some((header, rest)) => (header, Some(rest)),
        None => (line, None),
    };

    let expected: usize = header.parse().map_err(|_| FrameError::MalformedLength {
        header: header.to_string(),
    })?;

    let Some(rest) = rest else {
        return Err(FrameError::IncompleteMessage {
            expected,
            actual: 0,
        });
    };

    let actual =
        line.chars().count() - header.chars().count() - MSG_DELIMITER.chars().count();
    if expected != actual {
        return Err(FrameError::IncompleteMessage { expected, actual });
    }

    let (tag, body) = match rest.split_once(MSG_DELIMITER) {
        Some((tag, body)) => (tag, Some(body)),
        None => (rest, None),
    };
    let msg_type: MsgType = tag.parse()?;

    Ok(WireMessage {
        msg_type,
        body: body.map(str::to_string),
    })
}

/// Decode a wire line and return its body, accepting only `expected`.
pub fn decode_message(line: &str, expected: MsgType) -> Result<String> {
    MessageDecoder::new(expected).decode(line)
}

/// Decoder for a receive path that accepts a single message type.
#[derive(Debug, Clone, Copy)]
pub struct MessageDecoder {
    expected: MsgType,
}

impl MessageDecoder {
    /// Create a decoder that only accepts `expected`.
    pub fn new(expected: MsgType) -> Self {
        Self { expected }
    }

    /// The type this decoder accepts.
    pub fn expected(&self) -> MsgType {
        self.expected
    }

    /// Validate a line and return its body (`""` if the line has none).
    pub fn decode(&self, line: &str) -> Result<String> {
        let message = parse_message(line)?;
        if message.msg_type != self.expected {
            return Err(FrameError::UnexpectedType {
                expected: self.expected,
                actual: message.msg_type,
            });
        }
        Ok(message.body.unwrap_or_default())
    }
}

/// Append `message` and a terminating newline to `dst`.
pub fn encode_line(message: &str, dst: &mut BytesMut) {
    dst.reserve(message.len() + 1);
    dst.put_slice(message.as_bytes());
    dst.put_u8(b'\n');
}

/// Take one newline-terminated line off the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete line yet.
/// The newline and a single preceding `\r` are stripped.
pub fn decode_line(src: &mut BytesMut, max_line_length: usize) -> Result<Option<String>> {
    let Some(pos) = src.iter().position(|b| *b == b'\n') else {
        if src.len() > max_line_length {
            return Err(FrameError::LineTooLong {
                size: src.len(),
                max: max_line_length,
            });
        }
        return Ok(None); // Need more data
    };

    let len = if pos > 0 && src[pos - 1] == b'\r' {
        pos - 1
    } else {
        pos
    };
    if len > max_line_length {
        return Err(FrameError::LineTooLong {
            size: len,
            max: max_line_length,
        });
    }

    let mut line = src.split_to(pos + 1);
    line.truncate(len);

    String::from_utf8(line.to_vec())
        .map(Some)
        .map_err(|_| FrameError::InvalidUtf8)
}

/// Configuration for line framing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum line length in bytes. Default: 1 MiB.
    pub max_line_length: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
