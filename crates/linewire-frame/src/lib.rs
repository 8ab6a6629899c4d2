//! Length-checked line framing for the linewire protocol.
//!
//! Every message travels as one text line:
//! - a decimal length header
//! - the [`MSG_DELIMITER`]
//! - the message type tag, another delimiter, and the body fields
//!
//! The header counts the characters after the first delimiter, so a reader
//! can tell a truncated or merged line from a well-formed one.

pub mod codec;
pub mod error;
pub mod msg_type;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::LineCodec;
pub use codec::{
    decode_line, decode_message, encode_line, encode_message, parse_message, FrameConfig,
    MessageDecoder, WireMessage, DEFAULT_MAX_LINE_LENGTH,
};
pub use error::{FrameError, Result};
pub use msg_type::{MsgType, MSG_DELIMITER};
pub use reader::LineReader;
pub use writer::LineWriter;
