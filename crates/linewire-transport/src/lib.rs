//! TCP transport for linewire.
//!
//! Wraps `std::net` sockets with the pieces the protocol layers need:
//! bounded connect timeouts, idle-read timeouts, stream cloning for a
//! dedicated reader thread, and shutdown to unblock that reader.
//!
//! This is the lowest layer of linewire. Everything else builds on top of
//! the [`NetStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::{TcpTransport, DEFAULT_CONNECT_TIMEOUT};
