//! Length-checked line protocol client.
//!
//! linewire frames each message as one text line, `<len>###<TYPE>###<body>`,
//! where the length header lets the receiver detect truncated or corrupted
//! lines.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP stream transport with connect and idle timeouts
//! - [`frame`]: Message codec and line framing
//! - [`client`]: Server connection with a background receive loop (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use linewire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linewire_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use linewire_client::*;
}
