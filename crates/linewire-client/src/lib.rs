//! Client-side connection management for linewire.
//!
//! Connect to a server, send typed messages synchronously, and receive the
//! server's `SERVERMSG` bodies from a background thread, either through an
//! [`OutputHandler`] or an `mpsc` channel.

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
mod receiver;

pub use config::ConnectConfig;
pub use connection::ServerConnection;
pub use error::{ClientError, Result};
pub use handler::{Inbound, OutputHandler, LOST_CONNECTION_TEXT};
