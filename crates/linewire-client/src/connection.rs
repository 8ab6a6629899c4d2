use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use linewire_frame::{LineReader, LineWriter, MsgType, WireMessage};
use linewire_transport::{NetStream, TcpTransport};
use tracing::{debug, info};

use crate::config::ConnectConfig;
use crate::error::{ClientError, Result};
use crate::handler::{Inbound, OutputHandler};
use crate::receiver;

/// A live connection to a linewire server.
///
/// Sends happen synchronously on the calling thread. Inbound `SERVERMSG`
/// bodies are decoded on a dedicated receive thread and handed to the
/// handler given at connect time.
pub struct ServerConnection {
    writer: Mutex<LineWriter<NetStream>>,
    control: NetStream,
    connected: Arc<AtomicBool>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    peer_addr: SocketAddr,
}

impl ServerConnection {
    /// Connect with default timeouts and start the receive loop.
    pub fn connect<H: OutputHandler>(host: &str, port: u16, handler: H) -> Result<Self> {
        Self::connect_with_config(host, port, handler, ConnectConfig::default())
    }

    /// Connect with explicit configuration and start the receive loop.
    pub fn connect_with_config<H: OutputHandler>(
        host: &str,
        port: u16,
        handler: H,
        config: ConnectConfig,
    ) -> Result<Self> {
        let stream = TcpTransport::connect(host, port, config.connect_timeout)?;
        let peer_addr = stream.peer_addr()?;
        let reader_stream = stream.try_clone()?;
        let control = stream.try_clone()?;

        let frame_config = config.to_frame_config();
        let reader = LineReader::with_config_net(reader_stream, frame_config.clone())?;
        let writer = LineWriter::with_config_net(stream, frame_config)?;

        let connected = Arc::new(AtomicBool::new(true));
        let handle = receiver::spawn(reader, handler, Arc::clone(&connected))?;

        info!(addr = %peer_addr, "connected to server");

        Ok(Self {
            writer: Mutex::new(writer),
            control,
            connected,
            receiver: Mutex::new(Some(handle)),
            peer_addr,
        })
    }

    /// Connect and deliver inbound events over a channel.
    pub fn connect_channel(host: &str, port: u16) -> Result<(Self, Receiver<Inbound>)> {
        Self::connect_channel_with_config(host, port, ConnectConfig::default())
    }

    /// Connect with explicit configuration and deliver events over a channel.
    pub fn connect_channel_with_config(
        host: &str,
        port: u16,
        config: ConnectConfig,
    ) -> Result<(Self, Receiver<Inbound>)> {
        let (tx, rx) = mpsc::channel();
        let connection = Self::connect_with_config(host, port, tx, config)?;
        Ok((connection, rx))
    }

    /// Send a message of `msg_type` followed by `parts`.
    pub fn send_typed<S: AsRef<str>>(&self, msg_type: MsgType, parts: &[S]) -> Result<()> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        debug!(%msg_type, parts = parts.len(), "sending message");
        self.lock_writer().send_typed(msg_type, parts)?;
        Ok(())
    }

    /// Announce the user name (`USER`).
    pub fn send_username(&self, username: &str) -> Result<()> {
        self.send_typed(MsgType::User, &[username])
    }

    /// Ask the server to start (`START`).
    pub fn send_start(&self) -> Result<()> {
        self.send_typed::<&str>(MsgType::Start, &[])
    }

    /// Send a line of user input (`USER_INPUT`).
    pub fn send_input(&self, input: &str) -> Result<()> {
        self.send_typed(MsgType::UserInput, &[input])
    }

    /// Tell the server we are leaving, then close the socket.
    ///
    /// The receive loop exits without reporting a lost connection. Calling
    /// this again, or after the connection was lost, only waits for the
    /// receive thread.
    pub fn disconnect(&self) -> Result<()> {
        let was_connected = self.connected.swap(false, Ordering::SeqCst);

        let sent = if was_connected {
            self.lock_writer()
                .write_message(&WireMessage::bare(MsgType::Disconnect))
                .map_err(ClientError::from)
        } else {
            Ok(())
        };
        let closed = self.control.shutdown().map_err(ClientError::from);
        self.join_receiver();

        if was_connected {
            info!(addr = %self.peer_addr, "disconnected from server");
        }

        sent?;
        closed
    }

    /// Whether the connection is still live.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, LineWriter<NetStream>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join_receiver(&self) {
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // Disconnecting from inside the handler runs on the receive thread.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let _ = handle.join();
        }
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.control.shutdown();
    }
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("peer_addr", &self.peer_addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}
