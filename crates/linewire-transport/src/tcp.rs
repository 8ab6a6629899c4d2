use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// Default bound on establishing a connection: 30 seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP transport.
///
/// Provides bind/accept on the listening side and timeout-bounded connect on
/// the client side.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr` (e.g. `127.0.0.1:0`).
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NetStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect to `host:port`, bounding each attempt by `timeout`.
    ///
    /// Every resolved address is tried in order; the error from the last
    /// attempt is returned when none succeed.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<NetStream> {
        let target = format!("{host}:{port}");
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                addr: target.clone(),
                source: e,
            })?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    debug!(%addr, "connected to tcp socket");
                    return Ok(NetStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(source) => Err(TransportError::Connect {
                addr: target,
                source,
            }),
            None => Err(TransportError::NoAddress(target)),
        }
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();

        let handle = std::thread::spawn(move || {
            let mut client =
                TcpTransport::connect("127.0.0.1", port, DEFAULT_CONNECT_TIMEOUT).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
            listener.local_addr().port()
        };

        let result = TcpTransport::connect("127.0.0.1", port, Duration::from_secs(2));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_bind_rejects_invalid_address() {
        let result = TcpTransport::bind("not-an-address");
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_shutdown_unblocks_reader_clone() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();

        let client = TcpTransport::connect("127.0.0.1", port, DEFAULT_CONNECT_TIMEOUT).unwrap();
        let _server = listener.accept().unwrap();

        let mut reader = client.try_clone().unwrap();
        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            reader.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        client.shutdown().unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(result, Ok(0) | Err(_)));
    }

    #[test]
    fn test_read_timeout_applies() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();

        let mut client =
            TcpTransport::connect("127.0.0.1", port, DEFAULT_CONNECT_TIMEOUT).unwrap();
        let _server = listener.accept().unwrap();

        client
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let mut buf = [0u8; 4];
        let err = client.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ));
    }

    #[test]
    fn test_peer_and_local_addr() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();

        let client = TcpTransport::connect("127.0.0.1", port, DEFAULT_CONNECT_TIMEOUT).unwrap();
        let server = listener.accept().unwrap();

        assert_eq!(client.peer_addr().unwrap().port(), port);
        assert_eq!(server.local_addr().unwrap().port(), port);
        assert_eq!(listener.transport_name(), "tcp");
    }
}
