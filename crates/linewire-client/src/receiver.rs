use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use linewire_frame::{LineReader, MessageDecoder, MsgType};
use linewire_transport::NetStream;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::handler::{Inbound, OutputHandler};

const THREAD_NAME: &str = "linewire-recv";

/// Start the receive loop on its own thread.
pub(crate) fn spawn<H: OutputHandler>(
    reader: LineReader<NetStream>,
    handler: H,
    connected: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(reader, handler, &connected))
        .map_err(ClientError::Spawn)
}

/// Deliver `SERVERMSG` bodies until the first read or decode failure.
///
/// The failure is reported as [`Inbound::LostConnection`] only if this loop
/// is the one that clears `connected`; after a local disconnect it is
/// swallowed.
fn run<H: OutputHandler>(mut reader: LineReader<NetStream>, mut handler: H, connected: &AtomicBool) {
    let decoder = MessageDecoder::new(MsgType::ServerMsg);

    loop {
        let result = reader.read_line().and_then(|line| decoder.decode(&line));
        match result {
            Ok(body) => handler.handle(Inbound::Message(body)),
            Err(err) => {
                if connected.swap(false, Ordering::SeqCst) {
                    warn!(error = %err, "lost connection");
                    // Decode failures leave the socket open.
                    let _ = reader.get_ref().shutdown();
                    handler.handle(Inbound::LostConnection);
                } else {
                    debug!(error = %err, "receive loop stopped after disconnect");
                }
                return;
            }
        }
    }
}
