use std::sync::mpsc::Sender;

/// Text shown to users when the connection drops unexpectedly.
pub const LOST_CONNECTION_TEXT: &str = "Lost connection.";

/// Event delivered from the receive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Body of a validated `SERVERMSG` line.
    Message(String),
    /// The connection failed while it was live. Always the last event.
    LostConnection,
}

impl Inbound {
    /// Display text for this event.
    pub fn text(&self) -> &str {
        match self {
            Inbound::Message(body) => body,
            Inbound::LostConnection => LOST_CONNECTION_TEXT,
        }
    }
}

/// Consumer of inbound events, run on the receive thread.
pub trait OutputHandler: Send + 'static {
    fn handle(&mut self, event: Inbound);
}

impl OutputHandler for Sender<Inbound> {
    fn handle(&mut self, event: Inbound) {
        // Receiver gone means nobody is listening any more.
        let _ = self.send(event);
    }
}

impl<F> OutputHandler for F
where
    F: FnMut(Inbound) + Send + 'static,
{
    fn handle(&mut self, event: Inbound) {
        self(event)
    }
}
