use linewire_frame::{FrameError, LineReader, LineWriter, MsgType, WireMessage};
use linewire_transport::{NetStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::cmd::ServeArgs;
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let addr = format!("{}:{}", args.bind, args.port);
    let transport = TcpTransport::bind(&addr).map_err(|err| transport_error("bind failed", err))?;
    info!(
        transport = transport.transport_name(),
        addr = %transport.local_addr(),
        "serving"
    );

    let mut served = 0usize;
    loop {
        let stream = transport
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        match serve_session(stream, &peer, format) {
            Ok(()) => info!(%peer, "session ended"),
            Err(err) => warn!(%peer, error = %err, "session aborted"),
        }

        served = served.saturating_add(1);
        if let Some(count) = args.count {
            if served >= count {
                return Ok(SUCCESS);
            }
        }
    }
}

/// Answer one client until it sends DISCONNECT or goes away.
fn serve_session(stream: NetStream, peer: &str, format: OutputFormat) -> CliResult<()> {
    if let Ok(local) = stream.local_addr() {
        debug!(%peer, %local, "session started");
    }
    let reader_stream = stream
        .try_clone()
        .map_err(|err| transport_error("clone failed", err))?;
    let mut reader = LineReader::new(reader_stream);
    let mut writer = LineWriter::new(stream);
    let mut session = Session::default();

    loop {
        let message = match reader.read_wire_message() {
            Ok(message) => message,
            Err(FrameError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(frame_error("receive failed", err)),
        };
        print_message(&message, Some(peer), format);

        match session.reply(&message) {
            Reply::Send(text) => writer
                .send_typed(MsgType::ServerMsg, &[text])
                .map_err(|err| frame_error("send failed", err))?,
            Reply::Ignore => {}
            Reply::Close => return Ok(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Send(String),
    Ignore,
    Close,
}

#[derive(Debug, Default)]
struct Session {
    username: Option<String>,
}

impl Session {
    fn reply(&mut self, message: &WireMessage) -> Reply {
        match message.msg_type {
            MsgType::Disconnect => Reply::Close,
            MsgType::User => {
                let name = message.body_str().to_string();
                let text = format!("Hello, {name}!");
                self.username = Some(name);
                Reply::Send(text)
            }
            MsgType::Start => match &self.username {
                Some(name) => Reply::Send(format!("Started session for {name}.")),
                None => Reply::Send("Started session.".to_string()),
            },
            MsgType::UserInput => Reply::Send(format!("You said: {}", message.body_str())),
            MsgType::ServerMsg => {
                warn!("client sent SERVERMSG, ignoring");
                Reply::Ignore
            }
        }
    }
}
