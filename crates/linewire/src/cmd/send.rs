use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use linewire_client::{ConnectConfig, Inbound, ServerConnection};
use linewire_frame::MsgType;
use tracing::debug;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_inbound, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config =
        ConnectConfig::default().with_connect_timeout(parse_duration(&args.connect_timeout)?);

    let (connection, events) =
        ServerConnection::connect_channel_with_config(&args.host, args.port, config)
            .map_err(|err| client_error("connect failed", err))?;
    debug!(peer = %connection.peer_addr(), "connected");

    // disconnect() already sends DISCONNECT.
    if args.msg_type == MsgType::Disconnect && args.parts.is_empty() {
        connection
            .disconnect()
            .map_err(|err| client_error("disconnect failed", err))?;
        return Ok(SUCCESS);
    }

    let result = connection
        .send_typed(args.msg_type, &args.parts)
        .map_err(|err| client_error("send failed", err))
        .and_then(|()| {
            if args.wait {
                wait_for_reply(&events, wait_timeout, format)
            } else {
                Ok(SUCCESS)
            }
        });

    if let Err(err) = connection.disconnect() {
        debug!(error = %err, "disconnect after send failed");
    }
    result
}

fn wait_for_reply(
    events: &Receiver<Inbound>,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    match events.recv_timeout(timeout) {
        Ok(event @ Inbound::Message(_)) => {
            print_inbound(&event, format);
            Ok(SUCCESS)
        }
        Ok(Inbound::LostConnection) | Err(RecvTimeoutError::Disconnected) => Err(CliError::new(
            FAILURE,
            format!("receive failed: {}", Inbound::LostConnection.text()),
        )),
        Err(RecvTimeoutError::Timeout) => Err(CliError::new(
            TIMEOUT,
            format!("no reply within {}ms", timeout.as_millis()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn wait_for_reply_prints_first_message() {
        let (tx, rx) = mpsc::channel();
        tx.send(Inbound::Message("Hello, alice!".to_string())).unwrap();
        let code = wait_for_reply(&rx, Duration::from_millis(50), OutputFormat::Raw).unwrap();
        assert_eq!(code, SUCCESS);
    }

    #[test]
    fn wait_for_reply_times_out() {
        let (_tx, rx) = mpsc::channel::<Inbound>();
        let err = wait_for_reply(&rx, Duration::from_millis(20), OutputFormat::Raw).unwrap_err();
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn wait_for_reply_reports_lost_connection() {
        let (tx, rx) = mpsc::channel();
        tx.send(Inbound::LostConnection).unwrap();
        let err = wait_for_reply(&rx, Duration::from_millis(50), OutputFormat::Raw).unwrap_err();
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("Lost connection."));
    }

    #[test]
    fn wait_for_reply_closed_channel_is_failure() {
        let (tx, rx) = mpsc::channel::<Inbound>();
        drop(tx);
        let err = wait_for_reply(&rx, Duration::from_millis(50), OutputFormat::Raw).unwrap_err();
        assert_eq!(err.code, FAILURE);
    }
}
