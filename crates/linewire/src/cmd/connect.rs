use std::io::BufRead;
use std::sync::mpsc::{self, Sender};
use std::thread;

use linewire_client::{ClientError, ConnectConfig, Inbound, ServerConnection};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ConnectArgs};
use crate::exit::{client_error, io_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_inbound, OutputFormat};

/// Everything the interactive loop reacts to, funneled through one channel.
#[derive(Debug)]
enum SessionEvent {
    Input(String),
    InputClosed,
    Interrupted,
    Server(Inbound),
}

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ConnectConfig::default()
        .with_connect_timeout(parse_duration(&args.connect_timeout)?)
        .with_idle_timeout(Some(parse_duration(&args.idle_timeout)?));

    let (tx, events) = mpsc::channel();

    let server_tx = tx.clone();
    let connection = ServerConnection::connect_with_config(
        &args.host,
        args.port,
        move |event: Inbound| {
            let _ = server_tx.send(SessionEvent::Server(event));
        },
        config,
    )
    .map_err(|err| client_error("connect failed", err))?;
    info!(peer = %connection.peer_addr(), "connected; type lines to send, EOF to quit");

    install_ctrlc_handler(tx.clone())?;
    spawn_stdin_reader(tx)?;

    if let Some(username) = &args.username {
        connection
            .send_username(username)
            .map_err(|err| client_error("send failed", err))?;
    }
    if args.start {
        connection
            .send_start()
            .map_err(|err| client_error("send failed", err))?;
    }

    for event in events.iter() {
        match event {
            SessionEvent::Input(line) => {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                match connection.send_input(line) {
                    Ok(()) => {}
                    // The receive loop reports the loss itself.
                    Err(ClientError::NotConnected) => debug!("input dropped, not connected"),
                    Err(err) => return Err(client_error("send failed", err)),
                }
            }
            SessionEvent::Server(event @ Inbound::Message(_)) => print_inbound(&event, format),
            SessionEvent::Server(Inbound::LostConnection) => {
                print_inbound(&Inbound::LostConnection, format);
                return Ok(FAILURE);
            }
            SessionEvent::InputClosed | SessionEvent::Interrupted => break,
        }
    }

    connection
        .disconnect()
        .map_err(|err| client_error("disconnect failed", err))?;
    Ok(SUCCESS)
}

fn spawn_stdin_reader(tx: Sender<SessionEvent>) -> CliResult<()> {
    thread::Builder::new()
        .name("linewire-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(SessionEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(SessionEvent::InputClosed);
        })
        .map(|_| ())
        .map_err(|err| io_error("stdin reader failed", err))
}

fn install_ctrlc_handler(tx: Sender<SessionEvent>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = tx.send(SessionEvent::Interrupted);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
