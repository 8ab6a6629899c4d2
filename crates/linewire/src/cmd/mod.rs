use std::time::Duration;

use clap::{Args, Subcommand};
use linewire_frame::MsgType;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod connect;
pub mod decode;
pub mod encode;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a message into a wire line.
    Encode(EncodeArgs),
    /// Decode and validate a wire line.
    Decode(DecodeArgs),
    /// Connect, send one message, and optionally wait for a reply.
    Send(SendArgs),
    /// Interactive session: stdin lines go out as USER_INPUT.
    Connect(ConnectArgs),
    /// Run a small reply server for local testing.
    Serve(ServeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Connect(args) => connect::run(args, format),
        Command::Serve(args) => serve::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message type (DISCONNECT, USER, START, USER_INPUT, SERVERMSG).
    #[arg(value_parser = parse_msg_type)]
    pub msg_type: MsgType,
    /// Body fields, joined with the field delimiter.
    pub parts: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire line to decode (trailing newline optional).
    pub line: String,
    /// Require this message type.
    #[arg(long, value_parser = parse_msg_type)]
    pub expect: Option<MsgType>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Message type to send.
    #[arg(long = "type", short = 't', value_parser = parse_msg_type)]
    pub msg_type: MsgType,
    /// Body fields.
    pub parts: Vec<String>,
    /// Wait for one SERVERMSG reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    /// Connection timeout.
    #[arg(long, default_value = "30s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Send USER with this name after connecting.
    #[arg(long, short = 'u')]
    pub username: Option<String>,
    /// Send START after connecting.
    #[arg(long)]
    pub start: bool,
    /// Connection timeout.
    #[arg(long, default_value = "30s")]
    pub connect_timeout: String,
    /// Drop the connection after this long without server traffic.
    #[arg(long, default_value = "30m")]
    pub idle_timeout: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,
    /// Exit after serving N sessions.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_msg_type(input: &str) -> Result<MsgType, String> {
    input.parse().map_err(|err| format!("{err}"))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        _ => Duration::from_secs(value),
    })
}
