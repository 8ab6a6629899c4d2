use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linewire_client::Inbound;
use linewire_frame::WireMessage;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    line: &'a str,
    length: usize,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    #[serde(rename = "type")]
    msg_type: &'a str,
    body: Option<&'a str>,
    length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<&'a str>,
    timestamp: String,
}

#[derive(Serialize)]
struct InboundOutput<'a> {
    event: &'a str,
    text: &'a str,
    timestamp: String,
}

/// Print an encoded line (without its trailing newline).
pub fn print_encoded(line: &str, format: OutputFormat) {
    let length = declared_length(line);
    match format {
        OutputFormat::Json => print_json(&EncodedOutput { line, length }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LENGTH", "LINE"])
                .add_row(vec![length.to_string(), line.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("length={length} line={line}"),
        OutputFormat::Raw => print_raw(line),
    }
}

/// Print a parsed message, optionally tagged with the peer it came from.
pub fn print_message(message: &WireMessage, peer: Option<&str>, format: OutputFormat) {
    let msg_type = message.msg_type.as_str();
    let length = declared_length(&message.encode());
    match format {
        OutputFormat::Json => print_json(&MessageOutput {
            msg_type,
            body: message.body.as_deref(),
            length,
            peer,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "LENGTH", "PEER", "BODY"])
                .add_row(vec![
                    msg_type.to_string(),
                    length.to_string(),
                    peer.unwrap_or("-").to_string(),
                    message.body_str().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match peer {
            Some(peer) => println!(
                "type={msg_type} length={length} peer={peer} body={}",
                message.body_str()
            ),
            None => println!("type={msg_type} length={length} body={}", message.body_str()),
        },
        OutputFormat::Raw => print_raw(message.body_str()),
    }
}

/// Print an event from the receive loop.
pub fn print_inbound(event: &Inbound, format: OutputFormat) {
    let kind = match event {
        Inbound::Message(_) => "message",
        Inbound::LostConnection => "lost_connection",
    };
    match format {
        OutputFormat::Json => print_json(&InboundOutput {
            event: kind,
            text: event.text(),
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "TEXT"])
                .add_row(vec![kind.to_string(), event.text().to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("[{kind}] {}", event.text()),
        OutputFormat::Raw => print_raw(event.text()),
    }
}

fn print_raw(text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn declared_length(line: &str) -> usize {
    line.split_once(linewire_frame::MSG_DELIMITER)
        .and_then(|(header, _)| header.parse().ok())
        .unwrap_or(0)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_length_reads_header() {
        assert_eq!(declared_length("12###USER###alice"), 12);
        assert_eq!(declared_length("5###START"), 5);
        assert_eq!(declared_length("garbage"), 0);
    }
}
