#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use linewire::client::{Inbound, ServerConnection};

fn linewire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_linewire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral bind should work");
    listener.local_addr().expect("local addr").port()
}

fn spawn_server(port: u16, count: usize) -> Child {
    linewire()
        .arg("--format")
        .arg("json")
        .arg("serve")
        .arg(port.to_string())
        .arg("--count")
        .arg(count.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve command should start")
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> i32 {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("try_wait should work") {
            return status.code().unwrap_or(-1);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            panic!("process did not exit in time");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

/// Run `linewire send` until the server is up. Refused connects do not
/// count as sessions on the server side.
fn send_with_retry(port: u16, args: &[&str], timeout: Duration) -> Output {
    let start = Instant::now();
    loop {
        let output = linewire()
            .arg("--format")
            .arg("raw")
            .arg("send")
            .arg("127.0.0.1")
            .arg(port.to_string())
            .args(args)
            .output()
            .expect("send command should run");
        if output.status.success() || start.elapsed() >= timeout {
            return output;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn connect_with_retry(
    port: u16,
    timeout: Duration,
) -> (ServerConnection, std::sync::mpsc::Receiver<Inbound>) {
    let start = Instant::now();
    loop {
        match ServerConnection::connect_channel("127.0.0.1", port) {
            Ok(pair) => return pair,
            Err(err) if start.elapsed() >= timeout => panic!("connect timeout: {err}"),
            Err(_) => thread::sleep(Duration::from_millis(25)),
        }
    }
}

/// Block until `serve` accepts. The check itself uses up one session.
fn wait_until_serving(port: u16) {
    let (connection, _events) = connect_with_retry(port, Duration::from_secs(5));
    connection.disconnect().expect("readiness disconnect should work");
}

fn spawn_connect(port: u16, username: &str) -> Child {
    linewire()
        .args(["--format", "raw", "connect", "127.0.0.1"])
        .arg(port.to_string())
        .args(["--username", username, "--start"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("connect command should start")
}

fn stdout_lines(child: &mut Child) -> mpsc::Receiver<String> {
    let stdout = child.stdout.take().expect("stdout should be piped");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[test]
fn encode_raw_prints_wire_line() {
    let output = linewire()
        .args(["--format", "raw", "encode", "USER", "alice"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "12###USER###alice\n");
}

#[test]
fn encode_json_reports_length() {
    let output = linewire()
        .args(["--format", "json", "encode", "start"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["line"], "5###START");
    assert_eq!(json["length"], 5);
}

#[test]
fn decode_json_reports_fields() {
    let output = linewire()
        .args([
            "--format",
            "json",
            "decode",
            "14###SERVERMSG###hi",
            "--expect",
            "servermsg",
        ])
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["type"], "SERVERMSG");
    assert_eq!(json["body"], "hi");
    assert_eq!(json["length"], 14);
}

#[test]
fn decode_bad_length_exits_60() {
    let output = linewire()
        .args(["decode", "13###SERVERMSG###hi"])
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decode failed"));
}

#[test]
fn decode_unexpected_type_exits_60() {
    let output = linewire()
        .args(["decode", "12###USER###alice", "--expect", "SERVERMSG"])
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn send_wait_gets_server_reply() {
    let port = free_port();
    let mut server = spawn_server(port, 1);

    let output = send_with_retry(
        port,
        &["--type", "USER", "alice", "--wait"],
        Duration::from_secs(5),
    );

    assert!(
        output.status.success(),
        "send failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Hello, alice!\n");
    assert_eq!(wait_for_exit(&mut server, Duration::from_secs(5)), 0);
}

#[test]
fn client_session_against_server() {
    let port = free_port();
    let mut server = spawn_server(port, 1);
    let (connection, events) = connect_with_retry(port, Duration::from_secs(5));
    let timeout = Duration::from_secs(3);

    connection.send_username("bob").unwrap();
    assert_eq!(
        events.recv_timeout(timeout).unwrap(),
        Inbound::Message("Hello, bob!".to_string())
    );

    connection.send_start().unwrap();
    assert_eq!(
        events.recv_timeout(timeout).unwrap(),
        Inbound::Message("Started session for bob.".to_string())
    );

    connection.send_input("look around").unwrap();
    assert_eq!(
        events.recv_timeout(timeout).unwrap(),
        Inbound::Message("You said: look around".to_string())
    );

    connection.disconnect().unwrap();
    assert!(!connection.is_connected());
    assert_eq!(wait_for_exit(&mut server, Duration::from_secs(5)), 0);
}

#[test]
fn connect_sends_stdin_lines_until_eof() {
    let port = free_port();
    let mut server = spawn_server(port, 2);
    wait_until_serving(port);

    let mut client = spawn_connect(port, "carol");
    let lines = stdout_lines(&mut client);
    let mut stdin = client.stdin.take().expect("stdin should be piped");
    writeln!(stdin, "first").unwrap();
    writeln!(stdin, "second").unwrap();
    stdin.flush().unwrap();

    let timeout = Duration::from_secs(5);
    let received: Vec<String> = (0..4)
        .map(|_| lines.recv_timeout(timeout).expect("reply should arrive"))
        .collect();
    assert_eq!(
        received,
        [
            "Hello, carol!",
            "Started session for carol.",
            "You said: first",
            "You said: second",
        ]
    );

    drop(stdin);
    assert_eq!(wait_for_exit(&mut client, timeout), 0);
    assert_eq!(wait_for_exit(&mut server, timeout), 0);
}

#[test]
fn connect_exits_1_when_server_goes_away() {
    let port = free_port();
    let mut server = spawn_server(port, 2);
    wait_until_serving(port);

    let mut client = spawn_connect(port, "dave");
    let lines = stdout_lines(&mut client);
    // Held open so EOF on stdin cannot end the session first.
    let _stdin = client.stdin.take().expect("stdin should be piped");

    let timeout = Duration::from_secs(5);
    assert_eq!(lines.recv_timeout(timeout).unwrap(), "Hello, dave!");
    assert_eq!(
        lines.recv_timeout(timeout).unwrap(),
        "Started session for dave."
    );

    server.kill().expect("server should be killable");
    let _ = server.wait();

    assert_eq!(lines.recv_timeout(timeout).unwrap(), "Lost connection.");
    assert_eq!(wait_for_exit(&mut client, timeout), 1);
}

#[test]
fn send_to_closed_port_exits_3() {
    let port = free_port();
    let output = linewire()
        .args(["send", "127.0.0.1", &port.to_string(), "--type", "START"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn version_reports_package_version() {
    let output = linewire().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
