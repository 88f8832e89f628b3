//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Socket-level tests driving a real reactor over loopback

use hearth_output::{Colour, OutputDocument};
use hearth_service::{
    ClientConnection, ConnectionFactory, ConnectionId, ConnectionLimits, ConnectionState, Interest,
    Reactor, ReactorConfig, ReactorThread,
};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    reactor: ReactorThread,
    accepted: Receiver<Arc<dyn ClientConnection>>,
}

impl Harness {
    fn start(config: ReactorConfig, accepting: bool) -> Self {
        let (sender, accepted) = mpsc::channel();
        let factory: Arc<dyn ConnectionFactory> = Arc::new(move |conn: Arc<dyn ClientConnection>| {
            let _ = sender.send(conn);
        });
        let reactor = Reactor::start(config, factory).expect("reactor start");
        reactor.handle().set_accepting(accepting);
        Self { reactor, accepted }
    }

    fn accepting() -> Self {
        Self::start(ReactorConfig::new("127.0.0.1", 0), true)
    }

    fn connect(&self) -> TcpStream {
        let client = TcpStream::connect(self.reactor.handle().local_addr()).expect("connect");
        client.set_read_timeout(Some(TIMEOUT)).expect("read timeout");
        client
    }

    fn connect_and_accept(&self) -> (TcpStream, Arc<dyn ClientConnection>) {
        let client = self.connect();
        let connection = self.accepted.recv_timeout(TIMEOUT).expect("factory called");
        (client, connection)
    }

    fn stop(self) {
        self.reactor.handle().stop();
        self.reactor.join().expect("clean reactor exit");
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn read_exactly(client: &mut TcpStream, length: usize) -> Vec<u8> {
    let mut buffer = vec![0; length];
    client.read_exact(&mut buffer).expect("read from server");
    buffer
}

#[test]
fn test_line_in_document_out() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();
    assert_eq!(connection.state(), ConnectionState::AcceptingInput);

    for byte in b"look\r\n" {
        client.write_all(&[*byte]).expect("send byte");
        client.flush().expect("flush");
    }
    let mut line = None;
    assert!(wait_for(|| {
        line = connection.read_line();
        line.is_some()
    }));
    assert_eq!(line.as_deref(), Some("look"));
    assert_eq!(connection.read_line(), None);

    let mut document = OutputDocument::from_part("You see ", None, None);
    document.add_part("a dragon", Some(Colour::Red), None);
    document.new_line();
    document.add_part("> ", Some(Colour::BrightWhite), Some(Colour::Blue));
    connection.write(document, true);

    let expected = "You see \x1b[31ma dragon\x1b[0m\r\n\x1b[37;1m\x1b[44m> \x1b[0m\r\n";
    let received = read_exactly(&mut client, expected.len());
    assert_eq!(String::from_utf8_lossy(&received), expected);
    assert!(wait_for(|| connection.info().lines_sent == 2));
    assert_eq!(connection.info().outbound_queued, 0);

    harness.stop();
}

#[test]
fn test_refused_when_not_accepting() {
    let harness = Harness::start(ReactorConfig::new("127.0.0.1", 0), false);
    let mut client = harness.connect();

    let mut buffer = [0u8; 16];
    match client.read(&mut buffer) {
        Ok(count) => assert_eq!(count, 0, "refused socket must be closed"),
        Err(error) => assert_ne!(error.kind(), std::io::ErrorKind::WouldBlock),
    }
    assert!(harness.accepted.try_recv().is_err());
    assert_eq!(harness.reactor.handle().connection_count(), 0);

    harness.reactor.handle().set_accepting(true);
    let (_client, connection) = harness.connect_and_accept();
    assert_eq!(connection.state(), ConnectionState::AcceptingInput);
    harness.stop();
}

#[test]
fn test_peer_disconnect_closes_connection() {
    let harness = Harness::accepting();
    let (client, connection) = harness.connect_and_accept();
    assert!(wait_for(|| harness.reactor.handle().connection_count() == 1));

    drop(client);
    assert!(wait_for(|| connection.state() == ConnectionState::Closed));
    assert!(wait_for(|| harness.reactor.handle().connection_count() == 0));
    harness.stop();
}

#[test]
fn test_application_close_reaches_peer() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();

    connection.close();
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).expect("read to eof");
    assert!(rest.is_empty());
    assert!(wait_for(|| harness.reactor.handle().connection_count() == 0));
    harness.stop();
}

#[test]
fn test_shutdown_flushes_before_closing() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();
    let drained = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&drained);
    connection.set_drain_listener(Arc::new(move |_: ConnectionId| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut document = OutputDocument::from_text("Goodbye");
    document.new_line();
    document.add_text("See you soon");
    connection.write(document, false);
    connection.shutdown();

    let mut received = Vec::new();
    client.read_to_end(&mut received).expect("read to eof");
    assert_eq!(received, b"Goodbye\r\nSee you soon\r\n");
    assert!(wait_for(|| drained.load(Ordering::SeqCst) == 1));
    assert_eq!(connection.state(), ConnectionState::Closed);
    harness.stop();
}

#[test]
fn test_large_output_survives_partial_writes() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();

    let text = "x".repeat(4096);
    let mut document = OutputDocument::from_text(text.clone());
    for _ in 1..1000 {
        document.new_line();
        document.add_text(text.clone());
    }
    connection.write(document, false);

    let line_length = text.len() + 2;
    let received = read_exactly(&mut client, line_length * 1000);
    assert!(received.chunks(line_length).all(|line| line.ends_with(b"\r\n")));
    assert!(wait_for(|| connection.info().lines_sent == 1000));
    assert_eq!(connection.info().bytes_sent, (line_length * 1000) as u64);
    harness.stop();
}

#[test]
fn test_outbound_capacity_drops_excess_lines() {
    let config = ReactorConfig::new("127.0.0.1", 0)
        .with_limits(ConnectionLimits::default().with_outbound_capacity(2));
    let harness = Harness::start(config, true);
    let (mut client, connection) = harness.connect_and_accept();

    connection.refuse_input();
    let mut document = OutputDocument::from_text("one");
    for text in ["two", "three"] {
        document.new_line();
        document.add_text(text);
    }
    connection.write(document, false);
    connection.shutdown();

    let mut received = Vec::new();
    client.read_to_end(&mut received).expect("read to eof");
    assert_eq!(received, b"one\r\ntwo\r\n");
    harness.stop();
}

#[test]
fn test_stop_closes_live_connections() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();
    let handle = harness.reactor.handle().clone();

    harness.stop();
    assert!(!handle.is_running());
    assert_eq!(handle.connection_count(), 0);
    assert_eq!(connection.state(), ConnectionState::Closed);

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).expect("read to eof");
    assert!(rest.is_empty());
}

#[test]
fn test_deregistered_socket_is_ignored_until_registered_again() {
    let harness = Harness::accepting();
    let (mut client, connection) = harness.connect_and_accept();
    let handle = harness.reactor.handle().clone();
    let id = connection.id();
    assert!(wait_for(|| handle.pending_interest(id).is_none()));

    assert!(handle.request_interest_change(id, Interest::None, true));
    assert!(wait_for(|| handle.pending_interest(id).is_none()));
    client.write_all(b"look\r\n").expect("send line");
    thread::sleep(Duration::from_millis(100));
    assert_eq!(connection.read_line(), None);
    assert_eq!(connection.info().bytes_received, 0);

    handle.request_interest_change(id, Interest::Read, true);
    let mut line = None;
    assert!(wait_for(|| {
        line = connection.read_line();
        line.is_some()
    }));
    assert_eq!(line.as_deref(), Some("look"));

    handle.request_interest_change(id, Interest::None, true);
    assert!(wait_for(|| handle.pending_interest(id).is_none()));
    client.write_all(b"north\r\n").expect("send line");
    connection.write(OutputDocument::from_text("You head north."), false);

    let received = read_exactly(&mut client, "You head north.\r\n".len());
    assert_eq!(received, b"You head north.\r\n");
    assert!(wait_for(|| connection.read_line().as_deref() == Some("north")));
    assert_eq!(handle.connection_count(), 1);
    harness.stop();
}

#[test]
fn test_connection_lookup_by_id() {
    let harness = Harness::accepting();
    let (_client, connection) = harness.connect_and_accept();
    let handle = harness.reactor.handle();

    let found = handle.connection(connection.id()).expect("live connection");
    assert_eq!(found.id(), connection.id());
    assert_eq!(found.address(), connection.address());
    assert!(handle.connection(ConnectionId::new(999)).is_none());
    harness.stop();
}
