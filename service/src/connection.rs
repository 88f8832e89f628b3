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

//! Telnet connection state
//!
//! A [`TelnetConnection`] is shared between the reactor thread, which feeds
//! it raw input and drains its output, and any number of application threads
//! reading lines and writing documents. One lock guards all of its mutable
//! state; interest changes are queued only after that lock is released.

use crate::config::ConnectionLimits;
use crate::error::{Result, ServiceError};
use crate::interest::InterestQueue;
use crate::types::{ConnectionId, ConnectionInfo, ConnectionState, Interest};
use bytes::{Buf, Bytes};
use hearth_ansicolour::EOL;
use hearth_output::{OutputDocument, render_line};
use metrics::{counter, gauge};
use mio::net::TcpStream;
use mio::{Registry, Token};
use socket2::SockRef;
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Address reported when the peer address cannot be read
pub const UNKNOWN_ADDRESS: &str = "error retrieving address";

const BACKSPACE: u8 = 0x08;

/// Drop trailing UTF-8 continuation bytes, then the byte that leads them.
fn erase_last_char(pending: &mut Vec<u8>) {
    while let Some(byte) = pending.pop() {
        if byte & 0xC0 != 0x80 {
            break;
        }
    }
}

/// Callback run once a draining connection has flushed its output
pub type DrainListener = Arc<dyn Fn(ConnectionId) + Send + Sync + 'static>;

/// Capabilities the application layer relies on, independent of transport
///
/// Every method may be called from any thread and never blocks on I/O.
pub trait ClientConnection: Send + Sync {
    /// Connection identifier
    fn id(&self) -> ConnectionId;

    /// Peer address, or [`UNKNOWN_ADDRESS`]
    fn address(&self) -> String;

    /// Configure the socket and start watching it for input.
    ///
    /// Fails only when the socket options cannot be applied.
    fn setup(&self) -> Result<()>;

    /// Queue as many lines of `document` as fit in the outbound queue; the
    /// rest are discarded.
    fn write(&self, document: OutputDocument, use_colour: bool);

    /// Start queueing completed input lines
    fn accept_input(&self);

    /// Stop queueing input and discard any queued lines
    fn refuse_input(&self);

    /// Oldest completed input line, if any
    fn read_line(&self) -> Option<String>;

    /// Refuse further input and close once queued output is flushed
    fn shutdown(&self);

    /// Close the socket and clear every queue. Idempotent.
    fn close(&self);

    /// Current lifecycle state
    fn state(&self) -> ConnectionState;

    /// Install the callback run once [`shutdown`](Self::shutdown) has
    /// flushed every queued line. Replaces any earlier listener.
    fn set_drain_listener(&self, listener: DrainListener);

    /// Snapshot of counters and queue depths
    fn info(&self) -> ConnectionInfo;
}

struct ConnectionInner {
    stream: Option<TcpStream>,
    registered: bool,
    address: String,
    set_up: bool,
    accept_input: bool,
    shutdown: bool,
    closed: bool,
    drained: bool,
    pending: Vec<u8>,
    inbound: VecDeque<String>,
    outbound: VecDeque<Bytes>,
    drain_listener: Option<DrainListener>,
}

impl ConnectionInner {
    fn state(&self) -> ConnectionState {
        if self.closed {
            ConnectionState::Closed
        } else if !self.set_up {
            ConnectionState::Created
        } else if self.shutdown {
            ConnectionState::Draining
        } else if self.accept_input {
            ConnectionState::AcceptingInput
        } else {
            ConnectionState::RefusingInput
        }
    }

    /// True exactly once, when a draining connection has nothing left to send
    fn take_drain_notice(&mut self) -> bool {
        if self.shutdown && !self.closed && !self.drained && self.outbound.is_empty() {
            self.drained = true;
            true
        } else {
            false
        }
    }
}

/// A Telnet connection over a non-blocking TCP socket
pub struct TelnetConnection {
    id: ConnectionId,
    limits: ConnectionLimits,
    interests: Arc<InterestQueue>,
    inner: Mutex<ConnectionInner>,
    created_at: Instant,

    // Metrics (lock-free)
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    lines_sent: AtomicU64,
    lines_received: AtomicU64,
}

impl TelnetConnection {
    /// Wrap an accepted socket. Call [`ClientConnection::setup`] before use.
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        limits: ConnectionLimits,
        interests: Arc<InterestQueue>,
    ) -> Self {
        trace!(connection_id = %id, "Creating telnet connection");
        Self {
            id,
            inner: Mutex::new(ConnectionInner {
                stream: Some(stream),
                registered: false,
                address: UNKNOWN_ADDRESS.to_string(),
                set_up: false,
                accept_input: false,
                shutdown: false,
                closed: false,
                drained: false,
                pending: Vec::new(),
                inbound: VecDeque::new(),
                outbound: VecDeque::new(),
                drain_listener: None,
            }),
            limits,
            interests,
            created_at: Instant::now(),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            lines_sent: AtomicU64::new(0),
            lines_received: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get when the connection was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Get bytes sent
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Get bytes received
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Get lines fully written to the socket
    pub fn lines_sent(&self) -> u64 {
        self.lines_sent.load(Ordering::Relaxed)
    }

    /// Get lines queued for the application
    pub fn lines_received(&self) -> u64 {
        self.lines_received.load(Ordering::Relaxed)
    }

    /// Number of completed lines waiting to be read
    pub fn queued_input(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Number of output buffers waiting to be written
    pub fn queued_output(&self) -> usize {
        self.lock().outbound.len()
    }

    // Input

    /// Feed one raw input byte
    pub fn feed_byte(&self, byte: u8) {
        self.feed(&[byte]);
    }

    /// Feed raw input bytes, one at a time, under a single lock.
    ///
    /// CR or LF ends a non-empty line; backspace removes the last buffered
    /// character, taking every byte of a multi-byte UTF-8 sequence with it;
    /// anything else is buffered. Completed lines longer than the
    /// configured maximum are dropped whole.
    pub fn feed(&self, bytes: &[u8]) {
        self.bytes_received
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        let mut inner = self.lock();
        for &byte in bytes {
            match byte {
                b'\r' | b'\n' => {
                    if !inner.pending.is_empty() {
                        let line = std::mem::take(&mut inner.pending);
                        self.complete_line(&mut inner, line);
                    }
                }
                BACKSPACE => erase_last_char(&mut inner.pending),
                _ => inner.pending.push(byte),
            }
        }
    }

    fn complete_line(&self, inner: &mut ConnectionInner, line: Vec<u8>) {
        if line.len() > self.limits.max_input_length {
            warn!(
                connection_id = %self.id,
                length = line.len(),
                limit = self.limits.max_input_length,
                "Input line exceeded maximum length, dropped"
            );
            counter!("hearth.input.oversized").increment(1);
            return;
        }
        if !inner.accept_input || inner.shutdown {
            trace!(connection_id = %self.id, "Refusing input, line dropped");
            return;
        }
        if inner.inbound.len() >= self.limits.inbound_capacity {
            warn!(
                connection_id = %self.id,
                capacity = self.limits.inbound_capacity,
                "Inbound queue full, line dropped"
            );
            counter!("hearth.inbound.dropped").increment(1);
            return;
        }
        let line = String::from_utf8_lossy(&line).into_owned();
        trace!(connection_id = %self.id, line = %line, "Line received");
        inner.inbound.push_back(line);
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        counter!("hearth.lines.received").increment(1);
    }

    // Output

    /// Head of the outbound queue, left in place until
    /// [`finished_writing`](Self::finished_writing).
    ///
    /// When the queue is empty this asks for the next interest instead: none
    /// while shutting down, read otherwise.
    pub fn next_outbound_buffer(&self) -> Option<Bytes> {
        let (next, request) = {
            let inner = self.lock();
            match inner.outbound.front() {
                Some(buffer) => (Some(buffer.clone()), None),
                None if inner.closed => (None, None),
                None if inner.shutdown => (None, Some(Interest::None)),
                None => (None, Some(Interest::Read)),
            }
        };
        if let Some(interest) = request {
            self.interests.push(self.id, interest, false);
        }
        next
    }

    /// Record that the first `count` bytes of the head buffer were sent
    pub fn partially_written(&self, count: usize) {
        let mut inner = self.lock();
        if let Some(buffer) = inner.outbound.front_mut() {
            let count = count.min(buffer.len());
            buffer.advance(count);
            self.bytes_sent.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Remove the fully sent head buffer
    pub fn finished_writing(&self) {
        let drained = {
            let mut inner = self.lock();
            if let Some(buffer) = inner.outbound.pop_front() {
                self.bytes_sent
                    .fetch_add(buffer.len() as u64, Ordering::Relaxed);
                self.lines_sent.fetch_add(1, Ordering::Relaxed);
            }
            inner.take_drain_notice()
        };
        if drained {
            self.drained();
        }
    }

    fn drained(&self) {
        debug!(connection_id = %self.id, "Connection drained");
        let listener = self.lock().drain_listener.clone();
        self.close();
        if let Some(listener) = listener {
            listener(self.id);
        }
    }

    // Reactor side

    /// Apply an interest change to the socket's registration.
    ///
    /// Returns `Ok(false)` once the connection is closed.
    pub(crate) fn apply_interest(
        &self,
        registry: &Registry,
        interest: Interest,
    ) -> io::Result<bool> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Some(stream) = inner.stream.as_mut() else {
            return Ok(false);
        };
        let token = Token(self.id.as_u64() as usize);
        let ready = match interest {
            Interest::None => {
                if inner.registered {
                    registry.deregister(stream)?;
                    inner.registered = false;
                }
                return Ok(true);
            }
            Interest::Read => mio::Interest::READABLE,
            Interest::Write => mio::Interest::READABLE | mio::Interest::WRITABLE,
        };
        if inner.registered {
            registry.reregister(stream, token, ready)?;
        } else {
            registry.register(stream, token, ready)?;
            inner.registered = true;
        }
        Ok(true)
    }

    /// Remove the socket from the multiplexer, if registered
    pub(crate) fn deregister(&self, registry: &Registry) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if let (Some(stream), true) = (inner.stream.as_mut(), inner.registered) {
            if let Err(error) = registry.deregister(stream) {
                trace!(connection_id = %self.id, error = %error, "Failed to deregister socket");
            }
            inner.registered = false;
        }
    }

    pub(crate) fn read_socket(&self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.lock().stream.as_mut() {
            Some(stream) => stream.read(buffer),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    pub(crate) fn write_socket(&self, buffer: &[u8]) -> io::Result<usize> {
        match self.lock().stream.as_mut() {
            Some(stream) => stream.write(buffer),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl ClientConnection for TelnetConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn address(&self) -> String {
        self.lock().address.clone()
    }

    #[instrument(skip(self), fields(connection_id = %self.id))]
    fn setup(&self) -> Result<()> {
        let address = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let stream = inner.stream.as_ref().ok_or(ServiceError::ConnectionClosed)?;
            if self.limits.keepalive {
                SockRef::from(stream)
                    .set_keepalive(true)
                    .map_err(ServiceError::Keepalive)?;
            }
            inner.address = match stream.peer_addr() {
                Ok(address) => address.to_string(),
                Err(error) => {
                    warn!(error = %error, "Failed to read peer address");
                    UNKNOWN_ADDRESS.to_string()
                }
            };
            inner.pending.clear();
            inner.inbound.clear();
            inner.outbound.clear();
            inner.set_up = true;
            inner.accept_input = true;
            inner.address.clone()
        };

        gauge!("hearth.connections.active").increment(1.0);
        info!(peer_addr = %address, "Connection set up");
        self.interests.push(self.id, Interest::Read, true);
        Ok(())
    }

    fn write(&self, mut document: OutputDocument, use_colour: bool) {
        let discarded = {
            let mut inner = self.lock();
            if inner.closed {
                debug!(connection_id = %self.id, "Write on closed connection ignored");
                return;
            }
            while document.has_more_lines()
                && inner.outbound.len() < self.limits.outbound_capacity
            {
                let mut line = render_line(&mut document, use_colour);
                line.push_str(EOL);
                inner.outbound.push_back(Bytes::from(line));
                document.advance_line();
            }
            document.line_count()
        };
        if discarded > 0 {
            warn!(
                connection_id = %self.id,
                discarded,
                capacity = self.limits.outbound_capacity,
                "Outbound queue full, document lines dropped"
            );
            counter!("hearth.outbound.dropped").increment(discarded as u64);
        }
        self.interests.push(self.id, Interest::Write, true);
    }

    fn accept_input(&self) {
        let mut inner = self.lock();
        if !inner.closed && !inner.shutdown {
            inner.accept_input = true;
        }
    }

    fn refuse_input(&self) {
        let mut inner = self.lock();
        inner.accept_input = false;
        inner.inbound.clear();
    }

    fn read_line(&self) -> Option<String> {
        self.lock().inbound.pop_front()
    }

    fn shutdown(&self) {
        let drained = {
            let mut inner = self.lock();
            if inner.closed || inner.shutdown {
                return;
            }
            inner.shutdown = true;
            inner.take_drain_notice()
        };
        debug!(connection_id = %self.id, "Connection shutting down");
        if drained {
            self.drained();
        } else {
            self.interests.push(self.id, Interest::Write, true);
        }
    }

    fn close(&self) {
        let (stream, was_set_up) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            inner.accept_input = false;
            inner.shutdown = true;
            inner.pending.clear();
            inner.inbound.clear();
            inner.outbound.clear();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.registered = false;
            (inner.stream.take(), inner.set_up)
        };

        if let Some(stream) = stream {
            let peer = stream
                .peer_addr()
                .map_or_else(|_| UNKNOWN_ADDRESS.to_string(), |addr| addr.to_string());
            let local = stream
                .local_addr()
                .map_or_else(|_| UNKNOWN_ADDRESS.to_string(), |addr| addr.to_string());
            drop(stream);
            info!(
                connection_id = %self.id,
                peer_addr = %peer,
                local_addr = %local,
                "Connection closed"
            );
        }
        if was_set_up {
            gauge!("hearth.connections.active").decrement(1.0);
        }
        self.interests.push(self.id, Interest::None, true);
    }

    fn state(&self) -> ConnectionState {
        self.lock().state()
    }

    fn set_drain_listener(&self, listener: DrainListener) {
        self.lock().drain_listener = Some(listener);
    }

    fn info(&self) -> ConnectionInfo {
        let inner = self.lock();
        ConnectionInfo {
            id: self.id,
            state: inner.state(),
            address: inner.address.clone(),
            created_at: self.created_at,
            bytes_sent: self.bytes_sent(),
            bytes_received: self.bytes_received(),
            lines_sent: self.lines_sent(),
            lines_received: self.lines_received(),
            inbound_queued: inner.inbound.len(),
            outbound_queued: inner.outbound.len(),
        }
    }
}

impl fmt::Debug for TelnetConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("TelnetConnection")
            .field("id", &self.id)
            .field("address", &inner.address)
            .field("state", &inner.state())
            .field("inbound", &inner.inbound.len())
            .field("outbound", &inner.outbound.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_output::Colour;
    use std::net;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    struct Pair {
        connection: TelnetConnection,
        client: net::TcpStream,
        queue: Arc<InterestQueue>,
    }

    fn pair_with(limits: ConnectionLimits) -> Pair {
        let listener = net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        let client = net::TcpStream::connect(address).expect("connect");
        let (server, _) = listener.accept().expect("accept");
        server.set_nonblocking(true).expect("nonblocking");
        let queue = Arc::new(InterestQueue::new());
        let connection = TelnetConnection::new(
            ConnectionId::new(2),
            TcpStream::from_std(server),
            limits,
            Arc::clone(&queue),
        );
        Pair {
            connection,
            client,
            queue,
        }
    }

    fn ready_pair() -> Pair {
        let pair = pair_with(ConnectionLimits::default());
        pair.connection.setup().expect("setup");
        pair.queue.clear();
        pair
    }

    fn feed_str(connection: &TelnetConnection, input: &str) {
        for byte in input.bytes() {
            connection.feed_byte(byte);
        }
    }

    #[test]
    fn test_setup() {
        let pair = pair_with(ConnectionLimits::default());
        assert_eq!(pair.connection.state(), ConnectionState::Created);
        pair.connection.setup().expect("setup");
        assert_eq!(pair.connection.state(), ConnectionState::AcceptingInput);
        assert_eq!(
            pair.connection.address(),
            pair.client.local_addr().expect("addr").to_string()
        );
        assert_eq!(pair.queue.pending(pair.connection.id()), Some(Interest::Read));
    }

    #[test]
    fn test_input_before_setup_is_dropped() {
        let pair = pair_with(ConnectionLimits::default());
        feed_str(&pair.connection, "look\r\n");
        assert_eq!(pair.connection.read_line(), None);
    }

    #[test]
    fn test_line_assembly() {
        let pair = ready_pair();
        feed_str(&pair.connection, "hello\r\n");
        assert_eq!(pair.connection.read_line(), Some("hello".to_string()));
        assert_eq!(pair.connection.read_line(), None);
        assert_eq!(pair.connection.lines_received(), 1);
        assert_eq!(pair.connection.bytes_received(), 7);
    }

    #[test]
    fn test_backspace() {
        let pair = ready_pair();
        feed_str(&pair.connection, "hel\x08o\r\n");
        assert_eq!(pair.connection.read_line(), Some("heo".to_string()));

        feed_str(&pair.connection, "\x08\x08a\x08\x08b\n");
        assert_eq!(pair.connection.read_line(), Some("b".to_string()));
    }

    #[test]
    fn test_backspace_erases_whole_character() {
        let pair = ready_pair();
        feed_str(&pair.connection, "caf\u{e9}\x08e\r\n");
        assert_eq!(pair.connection.read_line(), Some("cafe".to_string()));

        feed_str(&pair.connection, "\u{1F600}\x08ok\r\n");
        assert_eq!(pair.connection.read_line(), Some("ok".to_string()));
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let pair = ready_pair();
        feed_str(&pair.connection, "\r\n\r\none\r\n\ntwo\r");
        assert_eq!(pair.connection.read_line(), Some("one".to_string()));
        assert_eq!(pair.connection.read_line(), Some("two".to_string()));
        assert_eq!(pair.connection.read_line(), None);
    }

    #[test]
    #[traced_test]
    fn test_oversized_line_is_dropped() {
        let pair = ready_pair();
        pair.connection.feed(&[b'a'; 5001]);
        pair.connection.feed(b"\r\n");
        assert_eq!(pair.connection.read_line(), None);
        assert!(logs_contain("Input line exceeded maximum length"));

        pair.connection.feed(&[b'a'; 5000]);
        pair.connection.feed(b"\r\n");
        assert_eq!(pair.connection.read_line().map(|l| l.len()), Some(5000));
    }

    #[test]
    fn test_refuse_input_discards_queue() {
        let pair = ready_pair();
        feed_str(&pair.connection, "one\r\n");
        pair.connection.refuse_input();
        assert_eq!(pair.connection.state(), ConnectionState::RefusingInput);
        assert_eq!(pair.connection.read_line(), None);
        feed_str(&pair.connection, "two\r\n");
        assert_eq!(pair.connection.read_line(), None);

        pair.connection.accept_input();
        feed_str(&pair.connection, "three\r\n");
        assert_eq!(pair.connection.read_line(), Some("three".to_string()));
    }

    #[test]
    #[traced_test]
    fn test_inbound_overflow() {
        let pair = pair_with(ConnectionLimits::default().with_inbound_capacity(2));
        pair.connection.setup().expect("setup");
        feed_str(&pair.connection, "a\nb\nc\n");
        assert_eq!(pair.connection.queued_input(), 2);
        assert!(logs_contain("Inbound queue full"));
        assert_eq!(pair.connection.read_line(), Some("a".to_string()));
        assert_eq!(pair.connection.read_line(), Some("b".to_string()));
        assert_eq!(pair.connection.read_line(), None);
    }

    #[test]
    fn test_write_coloured() {
        let pair = ready_pair();
        pair.connection
            .write(OutputDocument::from_part("hi", Some(Colour::Red), None), true);
        assert_eq!(
            pair.connection.next_outbound_buffer(),
            Some(Bytes::from_static(b"\x1b[31mhi\x1b[0m\r\n"))
        );
        assert_eq!(pair.queue.pending(pair.connection.id()), Some(Interest::Write));
    }

    #[test]
    fn test_write_plain() {
        let pair = ready_pair();
        pair.connection
            .write(OutputDocument::from_part("hi", Some(Colour::Red), None), false);
        assert_eq!(
            pair.connection.next_outbound_buffer(),
            Some(Bytes::from_static(b"hi\r\n"))
        );
    }

    #[test]
    #[traced_test]
    fn test_write_respects_outbound_capacity() {
        let pair = ready_pair();
        let mut document = OutputDocument::from_text("line");
        for _ in 1..1000 {
            document.new_line();
            document.add_text("line");
        }
        pair.connection.write(document, false);
        assert_eq!(pair.connection.queued_output(), 1000);
        assert!(!logs_contain("Outbound queue full"));

        pair.connection.write(OutputDocument::from_text("more"), false);
        assert_eq!(pair.connection.queued_output(), 1000);
        assert!(logs_contain("Outbound queue full"));
    }

    #[test]
    fn test_write_partially_drains_document() {
        let pair = pair_with(ConnectionLimits::default().with_outbound_capacity(3));
        pair.connection.setup().expect("setup");
        let mut document = OutputDocument::from_text("1");
        for text in ["2", "3", "4", "5"] {
            document.new_line();
            document.add_text(text);
        }
        pair.connection.write(document, false);
        assert_eq!(pair.connection.queued_output(), 3);
        for expected in ["1\r\n", "2\r\n", "3\r\n"] {
            assert_eq!(
                pair.connection.next_outbound_buffer().as_deref(),
                Some(expected.as_bytes())
            );
            pair.connection.finished_writing();
        }
    }

    #[test]
    fn test_empty_queue_requests_read() {
        let pair = ready_pair();
        assert_eq!(pair.connection.next_outbound_buffer(), None);
        assert_eq!(pair.queue.pending(pair.connection.id()), Some(Interest::Read));
    }

    #[test]
    fn test_partial_write_resumes() {
        let pair = ready_pair();
        pair.connection.write(OutputDocument::from_text("abcdef"), false);
        pair.connection.partially_written(2);
        assert_eq!(
            pair.connection.next_outbound_buffer().as_deref(),
            Some(&b"cdef\r\n"[..])
        );
        pair.connection.finished_writing();
        assert_eq!(pair.connection.bytes_sent(), 8);
        assert_eq!(pair.connection.lines_sent(), 1);
        assert_eq!(pair.connection.queued_output(), 0);
    }

    #[test]
    fn test_shutdown_drains_then_closes() {
        let pair = ready_pair();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        pair.connection.set_drain_listener(Arc::new(move |_: ConnectionId| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        pair.connection.write(OutputDocument::from_text("bye"), false);
        pair.connection.shutdown();
        assert_eq!(pair.connection.state(), ConnectionState::Draining);
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        feed_str(&pair.connection, "ignored\r\n");
        assert_eq!(pair.connection.read_line(), None);

        assert!(pair.connection.next_outbound_buffer().is_some());
        pair.connection.finished_writing();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(pair.connection.state(), ConnectionState::Closed);

        pair.connection.shutdown();
        pair.connection.finished_writing();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_with_empty_queue_notifies_immediately() {
        let pair = ready_pair();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        pair.connection.set_drain_listener(Arc::new(move |id: ConnectionId| {
            assert_eq!(id, ConnectionId::new(2));
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        pair.connection.shutdown();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(pair.connection.state(), ConnectionState::Closed);
    }

    #[test]
    #[traced_test]
    fn test_close_is_idempotent() {
        let pair = ready_pair();
        feed_str(&pair.connection, "queued\r\n");
        pair.connection.write(OutputDocument::from_text("pending"), false);
        pair.queue.clear();

        pair.connection.close();
        assert_eq!(pair.connection.state(), ConnectionState::Closed);
        assert_eq!(pair.connection.queued_output(), 0);
        assert_eq!(pair.connection.read_line(), None);
        assert_eq!(pair.queue.pending(pair.connection.id()), Some(Interest::None));
        assert!(logs_contain("Connection closed"));

        pair.connection.close();
        assert_eq!(pair.queue.len(), 1);
        assert_eq!(pair.connection.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_closed_connection_ignores_io() {
        let pair = ready_pair();
        pair.connection.close();
        pair.queue.clear();

        pair.connection.write(OutputDocument::from_text("late"), true);
        assert_eq!(pair.connection.queued_output(), 0);
        assert_eq!(pair.connection.next_outbound_buffer(), None);
        assert!(pair.queue.is_empty());

        let mut buffer = [0u8; 8];
        assert_eq!(
            pair.connection.read_socket(&mut buffer).map_err(|e| e.kind()),
            Err(io::ErrorKind::NotConnected)
        );
        assert!(pair.connection.setup().is_err());
    }

    #[test]
    fn test_info_snapshot() {
        let pair = ready_pair();
        feed_str(&pair.connection, "a\r\n");
        pair.connection.write(OutputDocument::from_text("b"), false);
        let info = pair.connection.info();
        assert_eq!(info.id, ConnectionId::new(2));
        assert_eq!(info.state, ConnectionState::AcceptingInput);
        assert_eq!(info.inbound_queued, 1);
        assert_eq!(info.outbound_queued, 1);
        assert_eq!(info.lines_received, 1);
    }

    #[test]
    fn test_application_side_through_capability() {
        let Pair {
            connection,
            client: _client,
            queue,
        } = ready_pair();
        let connection = Arc::new(connection);
        let capability: Arc<dyn ClientConnection> = connection.clone();

        connection.feed(b"look\r\n");
        assert_eq!(capability.read_line().as_deref(), Some("look"));
        assert_eq!(capability.read_line(), None);

        capability.write(OutputDocument::from_text("You see nothing."), false);
        assert_eq!(queue.pending(capability.id()), Some(Interest::Write));
        assert_eq!(capability.info().outbound_queued, 1);

        let drained = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&drained);
        capability.set_drain_listener(Arc::new(move |_: ConnectionId| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        capability.shutdown();
        assert_eq!(capability.state(), ConnectionState::Draining);

        assert_eq!(
            connection.next_outbound_buffer().as_deref(),
            Some(&b"You see nothing.\r\n"[..])
        );
        connection.finished_writing();
        assert_eq!(drained.load(Ordering::SeqCst), 1);
        assert_eq!(capability.state(), ConnectionState::Closed);
        assert_eq!(capability.info().lines_sent, 1);
    }
}
