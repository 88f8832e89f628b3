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

//! Readiness reactor
//!
//! One thread owns the multiplexer, the listening socket and every socket
//! read and write. Other threads talk to it through a [`ReactorHandle`]:
//! control messages over a channel, interest changes through the shared
//! [`InterestQueue`], both followed by a wake-up.
//!
//! ```text
//! poll ─┬─ Token(0) listener ── accept until WouldBlock ── setup ── factory
//!       ├─ Token(1) waker
//!       └─ Token(n) connection ── read chunks ── feed
//!                              └─ write buffers ── finished / partial
//! then: drain InterestQueue ── register / reregister / deregister
//! ```

use crate::config::ReactorConfig;
use crate::connection::{ClientConnection, TelnetConnection};
use crate::error::{Result, ServiceError};
use crate::handler::ConnectionFactory;
use crate::interest::InterestQueue;
use crate::types::{ConnectionId, Interest, ReactorSnapshot};
use dashmap::DashMap;
use metrics::counter;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Poll, Token, Waker};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, instrument, trace, warn};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION_ID: u64 = 2;

/// Messages a [`ReactorHandle`] sends to the reactor thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Leave the event loop and release every resource
    Stop,
}

/// State shared between the reactor thread and its handles
struct Shared {
    accepting: AtomicBool,
    running: AtomicBool,
    interests: Arc<InterestQueue>,
    connections: DashMap<ConnectionId, Arc<TelnetConnection>>,
    control: Sender<Control>,
    local_addr: SocketAddr,
}

/// Single-threaded non-blocking Telnet reactor
pub struct Reactor {
    config: ReactorConfig,
    poll: Option<Poll>,
    listener: Option<TcpListener>,
    shared: Arc<Shared>,
    control: Receiver<Control>,
    factory: Arc<dyn ConnectionFactory>,
    next_id: u64,
    buffer: Vec<u8>,
}

impl Reactor {
    /// Bind the listening socket and prepare the multiplexer.
    ///
    /// New connections are refused until [`ReactorHandle::set_accepting`]
    /// enables them.
    #[instrument(skip(config, factory), fields(address = %config.bind_address, port = config.port))]
    pub fn bind(config: ReactorConfig, factory: Arc<dyn ConnectionFactory>) -> Result<Self> {
        let address = resolve(&config.bind_address, config.port)?;
        let poll = Poll::new().map_err(ServiceError::Poll)?;
        let waker = Waker::new(poll.registry(), WAKER)?;

        let mut listener = TcpListener::bind(address).map_err(|source| ServiceError::Bind {
            address: address.to_string(),
            source,
        })?;
        poll.registry()
            .register(&mut listener, LISTENER, mio::Interest::READABLE)?;
        let local_addr = listener.local_addr()?;

        let (sender, receiver) = mpsc::channel();
        info!(local_addr = %local_addr, "Reactor bound");

        Ok(Self {
            buffer: vec![0; config.read_chunk_size.max(1)],
            config,
            poll: Some(poll),
            listener: Some(listener),
            shared: Arc::new(Shared {
                accepting: AtomicBool::new(false),
                running: AtomicBool::new(true),
                interests: Arc::new(InterestQueue::with_waker(waker)),
                connections: DashMap::new(),
                control: sender,
                local_addr,
            }),
            control: receiver,
            factory,
            next_id: FIRST_CONNECTION_ID,
        })
    }

    /// Bind and run the reactor on its own named thread
    pub fn start(
        config: ReactorConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<ReactorThread> {
        Self::bind(config, factory)?.spawn()
    }

    /// Run this reactor on its own named thread
    pub fn spawn(self) -> Result<ReactorThread> {
        let handle = self.handle();
        let join = thread::Builder::new()
            .name("hearth-reactor".to_string())
            .spawn(move || self.run())
            .map_err(ServiceError::Spawn)?;
        Ok(ReactorThread { handle, join })
    }

    /// Get a handle for controlling this reactor from other threads
    pub fn handle(&self) -> ReactorHandle {
        ReactorHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run the event loop on the calling thread until stopped or the
    /// readiness wait fails. Resources are released either way.
    pub fn run(mut self) -> Result<()> {
        info!(local_addr = %self.shared.local_addr, "Reactor running");
        let result = self.event_loop();
        self.release_all_resources();
        match &result {
            Ok(()) => info!("Reactor stopped"),
            Err(error) => error!(error = %error, "Reactor stopped after failure"),
        }
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.config.events_capacity.max(1));
        loop {
            let Some(poll) = self.poll.as_mut() else {
                return Err(ServiceError::ReactorStopped);
            };
            if let Err(error) = poll.poll(&mut events, None) {
                if error.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %error, "Readiness wait failed");
                return Err(ServiceError::Poll(error));
            }
            if self.stop_requested() {
                return Ok(());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept(),
                    WAKER => trace!("Reactor woken"),
                    Token(token) => self.connection_ready(
                        ConnectionId::new(token as u64),
                        event.is_readable() || event.is_read_closed() || event.is_error(),
                        event.is_writable(),
                    ),
                }
            }

            self.apply_interest_changes();
            if self.stop_requested() {
                return Ok(());
            }
        }
    }

    fn stop_requested(&self) -> bool {
        match self.control.try_recv() {
            Ok(Control::Stop) => {
                debug!("Stop requested");
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }

    // Accept

    fn accept(&mut self) {
        loop {
            let Some(listener) = self.listener.as_ref() else {
                return;
            };
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    if self.shared.accepting.load(Ordering::SeqCst) {
                        self.admit(stream, peer_addr);
                    } else {
                        warn!(peer_addr = %peer_addr, "Refusing new connection");
                        counter!("hearth.connections.rejected").increment(1);
                        drop(stream);
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    warn!(error = %error, "Failed to accept connection");
                    return;
                }
            }
        }
    }

    fn admit(&mut self, stream: TcpStream, peer_addr: SocketAddr) {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        debug!(connection_id = %id, peer_addr = %peer_addr, "Accepted connection");

        let connection = Arc::new(TelnetConnection::new(
            id,
            stream,
            self.config.limits.clone(),
            Arc::clone(&self.shared.interests),
        ));
        if let Err(error) = connection.setup() {
            warn!(connection_id = %id, error = %error, "Connection setup failed");
            counter!("hearth.connections.rejected").increment(1);
            connection.close();
            return;
        }

        counter!("hearth.connections.accepted").increment(1);
        self.shared.connections.insert(id, Arc::clone(&connection));
        self.factory.on_connect(connection);
    }

    // Connection I/O

    fn connection_ready(&mut self, id: ConnectionId, readable: bool, writable: bool) {
        let Some(connection) = self.lookup(id) else {
            trace!(connection_id = %id, "Event for unknown connection");
            return;
        };
        if readable && !self.read(&connection) {
            return;
        }
        if writable {
            self.write(&connection);
        }
    }

    /// Read until the socket has nothing more. Returns false if the
    /// connection was closed.
    #[instrument(level = "trace", skip_all, fields(connection_id = %connection.id()))]
    fn read(&mut self, connection: &TelnetConnection) -> bool {
        loop {
            match connection.read_socket(&mut self.buffer) {
                Ok(0) => {
                    debug!("Peer closed connection");
                    self.close_connection(connection);
                    return false;
                }
                Ok(count) => {
                    trace!(bytes = count, "Read chunk");
                    counter!("hearth.bytes.read").increment(count as u64);
                    connection.feed(&self.buffer[..count]);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return true,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    warn!(error = %error, "Read failed, closing connection");
                    self.close_connection(connection);
                    return false;
                }
            }
        }
    }

    /// Write queued buffers until the queue empties or the socket is full
    #[instrument(level = "trace", skip_all, fields(connection_id = %connection.id()))]
    fn write(&mut self, connection: &TelnetConnection) {
        while let Some(buffer) = connection.next_outbound_buffer() {
            match connection.write_socket(&buffer) {
                Ok(count) if count == buffer.len() => {
                    counter!("hearth.bytes.written").increment(count as u64);
                    connection.finished_writing();
                }
                Ok(0) => {
                    warn!("Socket accepted no bytes, closing connection");
                    self.close_connection(connection);
                    return;
                }
                Ok(count) => {
                    trace!(bytes = count, remaining = buffer.len() - count, "Partial write");
                    counter!("hearth.bytes.written").increment(count as u64);
                    connection.partially_written(count);
                    return;
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    warn!(error = %error, "Write failed, closing connection");
                    self.close_connection(connection);
                    return;
                }
            }
        }
    }

    fn lookup(&self, id: ConnectionId) -> Option<Arc<TelnetConnection>> {
        self.shared
            .connections
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn close_connection(&self, connection: &TelnetConnection) {
        if let Some(poll) = self.poll.as_ref() {
            connection.deregister(poll.registry());
        }
        connection.close();
        self.shared.connections.remove(&connection.id());
    }

    // Interest changes

    fn apply_interest_changes(&self) {
        for (id, interest) in self.shared.interests.drain() {
            let Some(connection) = self.lookup(id) else {
                trace!(
                    connection_id = %id,
                    interest = %interest,
                    "Interest change for unknown connection"
                );
                continue;
            };
            let Some(poll) = self.poll.as_ref() else {
                return;
            };
            match connection.apply_interest(poll.registry(), interest) {
                Ok(true) => trace!(connection_id = %id, interest = %interest, "Interest applied"),
                Ok(false) => {
                    debug!(connection_id = %id, "Forgetting closed connection");
                    self.shared.connections.remove(&id);
                }
                Err(error) => {
                    warn!(
                        connection_id = %id,
                        error = %error,
                        "Failed to update registration, closing connection"
                    );
                    self.close_connection(&connection);
                }
            }
        }
    }

    /// Close the listener and every connection, then the multiplexer.
    /// Safe to call more than once.
    pub fn release_all_resources(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            if let Some(poll) = self.poll.as_ref() {
                if let Err(error) = poll.registry().deregister(&mut listener) {
                    trace!(error = %error, "Failed to deregister listener");
                }
            }
            drop(listener);
            info!(local_addr = %self.shared.local_addr, "Listener closed");
        }

        let connections: Vec<Arc<TelnetConnection>> = self
            .shared
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.shared.connections.clear();
        for connection in connections {
            if let Some(poll) = self.poll.as_ref() {
                connection.deregister(poll.registry());
            }
            connection.close();
        }
        self.shared.interests.clear();

        if self.poll.take().is_some() {
            info!("Reactor resources released");
        }
        self.shared.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.release_all_resources();
    }
}

fn resolve(address: &str, port: u16) -> Result<SocketAddr> {
    (address, port)
        .to_socket_addrs()
        .map_err(|_| ServiceError::Resolve {
            address: format!("{address}:{port}"),
        })?
        .next()
        .ok_or_else(|| ServiceError::Resolve {
            address: format!("{address}:{port}"),
        })
}

/// Cloneable, thread-safe control surface of a [`Reactor`]
#[derive(Clone)]
pub struct ReactorHandle {
    shared: Arc<Shared>,
}

impl ReactorHandle {
    /// Admit or refuse new connections
    pub fn set_accepting(&self, accepting: bool) {
        self.shared.accepting.store(accepting, Ordering::SeqCst);
        debug!(accepting, "Accepting updated");
    }

    /// Check if new connections are admitted
    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    /// Queue an interest change for a connection. Returns true if the
    /// queue changed.
    pub fn request_interest_change(
        &self,
        id: ConnectionId,
        interest: Interest,
        wake: bool,
    ) -> bool {
        self.shared.interests.push(id, interest, wake)
    }

    /// Interest change still waiting to be applied for a connection
    pub fn pending_interest(&self, id: ConnectionId) -> Option<Interest> {
        self.shared.interests.pending(id)
    }

    /// Ask the reactor to stop. Returns immediately.
    pub fn stop(&self) {
        if self.shared.control.send(Control::Stop).is_err() {
            trace!("Reactor already gone");
        }
        self.shared.interests.wake();
    }

    /// Check if the event loop has not exited yet
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.shared.connections.len()
    }

    /// Look up a live connection
    pub fn connection(&self, id: ConnectionId) -> Option<Arc<dyn ClientConnection>> {
        self.shared
            .connections
            .get(&id)
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn ClientConnection>)
    }

    /// Get a snapshot of the reactor
    pub fn snapshot(&self) -> ReactorSnapshot {
        ReactorSnapshot {
            active_connections: self.connection_count(),
            local_addr: self.local_addr(),
            accepting: self.is_accepting(),
            running: self.is_running(),
        }
    }
}

/// A reactor running on its own thread
pub struct ReactorThread {
    handle: ReactorHandle,
    join: JoinHandle<Result<()>>,
}

impl ReactorThread {
    /// Get the handle of the running reactor
    pub fn handle(&self) -> &ReactorHandle {
        &self.handle
    }

    /// Check if the thread has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the thread to exit and return the loop's result
    pub fn join(self) -> Result<()> {
        self.join.join().unwrap_or_else(|_| {
            error!("Reactor thread panicked");
            Err(ServiceError::ReactorStopped)
        })
    }
}
