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

//! Core types for the reactor and its connections

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Unique identifier for a connection (monotonically increasing, never reused
/// within one reactor)
///
/// The value doubles as the connection's readiness token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Socket readiness a connection wants the reactor to watch for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interest {
    /// Not watched at all; the socket is deregistered
    None,
    /// Watched for incoming data
    Read,
    /// Watched for room in the send buffer, and for incoming data
    Write,
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Wrapped but not yet set up
    Created,
    /// Set up and queueing completed input lines
    AcceptingInput,
    /// Set up but discarding input
    RefusingInput,
    /// Shutting down; queued output is still being flushed
    Draining,
    /// Socket closed, queues cleared
    Closed,
}

impl ConnectionState {
    /// Check if the connection is in a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if the connection still accepts output
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::AcceptingInput => write!(f, "accepting-input"),
            Self::RefusingInput => write!(f, "refusing-input"),
            Self::Draining => write!(f, "draining"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Connection information snapshot
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Current state
    pub state: ConnectionState,
    /// Peer address, or a placeholder when it could not be read
    pub address: String,
    /// When the connection was created
    pub created_at: Instant,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total lines sent
    pub lines_sent: u64,
    /// Total lines received
    pub lines_received: u64,
    /// Completed lines waiting to be read
    pub inbound_queued: usize,
    /// Output buffers waiting to be written
    pub outbound_queued: usize,
}

impl ConnectionInfo {
    /// Get the connection duration
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Reactor snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ReactorSnapshot {
    /// Number of live connections
    pub active_connections: usize,
    /// Listening address
    pub local_addr: SocketAddr,
    /// Whether new connections are admitted
    pub accepting: bool,
    /// Whether the event loop is running
    pub running: bool,
}

impl fmt::Display for ReactorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reactor {{ active: {}, addr: {}, accepting: {}, running: {} }}",
            self.active_connections, self.local_addr, self.accepting, self.running
        )
    }
}
