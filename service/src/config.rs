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

//! Reactor and connection configuration
//!
//! ```
//! use hearth_service::{ConnectionLimits, ReactorConfig};
//!
//! let config = ReactorConfig::new("127.0.0.1", 4000)
//!     .with_read_chunk_size(128)
//!     .with_limits(ConnectionLimits::default().with_outbound_capacity(200));
//! ```

/// Per-connection queue bounds and socket options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Completed input lines held before further lines are dropped
    pub inbound_capacity: usize,

    /// Output buffers held before further document lines are dropped
    pub outbound_capacity: usize,

    /// Longest accepted input line in bytes; longer lines are dropped whole
    pub max_input_length: usize,

    /// Enable TCP keepalive on accepted sockets
    pub keepalive: bool,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            inbound_capacity: 1000,
            outbound_capacity: 1000,
            max_input_length: 5000,
            keepalive: true,
        }
    }
}

impl ConnectionLimits {
    /// Set the inbound line capacity
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity;
        self
    }

    /// Set the outbound buffer capacity
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    /// Set the maximum input line length
    pub fn with_max_input_length(mut self, length: usize) -> Self {
        self.max_input_length = length;
        self
    }

    /// Enable or disable keepalive
    pub fn with_keepalive(mut self, enabled: bool) -> Self {
        self.keepalive = enabled;
        self
    }
}

/// Listener and event loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactorConfig {
    /// Host name or IP address to listen on
    pub bind_address: String,

    /// Port to listen on; `0` picks an ephemeral port
    pub port: u16,

    /// Size of the buffer each socket read fills
    pub read_chunk_size: usize,

    /// Readiness events collected per wait
    pub events_capacity: usize,

    /// Limits applied to every accepted connection
    pub limits: ConnectionLimits,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 23,
            read_chunk_size: 64,
            events_capacity: 1024,
            limits: ConnectionLimits::default(),
        }
    }
}

impl ReactorConfig {
    /// Create a configuration listening on the given address and port
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the read chunk size
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the event capacity
    pub fn with_events_capacity(mut self, capacity: usize) -> Self {
        self.events_capacity = capacity;
        self
    }

    /// Set the connection limits
    pub fn with_limits(mut self, limits: ConnectionLimits) -> Self {
        self.limits = limits;
        self
    }
}
