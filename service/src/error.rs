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

//! Error types for the reactor and its connections

use std::io;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Reactor and connection error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O error from a socket or the readiness multiplexer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The bind address did not resolve to any socket address
    #[error("Unable to resolve bind address {address}")]
    Resolve {
        /// Address as configured
        address: String,
    },

    /// The listening socket could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address the bind was attempted on
        address: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// TCP keepalive could not be enabled on an accepted socket
    #[error("Failed to set SO_KEEPALIVE: {0}")]
    Keepalive(#[source] io::Error),

    /// The readiness wait failed
    #[error("Readiness wait failed: {0}")]
    Poll(#[source] io::Error),

    /// The reactor thread could not be spawned
    #[error("Failed to spawn reactor thread: {0}")]
    Spawn(#[source] io::Error),

    /// Connection has been closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reactor is not running
    #[error("Reactor stopped")]
    ReactorStopped,
}

impl ServiceError {
    /// Check if the error is fatal to reactor startup or to a running reactor
    ///
    /// Fatal errors are never retried here; restarting is left to whoever
    /// supervises the reactor.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::Resolve { .. }
                | ServiceError::Bind { .. }
                | ServiceError::Poll(_)
                | ServiceError::Spawn(_)
                | ServiceError::ReactorStopped
        )
    }

    /// Check if the error only concerns a single connection
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Io(_) | ServiceError::Keepalive(_) | ServiceError::ConnectionClosed
        )
    }
}
