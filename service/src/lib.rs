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

//! Telnet Reactor and Connections
//!
//! This crate is the network I/O layer of a text-based multiplayer server:
//! a single reactor thread multiplexes every socket, reconstructs input
//! lines from raw bytes, and flushes coloured output documents back to the
//! peers.
//!
//! # Architecture
//!
//! ```text
//! Reactor (one thread, owns Poll + listener)
//!     ↓ accept / read / write
//! TelnetConnection (Arc, one lock each) ← application threads, as dyn ClientConnection
//!     ↓ interest requests
//! InterestQueue (own lock) → applied by the reactor between rounds
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hearth_service::{ClientConnection, Reactor, ReactorConfig};
//! use hearth_output::OutputDocument;
//! use std::sync::Arc;
//!
//! let factory = Arc::new(|conn: Arc<dyn ClientConnection>| {
//!     conn.write(OutputDocument::from_text("Welcome!"), true);
//! });
//! let reactor = Reactor::start(ReactorConfig::new("0.0.0.0", 4000), factory)?;
//! reactor.handle().set_accepting(true);
//! reactor.join()?;
//! # Ok::<(), hearth_service::ServiceError>(())
//! ```

mod config;
mod connection;
mod error;
mod handler;
mod interest;
mod reactor;
mod types;

pub use config::{ConnectionLimits, ReactorConfig};
pub use connection::{ClientConnection, DrainListener, TelnetConnection, UNKNOWN_ADDRESS};
pub use error::{Result, ServiceError};
pub use handler::{CallbackFactory, ConnectionFactory};
pub use interest::InterestQueue;
pub use reactor::{Control, Reactor, ReactorHandle, ReactorThread};
pub use types::{ConnectionId, ConnectionInfo, ConnectionState, Interest, ReactorSnapshot};
