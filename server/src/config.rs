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

//! Server configuration
//!
//! Settings are read from a flat TOML file:
//!
//! ```toml
//! serverName = "Hearth"
//! serverIP = "0.0.0.0"
//! telnetPort = 4000
//! outboundLimit = 500
//! ```
//!
//! Lookups never fail: a missing string reads as `""` and a missing or
//! malformed integer reads as `0`. [`ServerSettings`] decides which of
//! those are fatal.

use crate::error::{Result, ServerError};
use hearth_service::{ConnectionLimits, ReactorConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use toml::{Table, Value};
use tracing::{info, warn};

const DEFAULT_TELNET_PORT: i64 = 23;
const DEFAULT_FAILURE_LIMIT: i64 = 5;
const DEFAULT_SHUTDOWN_GRACE_SECONDS: i64 = 5;

/// Key/value settings loaded from a configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ConfigSource {
    table: Table,
}

impl ConfigSource {
    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse(&text)?;
        info!(path = %path.display(), settings = source.table.len(), "Loaded config file");
        Ok(source)
    }

    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Setting as text. Integers and other scalars are rendered; a missing
    /// key yields an empty string.
    pub fn get_string(&self, key: &str) -> String {
        match self.table.get(key) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => {
                info!(key, "No setting found");
                String::new()
            }
        }
    }

    /// Setting as text, or `default` when it reads as empty
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        let value = self.get_string(key);
        if value.is_empty() {
            default.to_string()
        } else {
            value
        }
    }

    /// Setting as an integer. Strings are parsed; a missing or unparseable
    /// value yields `0`.
    pub fn get_int(&self, key: &str) -> i64 {
        match self.table.get(key) {
            Some(Value::Integer(value)) => *value,
            Some(Value::String(text)) => text.trim().parse().unwrap_or_else(|_| {
                info!(key, value = %text, "Setting is not an integer");
                0
            }),
            Some(other) => {
                info!(key, value = %other, "Setting is not an integer");
                0
            }
            None => {
                info!(key, "No setting found");
                0
            }
        }
    }

    /// Setting as an integer, or `default` when it reads as `0`
    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        match self.get_int(key) {
            0 => default,
            value => value,
        }
    }

    /// Number of settings loaded
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if no settings were loaded
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Validated process settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Display name of the server
    pub server_name: String,
    /// Address the listener binds to
    pub server_ip: String,
    /// Port the listener binds to
    pub telnet_port: u16,
    /// Bytes requested per socket read
    pub read_chunk_size: usize,
    /// Completed input lines held per connection
    pub inbound_limit: usize,
    /// Output lines held per connection
    pub outbound_limit: usize,
    /// Longest accepted input line
    pub max_input_length: usize,
    /// Unexpected reactor exits tolerated before giving up
    pub failure_limit: usize,
    /// How long shutdown waits for the reactor thread
    pub shutdown_grace: Duration,
}

impl ServerSettings {
    /// Settings for a listener on `server_ip:telnet_port`, everything else
    /// at its default
    pub fn new(server_ip: impl Into<String>, telnet_port: u16) -> Self {
        let limits = ConnectionLimits::default();
        let reactor = ReactorConfig::default();
        Self {
            server_name: String::from("Hearth"),
            server_ip: server_ip.into(),
            telnet_port,
            read_chunk_size: reactor.read_chunk_size,
            inbound_limit: limits.inbound_capacity,
            outbound_limit: limits.outbound_capacity,
            max_input_length: limits.max_input_length,
            failure_limit: DEFAULT_FAILURE_LIMIT as usize,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECONDS as u64),
        }
    }

    /// Validate the settings found in `source`
    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let server_ip = source.get_string("serverIP");
        if server_ip.is_empty() {
            return Err(ServerError::MissingSetting("serverIP"));
        }
        let telnet_port = u16::try_from(source.get_int_or("telnetPort", DEFAULT_TELNET_PORT))
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ServerError::MissingSetting("telnetPort"))?;

        let defaults = Self::new(server_ip, telnet_port);
        Ok(Self {
            server_name: source.get_string_or("serverName", &defaults.server_name),
            read_chunk_size: positive(source, "readChunkSize", defaults.read_chunk_size),
            inbound_limit: positive(source, "inboundLimit", defaults.inbound_limit),
            outbound_limit: positive(source, "outboundLimit", defaults.outbound_limit),
            max_input_length: positive(source, "maxInputLength", defaults.max_input_length),
            failure_limit: positive(source, "failureLimit", defaults.failure_limit),
            shutdown_grace: Duration::from_secs(positive(
                source,
                "shutdownGraceSeconds",
                DEFAULT_SHUTDOWN_GRACE_SECONDS as usize,
            ) as u64),
            ..defaults
        })
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(&ConfigSource::load(path)?)
    }

    /// Reactor configuration for these settings
    pub fn reactor_config(&self) -> ReactorConfig {
        let limits = ConnectionLimits::default()
            .with_inbound_capacity(self.inbound_limit)
            .with_outbound_capacity(self.outbound_limit)
            .with_max_input_length(self.max_input_length);
        ReactorConfig::new(self.server_ip.clone(), self.telnet_port)
            .with_read_chunk_size(self.read_chunk_size)
            .with_limits(limits)
    }
}

fn positive(source: &ConfigSource, key: &str, default: usize) -> usize {
    let value = source.get_int_or(key, default as i64);
    usize::try_from(value).unwrap_or_else(|_| {
        warn!(key, value, default, "Negative setting ignored");
        default
    })
}
