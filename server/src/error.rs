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

//! Server error types

use hearth_service::ServiceError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that stop the server process
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A required setting is absent or unusable
    #[error("No usable property found in config file for: {0}")]
    MissingSetting(&'static str),

    /// The reactor could not be started
    #[error("Reactor error: {0}")]
    Reactor(#[from] ServiceError),

    /// The reactor stopped unexpectedly too many times
    #[error("Reactor stopped unexpectedly {0} times, giving up")]
    RestartLimit(usize),
}
