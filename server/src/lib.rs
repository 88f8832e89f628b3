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

//! Hearth Server
//!
//! Process-level wiring around the reactor: settings loaded from a TOML
//! file, a supervisor that keeps the reactor alive, and the default
//! greeting factory used by the `hearth` binary.

mod config;
mod error;
mod supervisor;
mod welcome;

pub use config::{ConfigSource, ServerSettings};
pub use error::{Result, ServerError};
pub use supervisor::{RuntimeContext, Supervisor};
pub use welcome::WelcomeFactory;
