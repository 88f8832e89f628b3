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

//! Connection factory traits and implementations

use crate::connection::{ClientConnection, DrainListener};
use std::sync::Arc;

/// Receives every connection the reactor accepts and sets up
///
/// Connections arrive behind the [`ClientConnection`] capability, so a
/// factory works unchanged with any transport. Called on the reactor thread;
/// implementations should hand the connection off quickly rather than do
/// work inline.
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Called once per accepted connection, after a successful setup
    fn on_connect(&self, connection: Arc<dyn ClientConnection>);
}

impl<F> ConnectionFactory for F
where
    F: Fn(Arc<dyn ClientConnection>) + Send + Sync + 'static,
{
    fn on_connect(&self, connection: Arc<dyn ClientConnection>) {
        self(connection)
    }
}

/// Callback-based factory implementation
///
/// ```no_run
/// use hearth_service::CallbackFactory;
/// use std::sync::Arc;
///
/// let factory = CallbackFactory {
///     on_connect: Some(Box::new(|conn| println!("{} connected", conn.id()))),
///     on_drained: Some(Arc::new(|id| println!("{} drained", id))),
/// };
/// ```
#[derive(Default)]
pub struct CallbackFactory {
    /// Called on connection establishment
    pub on_connect: Option<Box<dyn Fn(Arc<dyn ClientConnection>) + Send + Sync + 'static>>,
    /// Installed as every connection's drain listener
    pub on_drained: Option<DrainListener>,
}

impl ConnectionFactory for CallbackFactory {
    fn on_connect(&self, connection: Arc<dyn ClientConnection>) {
        if let Some(on_drained) = &self.on_drained {
            connection.set_drain_listener(Arc::clone(on_drained));
        }
        if let Some(ref f) = self.on_connect {
            f(connection);
        }
    }
}
