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

//! Reactor supervision
//!
//! The [`Supervisor`] owns the reactor thread for the lifetime of the
//! process. It restarts the reactor when it stops without being asked to,
//! gives up after too many such stops, and performs the graceful shutdown
//! sequence when the [`RuntimeContext`] is told to stop.

use crate::config::ServerSettings;
use crate::error::{Result, ServerError};
use hearth_service::{ConnectionFactory, Reactor, ReactorHandle, ReactorThread};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, interval, sleep};
use tracing::{debug, error, info, instrument, trace, warn};

/// How often the supervisor checks on the reactor thread
const MONITOR_INTERVAL: Duration = Duration::from_millis(100);

/// Process-wide state shared between the supervisor and whoever may ask it
/// to stop
pub struct RuntimeContext {
    settings: ServerSettings,
    factory: Arc<dyn ConnectionFactory>,
    shutdown: Notify,
    running: AtomicBool,
    failures: AtomicUsize,
    reactor: Mutex<Option<ReactorHandle>>,
}

impl RuntimeContext {
    /// Create a context for a server that has not started yet
    pub fn new(settings: ServerSettings, factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            settings,
            factory,
            shutdown: Notify::new(),
            running: AtomicBool::new(true),
            failures: AtomicUsize::new(0),
            reactor: Mutex::new(None),
        }
    }

    /// Settings the server runs with
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Ask the supervisor to shut down. Safe to call more than once.
    pub fn request_shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
        self.shutdown.notify_one();
    }

    /// Check if shutdown has not been requested yet
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of unexpected reactor stops so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Handle of the current reactor, if one is running
    pub fn reactor(&self) -> Option<ReactorHandle> {
        self.reactor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_reactor(&self, handle: Option<ReactorHandle>) {
        *self.reactor.lock().unwrap_or_else(PoisonError::into_inner) = handle;
    }
}

/// Starts, watches, restarts and finally stops the reactor thread
pub struct Supervisor {
    context: Arc<RuntimeContext>,
    reactor: Option<ReactorThread>,
}

impl Supervisor {
    /// Create a supervisor for `context`
    pub fn new(context: Arc<RuntimeContext>) -> Self {
        Self {
            context,
            reactor: None,
        }
    }

    /// Run until shutdown is requested or the reactor fails too often.
    ///
    /// The reactor is always shut down before this returns.
    pub async fn run(mut self) -> Result<()> {
        info!(
            server_name = %self.context.settings.server_name,
            "Starting server"
        );
        let result = match self.start_reactor() {
            Ok(()) => self.monitor().await,
            Err(error) => Err(error),
        };
        if let Err(ref error) = result {
            error!(error = %error, "Supervisor stopping");
        }
        self.shutdown().await;
        result
    }

    fn start_reactor(&mut self) -> Result<()> {
        let settings = &self.context.settings;
        info!(
            address = %settings.server_ip,
            port = settings.telnet_port,
            "Starting reactor"
        );
        let reactor = Reactor::start(settings.reactor_config(), Arc::clone(&self.context.factory))?;
        reactor.handle().set_accepting(true);
        self.context.set_reactor(Some(reactor.handle().clone()));
        self.reactor = Some(reactor);
        Ok(())
    }

    async fn monitor(&mut self) -> Result<()> {
        let mut ticker = interval(MONITOR_INTERVAL);
        while self.context.is_running() {
            tokio::select! {
                _ = self.context.shutdown.notified() => {}
                _ = ticker.tick() => trace!("Checking reactor"),
            }
            if !self.context.is_running() {
                break;
            }
            if self.reactor.as_ref().is_none_or(ReactorThread::is_finished) {
                self.reactor_stopped_unexpectedly()?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn reactor_stopped_unexpectedly(&mut self) -> Result<()> {
        self.context.set_reactor(None);
        match self.reactor.take().map(ReactorThread::join) {
            Some(Err(error)) => error!(error = %error, "Reactor stopped without being asked to"),
            _ => error!("Reactor stopped without being asked to"),
        }

        let failures = self.context.failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures > self.context.settings.failure_limit {
            error!(failures, "Reactor stopped unexpectedly too many times");
            return Err(ServerError::RestartLimit(failures));
        }
        warn!(failures, "Restarting reactor");
        self.start_reactor()
    }

    async fn shutdown(&mut self) {
        info!("Starting shutdown");
        self.context.set_reactor(None);
        let Some(reactor) = self.reactor.take() else {
            info!("Finished shutdown");
            return;
        };

        reactor.handle().set_accepting(false);
        reactor.handle().stop();

        let deadline = Instant::now() + self.context.settings.shutdown_grace;
        while !reactor.is_finished() && Instant::now() < deadline {
            sleep(MONITOR_INTERVAL).await;
        }

        if reactor.is_finished() {
            match reactor.join() {
                Ok(()) => debug!("Reactor joined"),
                Err(error) => warn!(error = %error, "Reactor exited with an error"),
            }
        } else {
            warn!(
                grace = ?self.context.settings.shutdown_grace,
                "Reactor did not shut down in time, continuing anyway"
            );
        }
        info!("Finished shutdown");
    }
}
