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

//! Pending interest queue
//!
//! Any thread may ask for a connection's readiness interest to change; only
//! the reactor thread touches the multiplexer. Requests wait here until the
//! reactor drains them between dispatch rounds. The queue has its own lock,
//! which is never taken while a connection lock is held.

use crate::types::{ConnectionId, Interest};
use mio::Waker;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Queued interests indexed by connection, plus their arrival order
#[derive(Debug, Default)]
struct Items {
    order: VecDeque<ConnectionId>,
    interests: HashMap<ConnectionId, Interest>,
}

/// Cross-thread mailbox of interest changes, at most one per connection
#[derive(Debug, Default)]
pub struct InterestQueue {
    items: Mutex<Items>,
    waker: Option<Waker>,
}

impl InterestQueue {
    /// Create a queue that never wakes anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that interrupts the reactor's wait through `waker`
    pub fn with_waker(waker: Waker) -> Self {
        Self {
            items: Mutex::default(),
            waker: Some(waker),
        }
    }

    fn items(&self) -> MutexGuard<'_, Items> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an interest change for `id`, then wake the reactor if `wake` is
    /// set and the queue changed.
    ///
    /// A connection never has more than one queued item:
    /// - a queued `Write` absorbs every later request (finishing the write
    ///   asks for the next interest itself)
    /// - a queued `Read` ignores another `Read` and is replaced by anything else
    /// - a queued `None` ignores another `None` and is replaced by anything else
    ///
    /// Returns true if the queue changed.
    pub fn push(&self, id: ConnectionId, interest: Interest, wake: bool) -> bool {
        let changed = {
            let mut guard = self.items();
            let items = &mut *guard;
            match items.interests.get_mut(&id) {
                Some(Interest::Write) => {
                    trace!(connection_id = %id, requested = %interest, "Write already queued");
                    false
                }
                Some(queued) if *queued == interest => {
                    trace!(connection_id = %id, requested = %interest, "Interest already queued");
                    false
                }
                Some(queued) => {
                    trace!(
                        connection_id = %id,
                        from = %queued,
                        to = %interest,
                        "Replacing queued interest"
                    );
                    *queued = interest;
                    true
                }
                None => {
                    items.interests.insert(id, interest);
                    items.order.push_back(id);
                    true
                }
            }
        };
        if changed && wake {
            self.wake();
        }
        changed
    }

    /// Interrupt the reactor's readiness wait
    pub fn wake(&self) {
        if let Some(waker) = &self.waker {
            if let Err(error) = waker.wake() {
                trace!(error = %error, "Failed to wake reactor");
            }
        }
    }

    /// Take every queued item, oldest first
    pub fn drain(&self) -> Vec<(ConnectionId, Interest)> {
        let mut guard = self.items();
        let items = &mut *guard;
        items
            .order
            .drain(..)
            .filter_map(|id| items.interests.remove(&id).map(|interest| (id, interest)))
            .collect()
    }

    /// Interest currently queued for `id`
    pub fn pending(&self, id: ConnectionId) -> Option<Interest> {
        self.items().interests.get(&id).copied()
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items().interests.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items().interests.is_empty()
    }

    /// Discard every queued item
    pub fn clear(&self) {
        let mut items = self.items();
        items.order.clear();
        items.interests.clear();
    }
}
