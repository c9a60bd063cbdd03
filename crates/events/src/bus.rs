//! Event publishing/subscription (mechanics only).
//!
//! The bus is a registry of event kind → ordered handler list. Publishing is
//! **fire-and-forget**:
//!
//! - every matching handler runs as its own task, concurrently with the others
//! - `publish` returns once the tasks are spawned, not when they finish
//! - no completion order, no back-pressure, no persistence
//! - at-most-once: anything still queued when the process exits is lost
//! - no error channel: handler failures are logged here and go nowhere else
//!
//! ```text
//! Write store ──publish──► EventBus ──spawn──► handler #1 (task)
//!                                     ├─spawn──► handler #2 (task)
//!                                     └─spawn──► ...
//! ```
//!
//! Inside a Tokio runtime each handler becomes a Tokio task. Outside one the bus
//! falls back to a dedicated OS thread per handler so `publish` never blocks.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::event::{Event, PostEvent};

/// Failure reported by a handler. Logged by the bus, never propagated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// A subscribed callback. Shared between every task that runs it.
pub type Handler<E> = Arc<dyn Fn(E) -> HandlerResult + Send + Sync>;

/// Counts dispatched-but-unfinished handler invocations.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Held by each dispatched invocation; releases its slot on drop, including
/// when the handler panics.
struct InFlightTicket(Arc<InFlight>);

impl InFlightTicket {
    fn issue(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// In-process publish/subscribe dispatcher.
///
/// Constructed explicitly and shared by `Arc`; there is no global instance.
pub struct EventBus<E: Event> {
    handlers: RwLock<HashMap<E::Kind, Vec<Handler<E>>>>,
    in_flight: Arc<InFlight>,
}

/// The bus specialised to post events.
pub type PostEventBus = EventBus<PostEvent>;

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `kind`.
    ///
    /// No deduplication: subscribing the same handler twice runs it twice per
    /// event. Events published before this call are not replayed.
    pub fn subscribe<F>(&self, kind: E::Kind, handler: F)
    where
        F: Fn(E) -> HandlerResult + Send + Sync + 'static,
    {
        // A push cannot leave the map half-written, so a poisoned lock is still usable.
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let list = handlers.entry(kind).or_default();
        list.push(Arc::new(handler));
        debug!(kind = ?kind, handlers = list.len(), "handler subscribed");
    }

    /// Dispatches `event` to every handler subscribed to its kind and returns
    /// without waiting for any of them.
    pub fn publish(&self, event: E) {
        let kind = event.kind();
        let targets: Vec<Handler<E>> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers.get(&kind).cloned().unwrap_or_default()
        };

        debug!(
            event_type = event.event_type(),
            handlers = targets.len(),
            "publishing event"
        );

        let runtime = Handle::try_current().ok();
        for handler in targets {
            let ticket = InFlightTicket::issue(&self.in_flight);
            let event = event.clone();
            let job = move || {
                let _ticket = ticket;
                run_handler(&handler, event);
            };

            match &runtime {
                Some(rt) => {
                    rt.spawn(async move { job() });
                }
                None => {
                    // On spawn failure the closure (and its ticket) is dropped here.
                    if let Err(err) = thread::Builder::new()
                        .name("blogsync-event-handler".to_string())
                        .spawn(job)
                    {
                        error!(kind = ?kind, error = %err, "failed to spawn event handler thread");
                    }
                }
            }
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Handler invocations dispatched but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Waits until no handler invocation is in flight.
    ///
    /// Intended for graceful drain and tests. It is a point-in-time barrier:
    /// events published after it returns are not covered.
    pub async fn quiesce(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            in_flight: Arc::new(InFlight::default()),
        }
    }
}

impl<E: Event> core::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<E::Kind, usize> = handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus")
            .field("handlers", &counts)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn run_handler<E: Event>(handler: &Handler<E>, event: E) {
    let event_type = event.event_type();
    match catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(event_type, error = %err, "event handler failed");
        }
        Err(_) => {
            error!(event_type, "event handler panicked");
        }
    }
}
