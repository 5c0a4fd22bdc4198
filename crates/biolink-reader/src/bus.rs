//! Multicast event dispatch.
//!
//! The bus maps each [`EventKind`] to the handlers registered for it. An
//! emission snapshots the handler list and calls every handler in
//! registration order, outside the registry lock, so handlers may subscribe
//! or unsubscribe while being dispatched.
//!
//! A handler that panics is isolated: the panic is caught, reported as a
//! [`HandlerError`] through `tracing`, and the remaining handlers still run.

use crate::error::{HandlerError, ReaderError};
use crate::event::{Event, EventKind, TypedEvent};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, trace};

type Callback = dyn Fn(&Event) + Send + Sync;

/// A registered callback.
///
/// Handlers compare by identity: a clone is the same handler, while two
/// handlers built from identical closures are different. The value returned
/// by [`EventBus::on`] is the token to pass to [`EventBus::off`].
#[derive(Clone)]
pub struct Handler(Arc<Callback>);

impl Handler {
    /// Wrap a callback receiving any event.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Handler(Arc::new(callback))
    }

    /// Wrap a callback receiving one concrete event type.
    ///
    /// Events of other types are ignored.
    pub fn typed<E, F>(callback: F) -> Self
    where
        E: TypedEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Handler::new(move |event| {
            if let Some(event) = E::from_event(event) {
                callback(event);
            }
        })
    }

    fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Registry of event subscriptions.
///
/// # Examples
///
/// ```
/// use biolink_reader::{CommunicationFailed, Event, EventBus, EventKind, Handler};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let bus = EventBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = seen.clone();
/// let handler = bus.on(
///     EventKind::CommunicationFailed,
///     Handler::new(move |_| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }),
/// );
///
/// bus.emit(&Event::from(CommunicationFailed));
/// bus.off(EventKind::CommunicationFailed, &handler);
/// bus.emit(&Event::from(CommunicationFailed));
///
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` and return it for later removal.
    ///
    /// Registering the same handler twice makes it fire twice per emission.
    pub fn on(&self, kind: EventKind, handler: Handler) -> Handler {
        trace!(event = %kind, "Subscribing handler");
        self.registry()
            .entry(kind)
            .or_default()
            .push(handler.clone());
        handler
    }

    /// Register `handler` under an event name.
    ///
    /// # Errors
    /// Returns `ReaderError::UnknownEvent` if `name` is not an event name.
    pub fn on_named(&self, name: &str, handler: Handler) -> Result<Handler, ReaderError> {
        Ok(self.on(name.parse()?, handler))
    }

    /// Register a callback for one concrete event type.
    pub fn on_event<E, F>(&self, callback: F) -> Handler
    where
        E: TypedEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.on(E::KIND, Handler::typed(callback))
    }

    /// Remove every registration of `handler` for `kind`.
    ///
    /// Removing a handler that is not registered is a no-op.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> Handler {
        let mut handlers = self.registry();
        if let Some(registered) = handlers.get_mut(&kind) {
            let before = registered.len();
            registered.retain(|h| h != handler);
            trace!(event = %kind, removed = before - registered.len(), "Unsubscribing handler");

            if registered.is_empty() {
                handlers.remove(&kind);
            }
        }
        handler.clone()
    }

    /// Remove every registration of `handler` under an event name.
    ///
    /// # Errors
    /// Returns `ReaderError::UnknownEvent` if `name` is not an event name.
    pub fn off_named(&self, name: &str, handler: &Handler) -> Result<Handler, ReaderError> {
        Ok(self.off(name.parse()?, handler))
    }

    /// Remove every registration for every event.
    pub fn off_all(&self) {
        let mut handlers = self.registry();
        let count: usize = handlers.values().map(Vec::len).sum();
        handlers.clear();
        trace!(removed = count, "Removed all handlers");
    }

    /// Number of registrations for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn emit(&self, event: &Event) -> usize {
        let kind = event.kind();
        let handlers = match self.registry().get(&kind) {
            Some(handlers) => handlers.clone(),
            None => {
                trace!(event = %kind, "No handlers registered");
                return 0;
            }
        };

        trace!(event = %kind, handlers = handlers.len(), "Emitting event");

        let mut delivered = 0;
        for handler in &handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let failure = HandlerError {
                        event: kind,
                        message: panic_message(panic.as_ref()),
                    };
                    error!(event = %kind, "{}", failure);
                }
            }
        }
        delivered
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Handler>>> {
        // Handlers run outside the lock, so a poisoned registry is still consistent
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.registry();
        let mut map = f.debug_map();
        for (kind, registered) in handlers.iter() {
            map.entry(kind, &registered.len());
        }
        map.finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
