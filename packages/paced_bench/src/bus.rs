//! Named-event publish/subscribe.

use std::any::type_name;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use foldhash::{HashMap, HashMapExt};

/// Something that observers can subscribe to, keyed by event names of type `E`.
///
/// Every method accepts either a single event name or a collection of them: any type that
/// iterates over event names works. [`SuiteEvent`][crate::SuiteEvent] iterates over itself,
/// so `SuiteEvent::Test` and `[SuiteEvent::Started, SuiteEvent::Completed]` are both accepted.
pub trait Notifiable<E> {
    /// The handler type, typically a `dyn Fn(..)` trait object.
    type Handler: ?Sized;

    /// Registers `handler` for every event in `events`.
    ///
    /// Registering the same handler twice for the same event is permitted; it will then be
    /// called twice per publication.
    fn subscribe(&mut self, events: impl IntoIterator<Item = E>, handler: &Arc<Self::Handler>);

    /// Removes one registration of `handler` (matched by pointer identity) for every event
    /// in `events`. Events for which the handler is not registered are skipped.
    fn unsubscribe(&mut self, events: impl IntoIterator<Item = E>, handler: &Arc<Self::Handler>);

    /// Synchronously hands every handler registered for each event in `events` to `deliver`,
    /// in registration order.
    ///
    /// A panic in `deliver` aborts the remaining deliveries.
    fn publish(&self, events: impl IntoIterator<Item = E>, deliver: impl FnMut(E, &Self::Handler));
}

/// Keeps the handlers registered for each event name.
///
/// The bus does not know how handlers are called; the publisher supplies a `deliver`
/// callback that receives each handler in turn. This allows handlers to take borrowed
/// payloads whose lifetime is limited to a single publication.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use paced_bench::{EventBus, Notifiable};
///
/// type Handler = dyn Fn(&str, u32) + Send + Sync;
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let handler: Arc<Handler> = Arc::new({
///     let seen = Arc::clone(&seen);
///     move |_event: &str, value: u32| {
///         seen.fetch_add(value as usize, Ordering::Relaxed);
///     }
/// });
///
/// let mut bus = EventBus::<&str, Handler>::new();
/// bus.subscribe(["a", "b"], &handler);
///
/// bus.publish(["a", "b"], |event, handler| handler(event, 5));
/// assert_eq!(seen.load(Ordering::Relaxed), 10);
/// ```
pub struct EventBus<E, H: ?Sized> {
    handlers: HashMap<E, Vec<Arc<H>>>,
}

impl<E, H> EventBus<E, H>
where
    E: Copy + Eq + Hash,
    H: ?Sized,
{
    /// Creates a bus without any registered handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Number of registrations for `event`.
    #[must_use]
    pub fn handler_count(&self, event: E) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }
}

impl<E, H> Notifiable<E> for EventBus<E, H>
where
    E: Copy + Eq + Hash,
    H: ?Sized,
{
    type Handler = H;

    fn subscribe(&mut self, events: impl IntoIterator<Item = E>, handler: &Arc<H>) {
        for event in events {
            self.handlers
                .entry(event)
                .or_default()
                .push(Arc::clone(handler));
        }
    }

    fn unsubscribe(&mut self, events: impl IntoIterator<Item = E>, handler: &Arc<H>) {
        for event in events {
            let Some(handlers) = self.handlers.get_mut(&event) else {
                continue;
            };

            if let Some(index) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
                handlers.remove(index);
            }
        }
    }

    fn publish(&self, events: impl IntoIterator<Item = E>, mut deliver: impl FnMut(E, &H)) {
        for event in events {
            let Some(handlers) = self.handlers.get(&event) else {
                continue;
            };

            for handler in handlers {
                deliver(event, handler);
            }
        }
    }
}

impl<E, H> Default for EventBus<E, H>
where
    E: Copy + Eq + Hash,
    H: ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, H> fmt::Debug for EventBus<E, H>
where
    E: fmt::Debug,
    H: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self
            .handlers
            .iter()
            .map(|(event, handlers)| (event, handlers.len()))
            .collect::<Vec<_>>();

        f.debug_struct(type_name::<Self>())
            .field("handler_counts", &counts)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    type Handler = dyn Fn(&'static str, &mut Vec<String>) + Send + Sync;

    fn labelled(label: &'static str) -> Arc<Handler> {
        Arc::new(move |event: &'static str, log: &mut Vec<String>| {
            log.push(format!("{label}:{event}"));
        })
    }

    fn publish(bus: &EventBus<&'static str, Handler>, events: &[&'static str]) -> Vec<String> {
        let mut log = Vec::new();
        bus.publish(events.iter().copied(), |event, handler| handler(event, &mut log));
        log
    }

    static_assertions::assert_impl_all!(EventBus<&'static str, Handler>: Send, Sync);

    #[test]
    fn publish_without_handlers_does_nothing() {
        let bus = EventBus::<&'static str, Handler>::new();

        assert!(publish(&bus, &["nothing"]).is_empty());
        assert_eq!(bus.handler_count("nothing"), 0);
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let mut bus = EventBus::new();
        bus.subscribe(["x"], &labelled("first"));
        bus.subscribe(["x"], &labelled("second"));

        assert_eq!(publish(&bus, &["x"]), vec!["first:x", "second:x"]);
    }

    #[test]
    fn subscribe_to_multiple_events_at_once() {
        let mut bus = EventBus::new();
        bus.subscribe(["a", "b"], &labelled("h"));

        assert_eq!(publish(&bus, &["b", "a", "c"]), vec!["h:b", "h:a"]);
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        let mut bus = EventBus::new();
        let handler = labelled("h");
        bus.subscribe(["x"], &handler);
        bus.subscribe(["x"], &handler);

        assert_eq!(bus.handler_count("x"), 2);
        assert_eq!(publish(&bus, &["x"]), vec!["h:x", "h:x"]);
    }

    #[test]
    fn unsubscribe_removes_one_registration_by_identity() {
        let mut bus = EventBus::new();
        let kept = labelled("kept");
        let removed = labelled("removed");
        bus.subscribe(["x"], &removed);
        bus.subscribe(["x"], &kept);
        bus.subscribe(["x"], &removed);

        bus.unsubscribe(["x"], &removed);

        assert_eq!(publish(&bus, &["x"]), vec!["kept:x", "removed:x"]);
    }

    #[test]
    fn unsubscribe_unknown_handler_is_ignored() {
        let mut bus = EventBus::new();
        bus.subscribe(["x"], &labelled("h"));

        bus.unsubscribe(["x", "y"], &labelled("h"));

        assert_eq!(bus.handler_count("x"), 1);
    }

    #[test]
    fn panicking_handler_aborts_remaining_deliveries() {
        let mut bus = EventBus::new();
        let failing: Arc<Handler> =
            Arc::new(|_: &'static str, _: &mut Vec<String>| panic!("handler failed"));
        bus.subscribe(["x"], &failing);
        bus.subscribe(["x"], &labelled("after"));

        let mut log = Vec::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            bus.publish(["x"], |event, handler| handler(event, &mut log));
        }));

        assert!(result.is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn debug_shows_counts() {
        let mut bus = EventBus::new();
        bus.subscribe(["x"], &labelled("h"));

        let debug = format!("{bus:?}");

        assert!(debug.contains("\"x\", 1"), "got {debug}");
    }
}
