#![forbid(unsafe_code)]

//! Thread-safe multicast notification lists.
//!
//! # Design
//!
//! [`Subscribers<E>`] keeps subscriber callbacks as `Weak` references; the
//! strong reference lives in the [`Subscription`] guard returned from
//! [`Subscribers::subscribe`]. Dropping the guard unsubscribes.
//!
//! Each [`Subscribers::notify`] call delivers the event at most once to every
//! live subscriber, in registration order, on the calling thread. With no
//! live subscribers it is a no-op.
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: caught, logged under `osr.observer`, and the
//!   remaining subscribers still run. Notification never unwinds into the
//!   caller, which is usually an engine or host callback thread.
//! - **Re-entrant subscribe/notify**: allowed. Callbacks run outside the
//!   internal lock.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, Weak};

type CallbackArc<E> = Arc<dyn Fn(&E) + Send + Sync>;
type CallbackWeak<E> = Weak<dyn Fn(&E) + Send + Sync>;

/// A list of callbacks interested in events of type `E`.
pub struct Subscribers<E> {
    callbacks: Mutex<Vec<CallbackWeak<E>>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        f.debug_struct("Subscribers")
            .field("subscriber_count", &count)
            .finish()
    }
}

impl<E: 'static> Subscribers<E> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Keep the returned guard alive for as long as the
    /// callback should receive events.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let strong: CallbackArc<E> = Arc::new(callback);
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `event` to every live subscriber. Returns how many ran.
    pub fn notify(&self, event: &E) -> usize {
        let live: Vec<CallbackArc<E>> = {
            let mut callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
            callbacks.retain(|w| w.strong_count() > 0);
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };

        for callback in &live {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                tracing::error!(
                    target: "osr.observer",
                    event_type = std::any::type_name::<E>(),
                    panic_msg = %panic_message(payload.as_ref()),
                    "subscriber panicked during notification"
                );
            }
        }
        live.len()
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// No live subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it makes the callback unreachable; the dead entry is pruned on
/// the next notification.
pub struct Subscription {
    _guard: Box<dyn Any + Send + Sync>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notify_without_subscribers_is_noop() {
        let subs = Subscribers::<u32>::new();
        assert_eq!(subs.notify(&1), 0);
        assert!(subs.is_empty());
    }

    #[test]
    fn each_live_subscriber_receives_event_once() {
        let subs = Subscribers::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = Arc::clone(&hits);
        let h2 = Arc::clone(&hits);
        let _a = subs.subscribe(move |v| {
            h1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let _b = subs.subscribe(move |v| {
            h2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        assert_eq!(subs.notify(&5), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let subs = Subscribers::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let guard = subs.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        subs.notify(&());
        drop(guard);
        assert_eq!(subs.notify(&()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(subs.live_count(), 0);
    }

    #[test]
    fn registration_order_is_preserved() {
        let subs = Subscribers::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let guards: Vec<_> = (0..4)
            .map(|i| {
                let order = Arc::clone(&order);
                subs.subscribe(move |_| order.lock().unwrap().push(i))
            })
            .collect();
        subs.notify(&());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
        drop(guards);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_others() {
        let subs = Subscribers::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _bad = subs.subscribe(|_| panic!("boom"));
        let _good = subs.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(subs.notify(&()), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_subscribe_from_callback() {
        let subs = Arc::new(Subscribers::<()>::new());
        let inner = Arc::clone(&subs);
        let parked = Arc::new(Mutex::new(Vec::new()));
        let parked_inner = Arc::clone(&parked);
        let _g = subs.subscribe(move |_| {
            let guard = inner.subscribe(|_| {});
            parked_inner.lock().unwrap().push(guard);
        });
        subs.notify(&());
        assert_eq!(subs.live_count(), 2);
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
