#![forbid(unsafe_code)]

//! Routing of system process messages to registered handlers.
//!
//! # Invariants
//!
//! 1. Handlers for one kind run in registration order.
//! 2. Handlers run outside the registry lock, so a handler may register or
//!    unregister handlers (including itself) without deadlocking.
//! 3. A panicking handler is logged and does not stop later handlers.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use osr_core::observer::panic_message;

use crate::browser::Frame;
use crate::error::EngineError;
use crate::message::{MessageKind, ProcessMessage};

/// A message as delivered to handlers.
#[derive(Debug, Clone)]
pub struct MessageReceived {
    /// The frame whose renderer sent the message.
    pub frame: Arc<dyn Frame>,
    pub message: ProcessMessage,
}

type MessageHandler = Arc<dyn Fn(&MessageReceived) + Send + Sync>;

/// Handle returned by [`MessageDispatcher::register_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

struct Registration {
    id: HandlerId,
    kind: MessageKind,
    handler: MessageHandler,
}

/// Multiplexes incoming process messages by [`MessageKind`].
pub struct MessageDispatcher {
    handlers: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        f.debug_struct("MessageDispatcher")
            .field("handler_count", &count)
            .finish()
    }
}

impl MessageDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route messages of `kind` to `handler` until unregistered.
    pub fn register_handler(
        &self,
        kind: MessageKind,
        handler: impl Fn(&MessageReceived) + Send + Sync + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Registration {
                id,
                kind,
                handler: Arc::new(handler),
            });
        tracing::trace!(target: "osr.dispatch", kind = kind.name(), id = id.0, "handler registered");
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        handlers.len() != before
    }

    #[must_use]
    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|r| r.kind == kind)
    }

    /// Deliver a message to every handler for its kind.
    ///
    /// Returns true if at least one handler ran.
    pub fn dispatch(&self, frame: Arc<dyn Frame>, message: ProcessMessage) -> bool {
        let kind = message.kind;
        let matching: Vec<MessageHandler> = self
            .handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.handler))
            .collect();

        if matching.is_empty() {
            tracing::trace!(target: "osr.dispatch", kind = kind.name(), "no handler for message");
            return false;
        }

        let received = MessageReceived { frame, message };
        for handler in &matching {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(&received))) {
                tracing::error!(
                    target: "osr.dispatch",
                    kind = kind.name(),
                    panic_msg = %panic_message(payload.as_ref()),
                    "message handler panicked"
                );
            }
        }
        true
    }

    /// Send `message` to `frame`'s renderer.
    pub fn send(&self, frame: &dyn Frame, message: ProcessMessage) -> Result<(), EngineError> {
        tracing::trace!(
            target: "osr.dispatch",
            kind = message.kind.name(),
            frame_id = frame.identifier(),
            "sending message"
        );
        frame.send_process_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct NullFrame;

    impl Frame for NullFrame {
        fn identifier(&self) -> crate::browser::FrameId {
            1
        }
        fn name(&self) -> String {
            String::new()
        }
        fn url(&self) -> String {
            String::new()
        }
        fn is_main(&self) -> bool {
            true
        }
        fn is_valid(&self) -> bool {
            true
        }
        fn load_url(&self, _url: &str) -> Result<(), EngineError> {
            Ok(())
        }
        fn load_string(&self, _content: &str, _url: &str) -> Result<(), EngineError> {
            Ok(())
        }
        fn execute_javascript(&self, _code: &str, _url: &str, _line: i32) -> Result<(), EngineError> {
            Ok(())
        }
        fn send_process_message(&self, _message: ProcessMessage) -> Result<(), EngineError> {
            Err(EngineError::BrowserGone)
        }
    }

    fn frame() -> Arc<dyn Frame> {
        Arc::new(NullFrame)
    }

    #[test]
    fn dispatch_routes_by_kind() {
        let dispatcher = MessageDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        dispatcher.register_handler(MessageKind::ContextCreated, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dispatcher.dispatch(frame(), ProcessMessage::empty(MessageKind::ContextCreated)));
        assert!(!dispatcher.dispatch(frame(), ProcessMessage::empty(MessageKind::ContextReleased)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_stops_delivery() {
        let dispatcher = MessageDispatcher::new();
        let id = dispatcher.register_handler(MessageKind::MethodCall, |_| {});
        assert!(dispatcher.has_handler(MessageKind::MethodCall));
        assert!(dispatcher.unregister_handler(id));
        assert!(!dispatcher.unregister_handler(id));
        assert!(!dispatcher.has_handler(MessageKind::MethodCall));
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let dispatcher = MessageDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        dispatcher.register_handler(MessageKind::UncaughtException, |_| panic!("handler bug"));
        dispatcher.register_handler(MessageKind::UncaughtException, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(dispatcher.dispatch(frame(), ProcessMessage::empty(MessageKind::UncaughtException)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_unregister_itself() {
        let dispatcher = Arc::new(MessageDispatcher::new());
        let slot = Arc::new(Mutex::new(None::<HandlerId>));
        let inner = Arc::clone(&dispatcher);
        let inner_slot = Arc::clone(&slot);
        let id = dispatcher.register_handler(MessageKind::ContextReleased, move |_| {
            if let Some(id) = inner_slot.lock().unwrap().take() {
                inner.unregister_handler(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        assert!(dispatcher.dispatch(frame(), ProcessMessage::empty(MessageKind::ContextReleased)));
        assert!(!dispatcher.has_handler(MessageKind::ContextReleased));
    }

    #[test]
    fn send_surfaces_frame_errors() {
        let dispatcher = MessageDispatcher::new();
        let err = dispatcher
            .send(&NullFrame, ProcessMessage::empty(MessageKind::ObjectRegistered))
            .unwrap_err();
        assert_eq!(err, EngineError::BrowserGone);
    }
}
