#![forbid(unsafe_code)]

//! Public adapter events.
//!
//! One [`Subscribers`] list per event. Each occurrence is delivered at most
//! once to every live subscriber, on the thread the originating callback
//! arrived on. With no subscribers, raising an event is a no-op.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use osr_core::observer::Subscribers;
use osr_engine::{
    ErrorCode, Frame, JavascriptContextEvent, JavascriptUncaughtExceptionEvent, LogSeverity,
    TransitionType,
};

use crate::error::AdapterError;

#[derive(Debug, Clone)]
pub struct LoadStartEvent {
    pub frame: Arc<dyn Frame>,
    pub transition: TransitionType,
}

#[derive(Debug, Clone)]
pub struct LoadEndEvent {
    pub frame: Arc<dyn Frame>,
    pub http_status_code: i32,
}

#[derive(Debug, Clone)]
pub struct LoadErrorEvent {
    pub frame: Arc<dyn Frame>,
    pub error_code: ErrorCode,
    pub error_text: String,
    pub failed_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingStateChangeEvent {
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, Clone)]
pub struct AddressChangedEvent {
    pub frame: Arc<dyn Frame>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleChangedEvent {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessageEvent {
    pub message: String,
}

/// A console message from page script.
///
/// Subscribers may call [`ConsoleMessageEvent::suppress_output`] to keep the
/// engine from writing the message to its own console.
pub struct ConsoleMessageEvent {
    pub level: LogSeverity,
    pub message: String,
    pub source: String,
    pub line: i32,
    output_to_console: AtomicBool,
}

impl fmt::Debug for ConsoleMessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleMessageEvent")
            .field("level", &self.level)
            .field("message", &self.message)
            .field("source", &self.source)
            .field("line", &self.line)
            .field("output_to_console", &self.output_to_console())
            .finish()
    }
}

impl ConsoleMessageEvent {
    #[must_use]
    pub fn new(level: LogSeverity, message: &str, source: &str, line: i32) -> Self {
        Self {
            level,
            message: message.to_owned(),
            source: source.to_owned(),
            line,
            output_to_console: AtomicBool::new(true),
        }
    }

    pub fn suppress_output(&self) {
        self.output_to_console.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn output_to_console(&self) -> bool {
        self.output_to_console.load(Ordering::Relaxed)
    }
}

/// A fault caught at a fail-soft boundary, or reported by the browser
/// process.
#[derive(Debug, Clone)]
pub struct UnhandledExceptionEvent {
    /// Name of the handler that caught it.
    pub scope: &'static str,
    pub error: Arc<AdapterError>,
}

/// The browser handle arrived and the adapter is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializedEvent;

/// Every public event of a [`crate::BrowserAdapter`].
#[derive(Debug, Default)]
pub struct AdapterEvents {
    pub load_start: Subscribers<LoadStartEvent>,
    pub load_end: Subscribers<LoadEndEvent>,
    pub load_error: Subscribers<LoadErrorEvent>,
    pub loading_state_change: Subscribers<LoadingStateChangeEvent>,
    pub address_changed: Subscribers<AddressChangedEvent>,
    pub title_changed: Subscribers<TitleChangedEvent>,
    pub console_message: Subscribers<ConsoleMessageEvent>,
    pub status_message: Subscribers<StatusMessageEvent>,
    pub javascript_context_created: Subscribers<JavascriptContextEvent>,
    pub javascript_context_released: Subscribers<JavascriptContextEvent>,
    pub javascript_uncaught_exception: Subscribers<JavascriptUncaughtExceptionEvent>,
    pub unhandled_exception: Subscribers<UnhandledExceptionEvent>,
    pub initialized: Subscribers<InitializedEvent>,
}

impl AdapterEvents {
    /// Raise a console message. Returns true ("handled") only if someone is
    /// subscribed and a subscriber suppressed console output.
    pub(crate) fn raise_console_message(&self, event: &ConsoleMessageEvent) -> bool {
        if self.console_message.is_empty() {
            return false;
        }
        self.console_message.notify(event);
        !event.output_to_console()
    }
}
