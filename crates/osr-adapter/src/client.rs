#![forbid(unsafe_code)]

//! The engine-facing callback surface of an adapter.
//!
//! [`AdapterClient`] holds the adapter weakly: the engine may keep its client
//! alive after the adapter is gone, and late callbacks then fall back to
//! neutral answers.

use std::sync::{Arc, Weak};

use osr_backend::{HostControl, PaintSurface};
use osr_core::geometry::{Point, Rect};
use osr_core::handle::CursorHandle;
use osr_core::pixels::PixelBuffer;
use osr_engine::{
    Browser, BrowserHost, EngineClient, EngineError, ErrorCode, Frame, LogSeverity,
    ProcessMessage, ScreenInfo, TransitionType,
};

use crate::adapter::{AdapterInner, lock};
use crate::events::{
    AddressChangedEvent, ConsoleMessageEvent, LoadEndEvent, LoadErrorEvent, LoadStartEvent,
    LoadingStateChangeEvent, StatusMessageEvent, TitleChangedEvent,
};

pub(crate) struct AdapterClient {
    adapter: Weak<AdapterInner>,
}

impl AdapterClient {
    pub(crate) fn new(adapter: Weak<AdapterInner>) -> Self {
        Self { adapter }
    }

    fn with_adapter<R>(&self, fallback: R, f: impl FnOnce(&AdapterInner) -> R) -> R {
        match self.adapter.upgrade() {
            Some(inner) => f(&inner),
            None => fallback,
        }
    }
}

impl AdapterInner {
    /// View rect for the engine. After a visibility restore, the first query
    /// reports one extra row and schedules a corrective resize.
    fn view_rect_for_engine(&self) -> Rect {
        let rect = Rect::from_size(self.main_surface.width(), self.main_surface.height());
        if !self.view_rect.try_consume() {
            return rect;
        }
        tracing::trace!(target: "osr.paint", adapter = %self.name, "inflating view rect once");
        if let Some(host) = self.host() {
            self.with_error_handling("view_rect", || Ok(host.was_resized()?));
        }
        rect.with_height(rect.height + 1)
    }
}

impl EngineClient for AdapterClient {
    fn view_rect(&self) -> Rect {
        self.with_adapter(Rect::default(), AdapterInner::view_rect_for_engine)
    }

    fn screen_point(&self, view_point: Point) -> Point {
        self.with_adapter(Point::default(), |inner| {
            inner
                .with_error_handling("screen_point", || {
                    Ok(inner.control.point_to_screen(view_point)?)
                })
                .unwrap_or_default()
        })
    }

    fn screen_info(&self) -> ScreenInfo {
        self.with_adapter(ScreenInfo::default(), |inner| ScreenInfo {
            device_scale_factor: inner.main_surface.device_scale_factor(),
        })
    }

    fn on_popup_show(&self, show: bool) {
        self.with_adapter((), |inner| inner.on_popup_show(show));
    }

    fn on_popup_size(&self, rect: Rect) {
        self.with_adapter((), |inner| inner.on_popup_size(rect));
    }

    fn on_paint(&self, pixels: PixelBuffer, is_popup: bool) {
        self.with_adapter((), |inner| inner.on_paint(pixels, is_popup));
    }

    fn on_cursor_change(&self, cursor: CursorHandle) {
        self.with_adapter((), |inner| inner.on_cursor_change(cursor));
    }

    fn on_browser_created(&self, browser: Arc<dyn Browser>) {
        match self.adapter.upgrade() {
            Some(inner) => inner.on_browser_created(browser),
            None => {
                tracing::debug!(target: "osr.adapter", "browser created for a dropped adapter");
                if let Err(err) = browser.host().close_browser(true) {
                    tracing::warn!(target: "osr.adapter", error = %err, "closing orphan browser failed");
                }
            }
        }
    }

    fn on_browser_destroyed(&self, browser: Arc<dyn Browser>) {
        self.with_adapter((), |inner| inner.on_browser_destroyed(&browser));
    }

    fn on_tooltip(&self, text: Option<&str>) -> bool {
        self.with_adapter(false, |inner| inner.on_tooltip(text))
    }

    fn on_address_change(&self, frame: Arc<dyn Frame>, url: &str) {
        self.with_adapter((), |inner| {
            tracing::trace!(target: "osr.adapter", frame_id = frame.identifier(), url, "address changed");
            inner.events.address_changed.notify(&AddressChangedEvent {
                frame,
                url: url.to_owned(),
            });
        });
    }

    fn on_title_change(&self, title: &str) {
        self.with_adapter((), |inner| {
            *lock(&inner.title) = Some(title.to_owned());
            inner.events.title_changed.notify(&TitleChangedEvent {
                title: title.to_owned(),
            });
        });
    }

    fn on_status_message(&self, message: &str) {
        self.with_adapter((), |inner| {
            inner.events.status_message.notify(&StatusMessageEvent {
                message: message.to_owned(),
            });
        });
    }

    fn on_console_message(&self, level: LogSeverity, message: &str, source: &str, line: i32) -> bool {
        self.with_adapter(false, |inner| {
            let event = ConsoleMessageEvent::new(level, message, source, line);
            inner.events.raise_console_message(&event)
        })
    }

    fn on_load_start(&self, frame: Arc<dyn Frame>, transition: TransitionType) {
        self.with_adapter((), |inner| {
            tracing::trace!(target: "osr.adapter", frame_id = frame.identifier(), ?transition, "load start");
            inner
                .events
                .load_start
                .notify(&LoadStartEvent { frame, transition });
        });
    }

    fn on_load_end(&self, frame: Arc<dyn Frame>, http_status_code: i32) {
        self.with_adapter((), |inner| {
            tracing::trace!(target: "osr.adapter", frame_id = frame.identifier(), http_status_code, "load end");
            inner.events.load_end.notify(&LoadEndEvent {
                frame,
                http_status_code,
            });
        });
    }

    fn on_load_error(
        &self,
        frame: Arc<dyn Frame>,
        error_code: ErrorCode,
        error_text: &str,
        failed_url: &str,
    ) {
        self.with_adapter((), |inner| {
            tracing::debug!(
                target: "osr.adapter",
                adapter = %inner.name,
                error_code = error_code.0,
                error_text,
                failed_url,
                "load error"
            );
            inner.events.load_error.notify(&LoadErrorEvent {
                frame,
                error_code,
                error_text: error_text.to_owned(),
                failed_url: failed_url.to_owned(),
            });
        });
    }

    fn on_loading_state_change(&self, is_loading: bool, can_go_back: bool, can_go_forward: bool) {
        self.with_adapter((), |inner| {
            inner
                .events
                .loading_state_change
                .notify(&LoadingStateChangeEvent {
                    is_loading,
                    can_go_back,
                    can_go_forward,
                });
        });
    }

    fn on_process_message(&self, frame: Arc<dyn Frame>, message: ProcessMessage) -> bool {
        self.with_adapter(false, |inner| inner.dispatcher.dispatch(frame, message))
    }

    fn on_exception(&self, error: EngineError) {
        self.with_adapter((), |inner| inner.handle_exception("on_exception", error.into()));
    }
}
