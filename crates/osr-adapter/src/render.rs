#![forbid(unsafe_code)]

//! Paint and popup routing.
//!
//! Paint buffers go to the main or popup surface, selected only by the
//! engine's `is_popup` flag. Surface completion is never awaited; a failed
//! paint is reported through the unhandled-exception path.
//!
//! Popup visibility and popup geometry are independent. Either may arrive
//! first, and repeating the last value is a no-op. Hiding the popup forgets
//! its bounds, so a reopened popup is always placed again. Both are applied
//! to the popup window on the UI thread.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use osr_backend::{HostControl, PaintSurface, PopupHost};
use osr_core::geometry::Rect;
use osr_core::handle::CursorHandle;
use osr_core::pixels::PixelBuffer;

use crate::adapter::{AdapterInner, lock};

/// Last popup visibility and bounds the engine asked for.
#[derive(Debug, Default)]
pub(crate) struct PopupCoordinator {
    shown: AtomicBool,
    bounds: Mutex<Option<Rect>>,
}

impl PopupCoordinator {
    /// Record the requested visibility. True if it changed.
    ///
    /// Hiding clears the remembered bounds.
    pub(crate) fn set_shown(&self, show: bool) -> bool {
        if !show {
            *lock(&self.bounds) = None;
        }
        self.shown.swap(show, Ordering::AcqRel) != show
    }

    /// Record the requested bounds. True if they changed.
    pub(crate) fn set_bounds(&self, rect: Rect) -> bool {
        let mut bounds = lock(&self.bounds);
        if *bounds == Some(rect) {
            return false;
        }
        *bounds = Some(rect);
        true
    }
}

impl AdapterInner {
    pub(crate) fn on_popup_show(&self, show: bool) {
        if !self.popup_state.set_shown(show) {
            return;
        }
        tracing::debug!(target: "osr.popup", adapter = %self.name, show, "popup visibility");
        self.post_to_ui("on_popup_show", move |inner| {
            if show {
                inner.popup.open()?;
            } else {
                inner.popup.close()?;
            }
            Ok(())
        });
    }

    pub(crate) fn on_popup_size(&self, rect: Rect) {
        if !self.popup_state.set_bounds(rect) {
            return;
        }
        tracing::debug!(
            target: "osr.popup",
            adapter = %self.name,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "popup bounds"
        );
        self.popup_surface.resize(rect.width, rect.height);
        self.post_to_ui("on_popup_size", move |inner| {
            inner.popup.move_and_resize(rect)?;
            Ok(())
        });
    }

    pub(crate) fn on_paint(&self, pixels: PixelBuffer, is_popup: bool) {
        self.with_error_handling("on_paint", || {
            let surface = if is_popup {
                &self.popup_surface
            } else {
                &self.main_surface
            };
            tracing::trace!(
                target: "osr.paint",
                is_popup,
                width = pixels.width,
                height = pixels.height,
                dirty = pixels.dirty_rects.len(),
                "paint"
            );
            let weak = self.weak();
            surface.paint(
                pixels,
                Box::new(move |result| {
                    if let Err(err) = result
                        && let Some(inner) = weak.upgrade()
                    {
                        inner.handle_exception("on_paint", err.into());
                    }
                }),
            );
            Ok(())
        });
    }

    pub(crate) fn on_cursor_change(&self, cursor: CursorHandle) {
        tracing::trace!(target: "osr.paint", cursor = cursor.0, "cursor change");
        self.post_to_ui("on_cursor_change", move |inner| {
            inner.control.set_cursor(cursor)?;
            Ok(())
        });
    }

    /// Always reports the tooltip as handled. Unchanged text is not re-sent.
    pub(crate) fn on_tooltip(&self, text: Option<&str>) -> bool {
        let text = text.map(str::to_owned);
        {
            let mut current = lock(&self.tooltip);
            if *current == text {
                return true;
            }
            current.clone_from(&text);
        }
        self.post_to_ui("on_tooltip", move |inner| {
            inner.control.set_tooltip(text.as_deref())?;
            Ok(())
        });
        true
    }
}
