#![forbid(unsafe_code)]
#![doc = "Host-side contracts for the off-screen browser host."]
#![doc = ""]
#![doc = "This crate defines the boundary between the adapter and the concrete UI"]
#![doc = "toolkit that owns the pixels and the input stream. The adapter never"]
#![doc = "touches a windowing API directly; everything goes through these traits."]

use std::sync::{Arc, Weak};

use osr_core::event::{ControlRole, EventInterest, HostEvent, InputDisposition};
use osr_core::geometry::{Point, Rect};
use osr_core::handle::{CursorHandle, WindowHandle};
use osr_core::pixels::PixelBuffer;

/// Failures raised by host-side collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The control is not attached to a window (yet or anymore).
    #[error("control is detached from its window")]
    Detached,
    /// Writing pixels into a surface failed.
    #[error("paint failed: {0}")]
    Paint(String),
    /// Any other control or popup operation failed.
    #[error("{operation} failed: {reason}")]
    Control {
        operation: &'static str,
        reason: String,
    },
}

/// Continuation invoked when an asynchronous paint finishes.
///
/// May run on any thread, possibly before [`PaintSurface::paint`] returns.
pub type PaintCompletion = Box<dyn FnOnce(Result<(), HostError>) + Send>;

/// A work item marshalled onto the host UI thread.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// Pixel buffer plus scale factor for one logical surface (main view or popup).
///
/// Implementations own their buffer and must make a resize racing a paint
/// safe by swapping buffers atomically; the adapter only sequences
/// "resize, then notify the engine".
pub trait PaintSurface: Send + Sync {
    /// Current buffer width in view pixels.
    fn width(&self) -> i32;

    /// Current buffer height in view pixels.
    fn height(&self) -> i32;

    /// Reallocate the buffer for a new size.
    fn resize(&self, width: i32, height: i32);

    /// Device scale factor the engine should render at.
    fn device_scale_factor(&self) -> f32;

    /// Update the device scale factor.
    fn set_device_scale_factor(&self, factor: f32);

    /// Start copying `pixels` into the buffer.
    ///
    /// Returns immediately; `on_complete` reports the outcome.
    fn paint(&self, pixels: PixelBuffer, on_complete: PaintCompletion);

    /// Release the buffer. Further paints may be dropped.
    fn release(&self);
}

/// Receiver of host events, implemented by the adapter.
pub trait HostEventSink: Send + Sync {
    /// Route one event raised by the control playing `role`.
    fn handle_host_event(&self, role: ControlRole, event: HostEvent) -> InputDisposition;
}

/// The host widget that displays the main view.
pub trait HostControl: Send + Sync {
    /// The surface this control presents.
    fn render_surface(&self) -> Arc<dyn PaintSurface>;

    /// Native handle of the top-level window hosting this control, if the
    /// control is attached to one.
    fn host_window_handle(&self) -> Option<WindowHandle>;

    /// Acquire keyboard focus.
    fn focus(&self) -> Result<(), HostError>;

    /// Convert a control-relative point to screen coordinates.
    fn point_to_screen(&self, point: Point) -> Result<Point, HostError>;

    /// Show the given native cursor over the control.
    fn set_cursor(&self, cursor: CursorHandle) -> Result<(), HostError>;

    /// Show, replace, or clear (`None`) the tooltip.
    fn set_tooltip(&self, text: Option<&str>) -> Result<(), HostError>;

    /// Start delivering events of the given classes to `sink`.
    ///
    /// The control must hold `sink` weakly; the adapter owns it.
    fn attach(&self, interest: EventInterest, sink: Weak<dyn HostEventSink>);
}

/// A popup window that renders engine popups (select boxes, pickers).
///
/// Geometry is expressed in view coordinates of the placement target; the
/// implementation converts to screen coordinates.
pub trait PopupHost: HostControl {
    fn open(&self) -> Result<(), HostError>;

    fn close(&self) -> Result<(), HostError>;

    fn move_and_resize(&self, rect: Rect) -> Result<(), HostError>;
}

/// Marshals work onto the host UI thread.
///
/// `post` must not run `task` while the caller holds any lock it passed in;
/// implementations that run inline are acceptable for single-threaded hosts.
pub trait UiDispatcher: Send + Sync {
    fn post(&self, task: UiTask);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};

    // -----------------------------------------------------------------------
    // Minimal implementations for trait-object checks
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct TestSurface {
        width: AtomicI32,
        height: AtomicI32,
        scale: Mutex<f32>,
    }

    impl PaintSurface for TestSurface {
        fn width(&self) -> i32 {
            self.width.load(Ordering::SeqCst)
        }
        fn height(&self) -> i32 {
            self.height.load(Ordering::SeqCst)
        }
        fn resize(&self, width: i32, height: i32) {
            self.width.store(width, Ordering::SeqCst);
            self.height.store(height, Ordering::SeqCst);
        }
        fn device_scale_factor(&self) -> f32 {
            *self.scale.lock().unwrap()
        }
        fn set_device_scale_factor(&self, factor: f32) {
            *self.scale.lock().unwrap() = factor;
        }
        fn paint(&self, pixels: PixelBuffer, on_complete: PaintCompletion) {
            if pixels.width > self.width() || pixels.height > self.height() {
                on_complete(Err(HostError::Paint("frame larger than buffer".into())));
            } else {
                on_complete(Ok(()));
            }
        }
        fn release(&self) {
            self.resize(0, 0);
        }
    }

    struct InlineDispatcher;

    impl UiDispatcher for InlineDispatcher {
        fn post(&self, task: UiTask) {
            task();
        }
    }

    #[test]
    fn surface_is_object_safe_and_reports_completion() {
        let surface: Arc<dyn PaintSurface> = Arc::new(TestSurface::default());
        surface.resize(2, 2);

        let outcome = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&outcome);
        surface.paint(
            PixelBuffer::full(vec![0u8; 64], 4, 4),
            Box::new(move |r| *sink.lock().unwrap() = Some(r)),
        );
        assert!(matches!(
            outcome.lock().unwrap().as_ref(),
            Some(Err(HostError::Paint(_)))
        ));
    }

    #[test]
    fn release_clears_size() {
        let surface = TestSurface::default();
        surface.resize(10, 10);
        surface.release();
        assert_eq!((surface.width(), surface.height()), (0, 0));
    }

    #[test]
    fn dispatcher_runs_task() {
        let hit = Arc::new(AtomicI32::new(0));
        let h = Arc::clone(&hit);
        InlineDispatcher.post(Box::new(move || {
            h.store(1, Ordering::SeqCst);
        }));
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn host_error_display() {
        let err = HostError::Control {
            operation: "open",
            reason: "no owner window".into(),
        };
        assert_eq!(err.to_string(), "open failed: no owner window");
        assert_eq!(HostError::Detached.to_string(), "control is detached from its window");
    }
}
