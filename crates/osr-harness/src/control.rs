#![forbid(unsafe_code)]

//! Fake host controls: the main view and the popup window.
//!
//! Both record every call and let tests push host events into whatever sinks
//! the adapter attached, honouring the attached [`EventInterest`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use osr_backend::{HostControl, HostError, HostEventSink, PaintSurface, PopupHost};
use osr_core::event::{ControlRole, EventInterest, HostEvent, InputDisposition};
use osr_core::geometry::{Point, Rect};
use osr_core::handle::{CursorHandle, WindowHandle};

use crate::surface::RecordingSurface;

/// One call made on a fake control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Focus,
    SetCursor(CursorHandle),
    SetTooltip(Option<String>),
    PointToScreen(Point),
    Open,
    Close,
    MoveAndResize(Rect),
}

type Sink = (EventInterest, Weak<dyn HostEventSink>);

/// Recording [`HostControl`].
pub struct FakeControl {
    role: ControlRole,
    surface: Arc<RecordingSurface>,
    window: Mutex<Option<WindowHandle>>,
    screen_origin: Mutex<Point>,
    fail_focus: AtomicBool,
    fail_point_to_screen: AtomicBool,
    calls: Mutex<Vec<ControlCall>>,
    sinks: Mutex<Vec<Sink>>,
}

impl std::fmt::Debug for FakeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeControl")
            .field("role", &self.role)
            .field("window", &*self.window.lock().unwrap())
            .field("calls", &*self.calls.lock().unwrap())
            .finish_non_exhaustive()
    }
}

impl Default for FakeControl {
    fn default() -> Self {
        Self::with_role(ControlRole::Main)
    }
}

impl FakeControl {
    /// A main control hosted in window `WindowHandle(1)`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A main control not yet attached to a window.
    #[must_use]
    pub fn detached() -> Self {
        let control = Self::new();
        control.set_window_handle(None);
        control
    }

    fn with_role(role: ControlRole) -> Self {
        Self {
            role,
            surface: Arc::new(RecordingSurface::new()),
            window: Mutex::new(Some(WindowHandle(1))),
            screen_origin: Mutex::new(Point::new(0, 0)),
            fail_focus: AtomicBool::new(false),
            fail_point_to_screen: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            sinks: Mutex::new(Vec::new()),
        }
    }

    pub fn set_window_handle(&self, handle: Option<WindowHandle>) {
        *self.window.lock().unwrap() = handle;
    }

    /// Screen position of the control's top-left corner.
    pub fn set_screen_origin(&self, origin: Point) {
        *self.screen_origin.lock().unwrap() = origin;
    }

    pub fn fail_focus(&self, fail: bool) {
        self.fail_focus.store(fail, Ordering::SeqCst);
    }

    pub fn fail_point_to_screen(&self, fail: bool) {
        self.fail_point_to_screen.store(fail, Ordering::SeqCst);
    }

    /// The concrete surface behind [`HostControl::render_surface`].
    #[must_use]
    pub fn surface(&self) -> Arc<RecordingSurface> {
        Arc::clone(&self.surface)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Drain recorded calls.
    pub fn take_calls(&self) -> Vec<ControlCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Union of the interests of every live attached sink.
    #[must_use]
    pub fn attached_interest(&self) -> EventInterest {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sink)| sink.strong_count() > 0)
            .fold(EventInterest::empty(), |acc, (interest, _)| acc | *interest)
    }

    /// Raise `event` as the host widget would.
    ///
    /// Delivered to every live sink attached for the event's interest class;
    /// `Forwarded` if any sink forwarded it.
    pub fn emit(&self, event: HostEvent) -> InputDisposition {
        let wanted = event.interest();
        let targets: Vec<Arc<dyn HostEventSink>> = self
            .sinks
            .lock()
            .unwrap()
            .iter()
            .filter(|(interest, _)| interest.contains(wanted))
            .filter_map(|(_, sink)| sink.upgrade())
            .collect();

        let mut disposition = InputDisposition::NotForwarded;
        for sink in targets {
            if sink.handle_host_event(self.role, event.clone()).is_forwarded() {
                disposition = InputDisposition::Forwarded;
            }
        }
        disposition
    }

    fn record(&self, call: ControlCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HostControl for FakeControl {
    fn render_surface(&self) -> Arc<dyn PaintSurface> {
        self.surface.clone()
    }

    fn host_window_handle(&self) -> Option<WindowHandle> {
        *self.window.lock().unwrap()
    }

    fn focus(&self) -> Result<(), HostError> {
        self.record(ControlCall::Focus);
        if self.fail_focus.load(Ordering::SeqCst) {
            return Err(HostError::Control {
                operation: "focus",
                reason: "focus refused".into(),
            });
        }
        Ok(())
    }

    fn point_to_screen(&self, point: Point) -> Result<Point, HostError> {
        self.record(ControlCall::PointToScreen(point));
        if self.fail_point_to_screen.load(Ordering::SeqCst) {
            return Err(HostError::Detached);
        }
        let origin = *self.screen_origin.lock().unwrap();
        Ok(Point::new(origin.x + point.x, origin.y + point.y))
    }

    fn set_cursor(&self, cursor: CursorHandle) -> Result<(), HostError> {
        self.record(ControlCall::SetCursor(cursor));
        Ok(())
    }

    fn set_tooltip(&self, text: Option<&str>) -> Result<(), HostError> {
        self.record(ControlCall::SetTooltip(text.map(str::to_owned)));
        Ok(())
    }

    fn attach(&self, interest: EventInterest, sink: Weak<dyn HostEventSink>) {
        self.sinks.lock().unwrap().push((interest, sink));
    }
}

/// Recording [`PopupHost`].
#[derive(Debug)]
pub struct FakePopup {
    control: FakeControl,
    open: AtomicBool,
    bounds: Mutex<Option<Rect>>,
    fail_open: AtomicBool,
}

impl Default for FakePopup {
    fn default() -> Self {
        Self {
            control: FakeControl::with_role(ControlRole::Popup),
            open: AtomicBool::new(false),
            bounds: Mutex::new(None),
            fail_open: AtomicBool::new(false),
        }
    }
}

impl FakePopup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying control (surface, recorded calls, event emission).
    #[must_use]
    pub fn control(&self) -> &FakeControl {
        &self.control
    }

    #[must_use]
    pub fn surface(&self) -> Arc<RecordingSurface> {
        self.control.surface()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Last geometry passed to [`PopupHost::move_and_resize`].
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        *self.bounds.lock().unwrap()
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ControlCall> {
        self.control.calls()
    }

    pub fn emit(&self, event: HostEvent) -> InputDisposition {
        self.control.emit(event)
    }
}

impl HostControl for FakePopup {
    fn render_surface(&self) -> Arc<dyn PaintSurface> {
        self.control.render_surface()
    }

    fn host_window_handle(&self) -> Option<WindowHandle> {
        self.control.host_window_handle()
    }

    fn focus(&self) -> Result<(), HostError> {
        self.control.focus()
    }

    fn point_to_screen(&self, point: Point) -> Result<Point, HostError> {
        self.control.point_to_screen(point)
    }

    fn set_cursor(&self, cursor: CursorHandle) -> Result<(), HostError> {
        self.control.set_cursor(cursor)
    }

    fn set_tooltip(&self, text: Option<&str>) -> Result<(), HostError> {
        self.control.set_tooltip(text)
    }

    fn attach(&self, interest: EventInterest, sink: Weak<dyn HostEventSink>) {
        self.control.attach(interest, sink);
    }
}

impl PopupHost for FakePopup {
    fn open(&self) -> Result<(), HostError> {
        self.control.record(ControlCall::Open);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(HostError::Control {
                operation: "open",
                reason: "no owner window".into(),
            });
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), HostError> {
        self.control.record(ControlCall::Close);
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn move_and_resize(&self, rect: Rect) -> Result<(), HostError> {
        self.control.record(ControlCall::MoveAndResize(rect));
        *self.bounds.lock().unwrap() = Some(rect);
        Ok(())
    }
}
