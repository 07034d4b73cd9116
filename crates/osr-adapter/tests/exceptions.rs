#![forbid(unsafe_code)]

//! Fault propagation: local faults and browser-process faults both end in a
//! single unhandled-exception notification, logged first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use osr_adapter::{
    AdapterError, AdapterParts, AdapterSettings, BrowserAdapter, UnhandledExceptionEvent,
};
use osr_backend::{HostControl, HostError, HostEventSink, PaintCompletion, PaintSurface};
use osr_core::event::{EventInterest, HostEvent, MouseButton, MouseEvent};
use osr_core::geometry::Point;
use osr_core::handle::{CursorHandle, WindowHandle};
use osr_core::pixels::PixelBuffer;
use osr_engine::{
    EngineClient, EngineError, Frame, MessageKind, ProcessMessage, UnhandledExceptionDetails,
};
use osr_harness::{FakeControl, FakeEngine, FakePopup, InlineUiDispatcher};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// --- tracing capture ---

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

// --- rig ---

struct Rig {
    engine: Arc<FakeEngine>,
    adapter: BrowserAdapter,
    client: Arc<dyn EngineClient>,
    seen: Arc<Mutex<Vec<UnhandledExceptionEvent>>>,
    _sub: osr_core::Subscription,
}

impl Rig {
    fn active_with(control: Arc<dyn HostControl>) -> Self {
        let engine = Arc::new(FakeEngine::new());
        let adapter = BrowserAdapter::new(
            AdapterParts {
                control,
                popup: Arc::new(FakePopup::new()),
                engine: engine.clone(),
                ui: Arc::new(InlineUiDispatcher::new()),
            },
            AdapterSettings {
                name: "docs-view".into(),
                ..AdapterSettings::default()
            },
        );
        adapter.create_or_update_browser(320, 240).unwrap();
        engine.complete_creation();
        let client = adapter.engine_client().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let seen = Arc::clone(&seen);
            adapter.events().unhandled_exception.subscribe(move |event| {
                tracing::info!(target: "test.observer", scope = event.scope, "notified");
                seen.lock().unwrap().push(event.clone());
            })
        };
        Self {
            engine,
            adapter,
            client,
            seen,
            _sub: sub,
        }
    }

    fn active() -> Self {
        Self::active_with(Arc::new(FakeControl::new()))
    }

    fn main_frame(&self) -> Arc<dyn Frame> {
        self.engine.browser().fake_main_frame()
    }

    fn seen(&self) -> Vec<UnhandledExceptionEvent> {
        self.seen.lock().unwrap().clone()
    }
}

fn remote_exception() -> ProcessMessage {
    ProcessMessage::new(
        MessageKind::UnhandledException,
        &UnhandledExceptionDetails {
            exception_type: "System.NullReferenceException".into(),
            message: "Object reference not set".into(),
            stack_trace: "at Renderer.OnContextCreated()".into(),
        },
    )
    .unwrap()
}

#[test]
fn remote_exception_is_notified_once_with_fields() {
    let rig = Rig::active();
    assert!(rig.client.on_process_message(rig.main_frame(), remote_exception()));

    let seen = rig.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].scope, "on_browser_process_unhandled_exception");
    let remote = seen[0].error.as_remote().expect("remote fault");
    assert_eq!(remote.exception_type, "System.NullReferenceException");
    assert_eq!(remote.message, "Object reference not set");
    assert_eq!(remote.stack_trace, "at Renderer.OnContextCreated()");
    drop(rig.adapter);
}

#[test]
fn remote_exception_is_logged_before_notification() {
    let rig = Rig::active();
    let events = with_captured_tracing(|| {
        rig.client.on_process_message(rig.main_frame(), remote_exception());
    });

    let logged = events
        .iter()
        .position(|e| e.fields.contains_key("exception_type"))
        .expect("remote exception logged");
    let notified = events
        .iter()
        .position(|e| e.target == "test.observer")
        .expect("subscriber notified");
    assert!(logged < notified);

    let record = &events[logged];
    assert_eq!(record.level, tracing::Level::ERROR);
    assert_eq!(record.target, "osr.adapter");
    assert_eq!(record.fields["adapter"], "docs-view");
    assert_eq!(record.fields["exception_type"], "System.NullReferenceException");
    assert_eq!(record.fields["exception_message"], "Object reference not set");
    assert_eq!(record.fields["stack_trace"], "at Renderer.OnContextCreated()");
}

#[test]
fn malformed_remote_exception_is_a_local_fault() {
    let rig = Rig::active();
    let garbage = ProcessMessage::new(MessageKind::UnhandledException, &"not an object").unwrap();
    rig.client.on_process_message(rig.main_frame(), garbage);

    let seen = rig.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].error.is_remote());
    assert!(matches!(
        *seen[0].error,
        AdapterError::Engine(EngineError::Codec { .. })
    ));
}

#[test]
fn engine_reported_exception_is_forwarded() {
    let rig = Rig::active();
    rig.client
        .on_exception(EngineError::command("send_process_message", "pipe closed"));

    let seen = rig.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].scope, "on_exception");
    assert_eq!(
        seen[0].error.to_string(),
        "send_process_message failed: pipe closed"
    );
}

#[test]
fn local_fault_is_logged_with_scope() {
    let control = Arc::new(FakeControl::new());
    let rig = Rig::active_with(control.clone());
    control.fail_focus(true);

    let events = with_captured_tracing(|| {
        control.emit(HostEvent::MouseButtonPressed {
            event: MouseEvent::new(0, 0),
            button: MouseButton::Left,
            click_count: 1,
        });
    });

    let caught = events
        .iter()
        .find(|e| e.fields.get("scope").map(String::as_str) == Some("handle_mouse_button_down"))
        .expect("fail-soft catch logged");
    assert_eq!(caught.level, tracing::Level::ERROR);
    assert_eq!(caught.target, "osr.adapter");
    assert!(caught.fields["error"].contains("focus refused"));

    let seen = rig.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].scope, "handle_mouse_button_down");
}

#[test]
fn errors_returned_to_the_caller_are_not_reported() {
    let rig = Rig::active();
    rig.engine
        .browser()
        .fake_host()
        .fail_commands_with(Some(EngineError::BrowserGone));

    assert_eq!(
        rig.adapter.create_or_update_browser(640, 480),
        Err(AdapterError::Engine(EngineError::BrowserGone))
    );
    assert!(rig.seen().is_empty());
}

#[test]
fn no_subscribers_is_a_quiet_no_op() {
    let engine = Arc::new(FakeEngine::new());
    let adapter = BrowserAdapter::new(
        AdapterParts {
            control: Arc::new(FakeControl::new()),
            popup: Arc::new(FakePopup::new()),
            engine: engine.clone(),
            ui: Arc::new(InlineUiDispatcher::new()),
        },
        AdapterSettings::default(),
    );
    adapter.create_or_update_browser(10, 10).unwrap();
    engine.complete_creation();
    let client = adapter.engine_client().unwrap();
    client.on_process_message(engine.browser().fake_main_frame(), remote_exception());
    client.on_exception(EngineError::BrowserGone);
}

// --- panics at the fail-soft boundary ---

#[derive(Default)]
struct ExplodingSurface;

impl PaintSurface for ExplodingSurface {
    fn width(&self) -> i32 {
        320
    }
    fn height(&self) -> i32 {
        240
    }
    fn resize(&self, _width: i32, _height: i32) {}
    fn device_scale_factor(&self) -> f32 {
        1.0
    }
    fn set_device_scale_factor(&self, _factor: f32) {}
    fn paint(&self, _pixels: PixelBuffer, _on_complete: PaintCompletion) {
        panic!("surface blew up");
    }
    fn release(&self) {}
}

struct ExplodingControl {
    inner: FakeControl,
    surface: Arc<ExplodingSurface>,
}

impl HostControl for ExplodingControl {
    fn render_surface(&self) -> Arc<dyn PaintSurface> {
        self.surface.clone()
    }
    fn host_window_handle(&self) -> Option<WindowHandle> {
        self.inner.host_window_handle()
    }
    fn focus(&self) -> Result<(), HostError> {
        self.inner.focus()
    }
    fn point_to_screen(&self, point: Point) -> Result<Point, HostError> {
        self.inner.point_to_screen(point)
    }
    fn set_cursor(&self, cursor: CursorHandle) -> Result<(), HostError> {
        self.inner.set_cursor(cursor)
    }
    fn set_tooltip(&self, text: Option<&str>) -> Result<(), HostError> {
        self.inner.set_tooltip(text)
    }
    fn attach(&self, interest: EventInterest, sink: Weak<dyn HostEventSink>) {
        self.inner.attach(interest, sink);
    }
}

#[test]
fn panic_in_callback_becomes_unhandled_exception() {
    let rig = Rig::active_with(Arc::new(ExplodingControl {
        inner: FakeControl::new(),
        surface: Arc::new(ExplodingSurface),
    }));

    rig.client
        .on_paint(PixelBuffer::full(vec![0u8; 4], 1, 1), false);

    let seen = rig.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].scope, "on_paint");
    assert_eq!(
        *seen[0].error,
        AdapterError::Panic {
            message: "surface blew up".into()
        }
    );
}
