#![forbid(unsafe_code)]

//! Paint routing, popup coordination and UI-thread marshalling.

use std::sync::{Arc, Mutex};

use osr_adapter::{AdapterParts, AdapterSettings, BrowserAdapter};
use osr_backend::HostError;
use osr_core::geometry::{Point, Rect};
use osr_core::handle::CursorHandle;
use osr_core::pixels::PixelBuffer;
use osr_engine::{EngineClient, ScreenInfo};
use osr_harness::{
    ControlCall, FakeControl, FakeEngine, FakePopup, QueuedUiDispatcher, SurfaceCall,
};
use pretty_assertions::assert_eq;

struct Rig {
    control: Arc<FakeControl>,
    popup: Arc<FakePopup>,
    ui: Arc<QueuedUiDispatcher>,
    adapter: BrowserAdapter,
    client: Arc<dyn EngineClient>,
    faults: Arc<Mutex<Vec<String>>>,
    _faults_sub: osr_core::Subscription,
}

impl Rig {
    fn active() -> Self {
        let control = Arc::new(FakeControl::new());
        let popup = Arc::new(FakePopup::new());
        let engine = Arc::new(FakeEngine::new());
        let ui = Arc::new(QueuedUiDispatcher::new());
        let adapter = BrowserAdapter::new(
            AdapterParts {
                control: control.clone(),
                popup: popup.clone(),
                engine: engine.clone(),
                ui: ui.clone(),
            },
            AdapterSettings::default(),
        );
        adapter.create_or_update_browser(800, 600).unwrap();
        engine.complete_creation();
        let client = adapter.engine_client().unwrap();

        let faults = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let faults = Arc::clone(&faults);
            adapter.events().unhandled_exception.subscribe(move |event| {
                faults
                    .lock()
                    .unwrap()
                    .push(format!("{}: {}", event.scope, event.error));
            })
        };
        Self {
            control,
            popup,
            ui,
            adapter,
            client,
            faults,
            _faults_sub: sub,
        }
    }
}

fn frame(width: i32, height: i32) -> PixelBuffer {
    let len = (width * height) as usize * PixelBuffer::BYTES_PER_PIXEL;
    PixelBuffer::full(vec![0u8; len], width, height)
}

#[test]
fn paint_goes_to_surface_selected_by_flag() {
    let rig = Rig::active();
    rig.client.on_paint(frame(4, 4), false);
    rig.client.on_paint(frame(2, 2), true);
    rig.client.on_paint(frame(4, 4), false);

    assert_eq!(rig.control.surface().paint_count(), 2);
    assert_eq!(rig.popup.surface().paint_count(), 1);
    assert_eq!(
        rig.popup.surface().calls(),
        vec![SurfaceCall::Paint {
            width: 2,
            height: 2
        }]
    );
}

#[test]
fn failed_paint_is_reported_through_unhandled_exception() {
    let rig = Rig::active();
    let surface = rig.control.surface();
    surface.defer_completions(true);

    rig.client.on_paint(frame(1, 1), false);
    assert!(rig.faults.lock().unwrap().is_empty());

    surface.complete_deferred(Err(HostError::Paint("device lost".into())));
    let faults = rig.faults.lock().unwrap().clone();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].starts_with("on_paint: "));
    assert!(faults[0].contains("device lost"));
}

#[test]
fn successful_paint_reports_nothing() {
    let rig = Rig::active();
    rig.client.on_paint(frame(1, 1), false);
    rig.client.on_paint(frame(1, 1), true);
    assert!(rig.faults.lock().unwrap().is_empty());
}

#[test]
fn popup_show_and_size_are_marshalled_to_ui() {
    let rig = Rig::active();
    let bounds = Rect::new(40, 50, 200, 120);

    rig.client.on_popup_size(bounds);
    rig.client.on_popup_show(true);
    // The popup surface is sized at once; the window waits for the UI thread.
    assert_eq!(rig.popup.surface().resizes(), vec![(200, 120)]);
    assert!(!rig.popup.is_open());
    assert_eq!(rig.popup.bounds(), None);

    assert_eq!(rig.ui.run_pending(), 2);
    assert!(rig.popup.is_open());
    assert_eq!(rig.popup.bounds(), Some(bounds));

    rig.client.on_popup_show(false);
    rig.ui.run_pending();
    assert!(!rig.popup.is_open());
}

#[test]
fn repeated_popup_requests_are_idempotent() {
    let rig = Rig::active();
    let bounds = Rect::new(0, 0, 50, 50);
    rig.client.on_popup_show(true);
    rig.client.on_popup_show(true);
    rig.client.on_popup_size(bounds);
    rig.client.on_popup_size(bounds);
    rig.ui.run_pending();

    assert_eq!(
        rig.popup.calls(),
        vec![ControlCall::Open, ControlCall::MoveAndResize(bounds)]
    );
    assert_eq!(rig.popup.surface().resizes(), vec![(50, 50)]);
}

#[test]
fn reopened_popup_is_placed_again_at_same_bounds() {
    let rig = Rig::active();
    let bounds = Rect::new(10, 10, 80, 40);
    rig.client.on_popup_show(true);
    rig.client.on_popup_size(bounds);
    rig.ui.run_pending();
    rig.client.on_popup_show(false);
    rig.ui.run_pending();

    rig.client.on_popup_show(true);
    rig.client.on_popup_size(bounds);
    rig.ui.run_pending();

    assert_eq!(
        rig.popup.calls(),
        vec![
            ControlCall::Open,
            ControlCall::MoveAndResize(bounds),
            ControlCall::Close,
            ControlCall::Open,
            ControlCall::MoveAndResize(bounds),
        ]
    );
    assert_eq!(rig.popup.surface().resizes(), vec![(80, 40), (80, 40)]);
    assert_eq!(rig.popup.bounds(), Some(bounds));
}

#[test]
fn popup_failure_is_reported_on_ui_thread() {
    let rig = Rig::active();
    rig.popup.fail_open(true);
    rig.client.on_popup_show(true);
    assert!(rig.faults.lock().unwrap().is_empty());

    rig.ui.run_pending();
    let faults = rig.faults.lock().unwrap().clone();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].starts_with("on_popup_show: "));
}

#[test]
fn cursor_and_tooltip_are_marshalled() {
    let rig = Rig::active();
    rig.client.on_cursor_change(CursorHandle(42));
    assert!(rig.client.on_tooltip(Some("Save")));
    assert!(rig.client.on_tooltip(Some("Save")));
    assert!(rig.client.on_tooltip(None));
    assert!(rig.control.calls().is_empty());

    rig.ui.run_pending();
    assert_eq!(
        rig.control.calls(),
        vec![
            ControlCall::SetCursor(CursorHandle(42)),
            ControlCall::SetTooltip(Some("Save".into())),
            ControlCall::SetTooltip(None),
        ]
    );
}

#[test]
fn ui_tasks_outliving_the_adapter_are_dropped() {
    let rig = Rig::active();
    rig.client.on_popup_show(true);
    let Rig {
        popup, ui, adapter, ..
    } = rig;
    drop(adapter);
    assert_eq!(ui.run_pending(), 1);
    assert!(!popup.is_open());
}

#[test]
fn screen_point_and_info_come_from_host() {
    let rig = Rig::active();
    rig.control.set_screen_origin(Point::new(100, 200));
    assert_eq!(rig.client.screen_point(Point::new(5, 6)), Point::new(105, 206));
    assert_eq!(rig.client.screen_info(), ScreenInfo::default());

    rig.control.fail_point_to_screen(true);
    assert_eq!(rig.client.screen_point(Point::new(5, 6)), Point::new(0, 0));
    let faults = rig.faults.lock().unwrap().clone();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].starts_with("screen_point: "));
}

#[test]
fn dropped_adapter_leaves_client_inert() {
    let rig = Rig::active();
    let client = Arc::clone(&rig.client);
    drop(rig);

    assert_eq!(client.view_rect(), Rect::default());
    assert!(!client.on_tooltip(Some("x")));
    client.on_paint(frame(1, 1), false);
    client.on_title_change("ignored");
}
