#![forbid(unsafe_code)]

//! Host input is translated into browser-host commands.

use std::sync::Arc;

use osr_adapter::{AdapterParts, AdapterSettings, BrowserAdapter};
use osr_core::event::{
    DragData, DragOperations, HostEvent, InputDisposition, KeyEvent, KeyEventKind, Modifiers,
    MouseButton, MouseEvent,
};
use osr_core::geometry::Rect;
use osr_engine::EngineClient;
use osr_harness::{
    ControlCall, FakeBrowserHost, FakeControl, FakeEngine, FakePopup, HostCommand,
    InlineUiDispatcher, SurfaceCall,
};
use pretty_assertions::assert_eq;

struct Rig {
    control: Arc<FakeControl>,
    popup: Arc<FakePopup>,
    engine: Arc<FakeEngine>,
    adapter: BrowserAdapter,
}

impl Rig {
    fn active() -> Self {
        let control = Arc::new(FakeControl::new());
        let popup = Arc::new(FakePopup::new());
        let engine = Arc::new(FakeEngine::new());
        let adapter = BrowserAdapter::new(
            AdapterParts {
                control: control.clone(),
                popup: popup.clone(),
                engine: engine.clone(),
                ui: Arc::new(InlineUiDispatcher::new()),
            },
            AdapterSettings::default(),
        );
        adapter.create_or_update_browser(800, 600).unwrap();
        engine.complete_creation();
        engine.browser().fake_host().take_commands();
        Self {
            control,
            popup,
            engine,
            adapter,
        }
    }

    fn host(&self) -> Arc<FakeBrowserHost> {
        self.engine.browser().fake_host()
    }
}

#[test]
fn mouse_down_focuses_then_clicks() {
    let rig = Rig::active();
    let at = MouseEvent::new(10, 20).with_modifiers(Modifiers::LEFT_BUTTON);

    let disposition = rig.control.emit(HostEvent::MouseButtonPressed {
        event: at,
        button: MouseButton::Left,
        click_count: 2,
    });
    assert_eq!(disposition, InputDisposition::Forwarded);
    assert_eq!(rig.control.calls(), vec![ControlCall::Focus]);
    assert_eq!(
        rig.host().commands(),
        vec![HostCommand::MouseClick {
            event: at,
            button: MouseButton::Left,
            mouse_up: false,
            click_count: 2,
        }]
    );

    rig.control.emit(HostEvent::MouseButtonReleased {
        event: at,
        button: MouseButton::Left,
    });
    assert_eq!(
        rig.host().commands().last(),
        Some(&HostCommand::MouseClick {
            event: at,
            button: MouseButton::Left,
            mouse_up: true,
            click_count: 1,
        })
    );
}

#[test]
fn popup_mouse_down_focuses_popup() {
    let rig = Rig::active();
    rig.popup.emit(HostEvent::MouseButtonPressed {
        event: MouseEvent::new(1, 1),
        button: MouseButton::Left,
        click_count: 1,
    });
    assert_eq!(rig.popup.calls(), vec![ControlCall::Focus]);
    assert!(rig.control.calls().is_empty());
}

#[test]
fn move_leave_and_wheel() {
    let rig = Rig::active();
    let at = MouseEvent::new(5, 6);
    rig.control.emit(HostEvent::MouseMoved(at));
    rig.control.emit(HostEvent::MouseLeave(at));
    rig.control.emit(HostEvent::MouseWheel {
        event: at,
        delta_x: 0,
        delta_y: -120,
    });
    assert_eq!(
        rig.host().commands(),
        vec![
            HostCommand::MouseMove {
                event: at,
                leave: false
            },
            HostCommand::MouseMove {
                event: at,
                leave: true
            },
            HostCommand::MouseWheel {
                event: at,
                delta_x: 0,
                delta_y: -120
            },
        ]
    );
}

#[test]
fn focus_events_are_forwarded() {
    let rig = Rig::active();
    assert!(rig.control.emit(HostEvent::GotFocus).is_forwarded());
    assert!(rig.control.emit(HostEvent::LostFocus).is_forwarded());
    assert_eq!(
        rig.host().commands(),
        vec![HostCommand::Focus(true), HostCommand::Focus(false)]
    );
}

#[test]
fn key_events_are_sent_but_keep_bubbling() {
    let rig = Rig::active();
    let key = KeyEvent::new(KeyEventKind::RawKeyDown, 0x41).with_modifiers(Modifiers::SHIFT);
    let disposition = rig.control.emit(HostEvent::KeyDown(key));
    assert_eq!(disposition, InputDisposition::NotForwarded);
    assert_eq!(rig.host().commands(), vec![HostCommand::Key(key)]);
}

#[test]
fn text_input_becomes_one_char_event_per_character() {
    let rig = Rig::active();
    let disposition = rig.control.emit(HostEvent::TextInput("hé!".into()));
    assert!(disposition.is_forwarded());
    assert_eq!(
        rig.host().commands(),
        vec![
            HostCommand::Key(KeyEvent::character('h')),
            HostCommand::Key(KeyEvent::character('é')),
            HostCommand::Key(KeyEvent::character('!')),
        ]
    );

    assert!(!rig.control.emit(HostEvent::TextInput(String::new())).is_forwarded());
}

#[test]
fn drag_enter_is_enter_then_over_and_drop_is_over_then_drop() {
    let rig = Rig::active();
    let at = MouseEvent::new(30, 40);
    let data = DragData {
        text: Some("payload".into()),
        ..DragData::default()
    };
    let ops = DragOperations::COPY | DragOperations::MOVE;

    rig.control.emit(HostEvent::DragEnter {
        event: at,
        data: data.clone(),
        operations: ops,
    });
    rig.control.emit(HostEvent::DragLeave);
    rig.control.emit(HostEvent::Drop {
        event: at,
        operations: ops,
    });

    assert_eq!(
        rig.host().commands(),
        vec![
            HostCommand::DragEnter {
                data,
                event: at,
                operations: ops
            },
            HostCommand::DragOver {
                event: at,
                operations: ops
            },
            HostCommand::DragLeave,
            HostCommand::DragOver {
                event: at,
                operations: ops
            },
            HostCommand::Drop(at),
        ]
    );
}

#[test]
fn input_before_browser_is_not_forwarded() {
    let control = Arc::new(FakeControl::new());
    let engine = Arc::new(FakeEngine::new());
    let adapter = BrowserAdapter::new(
        AdapterParts {
            control: control.clone(),
            popup: Arc::new(FakePopup::new()),
            engine: engine.clone(),
            ui: Arc::new(InlineUiDispatcher::new()),
        },
        AdapterSettings::default(),
    );
    adapter.create_or_update_browser(100, 100).unwrap();

    let disposition = control.emit(HostEvent::MouseButtonPressed {
        event: MouseEvent::new(0, 0),
        button: MouseButton::Right,
        click_count: 1,
    });
    assert_eq!(disposition, InputDisposition::NotForwarded);
    // Focus still moves to the control.
    assert_eq!(control.calls(), vec![ControlCall::Focus]);
    assert!(engine.browser().fake_host().commands().is_empty());
}

#[test]
fn visibility_restore_inflates_next_view_rect_once() {
    let rig = Rig::active();
    let client = rig.adapter.engine_client().unwrap();
    assert_eq!(client.view_rect(), Rect::new(0, 0, 800, 600));

    rig.control.emit(HostEvent::VisibilityChanged(false));
    assert_eq!(rig.host().commands(), vec![HostCommand::WasHidden(true)]);
    assert_eq!(client.view_rect(), Rect::new(0, 0, 800, 600));

    rig.host().take_commands();
    rig.control.emit(HostEvent::VisibilityChanged(true));
    assert_eq!(
        rig.host().take_commands(),
        vec![HostCommand::WasHidden(false), HostCommand::WasResized]
    );

    assert_eq!(client.view_rect(), Rect::new(0, 0, 800, 601));
    // The inflated query schedules the corrective resize.
    assert_eq!(rig.host().take_commands(), vec![HostCommand::WasResized]);
    assert_eq!(client.view_rect(), Rect::new(0, 0, 800, 600));
    assert_eq!(client.view_rect(), Rect::new(0, 0, 800, 600));
    assert!(rig.host().commands().is_empty());
}

#[test]
fn scale_change_updates_surfaces_and_engine() {
    let rig = Rig::active();
    let client = rig.adapter.engine_client().unwrap();

    rig.control.emit(HostEvent::ScreenInfoChanged {
        device_scale_factor: 2.0,
    });
    assert_eq!(client.screen_info().device_scale_factor, 2.0);
    assert_eq!(
        rig.control.surface().calls().last(),
        Some(&SurfaceCall::SetScale(2.0))
    );
    assert_eq!(
        rig.popup.surface().calls().last(),
        Some(&SurfaceCall::SetScale(2.0))
    );
    assert_eq!(rig.host().commands(), vec![HostCommand::ScreenInfoChanged]);
}

#[test]
fn lifecycle_events_reach_adapter_before_creation() {
    let control = Arc::new(FakeControl::new());
    let adapter = BrowserAdapter::new(
        AdapterParts {
            control: control.clone(),
            popup: Arc::new(FakePopup::new()),
            engine: Arc::new(FakeEngine::new()),
            ui: Arc::new(InlineUiDispatcher::new()),
        },
        AdapterSettings::default(),
    );
    control.emit(HostEvent::ScreenInfoChanged {
        device_scale_factor: 1.5,
    });
    assert_eq!(control.surface().calls(), vec![SurfaceCall::SetScale(1.5)]);
    // Input is not attached until the browser is requested.
    control.emit(HostEvent::GotFocus);
    drop(adapter);
}

#[test]
fn failing_command_is_reported_not_raised() {
    let rig = Rig::active();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let _sub = {
        let seen = Arc::clone(&seen);
        rig.adapter
            .events()
            .unhandled_exception
            .subscribe(move |event| seen.lock().unwrap().push(event.scope))
    };

    rig.host()
        .fail_commands_with(Some(osr_engine::EngineError::BrowserGone));
    let disposition = rig.control.emit(HostEvent::MouseMoved(MouseEvent::new(1, 1)));
    assert_eq!(disposition, InputDisposition::NotForwarded);
    assert_eq!(*seen.lock().unwrap(), vec!["handle_mouse_move"]);
}
