#![forbid(unsafe_code)]

//! Host input routing.
//!
//! Every host event is translated into engine commands inside a fail-soft
//! scope named after the event ([`HostEvent::scope`]). Events that arrive
//! before the browser host exists are dropped and reported as not forwarded.
//!
//! | Host event | Engine commands |
//! |------------|-----------------|
//! | focus gained / lost | `send_focus_event` |
//! | mouse move / leave | `send_mouse_move_event` |
//! | button down | focus the control, then click (`mouse_up = false`) |
//! | button up | click (`mouse_up = true`, one click) |
//! | wheel | `send_mouse_wheel_event` |
//! | key down / up | `send_key_event` (host keeps bubbling) |
//! | text input | one character key event per `char` |
//! | drag enter | drag enter, then drag over |
//! | drop | drag over, then drop |
//! | visibility | `was_hidden`; on restore arm the view-rect override and resize |
//! | scale change | update surface scale, `notify_screen_info_changed` |

use std::sync::Weak;

use osr_backend::{HostControl, HostError, HostEventSink, PaintSurface, PopupHost};
use osr_core::event::{ControlRole, HostEvent, InputDisposition, KeyEvent};

use crate::adapter::AdapterInner;
use crate::error::AdapterError;

/// The sink attached to the main control and the popup.
pub(crate) struct InputRouter {
    adapter: Weak<AdapterInner>,
}

impl InputRouter {
    pub(crate) fn new(adapter: Weak<AdapterInner>) -> Self {
        Self { adapter }
    }
}

impl HostEventSink for InputRouter {
    fn handle_host_event(&self, role: ControlRole, event: HostEvent) -> InputDisposition {
        let Some(inner) = self.adapter.upgrade() else {
            return InputDisposition::NotForwarded;
        };
        let scope = event.scope();
        inner
            .with_error_handling(scope, || inner.route_input(role, event))
            .unwrap_or_default()
    }
}

impl AdapterInner {
    fn focus_control(&self, role: ControlRole) -> Result<(), HostError> {
        match role {
            ControlRole::Main => self.control.focus(),
            ControlRole::Popup => self.popup.focus(),
        }
    }

    fn route_input(
        &self,
        role: ControlRole,
        event: HostEvent,
    ) -> Result<InputDisposition, AdapterError> {
        match event {
            HostEvent::VisibilityChanged(visible) => return self.on_visibility_changed(visible),
            HostEvent::ScreenInfoChanged {
                device_scale_factor,
            } => return self.on_screen_info_changed(device_scale_factor),
            HostEvent::MouseButtonPressed { .. } => self.focus_control(role)?,
            _ => {}
        }

        let Some(host) = self.host() else {
            tracing::trace!(
                target: "osr.input",
                scope = event.scope(),
                "no browser host; event dropped"
            );
            return Ok(InputDisposition::NotForwarded);
        };
        tracing::trace!(target: "osr.input", ?role, ?event, "forwarding");

        match event {
            HostEvent::GotFocus => host.send_focus_event(true)?,
            HostEvent::LostFocus => host.send_focus_event(false)?,
            HostEvent::MouseMoved(mouse) => host.send_mouse_move_event(mouse, false)?,
            HostEvent::MouseLeave(mouse) => host.send_mouse_move_event(mouse, true)?,
            HostEvent::MouseButtonPressed {
                event: mouse,
                button,
                click_count,
            } => host.send_mouse_click_event(mouse, button, false, click_count)?,
            HostEvent::MouseButtonReleased {
                event: mouse,
                button,
            } => host.send_mouse_click_event(mouse, button, true, 1)?,
            HostEvent::MouseWheel {
                event: mouse,
                delta_x,
                delta_y,
            } => host.send_mouse_wheel_event(mouse, delta_x, delta_y)?,
            HostEvent::KeyDown(key) | HostEvent::KeyUp(key) => {
                host.send_key_event(key)?;
                // The host keeps processing key strokes (shortcuts, IME).
                return Ok(InputDisposition::NotForwarded);
            }
            HostEvent::TextInput(text) => {
                if text.is_empty() {
                    return Ok(InputDisposition::NotForwarded);
                }
                for c in text.chars() {
                    host.send_key_event(KeyEvent::character(c))?;
                }
            }
            HostEvent::DragEnter {
                event: mouse,
                data,
                operations,
            } => {
                host.drag_target_drag_enter(&data, mouse, operations)?;
                host.drag_target_drag_over(mouse, operations)?;
            }
            HostEvent::DragOver {
                event: mouse,
                operations,
            } => host.drag_target_drag_over(mouse, operations)?,
            HostEvent::DragLeave => host.drag_target_drag_leave()?,
            HostEvent::Drop {
                event: mouse,
                operations,
            } => {
                host.drag_target_drag_over(mouse, operations)?;
                host.drag_target_drop(mouse)?;
            }
            HostEvent::VisibilityChanged(_) | HostEvent::ScreenInfoChanged { .. } => {
                return Ok(InputDisposition::NotForwarded);
            }
        }
        Ok(InputDisposition::Forwarded)
    }

    fn on_visibility_changed(&self, visible: bool) -> Result<InputDisposition, AdapterError> {
        tracing::debug!(target: "osr.adapter", adapter = %self.name, visible, "visibility changed");
        let Some(host) = self.host() else {
            return Ok(InputDisposition::NotForwarded);
        };
        host.was_hidden(!visible)?;
        if visible {
            // Next view-rect query reports one extra row to force a frame.
            self.view_rect.arm();
            host.was_resized()?;
        }
        Ok(InputDisposition::Forwarded)
    }

    fn on_screen_info_changed(
        &self,
        device_scale_factor: f32,
    ) -> Result<InputDisposition, AdapterError> {
        tracing::debug!(
            target: "osr.adapter",
            adapter = %self.name,
            device_scale_factor,
            "screen info changed"
        );
        self.main_surface.set_device_scale_factor(device_scale_factor);
        self.popup_surface.set_device_scale_factor(device_scale_factor);
        let Some(host) = self.host() else {
            return Ok(InputDisposition::NotForwarded);
        };
        host.notify_screen_info_changed()?;
        Ok(InputDisposition::Forwarded)
    }
}

