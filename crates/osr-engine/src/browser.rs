#![forbid(unsafe_code)]

//! Engine-side contracts: the browser, its host, its frames, and the client
//! callbacks the engine raises.
//!
//! Every command is a fire-and-forget request to the out-of-process engine.
//! A returned `Ok` means the request was accepted for delivery, not that the
//! remote side acted on it.

use std::fmt;
use std::sync::Arc;

use osr_core::event::{DragData, DragOperations, KeyEvent, MouseButton, MouseEvent};
use osr_core::geometry::{Point, Rect};
use osr_core::handle::{CursorHandle, WindowHandle};
use osr_core::pixels::PixelBuffer;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::message::ProcessMessage;

/// Engine-assigned frame identifier, unique within one browser.
pub type FrameId = i64;

/// Engine-assigned browser identifier.
pub type BrowserId = i32;

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogSeverity {
    #[default]
    Default,
    Verbose,
    Info,
    Warning,
    Error,
    Fatal,
}

/// How a navigation was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionType {
    /// The user followed a link.
    #[default]
    Link,
    /// The embedder or the user typed the address.
    Explicit,
    FormSubmit,
    Reload,
    /// A subframe navigation.
    Subframe,
    Other,
}

/// Network or load error code reported by the engine. Negative values are
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const NONE: Self = Self(0);
    pub const FAILED: Self = Self(-2);
    pub const ABORTED: Self = Self(-3);
    pub const NAME_NOT_RESOLVED: Self = Self(-105);

    /// Navigation was cancelled (e.g. superseded by another load).
    #[must_use]
    pub const fn is_aborted(self) -> bool {
        self.0 == Self::ABORTED.0
    }
}

/// Screen parameters reported to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenInfo {
    pub device_scale_factor: f32,
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            device_scale_factor: 1.0,
        }
    }
}

/// How a browser window is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowMode {
    /// Off-screen rendering; pixels arrive through [`EngineClient::on_paint`].
    Windowless { transparent: bool },
    /// A native popup window owned by the engine (DevTools).
    Popup { title: String },
}

/// Window parameters for browser creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub parent: Option<WindowHandle>,
    pub mode: WindowMode,
}

impl WindowInfo {
    #[must_use]
    pub fn windowless(parent: WindowHandle, transparent: bool) -> Self {
        Self {
            parent: Some(parent),
            mode: WindowMode::Windowless { transparent },
        }
    }

    #[must_use]
    pub fn popup(parent: Option<WindowHandle>, title: impl Into<String>) -> Self {
        Self {
            parent,
            mode: WindowMode::Popup {
                title: title.into(),
            },
        }
    }
}

/// Per-browser engine settings, forwarded verbatim on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Upper bound on paint callbacks per second.
    pub windowless_frame_rate: u32,
    pub javascript_enabled: bool,
    pub web_security: bool,
    /// ARGB background painted before content arrives.
    pub background_color: u32,
    pub default_encoding: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            windowless_frame_rate: 30,
            javascript_enabled: true,
            web_security: true,
            background_color: 0xFFFF_FFFF,
            default_encoding: None,
        }
    }
}

/// Everything the engine needs to create a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBrowserRequest {
    pub window: WindowInfo,
    pub settings: BrowserSettings,
    pub url: String,
}

/// A document frame inside a browser.
pub trait Frame: Send + Sync + fmt::Debug {
    fn identifier(&self) -> FrameId;

    fn name(&self) -> String;

    fn url(&self) -> String;

    fn is_main(&self) -> bool;

    /// False once the frame has been detached or its browser closed.
    fn is_valid(&self) -> bool;

    fn load_url(&self, url: &str) -> Result<(), EngineError>;

    /// Load `content` as a document that claims to come from `url`.
    fn load_string(&self, content: &str, url: &str) -> Result<(), EngineError>;

    fn execute_javascript(&self, code: &str, url: &str, line: i32) -> Result<(), EngineError>;

    /// Send a message to this frame's renderer process.
    fn send_process_message(&self, message: ProcessMessage) -> Result<(), EngineError>;
}

/// A browser instance.
pub trait Browser: Send + Sync + fmt::Debug {
    fn identifier(&self) -> BrowserId;

    fn host(&self) -> Arc<dyn BrowserHost>;

    fn main_frame(&self) -> Arc<dyn Frame>;

    /// Look a frame up by name.
    fn frame(&self, name: &str) -> Option<Arc<dyn Frame>>;

    fn is_loading(&self) -> bool;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    fn go_back(&self) -> Result<(), EngineError>;

    fn go_forward(&self) -> Result<(), EngineError>;

    fn reload(&self) -> Result<(), EngineError>;

    fn reload_ignore_cache(&self) -> Result<(), EngineError>;
}

/// Host-side command surface of a browser.
pub trait BrowserHost: Send + Sync + fmt::Debug {
    /// Request the browser to close. `force` skips unload handlers.
    fn close_browser(&self, force: bool) -> Result<(), EngineError>;

    fn window_handle(&self) -> Option<WindowHandle>;

    fn zoom_level(&self) -> f64;

    fn set_zoom_level(&self, level: f64) -> Result<(), EngineError>;

    fn send_focus_event(&self, focused: bool) -> Result<(), EngineError>;

    fn send_mouse_move_event(&self, event: MouseEvent, mouse_leave: bool)
    -> Result<(), EngineError>;

    fn send_mouse_click_event(
        &self,
        event: MouseEvent,
        button: MouseButton,
        mouse_up: bool,
        click_count: i32,
    ) -> Result<(), EngineError>;

    fn send_mouse_wheel_event(
        &self,
        event: MouseEvent,
        delta_x: i32,
        delta_y: i32,
    ) -> Result<(), EngineError>;

    fn send_key_event(&self, event: KeyEvent) -> Result<(), EngineError>;

    fn drag_target_drag_enter(
        &self,
        data: &DragData,
        event: MouseEvent,
        operations: DragOperations,
    ) -> Result<(), EngineError>;

    fn drag_target_drag_over(
        &self,
        event: MouseEvent,
        operations: DragOperations,
    ) -> Result<(), EngineError>;

    fn drag_target_drag_leave(&self) -> Result<(), EngineError>;

    fn drag_target_drop(&self, event: MouseEvent) -> Result<(), EngineError>;

    fn was_hidden(&self, hidden: bool) -> Result<(), EngineError>;

    /// Ask the engine to re-query the view rect and repaint.
    fn was_resized(&self) -> Result<(), EngineError>;

    fn notify_screen_info_changed(&self) -> Result<(), EngineError>;

    fn show_dev_tools(
        &self,
        window: &WindowInfo,
        settings: &BrowserSettings,
        inspect_at: Point,
    ) -> Result<(), EngineError>;

    fn close_dev_tools(&self) -> Result<(), EngineError>;
}

/// The engine entry point.
pub trait Engine: Send + Sync {
    /// Start creating a browser. Completion is reported through
    /// [`EngineClient::on_browser_created`] on an engine thread.
    fn create_browser(
        &self,
        request: CreateBrowserRequest,
        client: Arc<dyn EngineClient>,
    ) -> Result<(), EngineError>;
}

/// Callbacks the engine raises for one browser.
///
/// Called on engine threads. Implementations must not block and must not
/// unwind; boolean returns mean "handled".
pub trait EngineClient: Send + Sync {
    // --- render handler ---

    /// The rect the engine should lay out and paint into.
    fn view_rect(&self) -> Rect;

    /// Convert a view point to screen coordinates.
    fn screen_point(&self, view_point: Point) -> Point;

    fn screen_info(&self) -> ScreenInfo;

    fn on_popup_show(&self, show: bool);

    fn on_popup_size(&self, rect: Rect);

    fn on_paint(&self, pixels: PixelBuffer, is_popup: bool);

    fn on_cursor_change(&self, cursor: CursorHandle);

    // --- life span ---

    fn on_browser_created(&self, browser: Arc<dyn Browser>);

    fn on_browser_destroyed(&self, browser: Arc<dyn Browser>);

    // --- display ---

    fn on_tooltip(&self, text: Option<&str>) -> bool;

    fn on_address_change(&self, frame: Arc<dyn Frame>, url: &str);

    fn on_title_change(&self, title: &str);

    fn on_status_message(&self, message: &str);

    fn on_console_message(
        &self,
        level: LogSeverity,
        message: &str,
        source: &str,
        line: i32,
    ) -> bool;

    // --- load ---

    fn on_load_start(&self, frame: Arc<dyn Frame>, transition: TransitionType);

    fn on_load_end(&self, frame: Arc<dyn Frame>, http_status_code: i32);

    fn on_load_error(
        &self,
        frame: Arc<dyn Frame>,
        error_code: ErrorCode,
        error_text: &str,
        failed_url: &str,
    );

    fn on_loading_state_change(&self, is_loading: bool, can_go_back: bool, can_go_forward: bool);

    // --- messaging ---

    /// A message arrived from `frame`'s renderer process.
    fn on_process_message(&self, frame: Arc<dyn Frame>, message: ProcessMessage) -> bool;

    /// The engine failed somewhere the client cannot otherwise observe.
    fn on_exception(&self, error: EngineError);
}
