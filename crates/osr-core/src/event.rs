#![forbid(unsafe_code)]

//! Canonical host input/event types.
//!
//! The host control translates its native widget events into [`HostEvent`]
//! values and pushes them into whatever sink the adapter attached. All
//! payload types are plain data so they can cross thread boundaries.
//!
//! # Design Notes
//!
//! - Mouse coordinates are view-relative (0,0 is the control's top-left).
//! - Key events follow the engine's model: one event per key transition and
//!   one [`KeyEventKind::Char`] event per typed character.
//! - [`InputDisposition`] replaces "handled" out-flags; hosts may use it to
//!   decide whether to keep bubbling the native event.

use bitflags::bitflags;

/// Which control raised an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRole {
    /// The main view control.
    Main,
    /// The popup (select boxes, autocomplete) control.
    Popup,
}

bitflags! {
    /// Event classes a sink can be attached for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventInterest: u8 {
        /// Visibility and screen-scale changes.
        const LIFECYCLE = 0b01;
        /// Focus, mouse, keyboard, text and drag/drop input.
        const INPUT     = 0b10;
    }
}

bitflags! {
    /// Modifier keys and mouse buttons held during an event.
    ///
    /// Bit values match the engine's event flags so they can be forwarded
    /// without translation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        /// No modifiers.
        const NONE          = 0;
        const CAPS_LOCK     = 1 << 0;
        const SHIFT         = 1 << 1;
        const CTRL          = 1 << 2;
        const ALT           = 1 << 3;
        const LEFT_BUTTON   = 1 << 4;
        const MIDDLE_BUTTON = 1 << 5;
        const RIGHT_BUTTON  = 1 << 6;
        /// Command/Super/Meta key.
        const COMMAND       = 1 << 7;
        const NUM_LOCK      = 1 << 8;
        const IS_KEY_PAD    = 1 << 9;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

bitflags! {
    /// Allowed drag operations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DragOperations: u32 {
        const NONE    = 0;
        const COPY    = 1;
        const LINK    = 2;
        const GENERIC = 4;
        const PRIVATE = 8;
        const MOVE    = 16;
        const DELETE  = 32;
        const EVERY   = u32::MAX;
    }
}

impl Default for DragOperations {
    fn default() -> Self {
        Self::NONE
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Pointer position plus held modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseEvent {
    /// X coordinate relative to the control.
    pub x: i32,
    /// Y coordinate relative to the control.
    pub y: i32,
    /// Modifier keys and buttons held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a mouse event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key pressed, before any character translation.
    #[default]
    RawKeyDown,
    /// Key pressed, after character translation.
    KeyDown,
    /// Key released.
    KeyUp,
    /// A translated character.
    Char,
}

/// A keyboard event in the engine's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub modifiers: Modifiers,
    /// Windows virtual-key code (or the character code for `Char` events).
    pub windows_key_code: i32,
    /// Platform scan/key code.
    pub native_key_code: i32,
    /// True for system keys (Alt-modified on Windows).
    pub is_system_key: bool,
    /// The translated character, if any.
    pub character: Option<char>,
    /// The character without modifiers applied, if any.
    pub unmodified_character: Option<char>,
}

impl KeyEvent {
    /// Create a key transition event for a virtual-key code.
    #[must_use]
    pub const fn new(kind: KeyEventKind, windows_key_code: i32) -> Self {
        Self {
            kind,
            modifiers: Modifiers::NONE,
            windows_key_code,
            native_key_code: 0,
            is_system_key: false,
            character: None,
            unmodified_character: None,
        }
    }

    /// A single typed character.
    #[must_use]
    pub const fn character(c: char) -> Self {
        Self {
            kind: KeyEventKind::Char,
            modifiers: Modifiers::NONE,
            windows_key_code: c as i32,
            native_key_code: 0,
            is_system_key: false,
            character: Some(c),
            unmodified_character: Some(c),
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Drag payload offered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DragData {
    pub text: Option<String>,
    pub html: Option<String>,
    pub link_url: Option<String>,
    pub file_names: Vec<String>,
}

/// Canonical host event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    GotFocus,
    LostFocus,
    MouseMoved(MouseEvent),
    MouseLeave(MouseEvent),
    MouseButtonPressed {
        event: MouseEvent,
        button: MouseButton,
        click_count: i32,
    },
    MouseButtonReleased {
        event: MouseEvent,
        button: MouseButton,
    },
    MouseWheel {
        event: MouseEvent,
        delta_x: i32,
        delta_y: i32,
    },
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Committed text (IME or plain typing), possibly several characters.
    TextInput(String),
    DragEnter {
        event: MouseEvent,
        data: DragData,
        operations: DragOperations,
    },
    DragOver {
        event: MouseEvent,
        operations: DragOperations,
    },
    DragLeave,
    Drop {
        event: MouseEvent,
        operations: DragOperations,
    },
    /// Control became visible (`true`) or hidden (`false`).
    VisibilityChanged(bool),
    /// Device scale factor of the hosting screen changed.
    ScreenInfoChanged {
        device_scale_factor: f32,
    },
}

impl HostEvent {
    /// The interest class a sink must be attached with to receive this event.
    #[must_use]
    pub const fn interest(&self) -> EventInterest {
        match self {
            Self::VisibilityChanged(_) | Self::ScreenInfoChanged { .. } => EventInterest::LIFECYCLE,
            _ => EventInterest::INPUT,
        }
    }

    /// Stable scope name used when logging failures for this event.
    #[must_use]
    pub const fn scope(&self) -> &'static str {
        match self {
            Self::GotFocus => "handle_got_focus",
            Self::LostFocus => "handle_lost_focus",
            Self::MouseMoved(_) => "handle_mouse_move",
            Self::MouseLeave(_) => "handle_mouse_leave",
            Self::MouseButtonPressed { .. } => "handle_mouse_button_down",
            Self::MouseButtonReleased { .. } => "handle_mouse_button_up",
            Self::MouseWheel { .. } => "handle_mouse_wheel",
            Self::KeyDown(_) | Self::KeyUp(_) => "handle_key_press",
            Self::TextInput(_) => "handle_text_input",
            Self::DragEnter { .. } => "handle_drag_enter",
            Self::DragOver { .. } => "handle_drag_over",
            Self::DragLeave => "handle_drag_leave",
            Self::Drop { .. } => "handle_drop",
            Self::VisibilityChanged(_) => "handle_visibility_changed",
            Self::ScreenInfoChanged { .. } => "handle_screen_info_changed",
        }
    }
}

/// Outcome of routing a host event.
///
/// `NotForwarded` also covers "forwarded but host propagation should
/// continue", which is how key events are reported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputDisposition {
    Forwarded,
    #[default]
    NotForwarded,
}

impl InputDisposition {
    /// Whether the host should treat the native event as handled.
    #[must_use]
    pub const fn is_forwarded(self) -> bool {
        matches!(self, Self::Forwarded)
    }
}
