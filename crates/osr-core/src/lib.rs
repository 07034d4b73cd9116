#![forbid(unsafe_code)]

//! Core: geometry, native handles, host input events, and observers.
//!
//! # Role in the off-screen host
//! `osr-core` is the vocabulary layer. It owns the canonical types that flow
//! between the host UI (`osr-backend`), the remote engine (`osr-engine`), and
//! the adapter that binds them (`osr-adapter`).
//!
//! # Primary responsibilities
//! - **Geometry**: [`geometry::Rect`], [`geometry::Point`], [`geometry::Size`]
//!   in view (logical) pixels.
//! - **Handles**: opaque [`handle::WindowHandle`] and [`handle::CursorHandle`].
//! - **Event**: canonical host input (mouse, keyboard, text, drag/drop, focus,
//!   visibility, scale).
//! - **Pixels**: [`pixels::PixelBuffer`], the frame payload of a paint callback.
//! - **Observer**: [`observer::Subscribers`], a thread-safe multicast list with
//!   RAII unsubscription.

pub mod event;
pub mod geometry;
pub mod handle;
pub mod observer;
pub mod pixels;

pub use event::{
    ControlRole, DragData, DragOperations, EventInterest, HostEvent, InputDisposition, KeyEvent,
    KeyEventKind, Modifiers, MouseButton, MouseEvent,
};
pub use geometry::{Point, Rect, Size};
pub use handle::{CursorHandle, WindowHandle};
pub use observer::{Subscribers, Subscription};
pub use pixels::PixelBuffer;
