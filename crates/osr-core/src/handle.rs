#![forbid(unsafe_code)]

//! Opaque native handles.
//!
//! The adapter never dereferences these; it only passes them between the
//! host control and the engine.

/// Native window handle of the top-level host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Native cursor handle chosen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(pub u64);
