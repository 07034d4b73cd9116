#![forbid(unsafe_code)]

//! Adapter lifecycle state.
//!
//! ```text
//! Uninitialized ──(first positive resize + window handle)──▶ Created
//! Created ──(browser-created callback)──▶ Active
//! Active ──(browser-destroyed callback)──▶ Destroyed
//! any ──(teardown)──▶ Destroying ──▶ Destroyed
//! ```
//!
//! Transitions are compare-and-swap so a racing caller cannot fire a
//! transition twice.

use std::sync::atomic::{AtomicU8, Ordering};

/// Where an adapter is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdapterState {
    /// No browser requested yet. Navigation is buffered.
    Uninitialized = 0,
    /// Create-browser issued; waiting for the engine.
    Created = 1,
    /// Browser handle received.
    Active = 2,
    Destroying = 3,
    Destroyed = 4,
}

impl AdapterState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Created,
            2 => Self::Active,
            3 => Self::Destroying,
            _ => Self::Destroyed,
        }
    }

    /// Destroying or destroyed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Destroying | Self::Destroyed)
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(AdapterState::Uninitialized as u8))
    }

    pub(crate) fn get(&self) -> AdapterState {
        AdapterState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `from → to`. False if the current state is not `from`.
    pub(crate) fn transition(&self, from: AdapterState, to: AdapterState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn set(&self, to: AdapterState) {
        self.0.store(to as u8, Ordering::Release);
    }
}
