#![forbid(unsafe_code)]

//! One-shot view-rect inflation after a visibility restore.
//!
//! Some engine builds do not produce a new frame when an off-screen view is
//! shown again. Reporting a view rect one pixel taller on the next query,
//! then the real one, forces a fresh frame.
//!
//! The override is a three-state flag rather than a stored closure:
//!
//! | State | Meaning |
//! |-------|---------|
//! | `None` | never armed |
//! | `PendingInflate` | armed; the next query inflates |
//! | `Consumed` | fired; queries report the true rect until re-armed |

use std::sync::atomic::{AtomicU8, Ordering};

/// State of the view-rect override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ViewRectOverrideState {
    None = 0,
    PendingInflate = 1,
    Consumed = 2,
}

/// Lock-free holder for [`ViewRectOverrideState`].
#[derive(Debug)]
pub struct ViewRectOverride(AtomicU8);

impl Default for ViewRectOverride {
    fn default() -> Self {
        Self(AtomicU8::new(ViewRectOverrideState::None as u8))
    }
}

impl ViewRectOverride {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ViewRectOverrideState {
        match self.0.load(Ordering::Acquire) {
            0 => ViewRectOverrideState::None,
            1 => ViewRectOverrideState::PendingInflate,
            _ => ViewRectOverrideState::Consumed,
        }
    }

    /// Arm for the next query. Re-arming while pending is a no-op.
    pub fn arm(&self) {
        self.0
            .store(ViewRectOverrideState::PendingInflate as u8, Ordering::Release);
    }

    /// Consume the override. True for exactly one caller per arming.
    pub fn try_consume(&self) -> bool {
        self.0
            .compare_exchange(
                ViewRectOverrideState::PendingInflate as u8,
                ViewRectOverrideState::Consumed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
