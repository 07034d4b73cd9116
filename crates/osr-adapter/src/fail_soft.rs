#![forbid(unsafe_code)]

//! Fail-soft execution: turn both `Err` and panics into an [`AdapterError`].

use std::panic::{AssertUnwindSafe, catch_unwind};

use osr_core::observer::panic_message;

use crate::error::AdapterError;

/// Run `f`, converting a panic into [`AdapterError::Panic`].
pub(crate) fn run<T>(f: impl FnOnce() -> Result<T, AdapterError>) -> Result<T, AdapterError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(AdapterError::Panic {
            message: panic_message(payload.as_ref()),
        }),
    }
}
