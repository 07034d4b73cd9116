#![forbid(unsafe_code)]

//! A paint surface that records what it was asked to do.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use osr_backend::{HostError, PaintCompletion, PaintSurface};
use osr_core::pixels::PixelBuffer;

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Resize { width: i32, height: i32 },
    SetScale(f32),
    Paint { width: i32, height: i32 },
    Release,
}

/// Records resizes and paints; paint failures and completion timing are
/// scriptable.
pub struct RecordingSurface {
    size: Mutex<(i32, i32)>,
    scale: Mutex<f32>,
    calls: Mutex<Vec<SurfaceCall>>,
    failure: Mutex<Option<HostError>>,
    defer: AtomicBool,
    deferred: Mutex<Vec<PaintCompletion>>,
    released: AtomicBool,
}

impl fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("size", &*self.size.lock().unwrap())
            .field("calls", &self.calls.lock().unwrap().len())
            .field("deferred", &self.deferred.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            size: Mutex::new((0, 0)),
            scale: Mutex::new(1.0),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            defer: AtomicBool::new(false),
            deferred: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete every following paint with `failure` (or success for `None`).
    pub fn fail_paints_with(&self, failure: Option<HostError>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Hold paint completions until [`Self::complete_deferred`].
    pub fn defer_completions(&self, defer: bool) {
        self.defer.store(defer, Ordering::SeqCst);
    }

    /// Run every held completion with `result`. Returns how many ran.
    pub fn complete_deferred(&self, result: Result<(), HostError>) -> usize {
        let held: Vec<PaintCompletion> = std::mem::take(&mut *self.deferred.lock().unwrap());
        let count = held.len();
        for completion in held {
            completion(result.clone());
        }
        count
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Sizes passed to [`PaintSurface::resize`], in order.
    #[must_use]
    pub fn resizes(&self) -> Vec<(i32, i32)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Resize { width, height } => Some((*width, *height)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn paint_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Paint { .. }))
            .count()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PaintSurface for RecordingSurface {
    fn width(&self) -> i32 {
        self.size.lock().unwrap().0
    }

    fn height(&self) -> i32 {
        self.size.lock().unwrap().1
    }

    fn resize(&self, width: i32, height: i32) {
        *self.size.lock().unwrap() = (width, height);
        self.record(SurfaceCall::Resize { width, height });
    }

    fn device_scale_factor(&self) -> f32 {
        *self.scale.lock().unwrap()
    }

    fn set_device_scale_factor(&self, factor: f32) {
        *self.scale.lock().unwrap() = factor;
        self.record(SurfaceCall::SetScale(factor));
    }

    fn paint(&self, pixels: PixelBuffer, on_complete: PaintCompletion) {
        self.record(SurfaceCall::Paint {
            width: pixels.width,
            height: pixels.height,
        });
        if self.defer.load(Ordering::SeqCst) {
            self.deferred.lock().unwrap().push(on_complete);
            return;
        }
        let failure = self.failure.lock().unwrap().clone();
        on_complete(failure.map_or(Ok(()), Err));
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.record(SurfaceCall::Release);
    }
}
