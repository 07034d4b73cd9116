#![forbid(unsafe_code)]

//! Deterministic fakes for every host and engine contract.
//!
//! Each fake records the calls it receives and exposes knobs for scripting
//! failures and timing, so adapter behaviour can be asserted without a UI
//! toolkit or a browser process.

pub mod control;
pub mod dispatcher;
pub mod engine;
pub mod surface;

pub use control::{ControlCall, FakeControl, FakePopup};
pub use dispatcher::{InlineUiDispatcher, QueuedUiDispatcher};
pub use engine::{
    BrowserCommand, FakeBrowser, FakeBrowserHost, FakeEngine, FakeFrame, FrameLoad, HostCommand,
};
pub use surface::{RecordingSurface, SurfaceCall};
