#![forbid(unsafe_code)]

//! Adapter: binds a windowless browser engine to a host UI surface.
//!
//! # Role in the off-screen host
//! `osr-adapter` is the only crate that knows both sides. It owns one browser
//! per host control, turns host input into engine commands, routes paint
//! buffers and popup geometry to the right surface, and bridges script
//! evaluation and native objects over the engine's message channel.
//!
//! # Key Components
//!
//! - [`BrowserAdapter`]: lifecycle, navigation, script and object commands.
//! - [`AdapterEvents`]: the public event surface (load, address, title,
//!   console, script context, unhandled exception, initialized).
//! - [`AdapterSettings`]: TOML/JSON configuration.
//! - [`AdapterError`]: everything a command or fail-soft scope can report,
//!   with [`RemoteException`] for faults raised in the browser process.
//!
//! # Example
//!
//! ```rust,ignore
//! let adapter = BrowserAdapter::new(parts, AdapterSettings::from_toml_file("browser.toml")?);
//! let _guard = adapter.events().unhandled_exception.subscribe(|event| {
//!     eprintln!("{}: {}", event.scope, event.error);
//! });
//! adapter.navigate("https://example.org")?;
//! adapter.create_or_update_browser(1280, 720)?;
//! ```

mod adapter;
mod client;
pub mod error;
pub mod events;
mod fail_soft;
mod input;
pub mod lifecycle;
mod render;
pub mod settings;
pub mod view_rect;

pub use adapter::{AdapterParts, BrowserAdapter};
pub use error::{AdapterError, RemoteException};
pub use events::{
    AddressChangedEvent, AdapterEvents, ConsoleMessageEvent, InitializedEvent, LoadEndEvent,
    LoadErrorEvent, LoadStartEvent, LoadingStateChangeEvent, StatusMessageEvent, TitleChangedEvent,
    UnhandledExceptionEvent,
};
pub use lifecycle::AdapterState;
pub use settings::{AdapterSettings, MAX_WINDOWLESS_FRAME_RATE, SettingsError};
pub use view_rect::{ViewRectOverride, ViewRectOverrideState};
