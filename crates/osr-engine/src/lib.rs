#![forbid(unsafe_code)]

//! Engine: contracts and plumbing for the out-of-process browser engine.
//!
//! # Role in the off-screen host
//! `osr-engine` describes the remote side. The adapter (`osr-adapter`) only
//! ever talks to the engine through the traits in [`browser`], and receives
//! renderer messages through the [`dispatcher::MessageDispatcher`].
//!
//! # Key Components
//!
//! - [`Engine`], [`EngineClient`], [`Browser`], [`BrowserHost`], [`Frame`]:
//!   command and callback surfaces.
//! - [`MessageKind`] / [`ProcessMessage`]: the closed set of system messages
//!   and their typed payloads.
//! - [`MessageDispatcher`]: routes renderer messages to handlers by kind.
//! - [`JavascriptExecutionEngine`] / [`Evaluation`]: script evaluation with
//!   request/response correlation.
//! - [`NativeObjectRegistry`] / [`NativeObjectMethodDispatcher`]: host
//!   objects callable from page script.

pub mod browser;
pub mod dispatcher;
pub mod error;
pub mod javascript;
pub mod message;
pub mod objects;

pub use browser::{
    Browser, BrowserHost, BrowserId, BrowserSettings, CreateBrowserRequest, Engine, EngineClient,
    ErrorCode, Frame, FrameId, LogSeverity, ScreenInfo, TransitionType, WindowInfo, WindowMode,
};
pub use dispatcher::{HandlerId, MessageDispatcher, MessageReceived};
pub use error::{EngineError, EvaluationError, ObjectCallError, RegistryError};
pub use javascript::{
    Evaluation, JavascriptContextEvent, JavascriptExecutionEngine, JavascriptUncaughtExceptionEvent,
};
pub use message::{MessageKind, ProcessMessage, UncaughtExceptionDetails, UnhandledExceptionDetails};
pub use objects::{
    MethodCallInterceptor, NativeObject, NativeObjectMethodDispatcher, NativeObjectRegistry,
    RegisteredObject,
};
