#![forbid(unsafe_code)]

//! System process messages exchanged with renderer processes.
//!
//! Message kinds are a closed set known at compile time. The payload travels
//! as a JSON value; [`ProcessMessage::new`] and [`ProcessMessage::decode`]
//! convert to and from the typed payload structs below.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Every system message the host and renderer agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Renderer-side fault that escaped all script handlers.
    UnhandledException,
    EvaluationRequest,
    EvaluationResponse,
    /// A frame's script context was created.
    ContextCreated,
    /// A frame's script context was released.
    ContextReleased,
    /// Script threw and nothing caught it.
    UncaughtException,
    ObjectRegistered,
    ObjectUnregistered,
    /// Script invoked a method on a native object.
    MethodCall,
    MethodCallResult,
}

impl MessageKind {
    pub const ALL: [Self; 10] = [
        Self::UnhandledException,
        Self::EvaluationRequest,
        Self::EvaluationResponse,
        Self::ContextCreated,
        Self::ContextReleased,
        Self::UncaughtException,
        Self::ObjectRegistered,
        Self::ObjectUnregistered,
        Self::MethodCall,
        Self::MethodCallResult,
    ];

    /// Wire name of the message.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnhandledException => "osr.unhandled-exception",
            Self::EvaluationRequest => "osr.js.evaluation-request",
            Self::EvaluationResponse => "osr.js.evaluation-response",
            Self::ContextCreated => "osr.js.context-created",
            Self::ContextReleased => "osr.js.context-released",
            Self::UncaughtException => "osr.js.uncaught-exception",
            Self::ObjectRegistered => "osr.objects.registered",
            Self::ObjectUnregistered => "osr.objects.unregistered",
            Self::MethodCall => "osr.objects.method-call",
            Self::MethodCallResult => "osr.objects.method-call-result",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A typed system message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessMessage {
    pub kind: MessageKind,
    pub payload: Value,
}

impl ProcessMessage {
    /// Encode `payload` for `kind`.
    pub fn new<T: Serialize>(kind: MessageKind, payload: &T) -> Result<Self, EngineError> {
        let payload = serde_json::to_value(payload).map_err(|e| EngineError::Codec {
            kind: kind.name(),
            reason: e.to_string(),
        })?;
        Ok(Self { kind, payload })
    }

    /// A message with no payload.
    #[must_use]
    pub const fn empty(kind: MessageKind) -> Self {
        Self {
            kind,
            payload: Value::Null,
        }
    }

    /// Decode the payload as `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EngineError> {
        T::deserialize(&self.payload).map_err(|e| EngineError::Codec {
            kind: self.kind.name(),
            reason: e.to_string(),
        })
    }
}

/// Payload of [`MessageKind::UnhandledException`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnhandledExceptionDetails {
    pub exception_type: String,
    pub message: String,
    pub stack_trace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub task_id: u64,
    pub code: String,
    pub url: String,
    pub line: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub task_id: u64,
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub exception: Option<String>,
}

/// Payload of [`MessageKind::UncaughtException`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UncaughtExceptionDetails {
    pub message: String,
    pub source_url: String,
    pub line: i32,
    pub column: i32,
    pub stack_trace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRegistration {
    pub name: String,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectUnregistration {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub call_id: u64,
    pub object_name: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallResult {
    pub call_id: u64,
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}
