#![forbid(unsafe_code)]

//! Script evaluation across the renderer message channel.
//!
//! An evaluation sends an [`EvaluationRequest`] to the target frame and parks
//! a oneshot sender under a fresh task id. The matching
//! [`EvaluationResponse`] (routed through the [`MessageDispatcher`]) resolves
//! it.
//!
//! # Invariants
//!
//! 1. Every pending evaluation completes exactly once: by its response, by
//!    the release of its frame's context (`FrameInvalidated`), or by
//!    [`JavascriptExecutionEngine::fail_all`].
//! 2. A response for an unknown task id (late, duplicated) is ignored.
//! 3. There is no timeout; a renderer that never answers leaves the
//!    evaluation pending until the frame or browser goes away.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use osr_core::observer::Subscribers;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use web_time::Instant;

use crate::browser::{Frame, FrameId};
use crate::dispatcher::{HandlerId, MessageDispatcher, MessageReceived};
use crate::error::EvaluationError;
use crate::message::{
    EvaluationRequest, EvaluationResponse, MessageKind, ProcessMessage, UncaughtExceptionDetails,
};

type EvaluationResult = Result<Value, EvaluationError>;

/// A frame's script context was created or released.
#[derive(Debug, Clone)]
pub struct JavascriptContextEvent {
    pub frame: Arc<dyn Frame>,
}

/// Script threw and nothing caught it.
#[derive(Debug, Clone)]
pub struct JavascriptUncaughtExceptionEvent {
    pub frame: Arc<dyn Frame>,
    pub details: UncaughtExceptionDetails,
}

struct PendingEvaluation {
    frame_id: FrameId,
    reply: oneshot::Sender<EvaluationResult>,
    started: Instant,
}

/// Bridge that evaluates script in renderer frames.
pub struct JavascriptExecutionEngine {
    dispatcher: Arc<MessageDispatcher>,
    pending: Mutex<HashMap<u64, PendingEvaluation>>,
    next_task_id: AtomicU64,
    main_frame_context: AtomicBool,
    handler_ids: Mutex<Vec<HandlerId>>,
    context_created: Subscribers<JavascriptContextEvent>,
    context_released: Subscribers<JavascriptContextEvent>,
    uncaught_exception: Subscribers<JavascriptUncaughtExceptionEvent>,
}

impl fmt::Debug for JavascriptExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JavascriptExecutionEngine")
            .field("pending", &self.pending_count())
            .field(
                "main_frame_context",
                &self.main_frame_context.load(Ordering::Acquire),
            )
            .finish_non_exhaustive()
    }
}

impl JavascriptExecutionEngine {
    /// Create the bridge and hook its handlers into `dispatcher`.
    ///
    /// Handlers hold the bridge weakly and are removed when it is dropped.
    #[must_use]
    pub fn new(dispatcher: Arc<MessageDispatcher>) -> Arc<Self> {
        let engine = Arc::new(Self {
            dispatcher,
            pending: Mutex::new(HashMap::new()),
            next_task_id: AtomicU64::new(1),
            main_frame_context: AtomicBool::new(false),
            handler_ids: Mutex::new(Vec::new()),
            context_created: Subscribers::new(),
            context_released: Subscribers::new(),
            uncaught_exception: Subscribers::new(),
        });

        let ids = vec![
            Self::route(&engine, MessageKind::EvaluationResponse, Self::on_evaluation_response),
            Self::route(&engine, MessageKind::ContextCreated, Self::on_context_created),
            Self::route(&engine, MessageKind::ContextReleased, Self::on_context_released),
            Self::route(&engine, MessageKind::UncaughtException, Self::on_uncaught_exception),
        ];
        *engine.handler_ids.lock().unwrap_or_else(|e| e.into_inner()) = ids;
        engine
    }

    fn route(
        engine: &Arc<Self>,
        kind: MessageKind,
        handle: fn(&Self, &MessageReceived),
    ) -> HandlerId {
        let weak = Arc::downgrade(engine);
        engine.dispatcher.register_handler(kind, move |received| {
            if let Some(engine) = weak.upgrade() {
                handle(&engine, received);
            }
        })
    }

    /// Evaluate `code` in `frame`.
    ///
    /// An invalid frame resolves immediately to `T::default()`. A send
    /// failure resolves immediately to that error.
    pub fn evaluate<T>(&self, code: &str, url: &str, line: i32, frame: &Arc<dyn Frame>) -> Evaluation<T> {
        if !frame.is_valid() {
            tracing::debug!(target: "osr.js", frame_id = frame.identifier(), "evaluation on invalid frame");
            return Evaluation::ready_default();
        }

        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let request = EvaluationRequest {
            task_id,
            code: code.to_owned(),
            url: url.to_owned(),
            line,
        };
        let message = match ProcessMessage::new(MessageKind::EvaluationRequest, &request) {
            Ok(message) => message,
            Err(err) => return Evaluation::failed(err.into()),
        };

        let (reply, receiver) = oneshot::channel();
        self.lock_pending().insert(
            task_id,
            PendingEvaluation {
                frame_id: frame.identifier(),
                reply,
                started: Instant::now(),
            },
        );

        if let Err(err) = self.dispatcher.send(frame.as_ref(), message) {
            self.lock_pending().remove(&task_id);
            tracing::warn!(target: "osr.js", task_id, error = %err, "evaluation request not delivered");
            return Evaluation::failed(err.into());
        }

        tracing::trace!(target: "osr.js", task_id, frame_id = frame.identifier(), "evaluation sent");
        Evaluation::pending(receiver)
    }

    /// True while the main frame has a live script context.
    #[must_use]
    pub fn is_main_frame_context_initialized(&self) -> bool {
        self.main_frame_context.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Fail every pending evaluation with `error`. Returns how many failed.
    pub fn fail_all(&self, error: EvaluationError) -> usize {
        let drained: Vec<PendingEvaluation> =
            self.lock_pending().drain().map(|(_, pending)| pending).collect();
        let count = drained.len();
        for pending in drained {
            let _ = pending.reply.send(Err(error.clone()));
        }
        if count > 0 {
            tracing::debug!(target: "osr.js", count, error = %error, "failed pending evaluations");
        }
        count
    }

    pub fn context_created(&self) -> &Subscribers<JavascriptContextEvent> {
        &self.context_created
    }

    pub fn context_released(&self) -> &Subscribers<JavascriptContextEvent> {
        &self.context_released
    }

    pub fn uncaught_exception(&self) -> &Subscribers<JavascriptUncaughtExceptionEvent> {
        &self.uncaught_exception
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, PendingEvaluation>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_evaluation_response(&self, received: &MessageReceived) {
        let response: EvaluationResponse = match received.message.decode() {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(target: "osr.js", error = %err, "malformed evaluation response");
                return;
            }
        };

        let Some(pending) = self.lock_pending().remove(&response.task_id) else {
            tracing::debug!(target: "osr.js", task_id = response.task_id, "response for unknown task");
            return;
        };

        let elapsed_us = pending.started.elapsed().as_micros() as u64;
        tracing::debug!(
            target: "osr.js",
            task_id = response.task_id,
            success = response.success,
            elapsed_us,
            "evaluation completed"
        );

        let outcome = if response.success {
            Ok(response.result)
        } else {
            Err(EvaluationError::Script {
                message: response.exception.unwrap_or_default(),
            })
        };
        let _ = pending.reply.send(outcome);
    }

    fn on_context_created(&self, received: &MessageReceived) {
        if received.frame.is_main() {
            self.main_frame_context.store(true, Ordering::Release);
        }
        tracing::debug!(target: "osr.js", frame_id = received.frame.identifier(), "context created");
        self.context_created.notify(&JavascriptContextEvent {
            frame: Arc::clone(&received.frame),
        });
    }

    fn on_context_released(&self, received: &MessageReceived) {
        let frame_id = received.frame.identifier();
        if received.frame.is_main() {
            self.main_frame_context.store(false, Ordering::Release);
        }

        let invalidated: Vec<PendingEvaluation> = {
            let mut pending = self.lock_pending();
            let ids: Vec<u64> = pending
                .iter()
                .filter(|(_, p)| p.frame_id == frame_id)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter().filter_map(|id| pending.remove(&id)).collect()
        };
        for pending in invalidated {
            let _ = pending
                .reply
                .send(Err(EvaluationError::FrameInvalidated { frame_id }));
        }

        tracing::debug!(target: "osr.js", frame_id, "context released");
        self.context_released.notify(&JavascriptContextEvent {
            frame: Arc::clone(&received.frame),
        });
    }

    fn on_uncaught_exception(&self, received: &MessageReceived) {
        let details: UncaughtExceptionDetails = match received.message.decode() {
            Ok(details) => details,
            Err(err) => {
                tracing::warn!(target: "osr.js", error = %err, "malformed uncaught exception");
                return;
            }
        };
        self.uncaught_exception.notify(&JavascriptUncaughtExceptionEvent {
            frame: Arc::clone(&received.frame),
            details,
        });
    }
}

impl Drop for JavascriptExecutionEngine {
    fn drop(&mut self) {
        let ids = mem::take(self.handler_ids.get_mut().unwrap_or_else(|e| e.into_inner()));
        for id in ids {
            self.dispatcher.unregister_handler(id);
        }
        self.fail_all(EvaluationError::Abandoned);
    }
}

enum EvaluationState {
    Default,
    Failed(EvaluationError),
    Pending(oneshot::Receiver<EvaluationResult>),
    Done,
}

/// Deferred result of a script evaluation.
///
/// Resolves to `T::default()` when the script produced `null`/`undefined` or
/// the target was invalid.
#[must_use = "an evaluation does nothing unless awaited"]
pub struct Evaluation<T> {
    state: EvaluationState,
    _result: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Evaluation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            EvaluationState::Default => "default",
            EvaluationState::Failed(_) => "failed",
            EvaluationState::Pending(_) => "pending",
            EvaluationState::Done => "done",
        };
        f.debug_struct("Evaluation").field("state", &state).finish()
    }
}

impl<T> Evaluation<T> {
    /// An evaluation that resolves to `T::default()` without touching the
    /// engine.
    pub fn ready_default() -> Self {
        Self::with_state(EvaluationState::Default)
    }

    /// An evaluation that resolves to `error`.
    pub fn failed(error: EvaluationError) -> Self {
        Self::with_state(EvaluationState::Failed(error))
    }

    fn pending(receiver: oneshot::Receiver<EvaluationResult>) -> Self {
        Self::with_state(EvaluationState::Pending(receiver))
    }

    fn with_state(state: EvaluationState) -> Self {
        Self {
            state,
            _result: PhantomData,
        }
    }

    /// True if the result depends on a renderer response.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, EvaluationState::Pending(_))
    }
}

fn decode_result<T: DeserializeOwned + Default>(value: Value) -> Result<T, EvaluationError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| EvaluationError::Decode(e.to_string()))
}

impl<T: DeserializeOwned + Default> Future for Evaluation<T> {
    type Output = Result<T, EvaluationError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let EvaluationState::Pending(receiver) = &mut this.state {
            let received = match Pin::new(receiver).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(received) => received,
            };
            this.state = EvaluationState::Done;
            return Poll::Ready(match received {
                Ok(Ok(value)) => decode_result(value),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(EvaluationError::Abandoned),
            });
        }

        match mem::replace(&mut this.state, EvaluationState::Done) {
            EvaluationState::Default => Poll::Ready(Ok(T::default())),
            EvaluationState::Failed(err) => Poll::Ready(Err(err)),
            EvaluationState::Done | EvaluationState::Pending(_) => {
                panic!("`Evaluation` polled after completion")
            }
        }
    }
}
