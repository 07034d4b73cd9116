#![forbid(unsafe_code)]

//! Native objects exposed to page script.
//!
//! The [`NativeObjectRegistry`] owns the name → object table and keeps the
//! renderer informed: every registration, removal and browser (re)binding is
//! announced to the bound browser's main frame. The
//! [`NativeObjectMethodDispatcher`] answers renderer method calls against the
//! registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::browser::Browser;
use crate::dispatcher::{HandlerId, MessageDispatcher, MessageReceived};
use crate::error::{ObjectCallError, RegistryError};
use crate::message::{
    MessageKind, MethodCall, MethodCallResult, ObjectRegistration, ObjectUnregistration,
    ProcessMessage,
};

/// An object whose methods page script may call.
pub trait NativeObject: Send + Sync {
    /// Method names visible to script.
    fn method_names(&self) -> Vec<String>;

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ObjectCallError>;
}

/// Wraps every method call on one object. Receives the call as a closure and
/// decides whether, where and how to run it.
pub type MethodCallInterceptor = Arc<
    dyn Fn(&dyn Fn() -> Result<Value, ObjectCallError>) -> Result<Value, ObjectCallError>
        + Send
        + Sync,
>;

/// A registry entry.
#[derive(Clone)]
pub struct RegisteredObject {
    pub name: String,
    pub object: Arc<dyn NativeObject>,
    pub interceptor: Option<MethodCallInterceptor>,
}

impl fmt::Debug for RegisteredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredObject")
            .field("name", &self.name)
            .field("methods", &self.object.method_names())
            .field("intercepted", &self.interceptor.is_some())
            .finish()
    }
}

impl RegisteredObject {
    /// Invoke `method`, through the interceptor if one is set.
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, ObjectCallError> {
        if !self.object.method_names().iter().any(|m| m == method) {
            return Err(ObjectCallError::UnknownMethod {
                object: self.name.clone(),
                method: method.to_owned(),
            });
        }
        let call = || self.object.call(method, args);
        match &self.interceptor {
            Some(interceptor) => interceptor(&call),
            None => call(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    objects: BTreeMap<String, RegisteredObject>,
    browser: Option<Arc<dyn Browser>>,
}

/// Name → native object table, re-bindable across browsers.
#[derive(Default)]
pub struct NativeObjectRegistry {
    state: Mutex<RegistryState>,
}

impl fmt::Debug for NativeObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("NativeObjectRegistry")
            .field("names", &state.objects.keys().collect::<Vec<_>>())
            .field("bound", &state.browser.is_some())
            .finish()
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl NativeObjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `object` under `name` (a script identifier).
    ///
    /// Announced to the renderer immediately if a browser is bound.
    pub fn register(
        &self,
        name: impl Into<String>,
        object: Arc<dyn NativeObject>,
        interceptor: Option<MethodCallInterceptor>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if !valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        let (entry, browser) = {
            let mut state = self.lock();
            if state.objects.contains_key(&name) {
                return Err(RegistryError::AlreadyRegistered(name));
            }
            let entry = RegisteredObject {
                name: name.clone(),
                object,
                interceptor,
            };
            state.objects.insert(name, entry.clone());
            (entry, state.browser.clone())
        };
        tracing::debug!(target: "osr.objects", name = %entry.name, "object registered");
        if let Some(browser) = browser {
            announce_registered(browser.as_ref(), &entry);
        }
        Ok(())
    }

    /// Remove `name`. Returns false if it was not registered.
    pub fn unregister(&self, name: &str) -> bool {
        let (removed, browser) = {
            let mut state = self.lock();
            (state.objects.remove(name).is_some(), state.browser.clone())
        };
        if !removed {
            return false;
        }
        tracing::debug!(target: "osr.objects", name, "object unregistered");
        if let Some(browser) = browser {
            let message = ProcessMessage::new(
                MessageKind::ObjectUnregistered,
                &ObjectUnregistration {
                    name: name.to_owned(),
                },
            );
            if let Err(err) = message.and_then(|m| browser.main_frame().send_process_message(m)) {
                tracing::warn!(target: "osr.objects", name, error = %err, "removal not announced");
            }
        }
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<RegisteredObject> {
        self.lock().objects.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().objects.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind to `browser` and announce every registered object to it.
    pub fn set_browser(&self, browser: Arc<dyn Browser>) {
        let entries: Vec<RegisteredObject> = {
            let mut state = self.lock();
            state.browser = Some(Arc::clone(&browser));
            state.objects.values().cloned().collect()
        };
        tracing::debug!(target: "osr.objects", count = entries.len(), "registry bound to browser");
        for entry in &entries {
            announce_registered(browser.as_ref(), entry);
        }
    }

    /// Forget the bound browser. Registered objects are kept.
    pub fn clear_browser(&self) {
        self.lock().browser = None;
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.lock().browser.is_some()
    }
}

fn announce_registered(browser: &dyn Browser, entry: &RegisteredObject) {
    let message = ProcessMessage::new(
        MessageKind::ObjectRegistered,
        &ObjectRegistration {
            name: entry.name.clone(),
            methods: entry.object.method_names(),
        },
    );
    if let Err(err) = message.and_then(|m| browser.main_frame().send_process_message(m)) {
        tracing::warn!(target: "osr.objects", name = %entry.name, error = %err, "registration not announced");
    }
}

/// Answers renderer method calls against a [`NativeObjectRegistry`].
pub struct NativeObjectMethodDispatcher {
    dispatcher: Arc<MessageDispatcher>,
    handler: Mutex<Option<HandlerId>>,
}

impl fmt::Debug for NativeObjectMethodDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObjectMethodDispatcher")
            .field("active", &self.is_active())
            .finish()
    }
}

impl NativeObjectMethodDispatcher {
    /// Start answering [`MessageKind::MethodCall`] messages.
    #[must_use]
    pub fn new(dispatcher: Arc<MessageDispatcher>, registry: Arc<NativeObjectRegistry>) -> Self {
        let id = dispatcher.register_handler(MessageKind::MethodCall, move |received| {
            handle_method_call(&registry, received);
        });
        Self {
            dispatcher,
            handler: Mutex::new(Some(id)),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Stop answering calls. Idempotent.
    pub fn dispose(&self) {
        let id = self.handler.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(id) = id {
            self.dispatcher.unregister_handler(id);
            tracing::debug!(target: "osr.objects", "method dispatcher stopped");
        }
    }
}

impl Drop for NativeObjectMethodDispatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn handle_method_call(registry: &NativeObjectRegistry, received: &MessageReceived) {
    let call: MethodCall = match received.message.decode() {
        Ok(call) => call,
        Err(err) => {
            tracing::warn!(target: "osr.objects", error = %err, "malformed method call");
            return;
        }
    };

    let outcome = match registry.get(&call.object_name) {
        Some(entry) => entry.invoke(&call.method, &call.args),
        None => Err(ObjectCallError::UnknownObject(call.object_name.clone())),
    };
    tracing::trace!(
        target: "osr.objects",
        call_id = call.call_id,
        object = %call.object_name,
        method = %call.method,
        success = outcome.is_ok(),
        "method call handled"
    );

    let result = match outcome {
        Ok(value) => MethodCallResult {
            call_id: call.call_id,
            success: true,
            result: value,
            error: None,
        },
        Err(err) => MethodCallResult {
            call_id: call.call_id,
            success: false,
            result: Value::Null,
            error: Some(err.to_string()),
        },
    };
    let reply = ProcessMessage::new(MessageKind::MethodCallResult, &result);
    if let Err(err) = reply.and_then(|m| received.frame.send_process_message(m)) {
        tracing::warn!(target: "osr.objects", call_id = call.call_id, error = %err, "method result not delivered");
    }
}
