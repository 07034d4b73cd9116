#![forbid(unsafe_code)]

//! The browser-host adapter.
//!
//! [`BrowserAdapter`] owns one browser instance for one host control. It is
//! driven from two sides:
//!
//! - **Host side**: the embedding calls [`BrowserAdapter::create_or_update_browser`]
//!   whenever the control is laid out, and the control delivers input through
//!   the adapter's [`HostEventSink`].
//! - **Engine side**: the engine raises callbacks on its own threads through
//!   the adapter's [`EngineClient`].
//!
//! # Threading
//!
//! Browser and host handles live in [`ArcSwapOption`] slots: written once on
//! browser creation and cleared once on teardown, read lock-free by every
//! callback. The pending start URL sits behind a mutex that also serializes
//! navigation against the browser-created callback, so a navigation issued
//! while the browser is being created is never lost.
//!
//! Host mutations (popup open/close/move, cursor, tooltip) are posted to the
//! [`UiDispatcher`]. Nothing here blocks on the engine.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use arc_swap::ArcSwapOption;
use osr_backend::{HostControl, HostEventSink, PaintSurface, PopupHost, UiDispatcher};
use osr_core::event::EventInterest;
use osr_core::geometry::Point;
use osr_core::observer::Subscription;
use osr_engine::{
    Browser, BrowserHost, BrowserSettings, CreateBrowserRequest, Engine, EngineClient,
    Evaluation, EvaluationError, Frame, HandlerId, JavascriptExecutionEngine, MessageDispatcher,
    MessageKind, MessageReceived, MethodCallInterceptor, NativeObject,
    NativeObjectMethodDispatcher, NativeObjectRegistry, UnhandledExceptionDetails, WindowInfo,
};
use serde::de::DeserializeOwned;

use crate::client::AdapterClient;
use crate::error::{AdapterError, RemoteException};
use crate::events::{AdapterEvents, InitializedEvent, UnhandledExceptionEvent};
use crate::fail_soft;
use crate::input::InputRouter;
use crate::lifecycle::{AdapterState, Lifecycle};
use crate::render::PopupCoordinator;
use crate::settings::AdapterSettings;
use crate::view_rect::ViewRectOverride;

const BLANK_URL: &str = "about:blank";
const DEV_TOOLS_TITLE: &str = "DevTools";
const REMOTE_EXCEPTION_SCOPE: &str = "on_browser_process_unhandled_exception";

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// The collaborators an adapter is built from.
#[derive(Clone)]
pub struct AdapterParts {
    /// The main view control.
    pub control: Arc<dyn HostControl>,
    /// The popup window used for select boxes and similar.
    pub popup: Arc<dyn PopupHost>,
    pub engine: Arc<dyn Engine>,
    /// Marshals host mutations onto the UI thread.
    pub ui: Arc<dyn UiDispatcher>,
}

impl fmt::Debug for AdapterParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterParts").finish_non_exhaustive()
    }
}

struct BrowserSlot(Arc<dyn Browser>);
struct HostSlot(Arc<dyn BrowserHost>);

pub(crate) struct AdapterInner {
    weak_self: Weak<AdapterInner>,
    pub(crate) name: String,
    settings: AdapterSettings,

    pub(crate) control: Arc<dyn HostControl>,
    pub(crate) popup: Arc<dyn PopupHost>,
    engine: Arc<dyn Engine>,
    pub(crate) ui: Arc<dyn UiDispatcher>,
    pub(crate) main_surface: Arc<dyn PaintSurface>,
    pub(crate) popup_surface: Arc<dyn PaintSurface>,

    lifecycle: Lifecycle,
    disposed: AtomicBool,
    /// Pending start URL. Also the navigation lock.
    start_url: Mutex<Option<String>>,
    /// URL sent with the create-browser command.
    requested_url: Mutex<Option<String>>,
    pub(crate) title: Mutex<Option<String>>,
    pub(crate) tooltip: Mutex<Option<String>>,

    browser: ArcSwapOption<BrowserSlot>,
    host: ArcSwapOption<HostSlot>,

    pub(crate) dispatcher: Arc<MessageDispatcher>,
    javascript: ArcSwapOption<JavascriptExecutionEngine>,
    javascript_forwarding: Mutex<Vec<Subscription>>,
    objects: Arc<NativeObjectRegistry>,
    method_dispatcher: Mutex<Option<NativeObjectMethodDispatcher>>,
    remote_exception_handler: Mutex<Option<HandlerId>>,

    client: Mutex<Option<Arc<AdapterClient>>>,
    router: Arc<InputRouter>,
    pub(crate) view_rect: ViewRectOverride,
    pub(crate) popup_state: PopupCoordinator,
    pub(crate) events: AdapterEvents,
}

impl AdapterInner {
    pub(crate) fn weak(&self) -> Weak<AdapterInner> {
        self.weak_self.clone()
    }

    pub(crate) fn browser(&self) -> Option<Arc<dyn Browser>> {
        self.browser.load_full().map(|slot| Arc::clone(&slot.0))
    }

    pub(crate) fn host(&self) -> Option<Arc<dyn BrowserHost>> {
        self.host.load_full().map(|slot| Arc::clone(&slot.0))
    }

    fn javascript(&self) -> Option<Arc<JavascriptExecutionEngine>> {
        self.javascript.load_full()
    }

    fn sink(&self) -> Weak<dyn HostEventSink> {
        let router: Weak<InputRouter> = Arc::downgrade(&self.router);
        router
    }

    // --- fail-soft plumbing ---

    /// Run `f` in a fail-soft scope. Errors and panics are logged and raised
    /// as an unhandled exception; `None` is returned in their place.
    pub(crate) fn with_error_handling<T>(
        &self,
        scope: &'static str,
        f: impl FnOnce() -> Result<T, AdapterError>,
    ) -> Option<T> {
        match fail_soft::run(f) {
            Ok(value) => Some(value),
            Err(err) => {
                self.handle_exception(scope, err);
                None
            }
        }
    }

    pub(crate) fn handle_exception(&self, scope: &'static str, error: AdapterError) {
        tracing::error!(
            target: "osr.adapter",
            adapter = %self.name,
            scope,
            error = %error,
            "caught exception"
        );
        self.events.unhandled_exception.notify(&UnhandledExceptionEvent {
            scope,
            error: Arc::new(error),
        });
    }

    /// Queue `task` on the UI thread, inside a fail-soft scope. Dropped
    /// silently if the adapter is gone by the time it runs.
    pub(crate) fn post_to_ui(
        &self,
        scope: &'static str,
        task: impl FnOnce(&AdapterInner) -> Result<(), AdapterError> + Send + 'static,
    ) {
        let weak = self.weak();
        self.ui.post(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.with_error_handling(scope, || task(&inner));
            }
        }));
    }

    // --- lifecycle ---

    fn create_or_update_browser(&self, width: i32, height: i32) -> Result<(), AdapterError> {
        tracing::debug!(
            target: "osr.adapter",
            adapter = %self.name,
            old_width = self.main_surface.width(),
            old_height = self.main_surface.height(),
            width,
            height,
            "browser resize"
        );
        if width <= 0 || height <= 0 {
            return Ok(());
        }
        match self.lifecycle.get() {
            AdapterState::Uninitialized => self.create_browser(width, height),
            AdapterState::Created | AdapterState::Active => self.resize(width, height),
            AdapterState::Destroying | AdapterState::Destroyed => Ok(()),
        }
    }

    fn create_browser(&self, width: i32, height: i32) -> Result<(), AdapterError> {
        let Some(parent) = self.control.host_window_handle() else {
            tracing::debug!(
                target: "osr.adapter",
                adapter = %self.name,
                "host window handle not available; browser creation deferred"
            );
            return Ok(());
        };
        if !self
            .lifecycle
            .transition(AdapterState::Uninitialized, AdapterState::Created)
        {
            // Lost a race with another creator.
            return match self.lifecycle.get() {
                AdapterState::Created | AdapterState::Active => self.resize(width, height),
                _ => Ok(()),
            };
        }

        let _span = tracing::debug_span!(
            target: "osr.adapter",
            "create_browser",
            adapter = %self.name,
            width,
            height
        )
        .entered();

        let sink = self.sink();
        self.control.attach(EventInterest::INPUT, sink.clone());
        self.popup.attach(EventInterest::INPUT, sink);

        self.main_surface.resize(width, height);

        let client = Arc::new(AdapterClient::new(self.weak()));
        *lock(&self.client) = Some(Arc::clone(&client));
        self.register_remote_exception_handler();

        let url = match lock(&self.start_url).as_deref() {
            Some(url) if !url.is_empty() => url.to_owned(),
            _ => BLANK_URL.to_owned(),
        };
        *lock(&self.requested_url) = Some(url.clone());

        let request = CreateBrowserRequest {
            window: WindowInfo::windowless(parent, self.settings.allows_transparency),
            settings: self.settings.browser.clone(),
            url,
        };
        tracing::debug!(target: "osr.adapter", url = %request.url, "requesting browser");
        self.engine.create_browser(request, client)?;
        Ok(())
    }

    fn resize(&self, width: i32, height: i32) -> Result<(), AdapterError> {
        if self.main_surface.width() == width && self.main_surface.height() == height {
            return Ok(());
        }
        self.main_surface.resize(width, height);
        if let Some(host) = self.host() {
            host.was_resized()?;
        }
        Ok(())
    }

    fn register_remote_exception_handler(&self) {
        let weak = self.weak();
        let id = self
            .dispatcher
            .register_handler(MessageKind::UnhandledException, move |received| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_browser_process_unhandled_exception(received);
                }
            });
        if let Some(previous) = lock(&self.remote_exception_handler).replace(id) {
            self.dispatcher.unregister_handler(previous);
        }
    }

    fn on_browser_process_unhandled_exception(&self, received: &MessageReceived) {
        let details: UnhandledExceptionDetails = match received.message.decode() {
            Ok(details) => details,
            Err(err) => {
                self.handle_exception(REMOTE_EXCEPTION_SCOPE, err.into());
                return;
            }
        };
        tracing::error!(
            target: "osr.adapter",
            adapter = %self.name,
            exception_type = %details.exception_type,
            exception_message = %details.message,
            stack_trace = %details.stack_trace,
            "browser process raised an unhandled exception"
        );
        let error = AdapterError::RemoteProcess(RemoteException {
            exception_type: details.exception_type,
            message: details.message,
            stack_trace: details.stack_trace,
        });
        self.events.unhandled_exception.notify(&UnhandledExceptionEvent {
            scope: REMOTE_EXCEPTION_SCOPE,
            error: Arc::new(error),
        });
    }

    pub(crate) fn on_browser_created(&self, browser: Arc<dyn Browser>) {
        if !self
            .lifecycle
            .transition(AdapterState::Created, AdapterState::Active)
        {
            let already_adopted = self
                .browser()
                .is_some_and(|current| current.identifier() == browser.identifier());
            if already_adopted {
                tracing::debug!(
                    target: "osr.adapter",
                    adapter = %self.name,
                    "duplicate browser-created callback ignored"
                );
            } else {
                tracing::debug!(
                    target: "osr.adapter",
                    adapter = %self.name,
                    state = ?self.lifecycle.get(),
                    browser_id = browser.identifier(),
                    "browser not adopted; closing it"
                );
                self.with_error_handling("on_browser_created", || {
                    Ok(browser.host().close_browser(true)?)
                });
            }
            return;
        }

        let adopted = self.with_error_handling("on_browser_created", || {
            let javascript = JavascriptExecutionEngine::new(Arc::clone(&self.dispatcher));
            self.forward_javascript_events(&javascript);
            self.javascript.store(Some(javascript));

            self.objects.set_browser(Arc::clone(&browser));
            *lock(&self.method_dispatcher) = Some(NativeObjectMethodDispatcher::new(
                Arc::clone(&self.dispatcher),
                Arc::clone(&self.objects),
            ));

            let host = browser.host();
            let replay = {
                let mut start_url = lock(&self.start_url);
                self.host.store(Some(Arc::new(HostSlot(Arc::clone(&host)))));
                self.browser
                    .store(Some(Arc::new(BrowserSlot(Arc::clone(&browser)))));
                let requested = lock(&self.requested_url).take();
                start_url.take().filter(|url| requested.as_ref() != Some(url))
            };

            Ok((host, replay))
        });
        let Some((host, replay)) = adopted else {
            return;
        };

        // Resize and replay fail independently of each other.
        if self.main_surface.width() > 0 && self.main_surface.height() > 0 {
            self.with_error_handling("on_browser_created", || Ok(host.was_resized()?));
        }
        if let Some(url) = replay {
            tracing::debug!(
                target: "osr.adapter",
                adapter = %self.name,
                url = %url,
                "replaying navigation issued during creation"
            );
            self.with_error_handling("on_browser_created", || {
                Ok(browser.main_frame().load_url(&url)?)
            });
        }

        if self.browser().is_none() {
            return;
        }
        tracing::debug!(
            target: "osr.adapter",
            adapter = %self.name,
            browser_id = browser.identifier(),
            "browser created"
        );
        self.events.initialized.notify(&InitializedEvent);
    }

    fn forward_javascript_events(&self, javascript: &JavascriptExecutionEngine) {
        let created = {
            let weak = self.weak();
            javascript.context_created().subscribe(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.events.javascript_context_created.notify(event);
                }
            })
        };
        let released = {
            let weak = self.weak();
            javascript.context_released().subscribe(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.events.javascript_context_released.notify(event);
                }
            })
        };
        let uncaught = {
            let weak = self.weak();
            javascript.uncaught_exception().subscribe(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.events.javascript_uncaught_exception.notify(event);
                }
            })
        };
        *lock(&self.javascript_forwarding) = vec![created, released, uncaught];
    }

    pub(crate) fn on_browser_destroyed(&self, browser: &Arc<dyn Browser>) {
        tracing::debug!(
            target: "osr.adapter",
            adapter = %self.name,
            browser_id = browser.identifier(),
            "browser destroyed"
        );
        self.release_browser_bindings();
        self.host.store(None);
        self.browser.store(None);
        self.lifecycle.transition(AdapterState::Active, AdapterState::Destroyed);
    }

    /// Stop the method dispatcher, fail in-flight evaluations and unbind the
    /// object registry.
    fn release_browser_bindings(&self) {
        let method_dispatcher = lock(&self.method_dispatcher).take();
        if let Some(method_dispatcher) = method_dispatcher {
            method_dispatcher.dispose();
        }
        if let Some(javascript) = self.javascript.swap(None) {
            let failed = javascript.fail_all(EvaluationError::BrowserDestroyed);
            if failed > 0 {
                tracing::debug!(
                    target: "osr.js",
                    adapter = %self.name,
                    failed,
                    "failed pending evaluations"
                );
            }
        }
        lock(&self.javascript_forwarding).clear();
        self.objects.clear_browser();
    }

    /// Single teardown path for both [`BrowserAdapter::dispose`] and drop.
    ///
    /// Only the explicit path asks the engine to close the browser and
    /// releases the paint surfaces.
    fn teardown(&self, explicit: bool) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lifecycle.set(AdapterState::Destroying);
        tracing::debug!(target: "osr.adapter", adapter = %self.name, explicit, "tearing down");

        if let Some(host) = self.host.swap(None)
            && explicit
        {
            self.with_error_handling("dispose", || Ok(host.0.close_browser(false)?));
        }
        self.browser.store(None);

        self.release_browser_bindings();
        let handler = lock(&self.remote_exception_handler).take();
        if let Some(handler) = handler {
            self.dispatcher.unregister_handler(handler);
        }

        if explicit {
            self.main_surface.release();
            self.popup_surface.release();
        }
        self.lifecycle.set(AdapterState::Destroyed);
    }

    // --- navigation ---

    fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        let url = url.trim_start();
        let frame = {
            let mut start_url = lock(&self.start_url);
            match (self.browser(), self.lifecycle.get()) {
                (Some(browser), _) => browser.main_frame(),
                (None, state) if state.is_terminal() => {
                    tracing::trace!(
                        target: "osr.adapter",
                        url,
                        ?state,
                        "no browser; navigation dropped"
                    );
                    return Ok(());
                }
                (None, _) => {
                    tracing::trace!(target: "osr.adapter", url, "buffering start url");
                    *start_url = Some(url.to_owned());
                    return Ok(());
                }
            }
        };
        tracing::trace!(target: "osr.adapter", url, "navigate");
        frame.load_url(url)?;
        Ok(())
    }

    fn address(&self) -> String {
        if let Some(browser) = self.browser() {
            return browser.main_frame().url();
        }
        lock(&self.start_url).clone().unwrap_or_default()
    }
}

impl Drop for AdapterInner {
    fn drop(&mut self) {
        self.teardown(false);
    }
}

/// Hosts one off-screen browser inside one host control.
///
/// Dropping the adapter tears it down without asking the engine to close the
/// browser; call [`BrowserAdapter::dispose`] for an orderly close.
pub struct BrowserAdapter {
    inner: Arc<AdapterInner>,
}

impl fmt::Debug for BrowserAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserAdapter")
            .field("name", &self.inner.name)
            .field("state", &self.inner.lifecycle.get())
            .finish_non_exhaustive()
    }
}

impl BrowserAdapter {
    /// Build an adapter. Nothing is requested from the engine until the first
    /// [`Self::create_or_update_browser`] with a positive size.
    #[must_use]
    pub fn new(parts: AdapterParts, settings: AdapterSettings) -> Self {
        let AdapterParts {
            control,
            popup,
            engine,
            ui,
        } = parts;
        let main_surface = control.render_surface();
        let popup_surface = popup.render_surface();
        let start_url = settings.start_url.clone();

        let inner = Arc::new_cyclic(|weak_self: &Weak<AdapterInner>| AdapterInner {
            weak_self: weak_self.clone(),
            name: settings.name.clone(),
            settings,
            control,
            popup,
            engine,
            ui,
            main_surface,
            popup_surface,
            lifecycle: Lifecycle::new(),
            disposed: AtomicBool::new(false),
            start_url: Mutex::new(Some(start_url)),
            requested_url: Mutex::new(None),
            title: Mutex::new(None),
            tooltip: Mutex::new(None),
            browser: ArcSwapOption::empty(),
            host: ArcSwapOption::empty(),
            dispatcher: Arc::new(MessageDispatcher::new()),
            javascript: ArcSwapOption::empty(),
            javascript_forwarding: Mutex::new(Vec::new()),
            objects: Arc::new(NativeObjectRegistry::new()),
            method_dispatcher: Mutex::new(None),
            remote_exception_handler: Mutex::new(None),
            client: Mutex::new(None),
            router: Arc::new(InputRouter::new(weak_self.clone())),
            view_rect: ViewRectOverride::new(),
            popup_state: PopupCoordinator::default(),
            events: AdapterEvents::default(),
        });

        inner.control.attach(EventInterest::LIFECYCLE, inner.sink());
        tracing::debug!(target: "osr.adapter", adapter = %inner.name, "adapter constructed");
        Self { inner }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn settings(&self) -> &AdapterSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn state(&self) -> AdapterState {
        self.inner.lifecycle.get()
    }

    #[must_use]
    pub fn events(&self) -> &AdapterEvents {
        &self.inner.events
    }

    /// The browser handle, once the engine has delivered it.
    #[must_use]
    pub fn browser(&self) -> Option<Arc<dyn Browser>> {
        self.inner.browser()
    }

    /// The callback surface handed to the engine. `None` before creation.
    #[must_use]
    pub fn engine_client(&self) -> Option<Arc<dyn EngineClient>> {
        lock(&self.inner.client)
            .as_ref()
            .map(|client| Arc::clone(client) as Arc<dyn EngineClient>)
    }

    /// Create the browser on the first call with a positive size and a
    /// resolvable host window; afterwards, resize it.
    ///
    /// Non-positive sizes and calls after teardown are no-ops.
    pub fn create_or_update_browser(&self, width: i32, height: i32) -> Result<(), AdapterError> {
        self.inner.create_or_update_browser(width, height)
    }

    /// True once the browser handle has arrived.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.browser().is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.browser().is_some_and(|b| b.is_loading())
    }

    /// True while the main frame has a live script context.
    #[must_use]
    pub fn is_javascript_engine_initialized(&self) -> bool {
        self.inner
            .javascript()
            .is_some_and(|js| js.is_main_frame_context_initialized())
    }

    /// Last title reported by the engine.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        lock(&self.inner.title).clone()
    }

    // --- navigation ---

    /// Load `url` in the main frame. Before the browser exists the URL is
    /// kept as the start URL instead (last write wins). Once the browser is
    /// gone the call does nothing.
    pub fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.inner.navigate(url)
    }

    /// Alias of [`Self::navigate`].
    pub fn set_address(&self, url: &str) -> Result<(), AdapterError> {
        self.inner.navigate(url)
    }

    /// Main-frame URL once active, otherwise the pending start URL.
    #[must_use]
    pub fn address(&self) -> String {
        self.inner.address()
    }

    /// Load `content` as the document for `url`.
    pub fn load_string(&self, content: &str, url: &str) -> Result<(), AdapterError> {
        if let Some(browser) = self.inner.browser() {
            browser.main_frame().load_string(content, url.trim_start())?;
        }
        Ok(())
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.inner.browser().is_some_and(|b| b.can_go_back())
    }

    pub fn go_back(&self) -> Result<(), AdapterError> {
        if let Some(browser) = self.inner.browser() {
            browser.go_back()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.inner.browser().is_some_and(|b| b.can_go_forward())
    }

    pub fn go_forward(&self) -> Result<(), AdapterError> {
        if let Some(browser) = self.inner.browser() {
            browser.go_forward()?;
        }
        Ok(())
    }

    pub fn reload(&self, ignore_cache: bool) -> Result<(), AdapterError> {
        if let Some(browser) = self.inner.browser() {
            if ignore_cache {
                browser.reload_ignore_cache()?;
            } else {
                browser.reload()?;
            }
        }
        Ok(())
    }

    // --- script ---

    /// Run `code` in the main frame without waiting for a result.
    pub fn execute_javascript(&self, code: &str, url: &str, line: i32) -> Result<(), AdapterError> {
        if let Some(browser) = self.inner.browser() {
            browser.main_frame().execute_javascript(code, url, line)?;
        }
        Ok(())
    }

    /// Evaluate `code` in the named frame (the main frame for `None`).
    ///
    /// Resolves to `T::default()` at once if there is no browser or no such
    /// frame.
    pub fn evaluate_javascript<T>(
        &self,
        code: &str,
        url: &str,
        line: i32,
        frame_name: Option<&str>,
    ) -> Evaluation<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(browser) = self.inner.browser() else {
            return Evaluation::ready_default();
        };
        let frame = match frame_name {
            Some(name) => browser.frame(name),
            None => Some(browser.main_frame()),
        };
        match frame {
            Some(frame) => self.evaluate_javascript_in_frame(code, url, line, &frame),
            None => Evaluation::ready_default(),
        }
    }

    /// Evaluate `code` in `frame`. An invalid frame resolves to
    /// `T::default()` at once.
    pub fn evaluate_javascript_in_frame<T>(
        &self,
        code: &str,
        url: &str,
        line: i32,
        frame: &Arc<dyn Frame>,
    ) -> Evaluation<T>
    where
        T: DeserializeOwned + Default,
    {
        if !frame.is_valid() {
            return Evaluation::ready_default();
        }
        match self.inner.javascript() {
            Some(javascript) => javascript.evaluate(code, url, line, frame),
            None => Evaluation::ready_default(),
        }
    }

    // --- native objects ---

    /// Expose `object` to page script under `name`.
    pub fn register_javascript_object(
        &self,
        name: &str,
        object: Arc<dyn NativeObject>,
        interceptor: Option<MethodCallInterceptor>,
    ) -> Result<(), AdapterError> {
        self.inner.objects.register(name, object, interceptor)?;
        Ok(())
    }

    /// Returns false if nothing was registered under `name`.
    pub fn unregister_javascript_object(&self, name: &str) -> bool {
        self.inner.objects.unregister(name)
    }

    #[must_use]
    pub fn is_javascript_object_registered(&self, name: &str) -> bool {
        self.inner.objects.contains(name)
    }

    // --- developer tools and zoom ---

    /// Open the developer tools in a popup owned by the browser window.
    pub fn show_developer_tools(&self) -> Result<(), AdapterError> {
        if let Some(host) = self.inner.host() {
            let window = WindowInfo::popup(host.window_handle(), DEV_TOOLS_TITLE);
            host.show_dev_tools(&window, &BrowserSettings::default(), Point::new(0, 0))?;
        }
        Ok(())
    }

    pub fn close_developer_tools(&self) -> Result<(), AdapterError> {
        if let Some(host) = self.inner.host() {
            host.close_dev_tools()?;
        }
        Ok(())
    }

    /// Current zoom level; 0.0 (the engine default) without a browser.
    #[must_use]
    pub fn zoom_level(&self) -> f64 {
        self.inner.host().map_or(0.0, |host| host.zoom_level())
    }

    pub fn set_zoom_level(&self, level: f64) -> Result<(), AdapterError> {
        if let Some(host) = self.inner.host() {
            host.set_zoom_level(level)?;
        }
        Ok(())
    }

    /// Close the browser and release both paint surfaces. Idempotent.
    pub fn dispose(&self) {
        self.inner.teardown(true);
    }
}
