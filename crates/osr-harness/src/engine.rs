#![forbid(unsafe_code)]

//! Scripted engine, browser, browser host and frames.
//!
//! Nothing here talks to a real renderer. Commands are recorded; callbacks
//! are raised only when a test asks for them ([`FakeEngine::complete_creation`],
//! [`FakeEngine::destroy_browser`], or by calling the captured client).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use osr_core::event::{DragData, DragOperations, KeyEvent, MouseButton, MouseEvent};
use osr_core::geometry::Point;
use osr_core::handle::WindowHandle;
use osr_engine::{
    Browser, BrowserHost, BrowserId, BrowserSettings, CreateBrowserRequest, Engine, EngineClient,
    EngineError, Frame, FrameId, MessageKind, ProcessMessage, WindowInfo,
};

/// A command received by [`FakeBrowserHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    CloseBrowser {
        force: bool,
    },
    SetZoomLevel(f64),
    Focus(bool),
    MouseMove {
        event: MouseEvent,
        leave: bool,
    },
    MouseClick {
        event: MouseEvent,
        button: MouseButton,
        mouse_up: bool,
        click_count: i32,
    },
    MouseWheel {
        event: MouseEvent,
        delta_x: i32,
        delta_y: i32,
    },
    Key(KeyEvent),
    DragEnter {
        data: DragData,
        event: MouseEvent,
        operations: DragOperations,
    },
    DragOver {
        event: MouseEvent,
        operations: DragOperations,
    },
    DragLeave,
    Drop(MouseEvent),
    WasHidden(bool),
    WasResized,
    ScreenInfoChanged,
    ShowDevTools {
        window: WindowInfo,
        settings: BrowserSettings,
        inspect_at: Point,
    },
    CloseDevTools,
}

/// Recording [`BrowserHost`].
#[derive(Debug)]
pub struct FakeBrowserHost {
    window: Option<WindowHandle>,
    zoom: Mutex<f64>,
    commands: Mutex<Vec<HostCommand>>,
    failure: Mutex<Option<EngineError>>,
}

impl Default for FakeBrowserHost {
    fn default() -> Self {
        Self {
            window: Some(WindowHandle(100)),
            zoom: Mutex::new(0.0),
            commands: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }
}

impl FakeBrowserHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> Vec<HostCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Drain recorded commands.
    pub fn take_commands(&self) -> Vec<HostCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }

    /// How many recorded commands satisfy `pred`.
    pub fn count(&self, pred: impl Fn(&HostCommand) -> bool) -> usize {
        self.commands.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Make every following command fail with `failure` (after recording it).
    pub fn fail_commands_with(&self, failure: Option<EngineError>) {
        *self.failure.lock().unwrap() = failure;
    }

    fn record(&self, command: HostCommand) -> Result<(), EngineError> {
        self.commands.lock().unwrap().push(command);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl BrowserHost for FakeBrowserHost {
    fn close_browser(&self, force: bool) -> Result<(), EngineError> {
        self.record(HostCommand::CloseBrowser { force })
    }

    fn window_handle(&self) -> Option<WindowHandle> {
        self.window
    }

    fn zoom_level(&self) -> f64 {
        *self.zoom.lock().unwrap()
    }

    fn set_zoom_level(&self, level: f64) -> Result<(), EngineError> {
        self.record(HostCommand::SetZoomLevel(level))?;
        *self.zoom.lock().unwrap() = level;
        Ok(())
    }

    fn send_focus_event(&self, focused: bool) -> Result<(), EngineError> {
        self.record(HostCommand::Focus(focused))
    }

    fn send_mouse_move_event(
        &self,
        event: MouseEvent,
        mouse_leave: bool,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::MouseMove {
            event,
            leave: mouse_leave,
        })
    }

    fn send_mouse_click_event(
        &self,
        event: MouseEvent,
        button: MouseButton,
        mouse_up: bool,
        click_count: i32,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::MouseClick {
            event,
            button,
            mouse_up,
            click_count,
        })
    }

    fn send_mouse_wheel_event(
        &self,
        event: MouseEvent,
        delta_x: i32,
        delta_y: i32,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::MouseWheel {
            event,
            delta_x,
            delta_y,
        })
    }

    fn send_key_event(&self, event: KeyEvent) -> Result<(), EngineError> {
        self.record(HostCommand::Key(event))
    }

    fn drag_target_drag_enter(
        &self,
        data: &DragData,
        event: MouseEvent,
        operations: DragOperations,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::DragEnter {
            data: data.clone(),
            event,
            operations,
        })
    }

    fn drag_target_drag_over(
        &self,
        event: MouseEvent,
        operations: DragOperations,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::DragOver { event, operations })
    }

    fn drag_target_drag_leave(&self) -> Result<(), EngineError> {
        self.record(HostCommand::DragLeave)
    }

    fn drag_target_drop(&self, event: MouseEvent) -> Result<(), EngineError> {
        self.record(HostCommand::Drop(event))
    }

    fn was_hidden(&self, hidden: bool) -> Result<(), EngineError> {
        self.record(HostCommand::WasHidden(hidden))
    }

    fn was_resized(&self) -> Result<(), EngineError> {
        self.record(HostCommand::WasResized)
    }

    fn notify_screen_info_changed(&self) -> Result<(), EngineError> {
        self.record(HostCommand::ScreenInfoChanged)
    }

    fn show_dev_tools(
        &self,
        window: &WindowInfo,
        settings: &BrowserSettings,
        inspect_at: Point,
    ) -> Result<(), EngineError> {
        self.record(HostCommand::ShowDevTools {
            window: window.clone(),
            settings: settings.clone(),
            inspect_at,
        })
    }

    fn close_dev_tools(&self) -> Result<(), EngineError> {
        self.record(HostCommand::CloseDevTools)
    }
}

/// A load requested on a [`FakeFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLoad {
    Url(String),
    String { content: String, url: String },
}

/// Recording [`Frame`].
#[derive(Debug)]
pub struct FakeFrame {
    id: FrameId,
    name: String,
    main: bool,
    url: Mutex<String>,
    valid: AtomicBool,
    fail_sends: AtomicBool,
    fail_loads: AtomicBool,
    loads: Mutex<Vec<FrameLoad>>,
    scripts: Mutex<Vec<(String, String, i32)>>,
    sent: Mutex<Vec<ProcessMessage>>,
}

impl FakeFrame {
    #[must_use]
    pub fn new(id: FrameId, name: impl Into<String>, main: bool) -> Self {
        Self {
            id,
            name: name.into(),
            main,
            url: Mutex::new("about:blank".to_owned()),
            valid: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            loads: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.lock().unwrap() = url.into();
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make `load_url` fail after recording the load.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn loads(&self) -> Vec<FrameLoad> {
        self.loads.lock().unwrap().clone()
    }

    /// `(code, url, line)` of every executed script.
    #[must_use]
    pub fn scripts(&self) -> Vec<(String, String, i32)> {
        self.scripts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<ProcessMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent messages of one kind, in order.
    #[must_use]
    pub fn sent_of(&self, kind: MessageKind) -> Vec<ProcessMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }
}

impl Frame for FakeFrame {
    fn identifier(&self) -> FrameId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    fn is_main(&self) -> bool {
        self.main
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn load_url(&self, url: &str) -> Result<(), EngineError> {
        self.loads.lock().unwrap().push(FrameLoad::Url(url.to_owned()));
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(EngineError::command("load_url", "load refused"));
        }
        Ok(())
    }

    fn load_string(&self, content: &str, url: &str) -> Result<(), EngineError> {
        self.loads.lock().unwrap().push(FrameLoad::String {
            content: content.to_owned(),
            url: url.to_owned(),
        });
        Ok(())
    }

    fn execute_javascript(&self, code: &str, url: &str, line: i32) -> Result<(), EngineError> {
        self.scripts
            .lock()
            .unwrap()
            .push((code.to_owned(), url.to_owned(), line));
        Ok(())
    }

    fn send_process_message(&self, message: ProcessMessage) -> Result<(), EngineError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(EngineError::command("send_process_message", "renderer unreachable"));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// A history or reload request made on a [`FakeBrowser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand {
    GoBack,
    GoForward,
    Reload,
    ReloadIgnoreCache,
}

/// Recording [`Browser`] with one main frame and optional named subframes.
#[derive(Debug)]
pub struct FakeBrowser {
    id: BrowserId,
    host: Arc<FakeBrowserHost>,
    main_frame: Arc<FakeFrame>,
    frames: Mutex<Vec<Arc<FakeFrame>>>,
    loading: AtomicBool,
    can_go_back: AtomicBool,
    can_go_forward: AtomicBool,
    commands: Mutex<Vec<BrowserCommand>>,
}

impl FakeBrowser {
    #[must_use]
    pub fn new(id: BrowserId) -> Self {
        Self {
            id,
            host: Arc::new(FakeBrowserHost::new()),
            main_frame: Arc::new(FakeFrame::new(1, "", true)),
            frames: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            can_go_back: AtomicBool::new(false),
            can_go_forward: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn fake_host(&self) -> Arc<FakeBrowserHost> {
        Arc::clone(&self.host)
    }

    #[must_use]
    pub fn fake_main_frame(&self) -> Arc<FakeFrame> {
        Arc::clone(&self.main_frame)
    }

    /// Add a named subframe with the next free identifier.
    pub fn add_frame(&self, name: impl Into<String>) -> Arc<FakeFrame> {
        let mut frames = self.frames.lock().unwrap();
        let id = frames.len() as FrameId + 2;
        let frame = Arc::new(FakeFrame::new(id, name, false));
        frames.push(Arc::clone(&frame));
        frame
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    pub fn set_history(&self, can_go_back: bool, can_go_forward: bool) {
        self.can_go_back.store(can_go_back, Ordering::SeqCst);
        self.can_go_forward.store(can_go_forward, Ordering::SeqCst);
    }

    #[must_use]
    pub fn commands(&self) -> Vec<BrowserCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: BrowserCommand) -> Result<(), EngineError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

impl Browser for FakeBrowser {
    fn identifier(&self) -> BrowserId {
        self.id
    }

    fn host(&self) -> Arc<dyn BrowserHost> {
        self.host.clone()
    }

    fn main_frame(&self) -> Arc<dyn Frame> {
        self.main_frame.clone()
    }

    fn frame(&self, name: &str) -> Option<Arc<dyn Frame>> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.name == name)
            .map(|f| Arc::clone(f) as Arc<dyn Frame>)
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn can_go_back(&self) -> bool {
        self.can_go_back.load(Ordering::SeqCst)
    }

    fn can_go_forward(&self) -> bool {
        self.can_go_forward.load(Ordering::SeqCst)
    }

    fn go_back(&self) -> Result<(), EngineError> {
        self.record(BrowserCommand::GoBack)
    }

    fn go_forward(&self) -> Result<(), EngineError> {
        self.record(BrowserCommand::GoForward)
    }

    fn reload(&self) -> Result<(), EngineError> {
        self.record(BrowserCommand::Reload)
    }

    fn reload_ignore_cache(&self) -> Result<(), EngineError> {
        self.record(BrowserCommand::ReloadIgnoreCache)
    }
}

/// Recording [`Engine`] that hands out one [`FakeBrowser`].
pub struct FakeEngine {
    browser: Arc<FakeBrowser>,
    requests: Mutex<Vec<CreateBrowserRequest>>,
    client: Mutex<Option<Arc<dyn EngineClient>>>,
    failure: Mutex<Option<EngineError>>,
}

impl std::fmt::Debug for FakeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeEngine")
            .field("requests", &*self.requests.lock().unwrap())
            .field("has_client", &self.client.lock().unwrap().is_some())
            .finish_non_exhaustive()
    }
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            browser: Arc::new(FakeBrowser::new(1)),
            requests: Mutex::new(Vec::new()),
            client: Mutex::new(None),
            failure: Mutex::new(None),
        }
    }
}

impl FakeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The browser handed out by [`Self::complete_creation`].
    #[must_use]
    pub fn browser(&self) -> Arc<FakeBrowser> {
        Arc::clone(&self.browser)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<CreateBrowserRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The client passed to the last `create_browser` call.
    #[must_use]
    pub fn client(&self) -> Option<Arc<dyn EngineClient>> {
        self.client.lock().unwrap().clone()
    }

    pub fn fail_creation_with(&self, failure: Option<EngineError>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Raise `on_browser_created` on the captured client. Returns false if
    /// no browser creation was requested.
    pub fn complete_creation(&self) -> bool {
        match self.client() {
            Some(client) => {
                client.on_browser_created(self.browser.clone());
                true
            }
            None => false,
        }
    }

    /// Raise `on_browser_destroyed` on the captured client.
    pub fn destroy_browser(&self) -> bool {
        match self.client() {
            Some(client) => {
                client.on_browser_destroyed(self.browser.clone());
                true
            }
            None => false,
        }
    }
}

impl Engine for FakeEngine {
    fn create_browser(
        &self,
        request: CreateBrowserRequest,
        client: Arc<dyn EngineClient>,
    ) -> Result<(), EngineError> {
        self.requests.lock().unwrap().push(request);
        *self.client.lock().unwrap() = Some(client);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
