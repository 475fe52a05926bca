//! Long-lived window manager container: reducer dispatch, ordered effect draining, per-window
//! hooks, and global effect listeners.
//!
//! All state lives behind one shared [`Rc`]; [`WindowManager`] clones are cheap and refer to the
//! same desktop. Reducer errors (an operation on an unknown window id) are logged at debug level
//! and dropped, so every public operation is infallible.
//!
//! Hooks and listeners may call back into the manager. Effects raised by such nested calls are
//! appended to the queue and delivered after the effect currently being delivered, so
//! notifications always arrive in the order their transitions happened.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::{Rc, Weak},
};

use log::debug;

use crate::{
    model::{
        CycleDirection, DesktopState, DesktopViewport, InteractionState, OpenWindowRequest,
        PlacementConfig, PointerPosition, ResizeEdge, WindowId, WindowRecord, WindowRect,
    },
    reducer::{reduce_desktop, DesktopAction, RuntimeEffect},
    shortcuts::{command_for_chord, KeyChord, WindowCommand},
};

/// Callback receiving a window id.
pub type FocusHook = Box<dyn FnMut(WindowId)>;
/// Callback receiving a window id and its new geometry.
pub type GeometryHook = Box<dyn FnMut(WindowId, WindowRect)>;
/// Close veto; returning `false` keeps the window open.
pub type CloseVeto = Box<dyn FnMut(WindowId) -> bool>;
/// Global listener called for every drained [`RuntimeEffect`].
pub type EffectListener = Box<dyn FnMut(&RuntimeEffect)>;

#[derive(Default)]
/// Optional per-window callbacks registered at creation.
pub struct WindowHooks {
    on_focus: Option<FocusHook>,
    on_blur: Option<FocusHook>,
    on_move: Option<GeometryHook>,
    on_resize: Option<GeometryHook>,
    on_close: Option<CloseVeto>,
}

impl WindowHooks {
    /// Called whenever the window is focused.
    pub fn on_focus(mut self, hook: impl FnMut(WindowId) + 'static) -> Self {
        self.on_focus = Some(Box::new(hook));
        self
    }

    /// Called when the window stops being the active window.
    pub fn on_blur(mut self, hook: impl FnMut(WindowId) + 'static) -> Self {
        self.on_blur = Some(Box::new(hook));
        self
    }

    /// Called after every position change, including each step of a drag.
    pub fn on_move(mut self, hook: impl FnMut(WindowId, WindowRect) + 'static) -> Self {
        self.on_move = Some(Box::new(hook));
        self
    }

    /// Called after every size change, including maximize and restore.
    pub fn on_resize(mut self, hook: impl FnMut(WindowId, WindowRect) + 'static) -> Self {
        self.on_resize = Some(Box::new(hook));
        self
    }

    /// Consulted before the window closes.
    pub fn on_close(mut self, veto: impl FnMut(WindowId) -> bool + 'static) -> Self {
        self.on_close = Some(Box::new(veto));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Token returned by [`WindowManager::subscribe`].
pub struct ListenerId(u64);

struct Inner {
    state: RefCell<DesktopState>,
    interaction: RefCell<InteractionState>,
    hooks: RefCell<HashMap<WindowId, Rc<RefCell<WindowHooks>>>>,
    listeners: RefCell<Vec<(ListenerId, Rc<RefCell<EffectListener>>)>>,
    next_listener_id: Cell<u64>,
    queue: RefCell<VecDeque<RuntimeEffect>>,
    draining: Cell<bool>,
}

#[derive(Clone)]
/// Shared handle to one desktop's window set.
pub struct WindowManager {
    inner: Rc<Inner>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::with_state(DesktopState::default())
    }
}

impl WindowManager {
    /// Creates an empty desktop for `viewport` using `placement` defaults.
    pub fn new(viewport: DesktopViewport, placement: PlacementConfig) -> Self {
        Self::with_state(DesktopState::new(viewport, placement))
    }

    /// Wraps an existing desktop state.
    pub fn with_state(state: DesktopState) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                interaction: RefCell::new(InteractionState::default()),
                hooks: RefCell::new(HashMap::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
                queue: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
            }),
        }
    }

    /// Runs `action` through the reducer and delivers the resulting effects.
    pub fn dispatch(&self, action: DesktopAction) {
        let result = {
            let mut state = self.inner.state.borrow_mut();
            let mut interaction = self.inner.interaction.borrow_mut();
            reduce_desktop(&mut state, &mut interaction, action)
        };
        match result {
            Ok(effects) => {
                self.inner.queue.borrow_mut().extend(effects);
                self.drain();
            }
            Err(err) => debug!("ignored desktop action: {err}"),
        }
    }

    /// Opens a window without hooks.
    pub fn create_window(&self, req: OpenWindowRequest) -> WindowHandle {
        self.create_window_with_hooks(req, WindowHooks::default())
    }

    /// Opens a window, placing and focusing it, with `hooks` registered before its first
    /// notification is delivered.
    pub fn create_window_with_hooks(
        &self,
        req: OpenWindowRequest,
        hooks: WindowHooks,
    ) -> WindowHandle {
        let window_id = WindowId(self.inner.state.borrow().next_window_id);
        self.inner
            .hooks
            .borrow_mut()
            .insert(window_id, Rc::new(RefCell::new(hooks)));
        self.dispatch(DesktopAction::OpenWindow(req));
        self.handle_for(window_id)
    }

    /// Returns a handle for a live window.
    pub fn handle(&self, window_id: WindowId) -> Option<WindowHandle> {
        self.window(window_id).map(|_| self.handle_for(window_id))
    }

    /// Non-owning reference for callbacks the manager itself stores.
    pub fn downgrade(&self) -> WeakWindowManager {
        WeakWindowManager {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn handle_for(&self, window_id: WindowId) -> WindowHandle {
        WindowHandle {
            window_id,
            manager: Rc::downgrade(&self.inner),
        }
    }

    pub fn focus_window(&self, window_id: WindowId) {
        self.dispatch(DesktopAction::FocusWindow { window_id });
    }

    /// Closes a window unless it is not closable or its close veto returns `false`.
    pub fn close_window(&self, window_id: WindowId) {
        let closable = self
            .inner
            .state
            .borrow()
            .window(window_id)
            .map(|w| w.flags.closable);
        match closable {
            None => {
                debug!("ignored close of unknown {window_id}");
                return;
            }
            Some(false) => return,
            Some(true) => {}
        }

        let mut allowed = true;
        self.run_window_hook(window_id, |hooks| {
            if let Some(veto) = hooks.on_close.as_mut() {
                allowed = veto(window_id);
            }
        });
        if !allowed {
            debug!("close of {window_id} vetoed");
            return;
        }
        self.dispatch(DesktopAction::CloseWindow { window_id });
    }

    pub fn minimize_window(&self, window_id: WindowId) {
        self.dispatch(DesktopAction::MinimizeWindow { window_id });
    }

    pub fn maximize_window(&self, window_id: WindowId) {
        self.dispatch(DesktopAction::MaximizeWindow { window_id });
    }

    pub fn restore_window(&self, window_id: WindowId) {
        self.dispatch(DesktopAction::RestoreWindow { window_id });
    }

    pub fn move_window(&self, window_id: WindowId, x: i32, y: i32) {
        self.dispatch(DesktopAction::MoveWindow { window_id, x, y });
    }

    pub fn resize_window(&self, window_id: WindowId, width: i32, height: i32) {
        self.dispatch(DesktopAction::ResizeWindow {
            window_id,
            width,
            height,
        });
    }

    pub fn set_title(&self, window_id: WindowId, title: impl Into<String>) {
        self.dispatch(DesktopAction::SetTitle {
            window_id,
            title: title.into(),
        });
    }

    pub fn set_content(&self, window_id: WindowId, content: Option<String>) {
        self.dispatch(DesktopAction::SetContent { window_id, content });
    }

    pub fn toggle_taskbar_window(&self, window_id: WindowId) {
        self.dispatch(DesktopAction::ToggleTaskbarWindow { window_id });
    }

    pub fn cycle_windows(&self, direction: CycleDirection) {
        self.dispatch(DesktopAction::CycleWindows { direction });
    }

    /// Closes the active window, honoring its close veto.
    pub fn close_active_window(&self) {
        if let Some(window_id) = self.active_window() {
            self.close_window(window_id);
        }
    }

    /// Applies a keyboard shortcut. Returns `true` when the chord is bound.
    pub fn handle_key(&self, chord: &KeyChord) -> bool {
        let Some(command) = command_for_chord(chord) else {
            return false;
        };
        match command {
            WindowCommand::CycleForward => self.cycle_windows(CycleDirection::Forward),
            WindowCommand::CycleBackward => self.cycle_windows(CycleDirection::Backward),
            WindowCommand::CloseActive => self.close_active_window(),
        }
        true
    }

    /// Pointer pressed anywhere on the desktop; focuses the window under it first.
    pub fn pointer_down(&self, pointer: PointerPosition) {
        self.dispatch(DesktopAction::PointerDown { pointer });
    }

    /// Starts a title-bar drag of `window_id`.
    pub fn begin_move(&self, window_id: WindowId, pointer: PointerPosition) {
        self.dispatch(DesktopAction::BeginMove { window_id, pointer });
    }

    /// Starts an edge or corner resize of `window_id`.
    pub fn begin_resize(&self, window_id: WindowId, edge: ResizeEdge, pointer: PointerPosition) {
        self.dispatch(DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        });
    }

    /// Feeds a pointer move into the active drag or resize, if any.
    pub fn pointer_move(&self, pointer: PointerPosition) {
        let (dragging, resizing) = {
            let interaction = self.inner.interaction.borrow();
            (
                interaction.dragging.is_some(),
                interaction.resizing.is_some(),
            )
        };
        if dragging {
            self.dispatch(DesktopAction::UpdateMove { pointer });
        }
        if resizing {
            self.dispatch(DesktopAction::UpdateResize { pointer });
        }
    }

    /// Ends the active drag or resize.
    pub fn pointer_up(&self) {
        self.dispatch(DesktopAction::EndMove);
        self.dispatch(DesktopAction::EndResize);
    }

    pub fn set_viewport(&self, viewport: DesktopViewport) {
        self.dispatch(DesktopAction::SetViewport { viewport });
    }

    /// Registers a listener for every effect, e.g. a taskbar watching for minimized windows.
    pub fn subscribe(&self, listener: impl FnMut(&RuntimeEffect) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.get());
        self.inner.next_listener_id.set(id.0 + 1);
        let listener: EffectListener = Box::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    /// Removes a listener. Returns `false` when it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Returns a copy of the current desktop state.
    pub fn state(&self) -> DesktopState {
        self.inner.state.borrow().clone()
    }

    pub fn window(&self, window_id: WindowId) -> Option<WindowRecord> {
        self.inner.state.borrow().window(window_id).cloned()
    }

    /// Live windows ordered bottom to top, minimized windows included.
    pub fn windows(&self) -> Vec<WindowRecord> {
        let mut windows = self.inner.state.borrow().windows.clone();
        windows.sort_by_key(|w| w.z_index);
        windows
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.inner.state.borrow().active_window
    }

    pub fn viewport(&self) -> DesktopViewport {
        self.inner.state.borrow().viewport
    }

    fn drain(&self) {
        if self.inner.draining.replace(true) {
            return;
        }
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(effect) = next else {
                break;
            };
            self.deliver(&effect);
        }
        self.inner.draining.set(false);
    }

    fn deliver(&self, effect: &RuntimeEffect) {
        match effect {
            RuntimeEffect::WindowFocused(window_id) => {
                let window_id = *window_id;
                self.run_window_hook(window_id, |hooks| {
                    if let Some(hook) = hooks.on_focus.as_mut() {
                        hook(window_id);
                    }
                });
            }
            RuntimeEffect::WindowBlurred(window_id) => {
                let window_id = *window_id;
                self.run_window_hook(window_id, |hooks| {
                    if let Some(hook) = hooks.on_blur.as_mut() {
                        hook(window_id);
                    }
                });
            }
            RuntimeEffect::WindowMoved { window_id, rect } => {
                let (window_id, rect) = (*window_id, *rect);
                self.run_window_hook(window_id, |hooks| {
                    if let Some(hook) = hooks.on_move.as_mut() {
                        hook(window_id, rect);
                    }
                });
            }
            RuntimeEffect::WindowResized { window_id, rect } => {
                let (window_id, rect) = (*window_id, *rect);
                self.run_window_hook(window_id, |hooks| {
                    if let Some(hook) = hooks.on_resize.as_mut() {
                        hook(window_id, rect);
                    }
                });
            }
            RuntimeEffect::WindowClosed(window_id) => {
                self.inner.hooks.borrow_mut().remove(window_id);
            }
            RuntimeEffect::WindowOpened(_)
            | RuntimeEffect::WindowMinimized(_)
            | RuntimeEffect::WindowRestored(_)
            | RuntimeEffect::WindowMaximized(_)
            | RuntimeEffect::WindowRetitled(_)
            | RuntimeEffect::WindowContentChanged(_)
            | RuntimeEffect::PersistLayout => {}
        }

        let listeners: Vec<_> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener(effect),
                Err(_) => debug!("skipped re-entrant effect listener"),
            }
        }
    }

    fn run_window_hook(&self, window_id: WindowId, run: impl FnOnce(&mut WindowHooks)) {
        let hooks = self.inner.hooks.borrow().get(&window_id).cloned();
        let Some(hooks) = hooks else {
            return;
        };
        let Ok(mut hooks) = hooks.try_borrow_mut() else {
            debug!("skipped re-entrant hook for {window_id}");
            return;
        };
        run(&mut hooks);
    }
}

#[derive(Clone)]
/// Weak counterpart of [`WindowManager`].
pub struct WeakWindowManager {
    inner: Weak<Inner>,
}

impl WeakWindowManager {
    pub fn upgrade(&self) -> Option<WindowManager> {
        self.inner.upgrade().map(|inner| WindowManager { inner })
    }
}

#[derive(Clone)]
/// Per-window handle handed to the app that owns the window.
///
/// The handle does not keep the manager alive; once the manager is dropped or the window is
/// closed, every operation is a no-op.
pub struct WindowHandle {
    window_id: WindowId,
    manager: Weak<Inner>,
}

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle")
            .field("window_id", &self.window_id)
            .finish()
    }
}

impl WindowHandle {
    pub fn id(&self) -> WindowId {
        self.window_id
    }

    fn manager(&self) -> Option<WindowManager> {
        self.manager.upgrade().map(|inner| WindowManager { inner })
    }

    fn with_manager(&self, run: impl FnOnce(&WindowManager, WindowId)) {
        match self.manager() {
            Some(manager) => run(&manager, self.window_id),
            None => debug!("window manager for {} dropped", self.window_id),
        }
    }

    pub fn focus(&self) {
        self.with_manager(|m, id| m.focus_window(id));
    }

    pub fn close(&self) {
        self.with_manager(|m, id| m.close_window(id));
    }

    pub fn minimize(&self) {
        self.with_manager(|m, id| m.minimize_window(id));
    }

    pub fn maximize(&self) {
        self.with_manager(|m, id| m.maximize_window(id));
    }

    pub fn restore(&self) {
        self.with_manager(|m, id| m.restore_window(id));
    }

    pub fn move_to(&self, x: i32, y: i32) {
        self.with_manager(|m, id| m.move_window(id, x, y));
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.with_manager(|m, id| m.resize_window(id, width, height));
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.with_manager(|m, id| m.set_title(id, title));
    }

    pub fn set_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.with_manager(|m, id| m.set_content(id, Some(content)));
    }

    /// Returns the current record, or `None` once the window is closed.
    pub fn record(&self) -> Option<WindowRecord> {
        self.manager()?.window(self.window_id)
    }

    pub fn is_open(&self) -> bool {
        self.record().is_some()
    }
}
