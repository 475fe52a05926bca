//! Reducer actions, side-effect intents, and transition logic for the desktop runtime.

use thiserror::Error;

use crate::{
    model::{
        CycleDirection, DesktopState, DesktopViewport, DragSession, InteractionState,
        OpenWindowRequest, PointerPosition, ResizeEdge, ResizeSession, WindowId, WindowRecord,
        WindowRect, WindowState,
    },
    window_manager::{
        clamp_drag, cycle_target, initial_window_rect, maximized_rect, resize_rect_clamped,
        window_at_point,
    },
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a new window using the supplied request.
    OpenWindow(OpenWindowRequest),
    /// Remove a window. Close vetoes are resolved by the caller before dispatch.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Minimize a window.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Maximize a window into the work area, or restore it when already maximized.
    MaximizeWindow {
        /// Window to maximize.
        window_id: WindowId,
    },
    /// Restore a minimized or maximized window.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Move a window's top-left corner.
    MoveWindow {
        /// Window to move.
        window_id: WindowId,
        /// New left edge.
        x: i32,
        /// New top edge.
        y: i32,
    },
    /// Resize a window, clamped to its minimum size.
    ResizeWindow {
        /// Window to resize.
        window_id: WindowId,
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// Replace a window's title.
    SetTitle {
        /// Window to retitle.
        window_id: WindowId,
        /// New title.
        title: String,
    },
    /// Replace a window's content payload.
    SetContent {
        /// Window whose content changes.
        window_id: WindowId,
        /// New content payload.
        content: Option<String>,
    },
    /// Toggle taskbar behavior for a window (focus, minimize, or restore).
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Focus the next or previous visible window in z-order.
    CycleWindows {
        /// Cycle direction.
        direction: CycleDirection,
    },
    /// Pointer pressed on the desktop; focuses the topmost window under it.
    PointerDown {
        /// Pointer position.
        pointer: PointerPosition,
    },
    /// Replace the viewport and re-fit maximized windows.
    SetViewport {
        /// New viewport.
        viewport: DesktopViewport,
    },
    /// Begin dragging a window.
    BeginMove {
        /// Window being dragged.
        window_id: WindowId,
        /// Pointer position at drag start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window drag.
    UpdateMove {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window drag.
    EndMove,
    /// Begin resizing a window.
    BeginResize {
        /// Window being resized.
        window_id: WindowId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window resize.
    UpdateResize {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window resize.
    EndResize,
}

#[derive(Debug, Clone, PartialEq)]
/// Notifications emitted by [`reduce_desktop`], drained in order by the runtime.
pub enum RuntimeEffect {
    /// A window was created.
    WindowOpened(WindowId),
    /// A window became active.
    WindowFocused(WindowId),
    /// A window stopped being active.
    WindowBlurred(WindowId),
    /// A window was minimized; consumed by the taskbar.
    WindowMinimized(WindowId),
    /// A window left the minimized or maximized state.
    WindowRestored(WindowId),
    /// A window was maximized.
    WindowMaximized(WindowId),
    /// A window's position changed.
    WindowMoved {
        /// Moved window.
        window_id: WindowId,
        /// Geometry after the move.
        rect: WindowRect,
    },
    /// A window's size changed.
    WindowResized {
        /// Resized window.
        window_id: WindowId,
        /// Geometry after the resize.
        rect: WindowRect,
    },
    /// A window's title changed.
    WindowRetitled(WindowId),
    /// A window's content payload changed.
    WindowContentChanged(WindowId),
    /// A window was removed.
    WindowClosed(WindowId),
    /// The window layout changed and should be persisted.
    PersistLayout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for invalid actions (for example, referencing a missing window).
pub enum ReducerError {
    /// The target window id was not found in the current state.
    #[error("window not found")]
    WindowNotFound,
}

/// Applies a [`DesktopAction`] to the desktop runtime state and collects resulting side effects.
///
/// This function is the authoritative state transition engine for window management. Operations
/// gated by a window flag, or invalid in the window's current state, succeed with no effects.
///
/// # Errors
///
/// Returns [`ReducerError::WindowNotFound`] when an action references a window that is not present.
pub fn reduce_desktop(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(req) => {
            let (rect, constraints) = initial_window_rect(state, &req);
            let window_id = next_window_id(state);
            state.windows.push(WindowRecord {
                id: window_id,
                app_id: req.app_id,
                title: req.title,
                content: req.content,
                rect,
                constraints,
                z_index: 0,
                state: WindowState::Normal,
                saved_rect: None,
                flags: req.flags,
            });
            effects.push(RuntimeEffect::WindowOpened(window_id));
            focus_window_internal(state, window_id, &mut effects)?;
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::CloseWindow { window_id } => {
            let index = state
                .windows
                .iter()
                .position(|w| w.id == window_id)
                .ok_or(ReducerError::WindowNotFound)?;
            state.windows.remove(index);
            if interaction
                .dragging
                .as_ref()
                .is_some_and(|s| s.window_id == window_id)
            {
                interaction.dragging = None;
            }
            if interaction
                .resizing
                .as_ref()
                .is_some_and(|s| s.window_id == window_id)
            {
                interaction.resizing = None;
            }
            effects.push(RuntimeEffect::WindowClosed(window_id));
            if state.active_window == Some(window_id) {
                state.active_window = None;
                refocus_topmost(state, &mut effects)?;
            }
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::FocusWindow { window_id } => {
            focus_window_internal(state, window_id, &mut effects)?;
        }
        DesktopAction::MinimizeWindow { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if window.is_minimized() || !window.flags.minimizable {
                return Ok(effects);
            }
            window.state = WindowState::Minimized;
            if state.active_window == Some(window_id) {
                state.active_window = None;
                effects.push(RuntimeEffect::WindowBlurred(window_id));
            }
            effects.push(RuntimeEffect::WindowMinimized(window_id));
            refocus_if_idle(state, &mut effects)?;
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::MaximizeWindow { window_id } => {
            let viewport = state.viewport;
            let window = find_window_mut(state, window_id)?;
            if !window.flags.maximizable {
                return Ok(effects);
            }
            let current = window.state;
            match current {
                WindowState::Maximized => {
                    restore_window(state, window_id, &mut effects)?;
                    return Ok(effects);
                }
                WindowState::Normal => window.saved_rect = Some(window.rect),
                WindowState::Minimized => {
                    if window.saved_rect.is_none() {
                        window.saved_rect = Some(window.rect);
                    }
                }
            }
            window.rect = maximized_rect(viewport, window.constraints);
            window.state = WindowState::Maximized;
            let rect = window.rect;
            effects.push(RuntimeEffect::WindowMaximized(window_id));
            effects.push(RuntimeEffect::WindowResized { window_id, rect });
            focus_window_internal(state, window_id, &mut effects)?;
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::RestoreWindow { window_id } => {
            restore_window(state, window_id, &mut effects)?;
        }
        DesktopAction::MoveWindow { window_id, x, y } => {
            let window = find_window_mut(state, window_id)?;
            if window.is_maximized() || (window.rect.x, window.rect.y) == (x, y) {
                return Ok(effects);
            }
            window.rect.x = x;
            window.rect.y = y;
            effects.push(RuntimeEffect::WindowMoved {
                window_id,
                rect: window.rect,
            });
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::ResizeWindow {
            window_id,
            width,
            height,
        } => {
            let window = find_window_mut(state, window_id)?;
            if window.is_maximized() || !window.flags.resizable {
                return Ok(effects);
            }
            let rect = WindowRect {
                w: width,
                h: height,
                ..window.rect
            }
            .clamped_min(window.constraints);
            if rect == window.rect {
                return Ok(effects);
            }
            window.rect = rect;
            effects.push(RuntimeEffect::WindowResized { window_id, rect });
            effects.push(RuntimeEffect::PersistLayout);
        }
        DesktopAction::SetTitle { window_id, title } => {
            let window = find_window_mut(state, window_id)?;
            if window.title != title {
                window.title = title;
                effects.push(RuntimeEffect::WindowRetitled(window_id));
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::SetContent { window_id, content } => {
            let window = find_window_mut(state, window_id)?;
            if window.content != content {
                window.content = content;
                effects.push(RuntimeEffect::WindowContentChanged(window_id));
            }
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            let focused = state.focused_window_id() == Some(window_id);
            let minimized = state
                .window(window_id)
                .map(WindowRecord::is_minimized)
                .ok_or(ReducerError::WindowNotFound)?;
            let follow_up = if minimized {
                DesktopAction::RestoreWindow { window_id }
            } else if focused {
                DesktopAction::MinimizeWindow { window_id }
            } else {
                DesktopAction::FocusWindow { window_id }
            };
            effects.extend(reduce_desktop(state, interaction, follow_up)?);
        }
        DesktopAction::CycleWindows { direction } => {
            if let Some(window_id) = cycle_target(state, direction) {
                if direction == CycleDirection::Backward {
                    if let Some(previous) = state.active_window.filter(|id| *id != window_id) {
                        sink_window(state, previous);
                    }
                }
                focus_window_internal(state, window_id, &mut effects)?;
            }
        }
        DesktopAction::PointerDown { pointer } => {
            if let Some(window_id) = window_at_point(state, pointer) {
                focus_window_internal(state, window_id, &mut effects)?;
            }
        }
        DesktopAction::SetViewport { viewport } => {
            state.viewport = viewport;
            for window in state.windows.iter_mut().filter(|w| w.is_maximized()) {
                let rect = maximized_rect(viewport, window.constraints);
                if rect != window.rect {
                    window.rect = rect;
                    effects.push(RuntimeEffect::WindowResized {
                        window_id: window.id,
                        rect,
                    });
                }
            }
            if !effects.is_empty() {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::BeginMove { window_id, pointer } => {
            let rect_start = find_window_mut(state, window_id)?.rect;
            focus_window_internal(state, window_id, &mut effects)?;
            interaction.dragging = Some(DragSession {
                window_id,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateMove { pointer } => {
            if let Some(session) = interaction.dragging.as_ref() {
                let dx = pointer.x.saturating_sub(session.pointer_start.x);
                let dy = pointer.y.saturating_sub(session.pointer_start.y);
                let viewport = state.viewport;
                let window = find_window_mut(state, session.window_id)?;
                let rect = clamp_drag(session.rect_start.offset(dx, dy), viewport);
                if !window.is_maximized() && rect != window.rect {
                    window.rect = rect;
                    effects.push(RuntimeEffect::WindowMoved {
                        window_id: session.window_id,
                        rect,
                    });
                }
            }
        }
        DesktopAction::EndMove => {
            if interaction.dragging.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
        DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            let rect_start = find_window_mut(state, window_id)?.rect;
            focus_window_internal(state, window_id, &mut effects)?;
            interaction.resizing = Some(ResizeSession {
                window_id,
                edge,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateResize { pointer } => {
            if let Some(session) = interaction.resizing.as_ref() {
                let dx = pointer.x.saturating_sub(session.pointer_start.x);
                let dy = pointer.y.saturating_sub(session.pointer_start.y);
                let window = find_window_mut(state, session.window_id)?;
                if !window.is_maximized() && window.flags.resizable {
                    let rect = resize_rect_clamped(
                        session.rect_start,
                        session.edge,
                        dx,
                        dy,
                        window.constraints,
                    );
                    if rect != window.rect {
                        window.rect = rect;
                        effects.push(RuntimeEffect::WindowResized {
                            window_id: session.window_id,
                            rect,
                        });
                    }
                }
            }
        }
        DesktopAction::EndResize => {
            if interaction.resizing.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout);
            }
        }
    }

    Ok(effects)
}

fn next_window_id(state: &mut DesktopState) -> WindowId {
    let id = WindowId(state.next_window_id);
    state.next_window_id = state.next_window_id.saturating_add(1);
    id
}

fn find_window_mut(
    state: &mut DesktopState,
    window_id: WindowId,
) -> Result<&mut WindowRecord, ReducerError> {
    state
        .windows
        .iter_mut()
        .find(|w| w.id == window_id)
        .ok_or(ReducerError::WindowNotFound)
}

/// Raises `window_id` above every other window and makes it active.
///
/// Minimized windows are left untouched.
fn focus_window_internal(
    state: &mut DesktopState,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    let z_index = state.next_z_index;
    let window = find_window_mut(state, window_id)?;
    if window.is_minimized() {
        return Ok(());
    }
    window.z_index = z_index;
    state.next_z_index = z_index.saturating_add(1);

    let previous = state.active_window.replace(window_id);
    if let Some(previous) = previous.filter(|previous| *previous != window_id) {
        effects.push(RuntimeEffect::WindowBlurred(previous));
    }
    effects.push(RuntimeEffect::WindowFocused(window_id));
    Ok(())
}

/// Restacks the visible windows with `window_id` at the bottom, keeping the others in order.
fn sink_window(state: &mut DesktopState, window_id: WindowId) {
    let mut order: Vec<WindowId> = state.visible_stack().iter().map(|w| w.id).collect();
    order.retain(|id| *id != window_id);
    order.insert(0, window_id);
    for id in order {
        let z_index = state.next_z_index;
        if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
            window.z_index = z_index;
            state.next_z_index = z_index.saturating_add(1);
        }
    }
}

/// Focuses the highest visible window, or clears the active window when none remain.
fn refocus_topmost(
    state: &mut DesktopState,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    match state.topmost_visible() {
        Some(window_id) => focus_window_internal(state, window_id, effects),
        None => {
            state.active_window = None;
            Ok(())
        }
    }
}

fn refocus_if_idle(
    state: &mut DesktopState,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    if state.active_window.is_none() {
        refocus_topmost(state, effects)?;
    }
    Ok(())
}

fn restore_window(
    state: &mut DesktopState,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    let viewport = state.viewport;
    let window = find_window_mut(state, window_id)?;
    match window.state {
        WindowState::Normal => return Ok(()),
        WindowState::Minimized => {
            window.state = if window.saved_rect.is_some() {
                window.rect = maximized_rect(viewport, window.constraints);
                WindowState::Maximized
            } else {
                WindowState::Normal
            };
        }
        WindowState::Maximized => {
            if let Some(saved) = window.saved_rect.take() {
                window.rect = saved;
            }
            window.state = WindowState::Normal;
            let rect = window.rect;
            effects.push(RuntimeEffect::WindowResized { window_id, rect });
        }
    }
    effects.push(RuntimeEffect::WindowRestored(window_id));
    focus_window_internal(state, window_id, effects)?;
    effects.push(RuntimeEffect::PersistLayout);
    Ok(())
}
