//! Shared window-manager geometry and stacking helpers used by the desktop reducer.

use crate::model::{
    CycleDirection, DesktopState, DesktopViewport, OpenWindowRequest, PointerPosition, ResizeEdge,
    WindowConstraints, WindowId, WindowPosition, WindowRect,
};

/// Clamps a position on one axis so `[pos, pos + size)` stays inside `[origin, origin + extent)`.
///
/// Windows larger than the extent are pinned to `origin`.
pub fn clamp_axis(pos: i32, size: i32, origin: i32, extent: i32) -> i32 {
    let max = origin.saturating_add(extent.saturating_sub(size).max(0));
    pos.clamp(origin, max)
}

/// Computes the geometry and constraints of a window about to be opened.
///
/// Explicit coordinates are clamped into the work area, missing or `Center` coordinates are
/// centered, then (unless the request opts out) the cascade offset for the current window count
/// is added and the result is clamped again.
pub fn initial_window_rect(
    state: &DesktopState,
    req: &OpenWindowRequest,
) -> (WindowRect, WindowConstraints) {
    let placement = state.placement;
    let constraints = req
        .constraints
        .unwrap_or_else(|| placement.default_constraints());
    let w = req
        .width
        .unwrap_or(placement.default_width)
        .max(constraints.min_width);
    let h = req
        .height
        .unwrap_or(placement.default_height)
        .max(constraints.min_height);

    let area = state.viewport.work_area();
    let cascade = if req.cascade {
        i32::try_from(state.windows.len())
            .unwrap_or(i32::MAX)
            .saturating_mul(placement.cascade_step)
    } else {
        0
    };
    let x = place_axis(req.x, w, area.x, area.w, cascade);
    let y = place_axis(req.y, h, area.y, area.h, cascade);
    (WindowRect { x, y, w, h }, constraints)
}

fn place_axis(
    requested: Option<WindowPosition>,
    size: i32,
    origin: i32,
    extent: i32,
    cascade: i32,
) -> i32 {
    let base = match requested.unwrap_or(WindowPosition::Center) {
        WindowPosition::At(pos) => pos,
        WindowPosition::Center => origin.saturating_add(extent.saturating_sub(size) / 2),
    };
    let base = clamp_axis(base, size, origin, extent);
    clamp_axis(base.saturating_add(cascade), size, origin, extent)
}

/// Returns the geometry of a maximized window for `viewport`.
pub fn maximized_rect(viewport: DesktopViewport, constraints: WindowConstraints) -> WindowRect {
    viewport.work_area().clamped_min(constraints)
}

/// Applies resize deltas for a given edge/corner drag.
pub fn resize_rect(start: WindowRect, edge: ResizeEdge, dx: i32, dy: i32) -> WindowRect {
    match edge {
        ResizeEdge::East => WindowRect {
            w: start.w.saturating_add(dx),
            ..start
        },
        ResizeEdge::West => WindowRect {
            x: start.x.saturating_add(dx),
            w: start.w.saturating_sub(dx),
            ..start
        },
        ResizeEdge::South => WindowRect {
            h: start.h.saturating_add(dy),
            ..start
        },
        ResizeEdge::North => WindowRect {
            y: start.y.saturating_add(dy),
            h: start.h.saturating_sub(dy),
            ..start
        },
        ResizeEdge::NorthEast => WindowRect {
            y: start.y.saturating_add(dy),
            h: start.h.saturating_sub(dy),
            w: start.w.saturating_add(dx),
            ..start
        },
        ResizeEdge::NorthWest => WindowRect {
            x: start.x.saturating_add(dx),
            y: start.y.saturating_add(dy),
            w: start.w.saturating_sub(dx),
            h: start.h.saturating_sub(dy),
        },
        ResizeEdge::SouthEast => WindowRect {
            w: start.w.saturating_add(dx),
            h: start.h.saturating_add(dy),
            ..start
        },
        ResizeEdge::SouthWest => WindowRect {
            x: start.x.saturating_add(dx),
            w: start.w.saturating_sub(dx),
            h: start.h.saturating_add(dy),
            ..start
        },
    }
}

/// Like [`resize_rect`], but clamps to `constraints` while keeping the edge opposite the
/// dragged one fixed.
pub fn resize_rect_clamped(
    start: WindowRect,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    constraints: WindowConstraints,
) -> WindowRect {
    let raw = resize_rect(start, edge, dx, dy);
    let mut rect = raw.clamped_min(constraints);
    if matches!(
        edge,
        ResizeEdge::West | ResizeEdge::NorthWest | ResizeEdge::SouthWest
    ) {
        rect.x = start.x.saturating_add(start.w).saturating_sub(rect.w);
    }
    if matches!(
        edge,
        ResizeEdge::North | ResizeEdge::NorthEast | ResizeEdge::NorthWest
    ) {
        rect.y = start.y.saturating_add(start.h).saturating_sub(rect.h);
    }
    rect
}

/// Keeps a dragged window's title bar reachable below the top of the work area.
pub fn clamp_drag(rect: WindowRect, viewport: DesktopViewport) -> WindowRect {
    let area = viewport.work_area();
    WindowRect {
        y: rect.y.max(area.y),
        ..rect
    }
}

/// Returns the topmost non-minimized window containing `point`.
pub fn window_at_point(state: &DesktopState, point: PointerPosition) -> Option<WindowId> {
    state
        .windows
        .iter()
        .filter(|w| !w.is_minimized() && w.rect.contains(point))
        .max_by_key(|w| w.z_index)
        .map(|w| w.id)
}

/// Picks the window a cycle command should focus.
///
/// Non-minimized windows are ordered by z-order. The active window is the topmost, so forward
/// wraps to the bottom-most window and backward picks the window directly beneath the active
/// one. With no active window, the topmost visible window is chosen.
pub fn cycle_target(state: &DesktopState, direction: CycleDirection) -> Option<WindowId> {
    let stack = state.visible_stack();
    if stack.is_empty() {
        return None;
    }
    let n = stack.len();
    let Some(active_index) = state
        .active_window
        .and_then(|active| stack.iter().position(|w| w.id == active))
    else {
        return stack.last().map(|w| w.id);
    };
    let index = match direction {
        CycleDirection::Forward => (active_index + 1) % n,
        CycleDirection::Backward => (active_index + n - 1) % n,
    };
    Some(stack[index].id)
}
