use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_WIDTH: i32 = 640;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 480;
pub const MIN_WINDOW_WIDTH: i32 = 220;
pub const MIN_WINDOW_HEIGHT: i32 = 140;
pub const CASCADE_STEP: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }

    pub fn clamped_min(self, constraints: WindowConstraints) -> Self {
        Self {
            w: self.w.max(constraints.min_width),
            h: self.h.max(constraints.min_height),
            ..self
        }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(self, point: PointerPosition) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && px < x + i64::from(self.w) && py >= y && py < y + i64::from(self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConstraints {
    pub min_width: i32,
    pub min_height: i32,
}

impl Default for WindowConstraints {
    fn default() -> Self {
        Self {
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowFlags {
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub closable: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            minimizable: true,
            maximizable: true,
            closable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub app_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub rect: WindowRect,
    pub constraints: WindowConstraints,
    pub z_index: u64,
    pub state: WindowState,
    /// Geometry to return to when leaving `Maximized`. `None` while `Normal`.
    pub saved_rect: Option<WindowRect>,
    pub flags: WindowFlags,
}

impl WindowRecord {
    pub fn is_minimized(&self) -> bool {
        self.state == WindowState::Minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.state == WindowState::Maximized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopViewport {
    pub width: i32,
    pub height: i32,
    /// Pixels reserved for the top bar.
    pub top_inset: i32,
    /// Pixels reserved for the taskbar.
    pub bottom_inset: i32,
}

impl DesktopViewport {
    /// The region windows are placed and maximized into.
    pub fn work_area(self) -> WindowRect {
        WindowRect {
            x: 0,
            y: self.top_inset,
            w: self.width.max(0),
            h: (self.height - self.top_inset - self.bottom_inset).max(0),
        }
    }
}

impl Default for DesktopViewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            top_inset: 32,
            bottom_inset: 48,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub default_width: i32,
    pub default_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub cascade_step: i32,
}

impl PlacementConfig {
    pub fn default_constraints(self) -> WindowConstraints {
        WindowConstraints {
            min_width: self.min_width,
            min_height: self.min_height,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WINDOW_WIDTH,
            default_height: DEFAULT_WINDOW_HEIGHT,
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            cascade_step: CASCADE_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopState {
    pub next_window_id: u64,
    pub next_z_index: u64,
    pub windows: Vec<WindowRecord>,
    pub active_window: Option<WindowId>,
    pub viewport: DesktopViewport,
    pub placement: PlacementConfig,
}

impl Default for DesktopState {
    fn default() -> Self {
        Self::new(DesktopViewport::default(), PlacementConfig::default())
    }
}

impl DesktopState {
    pub fn new(viewport: DesktopViewport, placement: PlacementConfig) -> Self {
        Self {
            next_window_id: 1,
            next_z_index: 1,
            windows: Vec::new(),
            active_window: None,
            viewport,
            placement,
        }
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.active_window
    }

    /// Non-minimized windows ordered bottom to top.
    pub fn visible_stack(&self) -> Vec<&WindowRecord> {
        let mut stack: Vec<_> = self.windows.iter().filter(|w| !w.is_minimized()).collect();
        stack.sort_by_key(|w| w.z_index);
        stack
    }

    pub fn topmost_visible(&self) -> Option<WindowId> {
        self.windows
            .iter()
            .filter(|w| !w.is_minimized())
            .max_by_key(|w| w.z_index)
            .map(|w| w.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPosition {
    Center,
    At(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWindowRequest {
    pub app_id: Option<String>,
    pub title: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub x: Option<WindowPosition>,
    pub y: Option<WindowPosition>,
    pub constraints: Option<WindowConstraints>,
    pub flags: WindowFlags,
    pub content: Option<String>,
    /// Offset the window by the cascade step for each open window.
    pub cascade: bool,
}

impl Default for OpenWindowRequest {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl OpenWindowRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            app_id: None,
            title: title.into(),
            width: None,
            height: None,
            x: None,
            y: None,
            constraints: None,
            flags: WindowFlags::default(),
            content: None,
            cascade: true,
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_geometry(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.x = Some(WindowPosition::At(x));
        self.y = Some(WindowPosition::At(y));
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn without_cascade(mut self) -> Self {
        self.cascade = false;
        self
    }

    pub fn centered(mut self) -> Self {
        self.x = Some(WindowPosition::Center);
        self.y = Some(WindowPosition::Center);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
}
