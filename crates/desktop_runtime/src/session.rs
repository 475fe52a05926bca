//! Session persistence: window geometry/state records and per-app state, saved as one JSON blob.

use std::{collections::BTreeMap, rc::Rc};

use log::{debug, warn};
use platform_host::{
    load_typed_with, save_typed_with, Clock, IntervalSchedule, KeyValueStore, StorageError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    model::{
        OpenWindowRequest, WindowConstraints, WindowFlags, WindowId, WindowRecord, WindowRect,
        WindowState,
    },
    runtime::{WindowHooks, WindowManager},
};

pub const SESSION_STORAGE_KEY: &str = "webdesk.session.v1";
pub const DEFAULT_SESSION_AUTOSAVE_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot restore {window_id}: {reason}")]
    InvalidRecord { window_id: WindowId, reason: String },
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage_key: String,
    pub autosave_interval_ms: u64,
    /// Recreate persisted windows when the desktop boots.
    pub restore_on_boot: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: SESSION_STORAGE_KEY.to_string(),
            autosave_interval_ms: DEFAULT_SESSION_AUTOSAVE_INTERVAL_MS,
            restore_on_boot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedWindow {
    pub id: WindowId,
    #[serde(default)]
    pub app_id: Option<String>,
    pub title: String,
    pub rect: WindowRect,
    /// Normal-state geometry of a maximized window.
    #[serde(default)]
    pub restore_rect: Option<WindowRect>,
    #[serde(default)]
    pub state: WindowState,
    #[serde(default)]
    pub flags: WindowFlags,
    #[serde(default)]
    pub constraints: WindowConstraints,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Fields to merge into a persisted window; `None` leaves the stored value alone.
pub struct WindowStatePatch {
    pub app_id: Option<Option<String>>,
    pub title: Option<String>,
    pub rect: Option<WindowRect>,
    pub restore_rect: Option<Option<WindowRect>>,
    pub state: Option<WindowState>,
    pub flags: Option<WindowFlags>,
    pub constraints: Option<WindowConstraints>,
}

impl WindowStatePatch {
    /// A patch carrying every persisted field of a live window.
    pub fn from_record(record: &WindowRecord) -> Self {
        Self {
            app_id: Some(record.app_id.clone()),
            title: Some(record.title.clone()),
            rect: Some(record.rect),
            restore_rect: Some(record.saved_rect),
            state: Some(record.state),
            flags: Some(record.flags),
            constraints: Some(record.constraints),
        }
    }

    fn apply(self, window: &mut PersistedWindow) {
        if let Some(app_id) = self.app_id {
            window.app_id = app_id;
        }
        if let Some(title) = self.title {
            window.title = title;
        }
        if let Some(rect) = self.rect {
            window.rect = rect;
        }
        if let Some(restore_rect) = self.restore_rect {
            window.restore_rect = restore_rect;
        }
        if let Some(state) = self.state {
            window.state = state;
        }
        if let Some(flags) = self.flags {
            window.flags = flags;
        }
        if let Some(constraints) = self.constraints {
            window.constraints = constraints;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStateRecord {
    pub state: Map<String, Value>,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    /// Window records in bottom-to-top stacking order.
    pub windows: Vec<PersistedWindow>,
    pub apps: BTreeMap<String, AppStateRecord>,
    pub last_saved: Option<u64>,
}

/// Owns the in-memory [`SessionSnapshot`] and flushes it to a [`KeyValueStore`].
pub struct SessionManager {
    snapshot: SessionSnapshot,
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    config: SessionConfig,
    autosave: IntervalSchedule,
}

impl SessionManager {
    /// Creates a manager and loads the persisted snapshot.
    pub fn load(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, config: SessionConfig) -> Self {
        let mut autosave = IntervalSchedule::new(config.autosave_interval_ms);
        autosave.reset(clock.now_ms());
        let mut manager = Self {
            snapshot: SessionSnapshot::default(),
            store,
            clock,
            config,
            autosave,
        };
        manager.load_session();
        manager
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Replaces the in-memory snapshot with the persisted one, or an empty snapshot when the
    /// stored blob is missing or malformed.
    pub fn load_session(&mut self) {
        let loaded =
            load_typed_with::<_, SessionSnapshot>(self.store.as_ref(), &self.config.storage_key);
        self.snapshot = match loaded {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => SessionSnapshot::default(),
            Err(err) => {
                warn!(
                    "persisted session under `{}` is unreadable ({err}); starting empty",
                    self.config.storage_key
                );
                SessionSnapshot::default()
            }
        };
    }

    /// Stamps `last_saved` and writes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] when serialization or the write fails.
    pub fn save_session(&mut self) -> Result<(), SessionError> {
        self.snapshot.last_saved = Some(self.clock.now_ms());
        save_typed_with(
            self.store.as_ref(),
            &self.config.storage_key,
            &self.snapshot,
        )?;
        Ok(())
    }

    /// Merges `patch` into the record for `window_id`, appending a new record when none exists.
    pub fn save_window_state(&mut self, window_id: WindowId, patch: WindowStatePatch) {
        let now = self.clock.now_ms();
        if let Some(window) = self.snapshot.windows.iter_mut().find(|w| w.id == window_id) {
            patch.apply(window);
            window.updated_at = now;
            return;
        }
        let mut window = PersistedWindow {
            id: window_id,
            app_id: None,
            title: String::new(),
            rect: WindowRect::new(0, 0, 0, 0),
            restore_rect: None,
            state: WindowState::Normal,
            flags: WindowFlags::default(),
            constraints: WindowConstraints::default(),
            created_at: now,
            updated_at: now,
        };
        patch.apply(&mut window);
        self.snapshot.windows.push(window);
    }

    pub fn window_state(&self, window_id: WindowId) -> Option<&PersistedWindow> {
        self.snapshot.windows.iter().find(|w| w.id == window_id)
    }

    /// Drops the record for `window_id`. Returns `false` when none existed.
    pub fn remove_window_state(&mut self, window_id: WindowId) -> bool {
        let before = self.snapshot.windows.len();
        self.snapshot.windows.retain(|w| w.id != window_id);
        self.snapshot.windows.len() != before
    }

    /// Mirrors the live window set: every open window is upserted in stacking order and records
    /// of windows that are no longer open are dropped.
    pub fn capture_windows(&mut self, windows: &WindowManager) {
        let live = windows.windows();
        self.snapshot
            .windows
            .retain(|persisted| live.iter().any(|w| w.id == persisted.id));
        for record in &live {
            self.save_window_state(record.id, WindowStatePatch::from_record(record));
        }
        self.snapshot.windows.sort_by_key(|persisted| {
            live.iter()
                .position(|w| w.id == persisted.id)
                .unwrap_or(usize::MAX)
        });
    }

    /// Shallow-merges `partial` into the state stored for `app_id`.
    pub fn save_app_state(&mut self, app_id: &str, partial: Map<String, Value>) {
        let now = self.clock.now_ms();
        let record = self
            .snapshot
            .apps
            .entry(app_id.to_string())
            .or_insert_with(|| AppStateRecord {
                state: Map::new(),
                updated_at: now,
            });
        record.state.extend(partial);
        record.updated_at = now;
    }

    pub fn get_app_state(&self, app_id: &str) -> Option<&Map<String, Value>> {
        self.snapshot.apps.get(app_id).map(|record| &record.state)
    }

    pub fn clear_app_state(&mut self, app_id: &str) -> bool {
        self.snapshot.apps.remove(app_id).is_some()
    }

    /// Recreates every persisted window through `windows` using [`default_restore_request`].
    ///
    /// Returns the mapping from persisted ids to the ids of the recreated windows.
    pub fn restore_windows(&mut self, windows: &WindowManager) -> BTreeMap<WindowId, WindowId> {
        self.restore_windows_with(windows, |record| {
            default_restore_request(record).map(|req| (req, WindowHooks::default()))
        })
    }

    /// Recreates every persisted window, letting `resolve` build the request and hooks for each
    /// record (typically by relaunching the record's app).
    ///
    /// A record that fails to resolve is logged and dropped; the remaining records are still
    /// restored. Surviving records are re-keyed to their new window ids.
    pub fn restore_windows_with(
        &mut self,
        windows: &WindowManager,
        mut resolve: impl FnMut(
            &PersistedWindow,
        ) -> Result<(OpenWindowRequest, WindowHooks), SessionError>,
    ) -> BTreeMap<WindowId, WindowId> {
        let mut mapping = BTreeMap::new();
        let mut restored = Vec::with_capacity(self.snapshot.windows.len());
        for record in std::mem::take(&mut self.snapshot.windows) {
            let (req, hooks) = match resolve(&record) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!("skipping window restore: {err}");
                    continue;
                }
            };
            let handle = windows.create_window_with_hooks(req, hooks);
            match record.state {
                WindowState::Normal => {}
                WindowState::Maximized => handle.maximize(),
                WindowState::Minimized => {
                    if record.restore_rect.is_some() {
                        handle.maximize();
                    }
                    handle.minimize();
                }
            }
            debug!("restored {} as {}", record.id, handle.id());
            mapping.insert(record.id, handle.id());
            restored.push(PersistedWindow {
                id: handle.id(),
                ..record
            });
        }
        self.snapshot.windows = restored;
        mapping
    }

    /// Runs the auto-save when its interval has elapsed. Returns `true` when a save ran.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] when the due save fails.
    pub fn tick(&mut self) -> Result<bool, SessionError> {
        if !self.autosave.poll(self.clock.now_ms()) {
            return Ok(false);
        }
        self.save_session()?;
        Ok(true)
    }

    /// Like [`SessionManager::tick`], capturing the live window set before a due save.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] when the due save fails.
    pub fn tick_with(&mut self, windows: &WindowManager) -> Result<bool, SessionError> {
        if !self.autosave.poll(self.clock.now_ms()) {
            return Ok(false);
        }
        self.capture_windows(windows);
        self.save_session()?;
        Ok(true)
    }
}

/// Builds the request that recreates `record` at its saved geometry.
///
/// # Errors
///
/// Returns [`SessionError::InvalidRecord`] when the saved geometry has no area.
pub fn default_restore_request(
    record: &PersistedWindow,
) -> Result<OpenWindowRequest, SessionError> {
    let rect = match record.state {
        WindowState::Normal => record.rect,
        WindowState::Maximized | WindowState::Minimized => {
            record.restore_rect.unwrap_or(record.rect)
        }
    };
    if rect.w <= 0 || rect.h <= 0 {
        return Err(SessionError::InvalidRecord {
            window_id: record.id,
            reason: format!("degenerate geometry {}x{}", rect.w, rect.h),
        });
    }
    let mut req = OpenWindowRequest::new(record.title.clone())
        .with_geometry(rect.x, rect.y, rect.w, rect.h)
        .without_cascade();
    req.app_id = record.app_id.clone();
    req.flags = record.flags;
    req.constraints = Some(record.constraints);
    Ok(req)
}
