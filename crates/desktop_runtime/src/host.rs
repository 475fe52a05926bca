//! Desktop host: boots the filesystem, session, and window manager over one storage backend and
//! drives their periodic saves.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use log::{debug, info, warn};
use platform_host::{Clock, FsError, KeyValueStore, SystemClock, VirtualFs};
use platform_host_web::{IntervalHandle, WebLocalStorage};
use thiserror::Error;

use crate::{
    config::DesktopConfig,
    model::WindowId,
    reducer::RuntimeEffect,
    runtime::WindowManager,
    session::{SessionError, SessionManager},
};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which periodic saves ran during a [`DesktopHost::tick`].
pub struct TickReport {
    pub vfs_saved: bool,
    pub session_saved: bool,
}

pub struct DesktopHost {
    config: DesktopConfig,
    windows: WindowManager,
    fs: Rc<RefCell<VirtualFs>>,
    session: Rc<RefCell<SessionManager>>,
    restored: BTreeMap<WindowId, WindowId>,
    timers: Vec<IntervalHandle>,
}

impl DesktopHost {
    /// Boots every service over `store`, restoring persisted windows when the session config
    /// asks for it.
    pub fn boot(config: DesktopConfig, store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        let fs = VirtualFs::load(Rc::clone(&store), Rc::clone(&clock), config.vfs.clone());
        info!(
            "filesystem ready ({:?}), cwd {}",
            fs.boot_source(),
            fs.current_directory()
        );

        let windows = WindowManager::new(config.viewport, config.placement);
        let session = Rc::new(RefCell::new(SessionManager::load(
            store,
            clock,
            config.session.clone(),
        )));

        let restored = if config.session.restore_on_boot {
            let mut session = session.borrow_mut();
            let mapping = session.restore_windows(&windows);
            session.capture_windows(&windows);
            mapping
        } else {
            BTreeMap::new()
        };
        info!("desktop booted with {} restored window(s)", restored.len());

        {
            let session = Rc::clone(&session);
            let observed = windows.downgrade();
            windows.subscribe(move |effect| {
                if !matches!(effect, RuntimeEffect::PersistLayout) {
                    return;
                }
                let Some(observed) = observed.upgrade() else {
                    return;
                };
                match session.try_borrow_mut() {
                    Ok(mut session) => session.capture_windows(&observed),
                    Err(_) => debug!("session busy; layout capture deferred"),
                }
            });
        }

        Self {
            config,
            windows,
            fs: Rc::new(RefCell::new(fs)),
            session,
            restored,
            timers: Vec::new(),
        }
    }

    /// Boots over browser `localStorage` and the system clock, with auto-save timers installed.
    pub fn boot_browser(config: DesktopConfig) -> Self {
        let mut host = Self::boot(config, Rc::new(WebLocalStorage), Rc::new(SystemClock));
        host.install_autosave_timers();
        host
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn fs(&self) -> &Rc<RefCell<VirtualFs>> {
        &self.fs
    }

    pub fn session(&self) -> &Rc<RefCell<SessionManager>> {
        &self.session
    }

    /// Maps persisted window ids to the windows recreated at boot.
    pub fn restored_windows(&self) -> &BTreeMap<WindowId, WindowId> {
        &self.restored
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Runs whichever periodic saves are due. Failures are logged and retried next interval.
    pub fn tick(&self) -> TickReport {
        TickReport {
            vfs_saved: tick_fs(&self.fs),
            session_saved: tick_session(&self.session, &self.windows),
        }
    }

    /// Persists the filesystem and the live session immediately.
    ///
    /// Both saves are attempted; the first failure is returned.
    pub fn save_now(&self) -> Result<(), HostError> {
        let fs_result = self.fs.borrow().persist();
        let session_result = {
            let mut session = self.session.borrow_mut();
            session.capture_windows(&self.windows);
            session.save_session()
        };
        fs_result?;
        session_result?;
        Ok(())
    }

    /// Starts browser intervals that poll each service's auto-save. Returns how many started;
    /// outside the browser none do and the host must be ticked manually.
    pub fn install_autosave_timers(&mut self) -> usize {
        self.timers.clear();

        let vfs_interval = interval_u32(self.config.vfs.autosave_interval_ms);
        let fs = Rc::clone(&self.fs);
        if let Some(timer) = IntervalHandle::start(vfs_interval, move || {
            tick_fs(&fs);
        }) {
            self.timers.push(timer);
        }

        let session_interval = interval_u32(self.config.session.autosave_interval_ms);
        let session = Rc::clone(&self.session);
        let windows = self.windows.clone();
        if let Some(timer) = IntervalHandle::start(session_interval, move || {
            tick_session(&session, &windows);
        }) {
            self.timers.push(timer);
        }

        debug!("installed {} autosave timer(s)", self.timers.len());
        self.timers.len()
    }
}

fn interval_u32(interval_ms: u64) -> u32 {
    u32::try_from(interval_ms).unwrap_or(u32::MAX)
}

fn tick_fs(fs: &RefCell<VirtualFs>) -> bool {
    let Ok(mut fs) = fs.try_borrow_mut() else {
        debug!("filesystem busy; autosave skipped");
        return false;
    };
    match fs.tick() {
        Ok(saved) => saved,
        Err(err) => {
            warn!("filesystem autosave failed: {err}");
            false
        }
    }
}

fn tick_session(session: &RefCell<SessionManager>, windows: &WindowManager) -> bool {
    let Ok(mut session) = session.try_borrow_mut() else {
        debug!("session busy; autosave skipped");
        return false;
    };
    match session.tick_with(windows) {
        Ok(saved) => saved,
        Err(err) => {
            warn!("session autosave failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use platform_host::{ManualClock, MemoryKeyValueStore, NoopKeyValueStore, VfsBootSource};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        model::{OpenWindowRequest, WindowRect, WindowState},
        session::DEFAULT_SESSION_AUTOSAVE_INTERVAL_MS,
    };

    fn boot(store: &MemoryKeyValueStore, clock: &ManualClock) -> DesktopHost {
        DesktopHost::boot(
            DesktopConfig::default(),
            Rc::new(store.clone()),
            Rc::new(clock.clone()),
        )
    }

    #[test]
    fn first_boot_seeds_filesystem_and_starts_empty() {
        let store = MemoryKeyValueStore::default();
        let host = boot(&store, &ManualClock::new(0));
        assert_eq!(host.fs().borrow().boot_source(), VfsBootSource::Seeded);
        assert!(host.windows().windows().is_empty());
        assert!(host.restored_windows().is_empty());
    }

    #[test]
    fn layout_survives_a_reboot() {
        let store = MemoryKeyValueStore::default();
        let clock = ManualClock::new(0);
        let terminal_rect = {
            let host = boot(&store, &clock);
            let notes = host
                .windows()
                .create_window(OpenWindowRequest::new("notes").with_geometry(40, 60, 500, 300));
            let terminal = host.windows().create_window(
                OpenWindowRequest::new("terminal").with_geometry(300, 200, 400, 300),
            );
            notes.minimize();
            host.fs()
                .borrow_mut()
                .write_file("todo.txt", "ship it")
                .expect("write");
            host.save_now().expect("save");
            terminal.record().expect("terminal").rect
        };
        // The second window opened with one cascade step applied.
        assert_eq!(terminal_rect, WindowRect::new(320, 220, 400, 300));

        let host = boot(&store, &clock);
        assert_eq!(host.fs().borrow().boot_source(), VfsBootSource::Restored);
        assert_eq!(
            host.fs().borrow().read_file("todo.txt").expect("read"),
            "ship it"
        );
        let windows = host.windows().windows();
        let titles: Vec<_> = windows.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["notes", "terminal"]);
        assert_eq!(windows[0].state, WindowState::Minimized);
        assert_eq!(windows[1].rect, terminal_rect);
        assert_eq!(host.restored_windows().len(), 2);
    }

    #[test]
    fn restore_can_be_disabled() {
        let store = MemoryKeyValueStore::default();
        let clock = ManualClock::new(0);
        {
            let host = boot(&store, &clock);
            host.windows().create_window(OpenWindowRequest::new("a"));
            host.save_now().expect("save");
        }
        let mut config = DesktopConfig::default();
        config.session.restore_on_boot = false;
        let host = DesktopHost::boot(config, Rc::new(store), Rc::new(clock));
        assert!(host.windows().windows().is_empty());
    }

    #[test]
    fn layout_changes_are_captured_into_the_session() {
        let store = MemoryKeyValueStore::default();
        let host = boot(&store, &ManualClock::new(0));
        let handle = host.windows().create_window(OpenWindowRequest::new("a"));
        handle.maximize();
        let session = host.session().borrow();
        let persisted = session.window_state(handle.id()).expect("captured");
        assert_eq!(persisted.state, WindowState::Maximized);
    }

    #[test]
    fn tick_runs_due_saves_only() {
        let store = MemoryKeyValueStore::default();
        let clock = ManualClock::new(0);
        let host = boot(&store, &clock);
        assert_eq!(host.tick(), TickReport::default());

        clock.advance(DEFAULT_SESSION_AUTOSAVE_INTERVAL_MS);
        assert_eq!(
            host.tick(),
            TickReport {
                vfs_saved: false,
                session_saved: true,
            }
        );
    }

    #[test]
    fn timers_do_not_start_outside_the_browser() {
        let mut host = DesktopHost::boot(
            DesktopConfig::default(),
            Rc::new(NoopKeyValueStore),
            Rc::new(ManualClock::new(0)),
        );
        assert_eq!(host.install_autosave_timers(), 0);
        assert_eq!(host.timer_count(), 0);
    }
}
