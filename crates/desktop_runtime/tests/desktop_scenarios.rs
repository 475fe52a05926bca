use std::rc::Rc;

use desktop_runtime::{
    CycleDirection, DesktopConfig, DesktopHost, KeyChord, OpenWindowRequest, WindowManager,
    WindowRect, WindowState, CASCADE_STEP,
};
use platform_host::{FsEntryKind, FsError, ManualClock, MemoryKeyValueStore, VirtualFs};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fresh_fs() -> VirtualFs {
    VirtualFs::load(
        Rc::new(MemoryKeyValueStore::default()),
        Rc::new(ManualClock::new(1_000)),
        Default::default(),
    )
}

#[test]
fn second_window_cascades_and_focus_order_follows_clicks() {
    init_logging();
    let windows = WindowManager::default();
    let a = windows.create_window(OpenWindowRequest::new("A").with_geometry(100, 100, 800, 600));
    let b = windows.create_window(OpenWindowRequest::new("B").with_geometry(100, 100, 800, 600));

    let rect_b = b.record().expect("B").rect;
    assert_eq!(
        rect_b,
        WindowRect::new(100 + CASCADE_STEP, 100 + CASCADE_STEP, 800, 600)
    );

    a.focus();
    b.focus();
    a.focus();

    let state = windows.state();
    assert_eq!(state.active_window, Some(a.id()));
    assert_eq!(state.topmost_visible(), Some(a.id()));
    let z = |id| state.window(id).map(|w| w.z_index).unwrap_or_default();
    assert!(z(a.id()) > z(b.id()));
}

#[test]
fn keyboard_cycling_walks_the_stack() {
    init_logging();
    let windows = WindowManager::default();
    let a = windows.create_window(OpenWindowRequest::new("A"));
    let b = windows.create_window(OpenWindowRequest::new("B"));
    let c = windows.create_window(OpenWindowRequest::new("C"));
    let hidden = windows.create_window(OpenWindowRequest::new("hidden"));
    hidden.minimize();
    assert_eq!(windows.active_window(), Some(c.id()));

    // Forward from the topmost window wraps to the bottom of the visible stack.
    assert!(windows.handle_key(&KeyChord::alt("Tab")));
    assert_eq!(windows.active_window(), Some(a.id()));
    windows.cycle_windows(CycleDirection::Forward);
    assert_eq!(windows.active_window(), Some(b.id()));
    windows.cycle_windows(CycleDirection::Forward);
    assert_eq!(windows.active_window(), Some(c.id()));

    assert!(windows.handle_key(&KeyChord::alt("Tab").with_shift()));
    assert_eq!(windows.active_window(), Some(b.id()));
    windows.cycle_windows(CycleDirection::Backward);
    assert_eq!(windows.active_window(), Some(a.id()));
    windows.cycle_windows(CycleDirection::Backward);
    assert_eq!(windows.active_window(), Some(c.id()));

    let hidden = hidden.record().expect("hidden");
    assert_eq!(hidden.state, WindowState::Minimized);
}

#[test]
fn minimize_and_maximize_round_trips_preserve_geometry() {
    init_logging();
    let windows = WindowManager::default();
    let handle =
        windows.create_window(OpenWindowRequest::new("editor").with_geometry(150, 90, 500, 320));
    let before = handle.record().expect("editor").rect;

    handle.minimize();
    assert_eq!(windows.active_window(), None);
    handle.restore();
    let record = handle.record().expect("editor");
    assert_eq!((record.state, record.rect), (WindowState::Normal, before));

    handle.maximize();
    handle.restore();
    let record = handle.record().expect("editor");
    assert_eq!((record.state, record.rect), (WindowState::Normal, before));

    handle.resize(1, 1);
    let rect = handle.record().expect("editor").rect;
    assert_eq!((rect.w, rect.h), (220, 140));
}

#[test]
fn directory_listing_and_move_scenario() {
    init_logging();
    let mut fs = fresh_fs();
    fs.create_directory("/home/docs").expect("mkdir");
    fs.create_file("/home/docs/a.txt", "hello").expect("create");

    let entries = fs.read_dir("/home/docs").expect("readdir");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "a.txt");
    assert_eq!(entries[0].kind, FsEntryKind::File);
    assert_eq!(entries[0].size, Some(5));

    fs.move_file("/home/docs/a.txt", "/home/b.txt").expect("move");
    assert!(!fs.exists("/home/docs/a.txt"));
    assert_eq!(fs.read_file("/home/b.txt").expect("read"), "hello");
}

#[test]
fn delete_guards_and_absence() {
    init_logging();
    let mut fs = fresh_fs();
    fs.create_directory("/tmp/work").expect("mkdir");
    fs.write_file("/tmp/work/notes.md", "").expect("write");

    assert!(matches!(
        fs.delete_directory("/tmp/work", false),
        Err(FsError::NotEmpty { .. })
    ));
    fs.delete_file("/tmp/work/notes.md").expect("rm");
    assert!(!fs.exists("/tmp/work/notes.md"));
    assert!(matches!(
        fs.read_file("/tmp/work/notes.md"),
        Err(FsError::NotFound { .. })
    ));
    fs.delete_directory("/tmp/work", false).expect("rmdir");
}

#[test]
fn host_reboot_restores_session_and_files() {
    init_logging();
    let store = MemoryKeyValueStore::default();
    let clock = ManualClock::new(0);
    let boot = || {
        DesktopHost::boot(
            DesktopConfig::default(),
            Rc::new(store.clone()),
            Rc::new(clock.clone()),
        )
    };

    {
        let host = boot();
        let calc = host
            .windows()
            .create_window(OpenWindowRequest::new("Calculator").with_app_id("calculator"));
        calc.maximize();
        host.session().borrow_mut().save_app_state(
            "calculator",
            serde_json::json!({ "display": "42" })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        host.fs()
            .borrow_mut()
            .create_file("/home/user/result.txt", "42")
            .expect("create");
        host.save_now().expect("save");
    }

    let host = boot();
    let windows = host.windows().windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].app_id.as_deref(), Some("calculator"));
    assert_eq!(windows[0].state, WindowState::Maximized);
    assert_eq!(
        host.session()
            .borrow()
            .get_app_state("calculator")
            .and_then(|state| state.get("display").cloned()),
        Some(serde_json::json!("42"))
    );
    assert_eq!(
        host.fs()
            .borrow()
            .read_file("/home/user/result.txt")
            .expect("read"),
        "42"
    );
}
