pub mod config;
pub mod host;
pub mod model;
pub mod reducer;
pub mod runtime;
pub mod session;
pub mod shortcuts;
pub mod window_manager;

pub use config::{ConfigError, DesktopConfig};
pub use host::{DesktopHost, HostError, TickReport};
pub use model::*;
pub use reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};
pub use runtime::{ListenerId, WeakWindowManager, WindowHandle, WindowHooks, WindowManager};
pub use session::{
    default_restore_request, AppStateRecord, PersistedWindow, SessionConfig, SessionError,
    SessionManager, SessionSnapshot, WindowStatePatch, DEFAULT_SESSION_AUTOSAVE_INTERVAL_MS,
    SESSION_STORAGE_KEY,
};
pub use shortcuts::{command_for_chord, KeyChord, WindowCommand};
