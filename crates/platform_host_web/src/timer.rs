//! `window.setInterval` wrapper owning its callback closure.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

/// A running browser interval; the interval is cleared when the handle is dropped.
pub struct IntervalHandle {
    #[cfg(target_arch = "wasm32")]
    id: i32,
    #[cfg(target_arch = "wasm32")]
    _callback: Closure<dyn FnMut()>,
    interval_ms: u32,
}

impl IntervalHandle {
    /// Schedules `callback` every `interval_ms` milliseconds.
    ///
    /// Returns `None` when no browser window is available (always the case outside `wasm32`).
    pub fn start(interval_ms: u32, callback: impl FnMut() + 'static) -> Option<Self> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window()?;
            let callback = Closure::<dyn FnMut()>::wrap(Box::new(callback));
            let id = window
                .set_interval_with_callback_and_timeout_and_arguments_0(
                    callback.as_ref().unchecked_ref(),
                    interval_ms as i32,
                )
                .map_err(|e| log::warn!("setInterval failed: {e:?}"))
                .ok()?;
            Some(Self {
                id,
                _callback: callback,
                interval_ms,
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (interval_ms, callback);
            None
        }
    }

    /// Returns the interval period.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        #[cfg(target_arch = "wasm32")]
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.id);
        }
    }
}
