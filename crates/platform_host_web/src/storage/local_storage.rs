//! `localStorage`-backed [`KeyValueStore`] implementation.

use platform_host::{KeyValueStore, StorageError};

#[derive(Debug, Clone, Copy, Default)]
/// Key-value store backed by `window.localStorage`.
///
/// Outside `wasm32` every read misses and every write reports [`StorageError::Unavailable`].
pub struct WebLocalStorage;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StorageError::Unavailable)
}

impl KeyValueStore for WebLocalStorage {
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| StorageError::Backend(format!("localStorage get_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw_json)
                .map_err(|e| StorageError::Backend(format!("localStorage set_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Err(StorageError::Unavailable)
        }
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?.remove_item(key).map_err(|e| {
                StorageError::Backend(format!("localStorage remove_item failed: {e:?}"))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Err(StorageError::Unavailable)
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn non_wasm_store_misses_reads_and_rejects_writes() {
        let store = WebLocalStorage;
        assert!(matches!(store.load_raw("k"), Ok(None)));
        assert!(matches!(
            store.save_raw("k", "{}"),
            Err(StorageError::Unavailable)
        ));
    }
}
