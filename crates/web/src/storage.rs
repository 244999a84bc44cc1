//! `window.localStorage` session backend.

use web_sys::Storage;
use zkauth::{StorageBackend, StorageError};

use crate::describe_js_error;

/// Persists the session in `localStorage`.
///
/// Every call looks the storage up again, so a store disabled mid-session
/// reads as "not connected" instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<Storage, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        window
            .local_storage()
            .map_err(|err| StorageError::Unavailable(describe_js_error(&err)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

impl StorageBackend for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| StorageError::Rejected(describe_js_error(&err)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Rejected(describe_js_error(&err)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| StorageError::Rejected(describe_js_error(&err)))
    }
}
