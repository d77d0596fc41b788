//! `localStorage`-backed tour flags.

use railway_core::{FlagStore, StorageError};

use crate::dom::{js_error_message, local_storage};

/// Flag store writing `railway:<id>:<flag>` keys to `window.localStorage`.
///
/// Every call resolves the storage handle again, so a page that blocks
/// storage simply reports errors (which the coordinator logs and ignores).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStorageFlags;

fn storage() -> Result<web_sys::Storage, StorageError> {
    local_storage().map_err(|err| StorageError::Unavailable(js_error_message(&err)))
}

impl FlagStore for LocalStorageFlags {
    type Error = StorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        storage()?
            .get_item(key)
            .map_err(|err| StorageError::ReadFailed {
                key: key.to_string(),
                reason: js_error_message(&err),
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::WriteRejected {
                key: key.to_string(),
                reason: js_error_message(&err),
            })
    }
}
