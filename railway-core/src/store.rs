//! Persistence of per-tour completed/viewed flags.
//!
//! Keys follow `railway:<tourId>:<completed|viewed>` and values are the literal
//! strings `"true"` / `"false"`, so a browser `localStorage` backend and the
//! in-memory backend used by tests agree on the wire format.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::StorageError;
use crate::tour::TourId;

/// Which persisted flag a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Completed,
    Viewed,
}

impl FlagKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Viewed => "viewed",
        }
    }
}

/// Storage key for a tour flag.
#[must_use]
pub fn storage_key(id: &TourId, kind: FlagKind) -> String {
    format!("railway:{id}:{}", kind.as_str())
}

#[must_use]
pub const fn encode_flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Only the exact string `"true"` counts as set.
#[must_use]
pub fn decode_flag(raw: Option<&str>) -> bool {
    raw == Some("true")
}

/// Abstract key→string store backing the flags.
/// Platform-specific implementations should provide this
pub trait FlagStore {
    type Error: std::error::Error + 'static;

    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Persist `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

impl<T: FlagStore + ?Sized> FlagStore for std::rc::Rc<T> {
    type Error = T::Error;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).write(key, value)
    }
}

/// Best-effort wrapper: failures are logged and degrade to `false` / no-op.
#[derive(Debug, Clone, Default)]
pub struct PersistedFlags<S> {
    store: S,
}

impl<S: FlagStore> PersistedFlags<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read a flag; unavailable storage reads as `false`.
    #[must_use]
    pub fn read(&self, id: &TourId, kind: FlagKind) -> bool {
        let key = storage_key(id, kind);
        match self.store.read(&key) {
            Ok(raw) => decode_flag(raw.as_deref()),
            Err(err) => {
                log::warn!("treating {key} as unset: {err}");
                false
            }
        }
    }

    /// Write a flag; failures are logged and otherwise ignored.
    pub fn write(&self, id: &TourId, kind: FlagKind, value: bool) {
        let key = storage_key(id, kind);
        if let Err(err) = self.store.write(&key, encode_flag(value)) {
            log::warn!("could not persist {key}: {err}");
        }
    }
}

/// In-memory store; survives "reloads" when shared between sessions.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    entries: RefCell<HashMap<String, String>>,
    unavailable: Cell<bool>,
}

impl MemoryFlagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate blocked storage (private browsing, quota, disabled cookies).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl FlagStore for MemoryFlagStore {
    type Error = StorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        if self.unavailable.get() {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason: "storage blocked".to_string(),
            });
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.unavailable.get() {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "storage blocked".to_string(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_railway_prefix() {
        let id = TourId::from("my-custom-trip-1");
        assert_eq!(
            storage_key(&id, FlagKind::Completed),
            "railway:my-custom-trip-1:completed"
        );
        assert_eq!(
            storage_key(&id, FlagKind::Viewed),
            "railway:my-custom-trip-1:viewed"
        );
    }

    #[test]
    fn only_literal_true_decodes_as_set() {
        assert!(decode_flag(Some("true")));
        assert!(!decode_flag(Some("TRUE")));
        assert!(!decode_flag(Some("1")));
        assert!(!decode_flag(None));
    }

    #[test]
    fn writes_literal_strings() {
        let flags = PersistedFlags::new(MemoryFlagStore::new());
        let id = TourId::from("intro");
        flags.write(&id, FlagKind::Viewed, true);
        flags.write(&id, FlagKind::Completed, false);
        assert_eq!(
            flags.store().get("railway:intro:viewed").as_deref(),
            Some("true")
        );
        assert_eq!(
            flags.store().get("railway:intro:completed").as_deref(),
            Some("false")
        );
        assert!(flags.read(&id, FlagKind::Viewed));
        assert!(!flags.read(&id, FlagKind::Completed));
    }

    #[test]
    fn blocked_storage_degrades_to_false() {
        let store = MemoryFlagStore::new();
        store.set_unavailable(true);
        let flags = PersistedFlags::new(store);
        let id = TourId::from("intro");
        flags.write(&id, FlagKind::Completed, true);
        assert!(!flags.read(&id, FlagKind::Completed));
        flags.store().set_unavailable(false);
        assert!(flags.store().is_empty());
    }
}
