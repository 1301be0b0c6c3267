//! Ports (interfaces) for the application layer.
//!
//! The application layer only talks to time, shared maps, durable client
//! storage and language detection through these traits. Infrastructure
//! provides the adapters.

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Infrastructure provides `SystemClock` for production and `MockClock`
/// for tests.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage.
///
/// Implementations must run each `with_entry_mut` call under an exclusive
/// lock on that key, so a read-check-write inside the accessor cannot
/// interleave with another call for the same key.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Builds the value when the key is absent
    /// * `accessor` - Receives the value and `true` if it was just created
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V, bool) -> R;

    /// Read an entry without creating it.
    fn read<Q, F, R>(&self, key: &Q, reader: F) -> Option<R>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

/// Key under which the chosen locale tag is persisted.
pub const PREFERENCE_KEY: &str = "language";

/// Error raised by a durable preference store.
#[derive(Debug)]
pub enum PreferenceStoreError {
    /// Reading or writing the backing file failed
    Io(std::io::Error),
    /// The preferences could not be encoded
    Encode(String),
}

impl fmt::Display for PreferenceStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceStoreError::Io(e) => write!(f, "preference storage I/O error: {}", e),
            PreferenceStoreError::Encode(e) => write!(f, "failed to encode preferences: {}", e),
        }
    }
}

impl std::error::Error for PreferenceStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreferenceStoreError::Io(e) => Some(e),
            PreferenceStoreError::Encode(_) => None,
        }
    }
}

impl From<std::io::Error> for PreferenceStoreError {
    fn from(e: std::io::Error) -> Self {
        PreferenceStoreError::Io(e)
    }
}

/// Port for durable client-side key-value storage.
///
/// Loading never fails: unavailable or corrupt storage reads as "nothing
/// saved". Saving reports errors so callers can log them.
pub trait PreferenceStore: Send + Sync + Debug {
    /// Raw value saved under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Persist `value` under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError>;
}

/// Port for an external language-preference signal, such as the OS locale
/// or a browser's `Accept-Language` header.
pub trait LanguageSignal: Send + Sync + Debug {
    /// The preferred language tag, e.g. `"en-US"`, if one is available.
    fn language_tag(&self) -> Option<String>;
}
