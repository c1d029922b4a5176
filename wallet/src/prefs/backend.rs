//! Settings backends
//!
//! A backend is the platform-managed persistent store underneath
//! [`PreferencesStore`](super::PreferencesStore). Backends are only ever
//! touched from the committer task, so they take `&mut self` and block.

use super::value::{PrefValue, StoredPreference};
use super::PrefsError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Persistent key/value storage for preferences
pub trait SettingsBackend: Send + 'static {
    /// Load every entry currently stored
    fn load(&self) -> Result<HashMap<String, PrefValue>, PrefsError>;

    /// Insert or overwrite an entry
    fn put(&mut self, name: &str, value: &PrefValue) -> Result<(), PrefsError>;

    /// Remove an entry if present
    fn remove(&mut self, name: &str) -> Result<(), PrefsError>;

    /// Remove every entry
    fn clear(&mut self) -> Result<(), PrefsError>;

    /// Make previous writes durable
    fn flush(&mut self) -> Result<(), PrefsError>;
}

/// Volatile backend. Clones share the same entries, which lets tests look at
/// what actually reached the backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, PrefValue>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that already holds `entries`
    pub fn with_entries(entries: HashMap<String, PrefValue>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Copy of the persisted entries
    pub fn snapshot(&self) -> HashMap<String, PrefValue> {
        self.entries.lock().clone()
    }
}

impl SettingsBackend for MemoryBackend {
    fn load(&self) -> Result<HashMap<String, PrefValue>, PrefsError> {
        Ok(self.snapshot())
    }

    fn put(&mut self, name: &str, value: &PrefValue) -> Result<(), PrefsError> {
        self.entries.lock().insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), PrefsError> {
        self.entries.lock().remove(name);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PrefsError> {
        self.entries.lock().clear();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PrefsError> {
        Ok(())
    }
}

/// Sled-backed settings. Each entry is a bincode [`StoredPreference`].
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    /// Open (or create) the settings database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrefsError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Write a raw record. Used to seed data produced by other writers.
    pub fn put_record(&mut self, name: &str, record: &StoredPreference) -> Result<(), PrefsError> {
        self.db.insert(name.as_bytes(), bincode::serialize(record)?)?;
        Ok(())
    }
}

impl SettingsBackend for SledBackend {
    fn load(&self) -> Result<HashMap<String, PrefValue>, PrefsError> {
        let mut entries = HashMap::new();

        for item in self.db.iter() {
            let (key, bytes) = item?;
            let name = String::from_utf8_lossy(&key).into_owned();

            let record: StoredPreference = match bincode::deserialize(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    warn!(name = %name, "Skipping undecodable preference: {}", e);
                    continue;
                }
            };

            let schema = record.schema;
            match record.into_current() {
                Some(value) => {
                    entries.insert(name, value);
                }
                None => warn!(name = %name, schema, "Skipping preference with unknown schema"),
            }
        }

        debug!("Loaded {} preferences from sled", entries.len());
        Ok(entries)
    }

    fn put(&mut self, name: &str, value: &PrefValue) -> Result<(), PrefsError> {
        self.put_record(name, &StoredPreference::new(value.clone()))
    }

    fn remove(&mut self, name: &str) -> Result<(), PrefsError> {
        self.db.remove(name.as_bytes())?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PrefsError> {
        self.db.clear()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PrefsError> {
        self.db.flush()?;
        Ok(())
    }
}
