//! Preferences Store
//!
//! Typed key/value settings over a [`SettingsBackend`].
//!
//! Reads are served from an in-process cache so a write is visible to the
//! next read immediately. Writes are handed to a single committer task that
//! owns the backend; [`PreferencesStore::flush`] is the completion signal
//! for everything queued before it.
//!
//! Normalization rules:
//! - null/empty strings are stored as `""`
//! - negative ints and longs are stored as `0`
//! - a long read of a value stored as an int widens it

pub mod backend;
pub mod value;

pub use backend::{MemoryBackend, SettingsBackend, SledBackend};
pub use value::{PrefValue, StoredPreference, PREFS_SCHEMA_VERSION};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preference committer has stopped")]
    CommitterStopped,
    #[error("Backend error: {0}")]
    Backend(String),
}

enum WriteOp {
    Put(String, PrefValue),
    Remove(String),
    Clear,
    Flush(oneshot::Sender<Result<(), PrefsError>>),
    Close(oneshot::Sender<Result<(), PrefsError>>),
}

struct Shared {
    cache: RwLock<HashMap<String, PrefValue>>,
    writer: mpsc::UnboundedSender<WriteOp>,
}

/// Handle to the preferences store. Cloning is cheap and all clones see the
/// same values.
#[derive(Clone)]
pub struct PreferencesStore {
    shared: Arc<Shared>,
}

impl PreferencesStore {
    /// Open a store over `backend`, loading its current entries.
    ///
    /// Must be called from within a tokio runtime: the committer runs as a
    /// blocking task.
    pub fn open<B: SettingsBackend>(backend: B) -> Result<Self, PrefsError> {
        let entries = backend.load()?;
        debug!("Opened preferences store with {} entries", entries.len());

        let (writer, rx) = mpsc::unbounded_channel();
        tokio::task::spawn_blocking(move || run_committer(backend, rx));

        Ok(Self {
            shared: Arc::new(Shared {
                cache: RwLock::new(entries),
                writer,
            }),
        })
    }

    /// Volatile store, mostly useful for tests and previews
    pub fn in_memory() -> Result<Self, PrefsError> {
        Self::open(MemoryBackend::new())
    }

    /// Read a string. A missing key yields `default`, with `None` or `""`
    /// both normalized to `""`.
    pub fn get_string(&self, name: &str, default: Option<&str>) -> String {
        let default = normalize_string(default);
        match self.shared.cache.read().get(name) {
            Some(PrefValue::Str(s)) => s.clone(),
            Some(other) => {
                mismatch(name, "string", other);
                default
            }
            None => default,
        }
    }

    /// Store a string; `None` and `""` are both stored as `""`
    pub fn set_string(&self, name: &str, value: Option<&str>) {
        self.write(name, PrefValue::Str(normalize_string(value)));
    }

    pub fn get_int(&self, name: &str, default: i32) -> i32 {
        match self.shared.cache.read().get(name) {
            Some(PrefValue::Int(v)) => *v,
            Some(other) => {
                mismatch(name, "int", other);
                default
            }
            None => default,
        }
    }

    /// Store an int, clamping negatives to zero
    pub fn set_int(&self, name: &str, value: i32) {
        self.write(name, PrefValue::Int(value.max(0)));
    }

    /// Read a long. Entries written as ints by older writers are widened.
    pub fn get_long(&self, name: &str, default: i64) -> i64 {
        match self.shared.cache.read().get(name) {
            Some(PrefValue::Long(v)) => *v,
            Some(PrefValue::Int(v)) => i64::from(*v),
            Some(other) => {
                mismatch(name, "long", other);
                default
            }
            None => default,
        }
    }

    /// Store a long, clamping negatives to zero
    pub fn set_long(&self, name: &str, value: i64) {
        self.write(name, PrefValue::Long(value.max(0)));
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.shared.cache.read().get(name) {
            Some(PrefValue::Bool(v)) => *v,
            Some(other) => {
                mismatch(name, "bool", other);
                default
            }
            None => default,
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.write(name, PrefValue::Bool(value));
    }

    /// Raw typed value, if any
    pub fn get_value(&self, name: &str) -> Option<PrefValue> {
        self.shared.cache.read().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.shared.cache.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) {
        let mut cache = self.shared.cache.write();
        cache.remove(name);
        self.send(WriteOp::Remove(name.to_string()));
    }

    pub fn clear(&self) {
        let mut cache = self.shared.cache.write();
        cache.clear();
        self.send(WriteOp::Clear);
    }

    /// Wait until every write issued before this call has reached the
    /// backend and been flushed.
    ///
    /// Returns the first backend error seen since the previous flush.
    pub async fn flush(&self) -> Result<(), PrefsError> {
        let (tx, rx) = oneshot::channel();
        self.shared
            .writer
            .send(WriteOp::Flush(tx))
            .map_err(|_| PrefsError::CommitterStopped)?;
        rx.await.map_err(|_| PrefsError::CommitterStopped)?
    }

    /// Flush and release the backend.
    ///
    /// Writes made afterwards through other clones stay in memory only.
    pub async fn close(self) -> Result<(), PrefsError> {
        let (tx, rx) = oneshot::channel();
        self.shared
            .writer
            .send(WriteOp::Close(tx))
            .map_err(|_| PrefsError::CommitterStopped)?;
        rx.await.map_err(|_| PrefsError::CommitterStopped)?
    }

    /// Cache updates and queued backend ops happen under the same guard so
    /// the backend sees writes in cache order.
    fn write(&self, name: &str, value: PrefValue) {
        let mut cache = self.shared.cache.write();
        cache.insert(name.to_string(), value.clone());
        self.send(WriteOp::Put(name.to_string(), value));
    }

    fn send(&self, op: WriteOp) {
        if self.shared.writer.send(op).is_err() {
            error!("Preference committer has stopped; write kept in memory only");
        }
    }
}

fn normalize_string(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => String::new(),
    }
}

fn mismatch(name: &str, requested: &str, stored: &PrefValue) {
    warn!(
        name = %name,
        requested,
        stored = stored.kind(),
        "Preference type mismatch, using default"
    );
}

fn run_committer<B: SettingsBackend>(mut backend: B, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    let mut first_error: Option<PrefsError> = None;

    while let Some(op) = rx.blocking_recv() {
        let result = match op {
            WriteOp::Put(name, value) => backend.put(&name, &value),
            WriteOp::Remove(name) => backend.remove(&name),
            WriteOp::Clear => backend.clear(),
            WriteOp::Flush(reply) => {
                let flushed = backend.flush();
                let outcome = match first_error.take() {
                    Some(e) => Err(e),
                    None => flushed,
                };
                let _ = reply.send(outcome);
                continue;
            }
            WriteOp::Close(reply) => {
                let flushed = backend.flush();
                drop(backend);
                let outcome = match first_error.take() {
                    Some(e) => Err(e),
                    None => flushed,
                };
                debug!("Preference committer closed");
                let _ = reply.send(outcome);
                return;
            }
        };

        if let Err(e) = result {
            error!("Failed to persist preference: {}", e);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    if let Err(e) = backend.flush() {
        error!("Final preference flush failed: {}", e);
    }
    debug!("Preference committer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_negative_numbers_are_clamped() {
        let prefs = PreferencesStore::in_memory().unwrap();

        prefs.set_long("backup_date", -5);
        assert_eq!(prefs.get_long("backup_date", 0), 0);

        prefs.set_int("attempts", -1);
        assert_eq!(prefs.get_int("attempts", 42), 0);

        prefs.set_int("attempts", 3);
        assert_eq!(prefs.get_int("attempts", 0), 3);
    }

    #[tokio::test]
    async fn test_string_normalization() {
        let prefs = PreferencesStore::in_memory().unwrap();

        prefs.set_string("guid", None);
        assert_eq!(prefs.get_string("guid", Some("fallback")), "");

        prefs.set_string("email", Some(""));
        assert!(prefs.has("email"));
        assert_eq!(prefs.get_string("email", Some("x")), "");

        assert_eq!(prefs.get_string("missing", None), "");
        assert_eq!(prefs.get_string("missing", Some("")), "");
        assert_eq!(prefs.get_string("missing", Some("dflt")), "dflt");
    }

    #[tokio::test]
    async fn test_long_read_widens_int() {
        let mut seeded = HashMap::new();
        seeded.insert("backup_date".to_string(), PrefValue::Int(1_700_000));
        let prefs = PreferencesStore::open(MemoryBackend::with_entries(seeded)).unwrap();

        assert_eq!(prefs.get_long("backup_date", 0), 1_700_000);
    }

    #[tokio::test]
    async fn test_type_mismatch_returns_default() {
        let prefs = PreferencesStore::in_memory().unwrap();

        prefs.set_bool("onboarded", true);
        assert_eq!(prefs.get_int("onboarded", 7), 7);
        assert_eq!(prefs.get_string("onboarded", Some("no")), "no");

        prefs.set_long("big", 5_000_000_000);
        assert_eq!(prefs.get_int("big", -1), -1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let backend = MemoryBackend::new();
        let prefs = PreferencesStore::open(backend.clone()).unwrap();

        prefs.set_bool("a", true);
        prefs.set_int("b", 2);
        prefs.remove("a");
        assert!(!prefs.has("a"));
        assert!(prefs.has("b"));

        prefs.flush().await.unwrap();
        assert_eq!(backend.snapshot().len(), 1);

        prefs.clear();
        assert!(!prefs.has("b"));
        prefs.flush().await.unwrap();
        assert!(backend.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_flush_waits_for_queued_writes() {
        let backend = MemoryBackend::new();
        let prefs = PreferencesStore::open(backend.clone()).unwrap();

        for i in 0..100 {
            prefs.set_int(&format!("k{}", i), i);
        }
        prefs.flush().await.unwrap();

        let persisted = backend.snapshot();
        assert_eq!(persisted.len(), 100);
        assert_eq!(persisted.get("k99"), Some(&PrefValue::Int(99)));
    }

    struct FailingBackend;

    impl SettingsBackend for FailingBackend {
        fn load(&self) -> Result<HashMap<String, PrefValue>, PrefsError> {
            Ok(HashMap::new())
        }
        fn put(&mut self, _name: &str, _value: &PrefValue) -> Result<(), PrefsError> {
            Err(PrefsError::Backend("disk full".to_string()))
        }
        fn remove(&mut self, _name: &str) -> Result<(), PrefsError> {
            Ok(())
        }
        fn clear(&mut self) -> Result<(), PrefsError> {
            Ok(())
        }
        fn flush(&mut self) -> Result<(), PrefsError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_flush_reports_backend_failure_once() {
        let prefs = PreferencesStore::open(FailingBackend).unwrap();

        prefs.set_string("label", Some("savings"));
        // Still readable in-process
        assert_eq!(prefs.get_string("label", None), "savings");

        let err = prefs.flush().await.unwrap_err();
        assert!(err.to_string().contains("disk full"));

        // Error was consumed by the previous flush
        prefs.flush().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_backend_matches_cache_under_concurrent_writers() {
        let backend = MemoryBackend::new();
        let prefs = PreferencesStore::open(backend.clone()).unwrap();
        let names = ["a", "b", "c"];

        for round in 0..100 {
            std::thread::scope(|scope| {
                for worker in 0..4i32 {
                    let prefs = prefs.clone();
                    scope.spawn(move || {
                        for (i, name) in names.iter().enumerate() {
                            if (worker + i as i32 + round) % 5 == 0 {
                                prefs.clear();
                            } else {
                                prefs.set_int(name, worker * 10 + i as i32);
                            }
                        }
                    });
                }
            });
            prefs.flush().await.unwrap();

            let stored = backend.snapshot();
            for name in names {
                assert_eq!(stored.get(name), prefs.get_value(name).as_ref(), "round {}", round);
            }
        }
    }
}
