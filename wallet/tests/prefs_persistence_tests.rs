//! Preferences Persistence Tests
//!
//! Values written through a sled-backed store must survive closing and
//! reopening the database, keeping their normalization and type tags.

use tempfile::tempdir;
use wallet_ui::prefs::{PrefValue, PreferencesStore, SledBackend};

#[tokio::test]
async fn test_values_survive_reopen() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("prefs.db");

    let prefs = PreferencesStore::open(SledBackend::open(&path).unwrap()).unwrap();
    prefs.set_string("fiat", Some("EUR"));
    prefs.set_string("label", None);
    prefs.set_int("legacy_date", 1_600_000_000);
    prefs.set_long("backup_date", -20);
    prefs.set_bool("pin_enabled", true);
    prefs.close().await.expect("Failed to close store");

    let reopened = PreferencesStore::open(SledBackend::open(&path).unwrap()).unwrap();
    assert_eq!(reopened.get_string("fiat", None), "EUR");
    assert_eq!(reopened.get_value("label"), Some(PrefValue::Str(String::new())));
    assert_eq!(reopened.get_value("legacy_date"), Some(PrefValue::Int(1_600_000_000)));
    // Stored as an int, read back as a long
    assert_eq!(reopened.get_long("legacy_date", 0), 1_600_000_000);
    assert_eq!(reopened.get_long("backup_date", 7), 0);
    assert!(reopened.get_bool("pin_enabled", false));
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn test_remove_and_clear_are_persisted() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("prefs.db");

    let prefs = PreferencesStore::open(SledBackend::open(&path).unwrap()).unwrap();
    prefs.set_string("a", Some("1"));
    prefs.set_string("b", Some("2"));
    prefs.remove("a");
    prefs.close().await.unwrap();

    let reopened = PreferencesStore::open(SledBackend::open(&path).unwrap()).unwrap();
    assert!(!reopened.has("a"));
    assert!(reopened.has("b"));
    reopened.clear();
    reopened.close().await.unwrap();

    let cleared = PreferencesStore::open(SledBackend::open(&path).unwrap()).unwrap();
    assert!(!cleared.has("b"));
    cleared.close().await.unwrap();
}

#[tokio::test]
async fn test_clones_share_values() {
    let prefs = PreferencesStore::in_memory().unwrap();
    let other = prefs.clone();

    other.set_int("count", 3);
    assert_eq!(prefs.get_int("count", 0), 3);
    prefs.flush().await.unwrap();
}
