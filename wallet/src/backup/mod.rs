//! Wallet backup status
//!
//! The backup flow records the time of the last successful backup in the
//! preferences store; the backup-complete screen reads it back.

pub mod complete;

pub use complete::{BackupCompleteScreen, BackupCompleteView, ScreenEvent, TransferPrompt};

use crate::prefs::PreferencesStore;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Preference key holding the last backup time in unix seconds
pub const BACKUP_DATE_KEY: &str = "backup_date";

/// e.g. "Mar 07, 2024"
pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y";

/// Record a completed backup
pub fn record_backup(prefs: &PreferencesStore, at: DateTime<Utc>) {
    info!("Recording wallet backup at {}", at.to_rfc3339());
    prefs.set_long(BACKUP_DATE_KEY, at.timestamp());
}

/// Time of the last backup, if one was ever recorded
pub fn last_backup(prefs: &PreferencesStore) -> Option<DateTime<Utc>> {
    match prefs.get_long(BACKUP_DATE_KEY, 0) {
        0 => None,
        secs => DateTime::from_timestamp(secs, 0),
    }
}

/// "Last backed up on <date>", or `None` when no backup was recorded
pub fn last_backup_message(prefs: &PreferencesStore, date_format: &str) -> Option<String> {
    last_backup(prefs).map(|at| format!("Last backed up on {}", format_date(at, date_format)))
}

/// Whether `format` is a usable strftime pattern
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn format_date(at: DateTime<Utc>, date_format: &str) -> String {
    if is_valid_date_format(date_format) {
        at.format(date_format).to_string()
    } else {
        warn!(date_format, "Invalid date format, using default");
        at.format(DEFAULT_DATE_FORMAT).to_string()
    }
}
