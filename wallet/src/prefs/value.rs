use serde::{Deserialize, Serialize};

/// Current layout of a persisted preference record.
pub const PREFS_SCHEMA_VERSION: u16 = 1;

/// A single typed preference value.
///
/// The variant is the stored type tag: readers decide how to interpret a
/// value from the tag instead of guessing from the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefValue {
    Str(String),
    Int(i32),
    Long(i64),
    Bool(bool),
}

impl PrefValue {
    /// Name of the stored type, used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Str(_) => "string",
            PrefValue::Int(_) => "int",
            PrefValue::Long(_) => "long",
            PrefValue::Bool(_) => "bool",
        }
    }
}

impl std::fmt::Display for PrefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefValue::Str(s) => write!(f, "{}", s),
            PrefValue::Int(v) => write!(f, "{}", v),
            PrefValue::Long(v) => write!(f, "{}", v),
            PrefValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Versioned envelope written by persistent backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreference {
    pub schema: u16,
    pub value: PrefValue,
}

impl StoredPreference {
    pub fn new(value: PrefValue) -> Self {
        Self {
            schema: PREFS_SCHEMA_VERSION,
            value,
        }
    }

    /// Unwrap the value if this record was written with a schema we understand
    pub fn into_current(self) -> Option<PrefValue> {
        if self.schema == PREFS_SCHEMA_VERSION {
            Some(self.value)
        } else {
            None
        }
    }
}
