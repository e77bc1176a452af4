use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::error::MirrorError;

/// Version written into every mirror file.
pub const SCHEMA_VERSION: u32 = 1;

/// On-disk wrapper around one named collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirroredData<T> {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub records: T,
}

impl<T> MirroredData<T> {
    pub fn new(records: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            records,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

impl<T: DeserializeOwned> MirroredData<T> {
    /// Decode a mirror document.
    ///
    /// A bare JSON array is a pre-envelope (version 0) file and is accepted
    /// with `saved_at` unknown (reported as the epoch).
    pub fn decode(name: &str, value: Value) -> Result<Self, MirrorError> {
        if value.is_array() {
            let records = serde_json::from_value(value).map_err(|e| MirrorError::json(name, e))?;
            return Ok(Self {
                schema_version: 0,
                saved_at: DateTime::<Utc>::default(),
                records,
            });
        }

        let found = value
            .get("schema_version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        if found > SCHEMA_VERSION {
            return Err(MirrorError::UnsupportedSchema {
                name: name.to_string(),
                found,
                supported: SCHEMA_VERSION,
            });
        }

        serde_json::from_value(value).map_err(|e| MirrorError::json(name, e))
    }
}
