use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::envelope::MirroredData;
use super::error::MirrorError;
use super::{MirrorPort, SCREENING_COLLECTION};
use crate::models::{ScreeningRecord, SessionKind, SessionRecord};

/// JSON file mirror: one `<name>.json` document per collection.
pub struct JsonMirror {
    data_dir: PathBuf,
}

impl JsonMirror {
    pub fn new(data_dir: PathBuf) -> Result<Self, MirrorError> {
        fs::create_dir_all(&data_dir).map_err(|e| MirrorError::io("data directory", e))?;
        Ok(Self { data_dir })
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<MirroredData<T>>, MirrorError> {
        let path = self.collection_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| MirrorError::io(name, e))?;
        let value = serde_json::from_str(&contents).map_err(|e| MirrorError::json(name, e))?;
        let data = MirroredData::decode(name, value)?;
        debug!(
            collection = name,
            schema_version = data.schema_version,
            "Loaded mirror collection"
        );
        Ok(Some(data))
    }

    /// Write the whole collection to a sibling temp file, flush it to disk
    /// and rename it over the previous document.
    fn save<T: Serialize>(&self, name: &str, records: &T) -> Result<(), MirrorError> {
        let mirrored = MirroredData::new(records);
        let contents =
            serde_json::to_string_pretty(&mirrored).map_err(|e| MirrorError::json(name, e))?;

        let path = self.collection_path(name);
        let tmp_path = self.data_dir.join(format!("{}.json.tmp", name));
        {
            let mut file = File::create(&tmp_path).map_err(|e| MirrorError::io(name, e))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| MirrorError::io(name, e))?;
            file.sync_all().map_err(|e| MirrorError::io(name, e))?;
        }
        fs::rename(&tmp_path, &path).map_err(|e| MirrorError::io(name, e))?;
        debug!(collection = name, bytes = contents.len(), "Saved mirror collection");
        Ok(())
    }

    // ===== Mirror Age Information =====

    fn load_age<T: DeserializeOwned>(&self, name: &str) -> Option<String> {
        match self.load::<T>(name) {
            Ok(Some(data)) => Some(data.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(collection = name, error = %e, "Failed to load mirror for age display");
                None
            }
        }
    }

    pub fn get_mirror_ages(&self) -> MirrorAges {
        MirrorAges {
            screening: self.load_age::<Vec<ScreeningRecord>>(SCREENING_COLLECTION),
            fmt_sessions: self.load_age::<Vec<SessionRecord>>(SessionKind::Fmt.collection_name()),
            sm_sessions: self.load_age::<Vec<SessionRecord>>(SessionKind::Sm.collection_name()),
        }
    }
}

impl MirrorPort for JsonMirror {
    fn load_screenings(&self) -> Result<Vec<ScreeningRecord>, MirrorError> {
        Ok(self
            .load(SCREENING_COLLECTION)?
            .map(|data| data.records)
            .unwrap_or_default())
    }

    fn save_screenings(&self, records: &[ScreeningRecord]) -> Result<(), MirrorError> {
        self.save(SCREENING_COLLECTION, &records)
    }

    fn load_sessions(&self, kind: SessionKind) -> Result<Vec<SessionRecord>, MirrorError> {
        Ok(self
            .load(kind.collection_name())?
            .map(|data| data.records)
            .unwrap_or_default())
    }

    fn save_sessions(&self, kind: SessionKind, records: &[SessionRecord]) -> Result<(), MirrorError> {
        self.save(kind.collection_name(), &records)
    }
}

#[derive(Debug, Default)]
pub struct MirrorAges {
    pub screening: Option<String>,
    pub fmt_sessions: Option<String>,
    pub sm_sessions: Option<String>,
}

impl MirrorAges {
    pub fn screening_age(&self) -> String {
        self.screening.clone().unwrap_or_else(|| "never".to_string())
    }

    pub fn sessions_age(&self, kind: SessionKind) -> String {
        let age = match kind {
            SessionKind::Fmt => &self.fmt_sessions,
            SessionKind::Sm => &self.sm_sessions,
        };
        age.clone().unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Location, NewScreening, NewSession};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn screening(name: &str) -> ScreeningRecord {
        NewScreening {
            collected_at: NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            name: name.to_string(),
            guardian_name: "Khan".to_string(),
            age: 18,
            muac: 11.4,
            gender: Gender::Female,
            location: Location {
                district: "D".to_string(),
                union: "U".to_string(),
                village: "X".to_string(),
            },
            vaccine_dose: String::new(),
            vaccine_due: true,
            remarks: None,
        }
        .stamp(1, "c", false)
    }

    fn session(kind: SessionKind) -> SessionRecord {
        NewSession {
            kind,
            name: "Rina".to_string(),
            father_or_husband_name: "Karim".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            village: "X".to_string(),
            union: "U".to_string(),
            age: 30,
            children_under_five: 1,
            contact: None,
            location: None,
            images: vec!["img-1.jpg".to_string()],
        }
        .stamp(1, "c", false)
    }

    #[test]
    fn test_missing_collections_load_empty() {
        let dir = TempDir::new().unwrap();
        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();
        assert!(mirror.load_screenings().unwrap().is_empty());
        assert!(mirror.load_sessions(SessionKind::Fmt).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_collections() {
        let dir = TempDir::new().unwrap();
        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();

        let screenings = vec![screening("Ali"), screening("Bina")];
        mirror.save_screenings(&screenings).unwrap();
        mirror.save_sessions(SessionKind::Sm, &[session(SessionKind::Sm)]).unwrap();

        assert_eq!(mirror.load_screenings().unwrap(), screenings);
        assert_eq!(mirror.load_sessions(SessionKind::Sm).unwrap().len(), 1);
        assert!(mirror.load_sessions(SessionKind::Fmt).unwrap().is_empty());
        assert!(dir.path().join("screening.json").exists());
        assert!(dir.path().join("sm_sessions.json").exists());
        assert!(!dir.path().join("screening.json.tmp").exists());
    }

    #[test]
    fn test_saved_file_carries_schema_version() {
        let dir = TempDir::new().unwrap();
        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();
        mirror.save_screenings(&[screening("Ali")]).unwrap();

        let raw = fs::read_to_string(dir.path().join("screening.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["records"][0]["name"], "Ali");
    }

    #[test]
    fn test_loads_legacy_bare_array() {
        let dir = TempDir::new().unwrap();
        let legacy = serde_json::to_string(&vec![screening("Ali")]).unwrap();
        fs::write(dir.path().join("screening.json"), legacy).unwrap();

        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();
        let loaded = mirror.load_screenings().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Ali");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fmt_sessions.json"), "{ not json").unwrap();
        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();
        let err = mirror.load_sessions(SessionKind::Fmt).unwrap_err();
        assert!(matches!(err, MirrorError::Json { .. }));
    }

    #[test]
    fn test_mirror_ages() {
        let dir = TempDir::new().unwrap();
        let mirror = JsonMirror::new(dir.path().to_path_buf()).unwrap();
        mirror.save_screenings(&[screening("Ali")]).unwrap();

        let ages = mirror.get_mirror_ages();
        assert_eq!(ages.screening_age(), "just now");
        assert_eq!(ages.sessions_age(SessionKind::Fmt), "never");
    }
}
