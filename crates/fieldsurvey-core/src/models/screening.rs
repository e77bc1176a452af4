//! Child nutrition screening entries.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::nutrition::{classify, NutritionClass};
use super::record::{new_record_id, RecordId, SurveyRecord};
use super::validation::{narrow, require_text, ValidationError};
use crate::utils::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

/// District > union > village.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub district: String,
    pub union: String,
    pub village: String,
}

/// A stored screening entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub id: RecordId,
    /// Display ordinal; not unique across devices.
    pub serial: u32,
    pub collected_at: NaiveDateTime,
    pub name: String,
    pub guardian_name: String,
    pub age: u32,
    /// Mid-upper-arm circumference in centimeters.
    pub muac: f64,
    pub gender: Gender,
    #[serde(flatten)]
    pub location: Location,
    pub vaccine_dose: String,
    pub vaccine_due: bool,
    pub remarks: String,
    pub owner: String,
    pub synced: bool,
}

impl ScreeningRecord {
    pub fn classification(&self) -> NutritionClass {
        classify(self.muac)
    }

    /// Overwrite the fields present in `patch`.
    ///
    /// Name fields are normalized. When `muac` changes and the patch carries
    /// no remarks, remarks are re-derived from the new reading.
    pub fn apply_patch(&mut self, patch: &ScreeningPatch) -> Result<(), ValidationError> {
        if let Some(ref name) = patch.name {
            self.name = normalized("name", name)?;
        }
        if let Some(ref guardian) = patch.guardian_name {
            self.guardian_name = normalized("guardian_name", guardian)?;
        }
        if let Some(collected_at) = patch.collected_at {
            self.collected_at = collected_at;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(ref district) = patch.district {
            self.location.district = district.clone();
        }
        if let Some(ref union) = patch.union {
            self.location.union = union.clone();
        }
        if let Some(ref village) = patch.village {
            self.location.village = village.clone();
        }
        if let Some(ref dose) = patch.vaccine_dose {
            self.vaccine_dose = dose.clone();
        }
        if let Some(due) = patch.vaccine_due {
            self.vaccine_due = due;
        }
        if let Some(muac) = patch.muac {
            self.muac = muac;
        }
        match patch.remarks {
            Some(ref remarks) => self.remarks = remarks_or_derived(Some(remarks), self.muac),
            None if patch.muac.is_some() => self.remarks = remarks_or_derived(None, self.muac),
            None => {}
        }
        Ok(())
    }
}

impl SurveyRecord for ScreeningRecord {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn record_date(&self) -> NaiveDate {
        self.collected_at.date()
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn mark_synced(&mut self) {
        self.synced = true;
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A screening candidate as submitted by a form, before the store stamps
/// identity, owner and sync state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScreening {
    #[serde(default = "local_now")]
    pub collected_at: NaiveDateTime,
    pub name: String,
    pub guardian_name: String,
    pub age: u32,
    pub muac: f64,
    pub gender: Gender,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub vaccine_dose: String,
    #[serde(default)]
    pub vaccine_due: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl NewScreening {
    /// Narrow an untyped form payload into a candidate.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        for field in ["name", "guardian_name", "village"] {
            require_text(payload, field)?;
        }
        narrow(payload)
    }

    pub(crate) fn stamp(self, serial: u32, owner: &str, synced: bool) -> ScreeningRecord {
        let remarks = remarks_or_derived(self.remarks.as_deref(), self.muac);
        ScreeningRecord {
            id: new_record_id(),
            serial,
            collected_at: self.collected_at,
            name: self.name,
            guardian_name: self.guardian_name,
            age: self.age,
            muac: self.muac,
            gender: self.gender,
            location: self.location,
            vaccine_dose: self.vaccine_dose,
            vaccine_due: self.vaccine_due,
            remarks,
            owner: owner.to_string(),
            synced,
        }
    }
}

/// Field-level correction for a screening record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreeningPatch {
    pub collected_at: Option<NaiveDateTime>,
    pub name: Option<String>,
    pub guardian_name: Option<String>,
    pub age: Option<u32>,
    pub muac: Option<f64>,
    pub gender: Option<Gender>,
    pub district: Option<String>,
    pub union: Option<String>,
    pub village: Option<String>,
    pub vaccine_dose: Option<String>,
    pub vaccine_due: Option<bool>,
    pub remarks: Option<String>,
}

fn remarks_or_derived(remarks: Option<&str>, muac: f64) -> String {
    match remarks.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => classify(muac).label().to_string(),
    }
}

pub(crate) fn normalized(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let name = normalize_name(raw);
    if name.is_empty() {
        Err(ValidationError::EmptyAfterNormalize { field })
    } else {
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(muac: f64, remarks: Option<&str>) -> NewScreening {
        NewScreening {
            collected_at: local_now(),
            name: "Ali".to_string(),
            guardian_name: "Khan".to_string(),
            age: 24,
            muac,
            gender: Gender::Male,
            location: Location {
                district: "Sylhet".to_string(),
                union: "North".to_string(),
                village: "X".to_string(),
            },
            vaccine_dose: "Penta-3".to_string(),
            vaccine_due: false,
            remarks: remarks.map(str::to_string),
        }
    }

    #[test]
    fn test_stamp_derives_remarks() {
        let record = candidate(10.5, None).stamp(1, "collector-1", false);
        assert_eq!(record.remarks, "SAM");
        assert_eq!(record.owner, "collector-1");
        assert!(!record.synced);

        let record = candidate(11.5, Some("   ")).stamp(2, "c", true);
        assert_eq!(record.remarks, "MAM");

        let record = candidate(13.0, Some("referred")).stamp(3, "c", true);
        assert_eq!(record.remarks, "referred");
    }

    #[test]
    fn test_stamp_assigns_distinct_ids() {
        let a = candidate(13.0, None).stamp(1, "c", true);
        let b = candidate(13.0, None).stamp(2, "c", true);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_apply_patch_normalizes_names() {
        let mut record = candidate(13.0, None).stamp(1, "c", true);
        let patch = ScreeningPatch {
            name: Some("  mOHAMMED   al-amin!! ".to_string()),
            guardian_name: Some("rahim khan".to_string()),
            ..Default::default()
        };
        record.apply_patch(&patch).unwrap();
        assert_eq!(record.name, "Mohammed Alamin");
        assert_eq!(record.guardian_name, "Rahim Khan");
    }

    #[test]
    fn test_apply_patch_rejects_empty_name() {
        let mut record = candidate(13.0, None).stamp(1, "c", true);
        let patch = ScreeningPatch {
            name: Some("!!!".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.apply_patch(&patch),
            Err(ValidationError::EmptyAfterNormalize { field: "name" })
        );
    }

    #[test]
    fn test_apply_patch_rederives_remarks_on_muac_change() {
        let mut record = candidate(13.0, None).stamp(1, "c", true);
        assert_eq!(record.remarks, "Normal");

        let patch = ScreeningPatch {
            muac: Some(11.8),
            ..Default::default()
        };
        record.apply_patch(&patch).unwrap();
        assert_eq!(record.remarks, "MAM");

        let patch = ScreeningPatch {
            muac: Some(10.0),
            remarks: Some("follow up".to_string()),
            ..Default::default()
        };
        record.apply_patch(&patch).unwrap();
        assert_eq!(record.remarks, "follow up");
        assert_eq!(record.classification(), NutritionClass::Sam);
    }

    #[test]
    fn test_from_json_narrows_payload() {
        let payload = json!({
            "name": "Ali",
            "guardian_name": "Khan",
            "age": 30,
            "muac": 10.5,
            "gender": "male",
            "district": "Sylhet",
            "union": "North",
            "village": "X",
            "collected_at": "2026-10-19T09:30:00"
        });
        let candidate = NewScreening::from_json(&payload).unwrap();
        assert_eq!(candidate.location.village, "X");
        assert_eq!(candidate.remarks, None);
        assert!(!candidate.vaccine_due);
    }

    #[test]
    fn test_from_json_missing_identity_field() {
        let payload = json!({ "name": "Ali", "guardian_name": "", "village": "X" });
        assert_eq!(
            NewScreening::from_json(&payload),
            Err(ValidationError::MissingField("guardian_name"))
        );
    }

    #[test]
    fn test_from_json_wrong_type_is_malformed() {
        let payload = json!({
            "name": "Ali", "guardian_name": "Khan", "village": "X",
            "age": "three", "muac": 12.0, "gender": "female",
            "district": "", "union": ""
        });
        assert!(matches!(
            NewScreening::from_json(&payload),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_record_serializes_flat_location() {
        let record = candidate(12.5, None).stamp(1, "c", false);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["village"], "X");
        let back: ScreeningRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
