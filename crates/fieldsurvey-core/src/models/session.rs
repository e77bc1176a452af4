//! Community awareness session attendance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{new_record_id, RecordId, SurveyRecord};
use super::screening::normalized;
use super::validation::{narrow, require_text, ValidationError};

/// The two session kinds. Each kind lives in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "FMT")]
    Fmt,
    #[serde(rename = "SM")]
    Sm,
}

impl SessionKind {
    pub const ALL: [SessionKind; 2] = [SessionKind::Fmt, SessionKind::Sm];

    pub fn tag(&self) -> &'static str {
        match self {
            SessionKind::Fmt => "FMT",
            SessionKind::Sm => "SM",
        }
    }

    /// Name of the persisted collection holding this kind.
    pub fn collection_name(&self) -> &'static str {
        match self {
            SessionKind::Fmt => "fmt_sessions",
            SessionKind::Sm => "sm_sessions",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// GPS fix captured alongside a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    pub kind: SessionKind,
    /// Per-day ordinal for this collector and kind.
    pub serial: u32,
    pub name: String,
    pub father_or_husband_name: String,
    pub date: NaiveDate,
    pub village: String,
    pub union: String,
    pub age: u32,
    pub children_under_five: u32,
    #[serde(default)]
    pub contact: Option<String>,
    pub owner: String,
    pub synced: bool,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl SessionRecord {
    pub fn apply_patch(&mut self, patch: &SessionPatch) -> Result<(), ValidationError> {
        if let Some(ref name) = patch.name {
            self.name = normalized("name", name)?;
        }
        if let Some(ref other) = patch.father_or_husband_name {
            self.father_or_husband_name = normalized("father_or_husband_name", other)?;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(ref village) = patch.village {
            self.village = village.clone();
        }
        if let Some(ref union) = patch.union {
            self.union = union.clone();
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(children) = patch.children_under_five {
            self.children_under_five = children;
        }
        if let Some(ref contact) = patch.contact {
            self.contact = Some(contact.clone()).filter(|c| !c.trim().is_empty());
        }
        Ok(())
    }
}

impl SurveyRecord for SessionRecord {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn record_date(&self) -> NaiveDate {
        self.date
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn mark_synced(&mut self) {
        self.synced = true;
    }
}

/// A session candidate as submitted by a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub kind: SessionKind,
    pub name: String,
    pub father_or_husband_name: String,
    pub date: NaiveDate,
    pub village: String,
    pub union: String,
    pub age: u32,
    pub children_under_five: u32,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewSession {
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        for field in ["kind", "name", "father_or_husband_name", "village"] {
            require_text(payload, field)?;
        }
        narrow(payload)
    }

    pub(crate) fn stamp(self, serial: u32, owner: &str, synced: bool) -> SessionRecord {
        SessionRecord {
            id: new_record_id(),
            kind: self.kind,
            serial,
            name: self.name,
            father_or_husband_name: self.father_or_husband_name,
            date: self.date,
            village: self.village,
            union: self.union,
            age: self.age,
            children_under_five: self.children_under_five,
            contact: self.contact.filter(|c| !c.trim().is_empty()),
            owner: owner.to_string(),
            synced,
            location: self.location,
            images: self.images,
        }
    }
}

/// Field-level correction for a session record. Kind, capture data and
/// identity are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub father_or_husband_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub village: Option<String>,
    pub union: Option<String>,
    pub age: Option<u32>,
    pub children_under_five: Option<u32>,
    pub contact: Option<String>,
}
