//! Record model for field survey entries.
//!
//! - `ScreeningRecord`: child nutrition screening with MUAC reading
//! - `SessionRecord`: awareness session attendance, partitioned by `SessionKind`
//! - `classify`: the MUAC threshold table shared by the store and exports
//! - Candidate (`New*`) and patch (`*Patch`) shapes accepted by the store

pub mod nutrition;
pub mod record;
pub mod screening;
pub mod session;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use nutrition::{classify, NutritionClass, MAM_MAX_MUAC_CM, SAM_MAX_MUAC_CM};
pub use record::{RecordId, SurveyRecord, SyncableCollection};
pub use screening::{Gender, Location, NewScreening, ScreeningPatch, ScreeningRecord};
pub use session::{GeoPoint, NewSession, SessionKind, SessionPatch, SessionRecord};
pub use validation::ValidationError;

/// A correction targeting either collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum RecordPatch {
    Screening(ScreeningPatch),
    Session(SessionPatch),
}

/// Which collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Screening,
    Session(SessionKind),
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Screening => write!(f, "screening"),
            RecordKind::Session(kind) => write!(f, "{} session", kind),
        }
    }
}
