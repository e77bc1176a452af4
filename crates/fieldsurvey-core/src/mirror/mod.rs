//! Persisted mirror of the store's collections.
//!
//! The store loads all three collections at construction and rewrites the
//! affected collection in full after every mutation. Collections:
//! - `screening`
//! - `fmt_sessions`
//! - `sm_sessions`

pub mod envelope;
pub mod error;
pub mod manager;
pub mod memory;

pub use envelope::{MirroredData, SCHEMA_VERSION};
pub use error::MirrorError;
pub use manager::{JsonMirror, MirrorAges};
pub use memory::MemoryMirror;

use crate::models::{ScreeningRecord, SessionKind, SessionRecord};

pub const SCREENING_COLLECTION: &str = "screening";

/// Load/save access to the named collections.
pub trait MirrorPort: Send + Sync {
    fn load_screenings(&self) -> Result<Vec<ScreeningRecord>, MirrorError>;
    fn save_screenings(&self, records: &[ScreeningRecord]) -> Result<(), MirrorError>;
    fn load_sessions(&self, kind: SessionKind) -> Result<Vec<SessionRecord>, MirrorError>;
    fn save_sessions(&self, kind: SessionKind, records: &[SessionRecord]) -> Result<(), MirrorError>;
}
