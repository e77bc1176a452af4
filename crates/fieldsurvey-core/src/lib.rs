//! Core library for fieldsurvey.
//!
//! Records child nutrition screenings and awareness-session attendance on
//! devices that are often offline:
//!
//! - `models`: record shapes and the MUAC classification table
//! - `duplicate`: same-day duplicate detection for screenings
//! - `mirror`: persisted JSON mirror of the collections
//! - `store`: the record store (add, bulk add, update, sync, export)
//! - `export`: the spreadsheet export engine
//! - `config`: collector identity and directory settings

pub mod config;
pub mod duplicate;
pub mod export;
pub mod mirror;
pub mod models;
pub mod store;
pub mod utils;

pub use config::Config;
pub use duplicate::{check_batch_duplicates, check_duplicate, BatchConflict, DuplicateQuery, DuplicateResult};
pub use export::{ExportArtifact, ExportError, ExportRequest};
pub use mirror::{JsonMirror, MirrorError, MirrorPort};
pub use models::{classify, NutritionClass};
pub use store::{RecordStore, StoreError};
