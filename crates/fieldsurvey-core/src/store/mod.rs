//! Local-first record store.
//!
//! `RecordStore` owns the screening collection and the two session
//! collections, writes every mutation through to a `MirrorPort`, and flips
//! sync flags when the host reports connectivity. Duplicate detection is a
//! separate step the caller runs before committing.

pub mod connectivity;
pub mod error;
pub mod record_store;

pub use connectivity::{Connectivity, LocalConfirmer, StaticConnectivity, SyncConfirmer};
pub use error::StoreError;
pub use record_store::{today, ExportSummary, RecordStore, StoreSummary, SyncOutcome};
