use chrono::NaiveDate;
use uuid::Uuid;

/// Opaque record identity.
pub type RecordId = Uuid;

/// An ordered collection of records. Append order is kept for display only;
/// lookups go through the record id.
pub type SyncableCollection<T> = Vec<T>;

/// Shared view over screening and session records, used by the store's sync
/// pass and the export time filter.
pub trait SurveyRecord {
    fn owner(&self) -> &str;
    /// Calendar day the record was collected on (device-local).
    fn record_date(&self) -> NaiveDate;
    fn is_synced(&self) -> bool;
    fn mark_synced(&mut self);
}

pub(crate) fn new_record_id() -> RecordId {
    Uuid::new_v4()
}
