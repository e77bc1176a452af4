use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use super::connectivity::{Connectivity, LocalConfirmer, SyncConfirmer};
use super::error::StoreError;
use crate::duplicate::{check_batch_duplicates, check_duplicate, BatchConflict, DuplicateQuery, DuplicateResult};
use crate::export::{export_screenings, export_sessions, ExportArtifact, ExportRequest};
use crate::mirror::MirrorPort;
use crate::models::{
    NewScreening, NewSession, NutritionClass, RecordId, RecordKind, RecordPatch, ScreeningRecord,
    SessionKind, SessionRecord, SurveyRecord, SyncableCollection, ValidationError,
};

/// Today's date on the device calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Records whose flag flipped to synced.
    pub marked: usize,
}

/// What an export produced and where it went.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub file_name: String,
    pub path: PathBuf,
    pub record_count: usize,
    pub sheet_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub screenings: usize,
    pub screened_today: usize,
    pub sam: usize,
    pub mam: usize,
    pub normal: usize,
    pub fmt_sessions: usize,
    pub sm_sessions: usize,
    pub unsynced: usize,
}

/// Holds the `loading` flag for the duration of a sync, including when the
/// sync future is dropped before completion.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, StoreError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| StoreError::SyncInProgress)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owner of the screening and session collections.
///
/// Every mutation builds the next state of the affected collection, writes
/// it through to the mirror and only then replaces the in-memory copy, so a
/// failed write leaves both sides as they were.
pub struct RecordStore {
    mirror: Arc<dyn MirrorPort>,
    connectivity: Arc<dyn Connectivity>,
    confirmer: Box<dyn SyncConfirmer>,
    owner: String,
    export_dir: PathBuf,

    screenings: SyncableCollection<ScreeningRecord>,
    fmt_sessions: SyncableCollection<SessionRecord>,
    sm_sessions: SyncableCollection<SessionRecord>,

    loading: Arc<AtomicBool>,
}

impl RecordStore {
    /// Rehydrate all collections from the mirror.
    pub fn open(
        mirror: Arc<dyn MirrorPort>,
        connectivity: Arc<dyn Connectivity>,
        owner: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let screenings = mirror.load_screenings()?;
        let fmt_sessions = mirror.load_sessions(SessionKind::Fmt)?;
        let sm_sessions = mirror.load_sessions(SessionKind::Sm)?;
        let owner = owner.into();

        info!(
            owner = %owner,
            screenings = screenings.len(),
            fmt_sessions = fmt_sessions.len(),
            sm_sessions = sm_sessions.len(),
            "Record store opened"
        );

        Ok(Self {
            mirror,
            connectivity,
            confirmer: Box::new(LocalConfirmer),
            owner,
            export_dir: PathBuf::from("."),
            screenings,
            fmt_sessions,
            sm_sessions,
            loading: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_confirmer(mut self, confirmer: Box<dyn SyncConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_export_dir(mut self, export_dir: PathBuf) -> Self {
        self.export_dir = export_dir;
        self
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// True while `sync_all` is running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn screenings(&self) -> &[ScreeningRecord] {
        &self.screenings
    }

    pub fn sessions(&self, kind: SessionKind) -> &[SessionRecord] {
        match kind {
            SessionKind::Fmt => &self.fmt_sessions,
            SessionKind::Sm => &self.sm_sessions,
        }
    }

    fn sessions_mut(&mut self, kind: SessionKind) -> &mut SyncableCollection<SessionRecord> {
        match kind {
            SessionKind::Fmt => &mut self.fmt_sessions,
            SessionKind::Sm => &mut self.sm_sessions,
        }
    }

    pub fn find_screening(&self, id: RecordId) -> Option<&ScreeningRecord> {
        self.screenings.iter().find(|r| r.id == id)
    }

    pub fn find_session(&self, id: RecordId) -> Option<&SessionRecord> {
        SessionKind::ALL
            .iter()
            .flat_map(|kind| self.sessions(*kind))
            .find(|r| r.id == id)
    }

    pub fn pending_sync_count(&self) -> usize {
        let sessions = SessionKind::ALL
            .iter()
            .flat_map(|kind| self.sessions(*kind))
            .filter(|r| !r.is_synced())
            .count();
        sessions + self.screenings.iter().filter(|r| !r.is_synced()).count()
    }

    pub fn summary(&self) -> StoreSummary {
        let today = today();
        let mut summary = StoreSummary {
            screenings: self.screenings.len(),
            fmt_sessions: self.fmt_sessions.len(),
            sm_sessions: self.sm_sessions.len(),
            unsynced: self.pending_sync_count(),
            ..Default::default()
        };
        for record in &self.screenings {
            match record.classification() {
                NutritionClass::Sam => summary.sam += 1,
                NutritionClass::Mam => summary.mam += 1,
                NutritionClass::Normal => summary.normal += 1,
            }
            if record.record_date() == today {
                summary.screened_today += 1;
            }
        }
        summary
    }

    /// Report a same-day record with the candidate's identity, if any.
    /// Callers run this before `add_screening` and decide what to do on a match.
    pub fn check_duplicate(&self, candidate: &NewScreening) -> DuplicateResult<'_> {
        check_duplicate(&DuplicateQuery::from(candidate), &self.screenings, today())
    }

    /// Same-day repeats within a batch, against stored records and against
    /// earlier candidates of the batch.
    pub fn check_batch_duplicates(&self, candidates: &[NewScreening]) -> Vec<(usize, BatchConflict<'_>)> {
        check_batch_duplicates(candidates, &self.screenings, today())
    }

    // =========================================================================
    // Screenings
    // =========================================================================

    /// Stamp and append one screening. Duplicate detection is not run here.
    pub fn add_screening(&mut self, candidate: NewScreening) -> Result<ScreeningRecord, StoreError> {
        let mut next = self.screenings.clone();
        let record = self.stamp_screening(&next, candidate);
        next.push(record.clone());
        self.commit_screenings(next)?;
        debug!(id = %record.id, serial = record.serial, synced = record.synced, "Screening added");
        Ok(record)
    }

    /// Stamp and append a batch; either every record is appended or none is.
    pub fn bulk_add_screening(&mut self, candidates: Vec<NewScreening>) -> Result<Vec<RecordId>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut next = self.screenings.clone();
        let mut ids = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let record = self.stamp_screening(&next, candidate);
            ids.push(record.id);
            next.push(record);
        }
        self.commit_screenings(next)?;
        info!(count = ids.len(), "Screening batch added");
        Ok(ids)
    }

    fn stamp_screening(&self, existing: &[ScreeningRecord], candidate: NewScreening) -> ScreeningRecord {
        let serial = existing.len() as u32 + 1;
        candidate.stamp(serial, &self.owner, self.is_online())
    }

    fn commit_screenings(&mut self, next: SyncableCollection<ScreeningRecord>) -> Result<(), StoreError> {
        self.mirror.save_screenings(&next)?;
        self.screenings = next;
        Ok(())
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Stamp and append one session to the collection of its kind.
    pub fn add_session(&mut self, candidate: NewSession) -> Result<SessionRecord, StoreError> {
        let kind = candidate.kind;
        let mut next = self.sessions(kind).to_vec();
        let record = self.stamp_session(&next, candidate);
        next.push(record.clone());
        self.commit_sessions(kind, next)?;
        debug!(id = %record.id, kind = %kind, serial = record.serial, "Session added");
        Ok(record)
    }

    /// Append a non-empty batch of a single kind, all or nothing.
    pub fn bulk_add_session(&mut self, candidates: Vec<NewSession>) -> Result<Vec<RecordId>, StoreError> {
        let first = candidates.first().ok_or(StoreError::EmptyBatch)?.kind;
        if let Some(other) = candidates.iter().map(|c| c.kind).find(|k| *k != first) {
            warn!(first = %first, other = %other, "Rejected mixed session batch");
            return Err(StoreError::BatchTypeMismatch { first, other });
        }

        let mut next = self.sessions(first).to_vec();
        let mut ids = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let record = self.stamp_session(&next, candidate);
            ids.push(record.id);
            next.push(record);
        }
        self.commit_sessions(first, next)?;
        info!(kind = %first, count = ids.len(), "Session batch added");
        Ok(ids)
    }

    /// Serial restarts at 1 for each collector, kind and day.
    fn stamp_session(&self, existing: &[SessionRecord], candidate: NewSession) -> SessionRecord {
        let same_day = existing
            .iter()
            .filter(|r| r.owner == self.owner && r.date == candidate.date)
            .count();
        candidate.stamp(same_day as u32 + 1, &self.owner, self.is_online())
    }

    fn commit_sessions(
        &mut self,
        kind: SessionKind,
        next: SyncableCollection<SessionRecord>,
    ) -> Result<(), StoreError> {
        self.mirror.save_sessions(kind, &next)?;
        *self.sessions_mut(kind) = next;
        Ok(())
    }

    // =========================================================================
    // Corrections
    // =========================================================================

    /// Overwrite fields on the record with `id`, in whichever collection
    /// holds it. The record's sync flag is reset to the current connectivity.
    pub fn update_record(&mut self, id: RecordId, patch: &RecordPatch) -> Result<RecordKind, StoreError> {
        let online = self.is_online();

        if let Some(pos) = self.screenings.iter().position(|r| r.id == id) {
            let RecordPatch::Screening(patch) = patch else {
                return Err(ValidationError::PatchKindMismatch("screening").into());
            };
            let mut next = self.screenings.clone();
            next[pos].apply_patch(patch)?;
            next[pos].synced = online;
            self.commit_screenings(next)?;
            info!(id = %id, "Screening updated");
            return Ok(RecordKind::Screening);
        }

        for kind in SessionKind::ALL {
            if let Some(pos) = self.sessions(kind).iter().position(|r| r.id == id) {
                let RecordPatch::Session(patch) = patch else {
                    return Err(ValidationError::PatchKindMismatch("session").into());
                };
                let mut next = self.sessions(kind).to_vec();
                next[pos].apply_patch(patch)?;
                next[pos].synced = online;
                self.commit_sessions(kind, next)?;
                info!(id = %id, kind = %kind, "Session updated");
                return Ok(RecordKind::Session(kind));
            }
        }

        Err(StoreError::NotFound(id))
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Mark every record synced once the confirmer acknowledges them.
    ///
    /// Fails without touching anything when offline. Running it again with
    /// nothing pending succeeds and writes nothing.
    pub async fn sync_all(&mut self) -> Result<SyncOutcome, StoreError> {
        if !self.is_online() {
            warn!("Sync requested while offline");
            return Err(StoreError::Connectivity);
        }
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let pending = self.pending_sync_count();
        if pending == 0 {
            debug!("Nothing to sync");
            return Ok(SyncOutcome { marked: 0 });
        }

        info!(pending, "Sync started");
        self.confirmer.confirm(pending).await?;
        if !self.is_online() {
            warn!("Connectivity lost before sync completed");
            return Err(StoreError::Connectivity);
        }

        let screenings = marked_synced(&self.screenings);
        let sessions: Vec<(SessionKind, Vec<SessionRecord>)> = SessionKind::ALL
            .iter()
            .filter_map(|kind| marked_synced(self.sessions(*kind)).map(|next| (*kind, next)))
            .collect();

        self.persist_synced(screenings.as_deref(), &sessions)?;

        if let Some(next) = screenings {
            self.screenings = next;
        }
        for (kind, next) in sessions {
            *self.sessions_mut(kind) = next;
        }

        info!(marked = pending, "Sync complete");
        Ok(SyncOutcome { marked: pending })
    }

    /// Write every changed collection. If a later write fails, collections
    /// already written are restored from the unchanged in-memory copies.
    fn persist_synced(
        &self,
        screenings: Option<&[ScreeningRecord]>,
        sessions: &[(SessionKind, Vec<SessionRecord>)],
    ) -> Result<(), StoreError> {
        if let Some(next) = screenings {
            self.mirror.save_screenings(next)?;
        }
        for (i, (kind, next)) in sessions.iter().enumerate() {
            if let Err(e) = self.mirror.save_sessions(*kind, next) {
                self.restore_mirror(screenings.is_some(), sessions[..i].iter().map(|(k, _)| *k));
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn restore_mirror(&self, screenings: bool, kinds: impl Iterator<Item = SessionKind>) {
        if screenings {
            if let Err(e) = self.mirror.save_screenings(&self.screenings) {
                warn!(error = %e, "Failed to restore screening mirror after sync error");
            }
        }
        for kind in kinds {
            if let Err(e) = self.mirror.save_sessions(kind, self.sessions(kind)) {
                warn!(kind = %kind, error = %e, "Failed to restore session mirror after sync error");
            }
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Build the workbook for `request` from the current collections.
    pub fn export_artifact(&self, request: &ExportRequest) -> Result<ExportArtifact, StoreError> {
        let today = today();
        let artifact = match request {
            ExportRequest::Screening(opts) => export_screenings(&self.screenings, opts, today)?,
            ExportRequest::Session(opts) => export_sessions(self.sessions(opts.kind), opts, today)?,
        };
        Ok(artifact)
    }

    /// Build the workbook and write it into the export directory.
    pub fn export_snapshot(&self, request: &ExportRequest) -> Result<ExportSummary, StoreError> {
        let artifact = self.export_artifact(request)?;
        let path = artifact.write_to(&self.export_dir)?;
        info!(path = %path.display(), records = artifact.record_count, "Export written");
        Ok(ExportSummary {
            file_name: artifact.file_name,
            path,
            record_count: artifact.record_count,
            sheet_names: artifact.sheet_names,
        })
    }
}

/// Copy of `records` with every flag set, or `None` if all were already synced.
fn marked_synced<T: SurveyRecord + Clone>(records: &[T]) -> Option<Vec<T>> {
    if records.iter().all(|r| r.is_synced()) {
        return None;
    }
    Some(
        records
            .iter()
            .cloned()
            .map(|mut r| {
                r.mark_synced();
                r
            })
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
