//! Spreadsheet export engine.
//!
//! Exports run as discrete, ordered stages over a read-only snapshot:
//!
//! 1. time filter (`pipeline::filter_by_time`)
//! 2. MUAC category filter, screenings only (`pipeline::filter_by_category`)
//! 3. optional split by collector (`pipeline::partition_by_owner`)
//! 4. row projection (`sheet::project_*_rows`)
//! 5. styling and column sizing (`SheetModel`, `workbook`)
//! 6. title banner (`SheetModel::with_title_banner`)
//! 7. workbook assembly (`workbook::render_workbook`)

pub mod error;
pub mod options;
pub mod pipeline;
pub mod sheet;
pub mod workbook;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

pub use error::ExportError;
pub use options::{CategoryFilter, ExportRequest, ScreeningExportOptions, SessionExportOptions, TimeRange};
pub use sheet::{Cell, SheetModel};
pub use workbook::render_workbook;

use crate::models::{ScreeningRecord, SessionRecord};
use crate::utils::{format_date, sanitize_sheet_name, truncate_chars, MAX_SHEET_NAME_LEN};
use pipeline::{filter_by_category, filter_by_time, partition_by_owner};
use sheet::{
    project_screening_rows, project_session_rows, SCREENING_HEADERS, SCREENING_MUAC_COLUMN,
    SESSION_HEADERS,
};

/// A finished workbook, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub sheet_names: Vec<String>,
    pub record_count: usize,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the workbook into `dir`, replacing a file of the same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        fs::write(&path, &self.bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Stages 1-6 for screenings.
pub fn build_screening_sheets(
    records: &[ScreeningRecord],
    opts: &ScreeningExportOptions,
    today: NaiveDate,
) -> Vec<SheetModel> {
    let request = ExportRequest::Screening(*opts);
    let heading = request.heading();
    let selected = filter_by_category(filter_by_time(records, opts.time_range, today), opts.categories);

    // An empty split has no collectors to name, so it falls back to one
    // unsplit sheet.
    let groups: Vec<(Option<String>, Vec<&ScreeningRecord>)> =
        if opts.split_by_owner && !selected.is_empty() {
            partition_by_owner(selected)
                .into_iter()
                .map(|(owner, rows)| (Some(owner), rows))
                .collect()
        } else {
            vec![(None, selected)]
        };

    let mut names = SheetNames::default();
    groups
        .into_iter()
        .map(|(owner, rows)| {
            let (rows, classes) = project_screening_rows(&rows);
            let (name, title) = match owner {
                Some(owner) => (
                    names.claim(&owner),
                    format!("{} - {} - {}", heading, owner, format_date(today)),
                ),
                None => (
                    names.claim(&request.sheet_name(today)),
                    format!("{} - {}", heading, format_date(today)),
                ),
            };
            SheetModel::new(name, &SCREENING_HEADERS, rows)
                .with_highlight(SCREENING_MUAC_COLUMN, classes)
                .with_title_banner(title)
        })
        .collect()
}

/// Stages 1 and 4-6 for one session kind.
pub fn build_session_sheets(
    records: &[SessionRecord],
    opts: &SessionExportOptions,
    today: NaiveDate,
) -> Vec<SheetModel> {
    let request = ExportRequest::Session(*opts);
    let heading = request.heading();
    let selected: Vec<&SessionRecord> = filter_by_time(records, opts.time_range, today)
        .into_iter()
        .filter(|r| r.kind == opts.kind)
        .collect();
    let rows = project_session_rows(&selected);
    let name = SheetNames::default().claim(&request.sheet_name(today));

    vec![SheetModel::new(name, &SESSION_HEADERS, rows)
        .with_title_banner(format!("{} - {}", heading, format_date(today)))]
}

pub fn export_screenings(
    records: &[ScreeningRecord],
    opts: &ScreeningExportOptions,
    today: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let sheets = build_screening_sheets(records, opts, today);
    assemble(ExportRequest::Screening(*opts), sheets, today)
}

pub fn export_sessions(
    records: &[SessionRecord],
    opts: &SessionExportOptions,
    today: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let sheets = build_session_sheets(records, opts, today);
    assemble(ExportRequest::Session(*opts), sheets, today)
}

/// Stage 7.
fn assemble(
    request: ExportRequest,
    sheets: Vec<SheetModel>,
    today: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let bytes = render_workbook(&sheets)?;
    let artifact = ExportArtifact {
        file_name: request.file_name(today),
        sheet_names: sheets.iter().map(|s| s.name.clone()).collect(),
        record_count: sheets.iter().map(|s| s.rows.len()).sum(),
        bytes,
    };
    info!(
        file = %artifact.file_name,
        sheets = artifact.sheet_names.len(),
        records = artifact.record_count,
        "Built export workbook"
    );
    Ok(artifact)
}

/// Hands out unique, Excel-safe sheet names.
#[derive(Default)]
struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    fn claim(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        let mut candidate = base.clone();
        let mut n = 2;
        // Excel compares sheet names case-insensitively.
        while self.taken.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let room = MAX_SHEET_NAME_LEN - suffix.chars().count();
            candidate = format!("{}{}", truncate_chars(&base, room), suffix);
            n += 1;
        }
        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}
