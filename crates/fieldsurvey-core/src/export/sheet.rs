//! In-memory sheet layout: projection, column sizing and the title banner.
//!
//! A `SheetModel` holds everything the workbook writer needs, so layout can
//! be asserted without producing a file.

use crate::models::{NutritionClass, ScreeningRecord, SessionRecord};
use crate::utils::{format_date, format_optional, yes_no};

/// Widest a column may be sized to.
pub const MAX_COLUMN_WIDTH: f64 = 40.0;

/// Padding added to the longest cell in a column.
pub const COLUMN_PADDING: f64 = 2.0;

/// Rows inserted above the header for the title banner.
pub const TITLE_BANNER_ROWS: u32 = 2;

pub const SCREENING_HEADERS: [&str; 15] = [
    "Serial",
    "Date",
    "Name",
    "Guardian Name",
    "Age",
    "MUAC (cm)",
    "Gender",
    "District",
    "Union",
    "Village",
    "Vaccine Dose",
    "Vaccine Due",
    "Remarks",
    "Collector",
    "Synced",
];

/// Index of the MUAC column in `SCREENING_HEADERS`.
pub const SCREENING_MUAC_COLUMN: usize = 5;

pub const SESSION_HEADERS: [&str; 15] = [
    "Serial",
    "Type",
    "Name",
    "Father/Husband Name",
    "Date",
    "Village",
    "Union",
    "Age",
    "Children Under 5",
    "Contact",
    "Collector",
    "Synced",
    "Latitude",
    "Longitude",
    "Images",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn display(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }

    fn display_len(&self) -> usize {
        self.display().chars().count()
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Per-row fill for the MUAC column.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub column: usize,
    pub classes: Vec<NutritionClass>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetModel {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub column_widths: Vec<f64>,
    pub highlight: Option<Highlight>,
    pub title: Option<String>,
}

impl SheetModel {
    /// Build a sheet from projected rows and size its columns.
    pub fn new(name: String, headers: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let column_widths = column_widths(&headers, &rows);
        Self {
            name,
            headers,
            rows,
            column_widths,
            highlight: None,
            title: None,
        }
    }

    pub fn with_highlight(mut self, column: usize, classes: Vec<NutritionClass>) -> Self {
        self.highlight = Some(Highlight { column, classes });
        self
    }

    /// Shift the table down and place a merged title across all columns.
    /// Column widths are kept as computed.
    pub fn with_title_banner(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// Zero-based row of the header.
    pub fn header_row(&self) -> u32 {
        if self.title.is_some() {
            TITLE_BANNER_ROWS
        } else {
            0
        }
    }

    pub fn first_data_row(&self) -> u32 {
        self.header_row() + 1
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn highlight_for(&self, row: usize, column: usize) -> Option<NutritionClass> {
        self.highlight
            .as_ref()
            .filter(|h| h.column == column)
            .and_then(|h| h.classes.get(row).copied())
    }
}

/// `min(40, 2 + longest cell)` for each column, header included.
pub fn column_widths(headers: &[String], rows: &[Vec<Cell>]) -> Vec<f64> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(Cell::display_len)
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (COLUMN_PADDING + longest as f64).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Stage 4 for screenings: one row per record in declaration order, plus the
/// band of each row for MUAC colouring.
pub fn project_screening_rows(records: &[&ScreeningRecord]) -> (Vec<Vec<Cell>>, Vec<NutritionClass>) {
    records
        .iter()
        .map(|r| {
            let row = vec![
                Cell::from(r.serial),
                Cell::from(format_date(r.collected_at.date())),
                Cell::from(r.name.as_str()),
                Cell::from(r.guardian_name.as_str()),
                Cell::from(r.age),
                Cell::from(r.muac),
                Cell::from(r.gender.to_string()),
                Cell::from(r.location.district.as_str()),
                Cell::from(r.location.union.as_str()),
                Cell::from(r.location.village.as_str()),
                Cell::from(r.vaccine_dose.as_str()),
                Cell::from(yes_no(r.vaccine_due)),
                Cell::from(r.remarks.as_str()),
                Cell::from(r.owner.as_str()),
                Cell::from(yes_no(r.synced)),
            ];
            (row, r.classification())
        })
        .unzip()
}

/// Stage 4 for sessions.
pub fn project_session_rows(records: &[&SessionRecord]) -> Vec<Vec<Cell>> {
    records
        .iter()
        .map(|r| {
            let (lat, long) = match r.location {
                Some(point) => (Cell::from(point.latitude), Cell::from(point.longitude)),
                None => (Cell::from(""), Cell::from("")),
            };
            vec![
                Cell::from(r.serial),
                Cell::from(r.kind.tag()),
                Cell::from(r.name.as_str()),
                Cell::from(r.father_or_husband_name.as_str()),
                Cell::from(format_date(r.date)),
                Cell::from(r.village.as_str()),
                Cell::from(r.union.as_str()),
                Cell::from(r.age),
                Cell::from(r.children_under_five),
                Cell::from(format_optional(&r.contact, "")),
                Cell::from(r.owner.as_str()),
                Cell::from(yes_no(r.synced)),
                lat,
                long,
                Cell::from(r.images.len() as u32),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Location, NewScreening};
    use chrono::NaiveDate;

    fn screening(name: &str, muac: f64) -> ScreeningRecord {
        NewScreening {
            collected_at: NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            name: name.to_string(),
            guardian_name: "Khan".to_string(),
            age: 20,
            muac,
            gender: Gender::Female,
            location: Location {
                district: "Sylhet".to_string(),
                union: "North".to_string(),
                village: "X".to_string(),
            },
            vaccine_dose: "BCG".to_string(),
            vaccine_due: true,
            remarks: None,
        }
        .stamp(7, "collector-1", false)
    }

    #[test]
    fn test_project_screening_rows() {
        let record = screening("Ali", 10.5);
        let (rows, classes) = project_screening_rows(&[&record]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), SCREENING_HEADERS.len());
        assert_eq!(rows[0][0], Cell::Number(7.0));
        assert_eq!(rows[0][1], Cell::Text("19/10/2026".to_string()));
        assert_eq!(rows[0][SCREENING_MUAC_COLUMN], Cell::Number(10.5));
        assert_eq!(rows[0][11], Cell::Text("Yes".to_string()));
        assert_eq!(rows[0][14], Cell::Text("No".to_string()));
        assert_eq!(classes, vec![NutritionClass::Sam]);
    }

    #[test]
    fn test_column_widths_rule() {
        let headers = vec!["Id".to_string(), "Notes".to_string()];
        let rows = vec![
            vec![Cell::from(1u32), Cell::from("short")],
            vec![Cell::from(22u32), Cell::from("x".repeat(80))],
        ];
        let widths = column_widths(&headers, &rows);
        // "Id" is the longest cell in column 0.
        assert_eq!(widths[0], 4.0);
        assert_eq!(widths[1], MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_column_widths_empty_rows_use_header() {
        let headers = vec!["Guardian Name".to_string()];
        assert_eq!(column_widths(&headers, &[]), vec![15.0]);
    }

    #[test]
    fn test_title_banner_shifts_rows_and_keeps_widths() {
        let record = screening("Ali", 11.5);
        let (rows, classes) = project_screening_rows(&[&record]);
        let sheet = SheetModel::new("Screening".to_string(), &SCREENING_HEADERS, rows)
            .with_highlight(SCREENING_MUAC_COLUMN, classes);
        let widths = sheet.column_widths.clone();
        assert_eq!(sheet.header_row(), 0);

        let sheet = sheet.with_title_banner("Screening Records (All)".to_string());
        assert_eq!(sheet.header_row(), 2);
        assert_eq!(sheet.first_data_row(), 3);
        assert_eq!(sheet.column_widths, widths);
        assert_eq!(sheet.highlight_for(0, SCREENING_MUAC_COLUMN), Some(NutritionClass::Mam));
        assert_eq!(sheet.highlight_for(0, 0), None);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(24.0).display(), "24");
        assert_eq!(Cell::Number(10.5).display(), "10.5");
    }
}
