use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{NutritionClass, SessionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Today,
    #[default]
    All,
}

/// SAM/MAM selection. Selecting neither disables category filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub sam: bool,
    pub mam: bool,
}

impl CategoryFilter {
    pub fn admits(&self, class: NutritionClass) -> bool {
        match (self.sam, self.mam) {
            (false, false) => true,
            (true, true) => class.is_acute(),
            (true, false) => class == NutritionClass::Sam,
            (false, true) => class == NutritionClass::Mam,
        }
    }

    pub fn tag(&self) -> &'static str {
        match (self.sam, self.mam) {
            (true, true) => "SAM-MAM",
            (true, false) => "SAM",
            (false, true) => "MAM",
            (false, false) => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreeningExportOptions {
    pub time_range: TimeRange,
    pub categories: CategoryFilter,
    pub split_by_owner: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExportOptions {
    pub kind: SessionKind,
    pub time_range: TimeRange,
}

/// What to export and how to filter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "export", rename_all = "lowercase")]
pub enum ExportRequest {
    Screening(ScreeningExportOptions),
    Session(SessionExportOptions),
}

impl ExportRequest {
    pub fn kind_slug(&self) -> &'static str {
        match self {
            ExportRequest::Screening(_) => "screening",
            ExportRequest::Session(opts) => match opts.kind {
                SessionKind::Fmt => "fmt-sessions",
                SessionKind::Sm => "sm-sessions",
            },
        }
    }

    /// Filter tag: category selection, then `-Today` and `-ByCollector`
    /// qualifiers so differently filtered exports never share a name.
    pub fn filter_tag(&self) -> String {
        let (base, time_range, split) = match self {
            ExportRequest::Screening(opts) => {
                (opts.categories.tag(), opts.time_range, opts.split_by_owner)
            }
            ExportRequest::Session(opts) => ("All", opts.time_range, false),
        };
        let mut tag = base.to_string();
        if time_range == TimeRange::Today {
            tag.push_str("-Today");
        }
        if split {
            tag.push_str("-ByCollector");
        }
        tag
    }

    /// `{kind}-{filter-tag}-{YYYY-MM-DD}.xlsx`
    pub fn file_name(&self, today: NaiveDate) -> String {
        format!(
            "{}-{}-{}.xlsx",
            self.kind_slug(),
            self.filter_tag(),
            today.format("%Y-%m-%d")
        )
    }

    /// Sheet name for an unsplit export: kind, category filter and date,
    /// e.g. `Screening SAM 2026-10-19`. Fits Excel's 31-char limit.
    pub fn sheet_name(&self, today: NaiveDate) -> String {
        let date = today.format("%Y-%m-%d");
        match self {
            ExportRequest::Screening(opts) => format!("Screening {} {}", opts.categories.tag(), date),
            ExportRequest::Session(opts) => format!("{} Sessions {}", opts.kind, date),
        }
    }

    /// Human-readable heading used in sheet title banners.
    pub fn heading(&self) -> String {
        match self {
            ExportRequest::Screening(opts) => {
                format!("Screening Records ({})", opts.categories.tag())
            }
            ExportRequest::Session(opts) => format!("{} Session Records", opts.kind),
        }
    }
}
