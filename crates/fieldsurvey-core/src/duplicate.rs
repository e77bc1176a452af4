//! Same-day duplicate detection for screening candidates.
//!
//! A candidate collides with a stored record when name, guardian name and
//! village all match exactly (case-sensitive) and the stored record was
//! collected on `today`'s calendar day. The detector only reports; the caller
//! decides whether to revise the candidate or force the insert.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{NewScreening, ScreeningRecord, SurveyRecord};

/// The identity fields of a screening candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

impl DuplicateQuery {
    /// All three identity fields, or `None` if any is missing or empty.
    fn identity(&self) -> Option<(&str, &str, &str)> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }
        Some((
            present(&self.name)?,
            present(&self.guardian_name)?,
            present(&self.village)?,
        ))
    }
}

impl From<&NewScreening> for DuplicateQuery {
    fn from(candidate: &NewScreening) -> Self {
        Self {
            name: Some(candidate.name.clone()),
            guardian_name: Some(candidate.guardian_name.clone()),
            village: Some(candidate.location.village.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuplicateResult<'a> {
    NoMatch,
    Match(&'a ScreeningRecord),
}

impl DuplicateResult<'_> {
    pub fn is_match(&self) -> bool {
        matches!(self, DuplicateResult::Match(_))
    }
}

/// Look for a record collected today with the same identity fields.
///
/// Partial queries never match. The first colliding record in collection
/// order is reported.
pub fn check_duplicate<'a>(
    candidate: &DuplicateQuery,
    existing: &'a [ScreeningRecord],
    today: NaiveDate,
) -> DuplicateResult<'a> {
    let Some((name, guardian, village)) = candidate.identity() else {
        return DuplicateResult::NoMatch;
    };

    existing
        .iter()
        .find(|record| {
            record.record_date() == today
                && record.name == name
                && record.guardian_name == guardian
                && record.location.village == village
        })
        .map_or(DuplicateResult::NoMatch, DuplicateResult::Match)
}

/// Why a batch candidate was flagged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchConflict<'a> {
    /// Repeats a stored record collected today.
    Stored(&'a ScreeningRecord),
    /// Repeats the candidate at this earlier position in the same batch.
    Earlier(usize),
}

/// Flag every candidate that repeats a stored same-day record or an earlier
/// same-day candidate of the batch. Returns `(index, conflict)` pairs in
/// batch order.
pub fn check_batch_duplicates<'a>(
    candidates: &[NewScreening],
    existing: &'a [ScreeningRecord],
    today: NaiveDate,
) -> Vec<(usize, BatchConflict<'a>)> {
    let queries: Vec<DuplicateQuery> = candidates.iter().map(DuplicateQuery::from).collect();
    let mut conflicts = Vec::new();

    for (i, query) in queries.iter().enumerate() {
        if let DuplicateResult::Match(record) = check_duplicate(query, existing, today) {
            conflicts.push((i, BatchConflict::Stored(record)));
            continue;
        }
        let Some(identity) = query.identity() else {
            continue;
        };
        let earlier = queries[..i].iter().zip(candidates).position(|(other, candidate)| {
            candidate.collected_at.date() == today && other.identity() == Some(identity)
        });
        if let Some(j) = earlier {
            conflicts.push((i, BatchConflict::Earlier(j)));
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Location};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn record(name: &str, guardian: &str, village: &str, date: NaiveDate) -> ScreeningRecord {
        ScreeningRecord {
            id: Uuid::new_v4(),
            serial: 1,
            collected_at: date.and_hms_opt(10, 0, 0).unwrap(),
            name: name.to_string(),
            guardian_name: guardian.to_string(),
            age: 20,
            muac: 12.5,
            gender: Gender::Female,
            location: Location {
                district: "D".to_string(),
                union: "U".to_string(),
                village: village.to_string(),
            },
            vaccine_dose: String::new(),
            vaccine_due: false,
            remarks: "Normal".to_string(),
            owner: "c".to_string(),
            synced: false,
        }
    }

    fn query(name: &str, guardian: &str, village: &str) -> DuplicateQuery {
        DuplicateQuery {
            name: Some(name.to_string()),
            guardian_name: Some(guardian.to_string()),
            village: Some(village.to_string()),
        }
    }

    #[test]
    fn test_same_day_identical_identity_matches() {
        let existing = vec![record("Ali", "Khan", "X", today())];
        let result = check_duplicate(&query("Ali", "Khan", "X"), &existing, today());
        assert_eq!(result, DuplicateResult::Match(&existing[0]));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let existing = vec![record("Ali", "Khan", "X", today())];
        let result = check_duplicate(&query("ali", "Khan", "X"), &existing, today());
        assert_eq!(result, DuplicateResult::NoMatch);
    }

    #[test]
    fn test_each_identity_field_must_match() {
        let existing = vec![record("Ali", "Khan", "X", today())];
        assert!(!check_duplicate(&query("Ali", "Khan", "Y"), &existing, today()).is_match());
        assert!(!check_duplicate(&query("Ali", "Kahn", "X"), &existing, today()).is_match());
        assert!(!check_duplicate(&query("Aly", "Khan", "X"), &existing, today()).is_match());
    }

    #[test]
    fn test_previous_day_does_not_match() {
        let yesterday = today().pred_opt().unwrap();
        let existing = vec![record("Ali", "Khan", "X", yesterday)];
        let result = check_duplicate(&query("Ali", "Khan", "X"), &existing, today());
        assert_eq!(result, DuplicateResult::NoMatch);
    }

    #[test]
    fn test_calendar_day_not_rolling_window() {
        // Late last night is less than 24h ago but still another day.
        let mut late = record("Ali", "Khan", "X", today());
        late.collected_at = today().pred_opt().unwrap().and_hms_opt(23, 59, 0).unwrap();
        let mut early = record("Ali", "Khan", "X", today());
        early.collected_at = today().and_hms_opt(0, 0, 1).unwrap();

        assert!(!check_duplicate(&query("Ali", "Khan", "X"), &[late], today()).is_match());
        assert!(check_duplicate(&query("Ali", "Khan", "X"), &[early], today()).is_match());
    }

    #[test]
    fn test_partial_query_never_matches() {
        let existing = vec![record("Ali", "Khan", "", today())];
        let partial = DuplicateQuery {
            name: Some("Ali".to_string()),
            guardian_name: Some("Khan".to_string()),
            village: None,
        };
        assert_eq!(check_duplicate(&partial, &existing, today()), DuplicateResult::NoMatch);

        let empty_village = query("Ali", "Khan", "");
        assert_eq!(
            check_duplicate(&empty_village, &existing, today()),
            DuplicateResult::NoMatch
        );
    }

    fn candidate(name: &str, village: &str, date: NaiveDate) -> NewScreening {
        NewScreening {
            collected_at: date.and_hms_opt(11, 30, 0).unwrap(),
            name: name.to_string(),
            guardian_name: "Khan".to_string(),
            age: 20,
            muac: 12.5,
            gender: Gender::Male,
            location: Location {
                district: "D".to_string(),
                union: "U".to_string(),
                village: village.to_string(),
            },
            vaccine_dose: String::new(),
            vaccine_due: false,
            remarks: None,
        }
    }

    #[test]
    fn test_batch_flags_stored_and_in_batch_repeats() {
        let existing = vec![record("Ali", "Khan", "X", today())];
        let batch = vec![
            candidate("Ali", "X", today()),
            candidate("Rina", "X", today()),
            candidate("Rina", "X", today()),
            candidate("Rina", "Y", today()),
        ];

        let conflicts = check_batch_duplicates(&batch, &existing, today());
        assert_eq!(
            conflicts,
            vec![
                (0, BatchConflict::Stored(&existing[0])),
                (2, BatchConflict::Earlier(1)),
            ]
        );
    }

    #[test]
    fn test_batch_ignores_earlier_candidate_from_another_day() {
        let yesterday = today().pred_opt().unwrap();
        let batch = vec![candidate("Rina", "X", yesterday), candidate("Rina", "X", today())];
        assert!(check_batch_duplicates(&batch, &[], today()).is_empty());

        let partial = vec![candidate("Rina", "", today()), candidate("Rina", "", today())];
        assert!(check_batch_duplicates(&partial, &[], today()).is_empty());
    }

    #[test]
    fn test_reports_first_collision() {
        let existing = vec![
            record("Ali", "Khan", "X", today()),
            record("Ali", "Khan", "X", today()),
        ];
        match check_duplicate(&query("Ali", "Khan", "X"), &existing, today()) {
            DuplicateResult::Match(found) => assert_eq!(found.id, existing[0].id),
            DuplicateResult::NoMatch => panic!("expected a match"),
        }
    }
}
