//! Filtering and grouping stages. Each stage takes the previous stage's
//! output and never touches the source collection.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::options::{CategoryFilter, TimeRange};
use crate::models::{ScreeningRecord, SurveyRecord};

/// Stage 1: keep records collected on `today` when the range is `Today`.
pub fn filter_by_time<T: SurveyRecord>(records: &[T], range: TimeRange, today: NaiveDate) -> Vec<&T> {
    records
        .iter()
        .filter(|r| range == TimeRange::All || r.record_date() == today)
        .collect()
}

/// Stage 2: keep screenings whose MUAC band is selected.
pub fn filter_by_category(
    records: Vec<&ScreeningRecord>,
    categories: CategoryFilter,
) -> Vec<&ScreeningRecord> {
    records
        .into_iter()
        .filter(|r| categories.admits(r.classification()))
        .collect()
}

/// Stage 3: group by owning collector, ordered by collector id. Record order
/// within a group follows the input.
pub fn partition_by_owner<T: SurveyRecord>(records: Vec<&T>) -> Vec<(String, Vec<&T>)> {
    let mut groups: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for record in records {
        groups.entry(record.owner().to_string()).or_default().push(record);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Location, NewScreening};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn screening(owner: &str, muac: f64, date: NaiveDate) -> ScreeningRecord {
        NewScreening {
            collected_at: date.and_hms_opt(8, 30, 0).unwrap(),
            name: "Ali".to_string(),
            guardian_name: "Khan".to_string(),
            age: 20,
            muac,
            gender: Gender::Male,
            location: Location::default(),
            vaccine_dose: String::new(),
            vaccine_due: false,
            remarks: None,
        }
        .stamp(1, owner, false)
    }

    #[test]
    fn test_filter_by_time() {
        let yesterday = today().pred_opt().unwrap();
        let records = vec![
            screening("a", 13.0, today()),
            screening("a", 13.0, yesterday),
            screening("b", 13.0, today()),
        ];
        assert_eq!(filter_by_time(&records, TimeRange::Today, today()).len(), 2);
        assert_eq!(filter_by_time(&records, TimeRange::All, today()).len(), 3);
    }

    #[test]
    fn test_filter_by_category() {
        let records = vec![
            screening("a", 10.5, today()),
            screening("a", 11.5, today()),
            screening("a", 12.0, today()),
            screening("a", 12.5, today()),
        ];
        let all = filter_by_time(&records, TimeRange::All, today());

        let sam = filter_by_category(all.clone(), CategoryFilter { sam: true, mam: false });
        assert_eq!(sam.len(), 1);

        let mam = filter_by_category(all.clone(), CategoryFilter { sam: false, mam: true });
        assert_eq!(mam.len(), 2);

        let both = filter_by_category(all.clone(), CategoryFilter { sam: true, mam: true });
        assert!(both.iter().all(|r| r.muac <= 12.0));
        assert_eq!(both.len(), 3);

        let none = filter_by_category(all, CategoryFilter::default());
        assert_eq!(none.len(), 4);
    }

    #[test]
    fn test_partition_by_owner() {
        let records = vec![
            screening("zed", 13.0, today()),
            screening("amy", 10.0, today()),
            screening("zed", 11.0, today()),
        ];
        let groups = partition_by_owner(filter_by_time(&records, TimeRange::All, today()));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "amy");
        assert_eq!(groups[1].0, "zed");
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(groups[1].1[0].muac, 13.0);
    }
}
