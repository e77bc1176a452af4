use chrono::NaiveDate;

/// Characters Excel refuses in worksheet names.
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Excel's worksheet name limit.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Normalize a person name: drop anything that is not alphanumeric or a
/// space, collapse runs of whitespace and title-case each word.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();

    cleaned
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Format a date the way exported sheets show it (dd/mm/yyyy).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Truncate to at most `max_len` characters, without an ellipsis.
pub fn truncate_chars(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// Make a string usable as a worksheet name.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if SHEET_NAME_FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        truncate_chars(cleaned, MAX_SHEET_NAME_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("ali"), "Ali");
        assert_eq!(normalize_name("  md.  RAHIM   uddin "), "Md Rahim Uddin");
        assert_eq!(normalize_name("o'brien-smith"), "Obriensmith");
        assert_eq!(normalize_name("jane2 doe"), "Jane2 Doe");
        assert_eq!(normalize_name("***"), "");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date), "07/03/2026");
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(true), "Yes");
        assert_eq!(yes_no(false), "No");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(&None, "-"), "-");
        assert_eq!(format_optional(&Some("017".to_string()), "-"), "017");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("team/a:b"), "team_a_b");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
        assert_eq!(
            sanitize_sheet_name("a-very-long-collector-identifier-0001").chars().count(),
            MAX_SHEET_NAME_LEN
        );
    }
}
