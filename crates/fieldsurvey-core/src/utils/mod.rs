//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_date, format_optional, normalize_name, sanitize_sheet_name, truncate_chars, yes_no,
    MAX_SHEET_NAME_LEN,
};
