//! Date and label formatting

use chrono::NaiveDate;

/// Format a date as a long English date
///
/// The day is zero padded (`"October 06, 2025"`).
///
/// # Examples
/// ```
/// use badge_text::format_long_date;
/// let date = chrono::NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
/// assert_eq!(format_long_date(date), "October 26, 2025");
/// ```
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Uppercase the first character, leave the rest untouched
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
