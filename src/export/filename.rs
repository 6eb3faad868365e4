//! Timestamped download file names
//!
//! Names read `<date> at <time><ext>`, e.g. `10-15-2026 at 3.04.05 PM.png`.
//! The format is fixed to US order (month, day, year and a 12-hour clock)
//! whatever the system locale, so names sort the same on every machine.
//! Slashes and colons from the date and time are replaced so the result is
//! a valid file name on every platform.

use chrono::{Local, NaiveDateTime};

/// File name for a capture taken now, in local time
pub fn default_file_name(extension: &str) -> String {
    file_name_at(Local::now().naive_local(), extension)
}

/// File name for a capture taken at `timestamp`
pub fn file_name_at(timestamp: NaiveDateTime, extension: &str) -> String {
    let name = format!(
        "{} at {}{}",
        timestamp.format("%-m/%-d/%Y"),
        timestamp.format("%-I:%M:%S %p"),
        extension
    );
    sanitize(&name)
}

/// Replace characters that cannot appear in file names
pub fn sanitize(name: &str) -> String {
    name.replace('/', "-").replace(':', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_fixed_timestamp() {
        assert_eq!(file_name_at(timestamp(15, 4, 5), ".png"), "10-15-2026 at 3.04.05 PM.png");
        assert_eq!(file_name_at(timestamp(0, 0, 9), ".png"), "10-15-2026 at 12.00.09 AM.png");
    }

    #[test]
    fn test_month_comes_before_day() {
        let timestamp = NaiveDate::from_ymd_opt(2026, 3, 28)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(file_name_at(timestamp, ".png"), "3-28-2026 at 9.30.00 AM.png");
    }

    #[test]
    fn test_no_illegal_characters() {
        let name = file_name_at(timestamp(23, 59, 59), ".png");
        assert!(!name.contains('/'));
        assert!(!name.contains(':'));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_default_name_is_png() {
        let name = default_file_name(".png");
        assert!(name.ends_with(".png"));
        assert!(name.contains(" at "));
        assert!(!name.contains('/') && !name.contains(':'));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a/b:c"), "a-b.c");
    }
}
