use anyhow::{Context, Result};
use chrono::NaiveDate;

pub const ISO_FORMAT: &str = "%Y-%m-%d";

pub fn parse_iso(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)
        .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD"))
}

#[must_use]
pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// `dd.mm.yyyy`
#[must_use]
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// `dd.mm.yy`
#[must_use]
pub fn format_display_short(date: NaiveDate) -> String {
    date.format("%d.%m.%y").to_string()
}

/// Parse `dd.mm.yyyy` as typed by users.
pub fn parse_display(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d.%m.%Y")
        .with_context(|| format!("Invalid date '{s}'. Use DD.MM.YYYY"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_parse_and_format() {
        let d = parse_iso("2024-03-07").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(format_iso(d), "2024-03-07");
        assert!(parse_iso("07.03.2024").is_err());
    }

    #[test]
    fn test_display_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_display(d), "07.03.2024");
        assert_eq!(format_display_short(d), "07.03.24");
        assert_eq!(parse_display("07.03.2024").unwrap(), d);
        assert!(parse_display("2024-03-07").is_err());
    }
}
