use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use vitalog_core::dates::parse_display;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" | "heute" => Ok(Local::now().date_naive()),
            "yesterday" | "gestern" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" | "morgen" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .or_else(|_| parse_display(&s))
                .with_context(|| {
                    format!(
                        "Invalid date '{s}'. Use YYYY-MM-DD, DD.MM.YYYY or today/yesterday/tomorrow"
                    )
                }),
        },
    }
}

/// Parse a weight as typed by the user. Accepts a decimal comma (`78,5`).
pub(crate) fn parse_weight(s: &str) -> Result<f64> {
    let normalized = s.trim().replace(',', ".");
    let value: f64 = normalized
        .parse()
        .with_context(|| format!("Invalid weight: '{s}'. Use a number like '78.5' or '78,5'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    Ok(value)
}

/// Parse `HH:MM` or a bare hour (`7` → `07:00`).
pub(crate) fn parse_time(s: &str) -> String {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(hour) if hour < 24 => format!("{hour:02}:00"),
        _ => s.to_string(),
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Print a "not found" style message on stdout (JSON) or stderr (text).
pub(crate) fn report_missing(message: &str, json: bool) {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
}

pub(crate) fn check_mark(done: bool) -> &'static str {
    if done { "✓" } else { "✗" }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn signed(v: f64) -> String {
    let v = no_neg_zero(v);
    if v > 0.0 {
        format!("+{v:.1}")
    } else {
        format!("{v:.1}")
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
