use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalog_core::dates::{format_display, format_display_short};
use vitalog_core::metrics::MAX_PROGRESS_DAYS;
use vitalog_core::models::{NewWeightEntry, WeightEntry};

use super::helpers::{no_neg_zero, parse_date, parse_weight, print_json, report_missing, signed};
use crate::backend::Backend;

pub(crate) async fn cmd_weight_log(
    backend: &Backend,
    value: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let weight = parse_weight(value)?;
    let date = parse_date(date)?;
    let result = backend.log_weight(&NewWeightEntry { date, weight }).await?;

    if json {
        print_json(&result)
    } else {
        println!(
            "Logged {:.1} kg for {}",
            result.weight,
            format_display(result.date)
        );
        Ok(())
    }
}

pub(crate) async fn cmd_weight_show(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;

    if let Some(e) = backend.get_weight(date).await? {
        if json {
            print_json(&e)?;
        } else {
            println!("{}: {:.1} kg", format_display(e.date), e.weight);
        }
    } else {
        report_missing(&format!("No weight entry for {}", format_display(date)), json);
    }

    Ok(())
}

fn print_weight_table(entries: &[WeightEntry]) {
    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        kg: String,
        #[tabled(rename = "Change")]
        change: String,
    }

    let mut previous: Option<f64> = None;
    let rows: Vec<WeightRow> = entries
        .iter()
        .map(|e| {
            let change = previous.map_or_else(|| "-".to_string(), |p| signed(e.weight - p));
            previous = Some(e.weight);
            WeightRow {
                date: format_display(e.date),
                kg: format!("{:.1}", e.weight),
                change,
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) async fn cmd_weight_range(
    backend: &Backend,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<()> {
    let end = parse_date(end)?;
    let start = match start {
        Some(s) => parse_date(Some(s))?,
        None => end - chrono::Duration::days(30),
    };
    if start > end {
        bail!("Start date must not be after end date");
    }

    let entries = backend.weight_range(start, end).await?;

    if json {
        print_json(&entries)
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `vitalog weight log` to record your weight.");
        Ok(())
    } else {
        print_weight_table(&entries);
        Ok(())
    }
}

pub(crate) async fn cmd_weight_progress(backend: &Backend, days: u32, json: bool) -> Result<()> {
    if days == 0 || days > MAX_PROGRESS_DAYS {
        bail!("Days must be between 1 and {MAX_PROGRESS_DAYS}");
    }
    let progress = backend.weight_progress(days).await?;

    if json {
        return print_json(&progress);
    }

    if progress.progress.is_empty() {
        eprintln!("No weight entries in the last {days} days.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        kg: String,
        #[tabled(rename = "Δ")]
        difference: String,
    }

    let rows: Vec<ProgressRow> = progress
        .progress
        .iter()
        .map(|p| ProgressRow {
            date: format_display_short(p.date),
            kg: format!("{:.1}", p.weight),
            difference: signed(p.difference),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let s = &progress.summary;
    let per_day = no_neg_zero(s.average_daily_change);
    println!(
        "{} entries over {} days: {} kg total, {per_day:+.2} kg/day",
        s.entries_found,
        s.total_days,
        signed(s.total_change),
    );

    Ok(())
}

pub(crate) async fn cmd_weight_delete(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    if !backend.delete_weight(date).await? {
        bail!("No weight entry for {}", format_display(date));
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": date }));
    } else {
        println!("Deleted weight entry for {}", format_display(date));
    }

    Ok(())
}
