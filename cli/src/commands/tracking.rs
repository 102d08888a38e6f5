use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalog_core::dates::format_display;
use vitalog_core::metrics::WATER_GOAL;
use vitalog_core::models::{DrinkCounts, DrinkType, DrinkUpdate, PillUpdate};

use super::helpers::{check_mark, parse_date, print_json, report_missing};
use crate::backend::Backend;

pub(crate) async fn cmd_dashboard(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let summary = backend.dashboard(date).await?;

    if json {
        return print_json(&summary);
    }

    println!("Dashboard for {}", format_display(date));
    match summary.pills {
        Some(ref p) => println!(
            "  Pills:   morning {}  evening {}",
            check_mark(p.morning_taken),
            check_mark(p.evening_taken)
        ),
        None => println!("  Pills:   nothing logged"),
    }
    match summary.drinks {
        Some(ref d) if d.drinks.total() > 0 => {
            let parts: Vec<String> = DrinkType::ALL
                .into_iter()
                .filter(|t| d.drinks.get(*t) > 0)
                .map(|t| format!("{} {}", t.label(), d.drinks.get(t)))
                .collect();
            println!("  Drinks:  {} (total {})", parts.join(", "), d.drinks.total());
        }
        _ => println!("  Drinks:  nothing logged"),
    }
    match summary.weight {
        Some(ref w) => println!("  Weight:  {:.1} kg", w.weight),
        None => println!("  Weight:  not logged"),
    }
    if let Some(ref goal) = summary.active_goal {
        if let Some(target) = goal.resolved_target_weight() {
            println!(
                "  Goal:    {target:.1} kg by {}",
                format_display(goal.target_date)
            );
        }
    }

    Ok(())
}

// --- Pills ---

pub(crate) async fn cmd_pills_show(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let Some(record) = backend.get_pills(date).await? else {
        report_missing(&format!("No pills logged for {}", format_display(date)), json);
        return Ok(());
    };

    if json {
        print_json(&record)
    } else {
        println!(
            "{}: morning {}  evening {}",
            format_display(date),
            check_mark(record.morning_taken),
            check_mark(record.evening_taken)
        );
        Ok(())
    }
}

pub(crate) async fn cmd_pills_set(
    backend: &Backend,
    morning: Option<bool>,
    evening: Option<bool>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if morning.is_none() && evening.is_none() {
        anyhow::bail!("Nothing to update. Pass --morning and/or --evening");
    }
    let date = parse_date(date)?;
    let record = backend
        .update_pills(
            date,
            &PillUpdate {
                morning_taken: morning,
                evening_taken: evening,
            },
        )
        .await?;

    if json {
        print_json(&record)
    } else {
        println!(
            "Pills for {}: morning {}  evening {}",
            format_display(date),
            check_mark(record.morning_taken),
            check_mark(record.evening_taken)
        );
        Ok(())
    }
}

// --- Drinks ---

fn print_drinks_table(counts: &DrinkCounts) {
    #[derive(Tabled)]
    struct DrinkRow {
        #[tabled(rename = "Drink")]
        label: &'static str,
        #[tabled(rename = "Key")]
        key: &'static str,
        #[tabled(rename = "Count")]
        count: u32,
    }

    let rows: Vec<DrinkRow> = DrinkType::ALL
        .into_iter()
        .map(|t| DrinkRow {
            label: t.label(),
            key: t.as_str(),
            count: counts.get(t),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let water = counts.get(DrinkType::Wasser);
    if water >= WATER_GOAL {
        println!("Water goal reached ({water}/{WATER_GOAL})");
    } else {
        println!("Water: {water}/{WATER_GOAL}");
    }
}

pub(crate) async fn cmd_drinks_show(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let record = backend.get_drinks(date).await?;

    if json {
        return match record {
            Some(r) => print_json(&r),
            None => {
                report_missing(&format!("No drinks logged for {}", format_display(date)), true);
                Ok(())
            }
        };
    }

    println!("Drinks for {}", format_display(date));
    print_drinks_table(&record.map(|r| r.drinks).unwrap_or_default());
    Ok(())
}

pub(crate) async fn cmd_drinks_set(
    backend: &Backend,
    drink: &str,
    count: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let drink_type: DrinkType = drink.parse()?;
    let date = parse_date(date)?;
    let record = backend
        .update_drink(date, &DrinkUpdate { drink_type, count })
        .await?;

    if json {
        print_json(&record)
    } else {
        println!(
            "{} for {}: {}",
            drink_type.label(),
            format_display(date),
            record.drinks.get(drink_type)
        );
        Ok(())
    }
}

/// Adjust a counter relative to its current value. Negative amounts count down.
pub(crate) async fn cmd_drinks_add(
    backend: &Backend,
    drink: &str,
    amount: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let drink_type: DrinkType = drink.parse()?;
    let date = parse_date(date)?;
    let current = backend
        .get_drinks(date)
        .await?
        .map_or(0, |r| r.drinks.get(drink_type));
    let count = i64::from(current) + amount;
    let record = backend
        .update_drink(date, &DrinkUpdate { drink_type, count })
        .await?;

    if json {
        print_json(&record)
    } else {
        println!(
            "{} for {}: {} → {}",
            drink_type.label(),
            format_display(date),
            current,
            record.drinks.get(drink_type)
        );
        Ok(())
    }
}
