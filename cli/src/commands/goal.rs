use anyhow::{Context, Result, bail};
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalog_core::dates::format_display;
use vitalog_core::models::{GoalType, NewWeightGoal, WeightGoal, validate_new_goal};

use super::helpers::{parse_date, parse_weight, print_json, report_missing};
use crate::backend::Backend;

/// Most recent weight logged within the last year.
async fn latest_weight(backend: &Backend) -> Result<Option<f64>> {
    let today = Local::now().date_naive();
    let entries = backend
        .weight_range(today - chrono::Duration::days(365), today)
        .await?;
    Ok(entries.last().map(|e| e.weight))
}

fn target_label(goal: &WeightGoal) -> String {
    match (goal.goal_type, goal.resolved_target_weight()) {
        (GoalType::Percentage, Some(kg)) => {
            format!("-{}% ({kg:.1} kg)", goal.target_percentage.unwrap_or_default())
        }
        (_, Some(kg)) => format!("{kg:.1} kg"),
        (_, None) => "-".to_string(),
    }
}

pub(crate) async fn cmd_goal_set(
    backend: &Backend,
    weight: Option<String>,
    percent: Option<f64>,
    start: Option<String>,
    from: Option<String>,
    by: &str,
    json: bool,
) -> Result<()> {
    let (goal_type, target_weight, target_percentage) = match (weight, percent) {
        (Some(w), None) => (GoalType::FixedWeight, Some(parse_weight(&w)?), None),
        (None, Some(p)) => (GoalType::Percentage, None, Some(p)),
        _ => bail!("Pass exactly one of --weight or --percent"),
    };

    let start_weight = match start {
        Some(s) => parse_weight(&s)?,
        None => latest_weight(backend)
            .await?
            .context("No weight logged yet. Pass --start or log a weight first")?,
    };

    let goal = NewWeightGoal {
        goal_type,
        start_weight,
        target_weight,
        target_percentage,
        start_date: parse_date(from)?,
        target_date: parse_date(Some(by.to_string()))?,
    };
    validate_new_goal(&goal)?;

    let created = backend.create_goal(&goal).await?;

    if json {
        print_json(&created)
    } else {
        println!(
            "New goal: {:.1} kg → {} by {}",
            created.start_weight,
            target_label(&created),
            format_display(created.target_date)
        );
        Ok(())
    }
}

pub(crate) async fn cmd_goal_list(backend: &Backend, json: bool) -> Result<()> {
    let goals = backend.goals().await?;

    if json {
        return print_json(&goals);
    }
    if goals.is_empty() {
        eprintln!("No goals yet. Use `vitalog goal set` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Active")]
        active: &'static str,
        #[tabled(rename = "Type")]
        goal_type: String,
        #[tabled(rename = "Start (kg)")]
        start: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "From")]
        from: String,
        #[tabled(rename = "By")]
        by: String,
    }

    let rows: Vec<GoalRow> = goals
        .iter()
        .map(|g| GoalRow {
            active: if g.is_active { "*" } else { "" },
            goal_type: g.goal_type.to_string(),
            start: format!("{:.1}", g.start_weight),
            target: target_label(g),
            from: format_display(g.start_date),
            by: format_display(g.target_date),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) async fn cmd_goal_active(backend: &Backend, json: bool) -> Result<()> {
    let goal = backend.active_goal().await?;

    if json {
        return print_json(&goal);
    }
    match goal {
        Some(g) => println!(
            "Active goal: {:.1} kg → {} by {}",
            g.start_weight,
            target_label(&g),
            format_display(g.target_date)
        ),
        None => eprintln!("No active goal"),
    }
    Ok(())
}

pub(crate) async fn cmd_goal_target(
    backend: &Backend,
    current: Option<String>,
    json: bool,
) -> Result<()> {
    let current = match current {
        Some(s) => parse_weight(&s)?,
        None => latest_weight(backend)
            .await?
            .context("No weight logged yet. Pass the current weight")?,
    };

    let Some(target) = backend.daily_target(current).await? else {
        report_missing("No active goal", json);
        return Ok(());
    };

    if json {
        print_json(&target)
    } else {
        println!("Target weight:     {:.1} kg", target.target_weight);
        println!("Still to lose:     {:.1} kg", target.weight_to_lose);
        println!("Days remaining:    {}", target.days_remaining);
        println!("Per day:           {:.2} kg", target.daily_target);
        println!("Tomorrow's target: {:.1} kg", target.suggested_daily_weight);
        Ok(())
    }
}
