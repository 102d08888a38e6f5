use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use vitalog_core::models::{NewReminder, Reminder, ReminderUpdate, validate_new_reminder};

use super::helpers::{check_mark, parse_time, print_json};
use crate::backend::Backend;

fn print_reminder(r: &Reminder) {
    let state = if r.is_enabled { "enabled" } else { "disabled" };
    println!("{} {} at {} ({state})", r.id, r.reminder_type, r.time);
}

pub(crate) async fn cmd_reminder_add(
    backend: &Backend,
    reminder_type: &str,
    time: &str,
    disabled: bool,
    json: bool,
) -> Result<()> {
    let reminder = validate_new_reminder(&NewReminder {
        reminder_type: reminder_type.to_string(),
        time: parse_time(time),
        is_enabled: !disabled,
    })?;
    let created = backend.create_reminder(&reminder).await?;

    if json {
        print_json(&created)
    } else {
        print!("Created reminder ");
        print_reminder(&created);
        Ok(())
    }
}

pub(crate) async fn cmd_reminder_list(backend: &Backend, json: bool) -> Result<()> {
    let reminders = backend.reminders().await?;

    if json {
        return print_json(&reminders);
    }
    if reminders.is_empty() {
        eprintln!("No reminders. Use `vitalog reminder add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ReminderRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Type")]
        reminder_type: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "On")]
        enabled: &'static str,
    }

    let mut sorted: Vec<&Reminder> = reminders.iter().collect();
    sorted.sort_by(|a, b| a.time.cmp(&b.time));
    let rows: Vec<ReminderRow> = sorted
        .into_iter()
        .map(|r| ReminderRow {
            id: r.id.clone(),
            reminder_type: r.reminder_type.clone(),
            time: r.time.clone(),
            enabled: check_mark(r.is_enabled),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

pub(crate) async fn cmd_reminder_toggle(
    backend: &Backend,
    id: &str,
    enabled: bool,
    json: bool,
) -> Result<()> {
    let update = ReminderUpdate {
        is_enabled: Some(enabled),
        ..ReminderUpdate::default()
    };
    let Some(reminder) = backend.update_reminder(id, &update).await? else {
        bail!("Reminder {id} not found");
    };

    if json {
        print_json(&reminder)
    } else {
        print_reminder(&reminder);
        Ok(())
    }
}

pub(crate) async fn cmd_reminder_delete(backend: &Backend, id: &str, json: bool) -> Result<()> {
    if !backend.delete_reminder(id).await? {
        bail!("Reminder {id} not found");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted reminder {id}");
    }

    Ok(())
}
