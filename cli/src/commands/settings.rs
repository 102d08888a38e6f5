use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use vitalog_core::models::{
    AppSettings, AppSettingsUpdate, NotificationSettings, NotificationSettingsUpdate,
    validate_notification_update, validate_settings_update,
};
use vitalog_core::theme::{DEFAULT_THEME, palette, palette_or_default, theme_names};

use super::helpers::{check_mark, parse_time, print_json};
use crate::backend::Backend;

fn print_settings(s: &AppSettings) {
    println!("Theme:      {}", s.theme);
    println!("Language:   {}", s.language);
    println!("Sound:      {}", check_mark(s.sound_enabled));
    println!("Vibration:  {}", check_mark(s.vibration_enabled));
    println!("Analytics:  {}", check_mark(s.analytics_enabled));
}

pub(crate) async fn cmd_settings_show(backend: &Backend, json: bool) -> Result<()> {
    let settings = backend.settings().await?;
    if json {
        print_json(&settings)
    } else {
        print_settings(&settings);
        Ok(())
    }
}

pub(crate) async fn cmd_settings_set(
    backend: &Backend,
    update: &AppSettingsUpdate,
    json: bool,
) -> Result<()> {
    if update.is_empty() {
        bail!(
            "Nothing to update. Pass at least one of --theme, --language, --sound, --vibration, --analytics"
        );
    }
    validate_settings_update(update)?;
    let settings = backend.update_settings(update).await?;

    if json {
        print_json(&settings)
    } else {
        print_settings(&settings);
        Ok(())
    }
}

// --- Notifications ---

fn print_notifications(n: &NotificationSettings) {
    println!("Enabled:        {}", check_mark(n.is_enabled));
    println!("Morning pills:  {}", n.morning_pills_time);
    println!("Evening pills:  {}", n.evening_pills_time);
    println!("Water:          {}", n.water_reminder_times.join(", "));
    println!("Weight:         {}", n.weight_reminder_time);
    println!("Motivation:     {}", n.motivation_reminder_time);
}

pub(crate) async fn cmd_notifications_show(backend: &Backend, json: bool) -> Result<()> {
    let settings = backend.notification_settings().await?;
    if json {
        print_json(&settings)
    } else {
        print_notifications(&settings);
        Ok(())
    }
}

/// Notification flags as typed; times accept a bare hour (`7`).
pub(crate) struct NotificationArgs {
    pub morning: Option<String>,
    pub evening: Option<String>,
    pub water: Option<Vec<String>>,
    pub weight: Option<String>,
    pub motivation: Option<String>,
    pub enabled: Option<bool>,
}

impl NotificationArgs {
    fn into_update(self) -> NotificationSettingsUpdate {
        let time = |t: Option<String>| t.as_deref().map(parse_time);
        NotificationSettingsUpdate {
            morning_pills_time: time(self.morning),
            evening_pills_time: time(self.evening),
            water_reminder_times: self
                .water
                .map(|times| times.iter().map(|t| parse_time(t)).collect()),
            weight_reminder_time: time(self.weight),
            motivation_reminder_time: time(self.motivation),
            is_enabled: self.enabled,
        }
    }
}

pub(crate) async fn cmd_notifications_set(
    backend: &Backend,
    args: NotificationArgs,
    json: bool,
) -> Result<()> {
    let update = args.into_update();
    if update.is_empty() {
        bail!(
            "Nothing to update. Pass at least one of --morning, --evening, --water, --weight, --motivation, --enabled"
        );
    }
    let update = validate_notification_update(&update)?;
    let settings = backend.update_notification_settings(&update).await?;

    if json {
        print_json(&settings)
    } else {
        print_notifications(&settings);
        Ok(())
    }
}

// --- Themes ---

pub(crate) fn cmd_theme_list(json: bool) -> Result<()> {
    let names = theme_names();
    if json {
        return print_json(&names);
    }
    for name in names {
        let marker = if name == DEFAULT_THEME { " (default)" } else { "" };
        println!("{name}{marker}");
    }
    Ok(())
}

/// Show a palette by name, or the palette of the current theme setting.
pub(crate) async fn cmd_theme_show(
    backend: &Backend,
    name: Option<String>,
    json: bool,
) -> Result<()> {
    let (name, colors) = match name {
        Some(n) => match palette(&n) {
            Some(p) => (n.to_lowercase(), p),
            None => bail!(
                "Unknown theme '{n}'. Available: {}",
                theme_names().join(", ")
            ),
        },
        None => {
            let current = backend.settings().await?.theme;
            let p = palette_or_default(&current);
            (current, p)
        }
    };

    if json {
        return print_json(&serde_json::json!({ "theme": name, "colors": colors }));
    }

    #[derive(Tabled)]
    struct ColorRow {
        #[tabled(rename = "Role")]
        role: &'static str,
        #[tabled(rename = "Color")]
        color: &'static str,
    }

    let rows: Vec<ColorRow> = colors
        .entries()
        .into_iter()
        .map(|(role, color)| ColorRow { role, color })
        .collect();

    println!("Theme: {name}");
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_args_expand_bare_hours() {
        let update = NotificationArgs {
            morning: Some("7".into()),
            evening: None,
            water: Some(vec!["9".into(), "13:30".into()]),
            weight: None,
            motivation: None,
            enabled: Some(false),
        }
        .into_update();
        assert_eq!(update.morning_pills_time.as_deref(), Some("07:00"));
        assert_eq!(
            update.water_reminder_times,
            Some(vec!["09:00".to_string(), "13:30".to_string()])
        );
        assert!(update.evening_pills_time.is_none());
        assert_eq!(update.is_enabled, Some(false));
    }

    #[test]
    fn test_notification_args_empty() {
        let update = NotificationArgs {
            morning: None,
            evening: None,
            water: None,
            weight: None,
            motivation: None,
            enabled: None,
        }
        .into_update();
        assert!(update.is_empty());
    }
}
