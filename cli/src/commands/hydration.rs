use anyhow::{Result, bail};

use vitalog_core::dates::format_display;
use vitalog_core::models::{
    ActivityLevel, UserProfile, UserProfileUpdate, WaterIntake, WaterIntakeStatus,
    WaterIntakeUpdate, validate_profile_update, validate_water_intake_update,
};

use super::helpers::{parse_date, print_json, report_missing};
use crate::backend::Backend;

// --- Profile ---

fn print_profile(p: &UserProfile) {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!("Height:    {}", or_dash(p.height.map(|h| format!("{h:.0} cm"))));
    println!("Age:       {}", or_dash(p.age.map(|a| a.to_string())));
    println!("Gender:    {}", or_dash(p.gender.clone()));
    println!(
        "Activity:  {}",
        or_dash(p.activity_level.map(|a| a.to_string()))
    );
    println!("Glass:     {} ml", p.glass_size);
}

pub(crate) async fn cmd_profile_show(backend: &Backend, json: bool) -> Result<()> {
    let profile = backend.profile().await?;
    if json {
        return print_json(&profile);
    }
    match profile {
        Some(p) => print_profile(&p),
        None => eprintln!("No profile yet. Create one with `vitalog profile set`."),
    }
    Ok(())
}

/// Raw profile flags as typed on the command line.
pub(crate) struct ProfileArgs {
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub activity: Option<String>,
    pub glass_size: Option<u32>,
}

impl ProfileArgs {
    fn into_update(self) -> Result<UserProfileUpdate> {
        let activity_level = self
            .activity
            .as_deref()
            .map(str::parse::<ActivityLevel>)
            .transpose()?;
        Ok(UserProfileUpdate {
            height: self.height,
            age: self.age,
            gender: self.gender,
            activity_level,
            glass_size: self.glass_size,
        })
    }
}

pub(crate) async fn cmd_profile_set(
    backend: &Backend,
    args: ProfileArgs,
    json: bool,
) -> Result<()> {
    let update = args.into_update()?;
    if update.is_empty() {
        bail!(
            "Nothing to update. Pass at least one of --height, --age, --gender, --activity, --glass-size"
        );
    }
    let update = validate_profile_update(&update)?;
    let profile = backend.update_profile(&update).await?;

    if json {
        print_json(&profile)
    } else {
        print_profile(&profile);
        Ok(())
    }
}

// --- Water intake ---

fn print_intake(intake: &WaterIntake) {
    println!(
        "{}: {} glasses × {} ml = {} ml (goal {} ml)",
        format_display(intake.date),
        intake.glasses_consumed,
        intake.ml_per_glass,
        intake.total_ml,
        intake.daily_goal_ml
    );
}

pub(crate) async fn cmd_water_show(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let Some(intake) = backend.water_intake(date).await? else {
        report_missing(
            &format!("No water intake logged for {}", format_display(date)),
            json,
        );
        return Ok(());
    };
    if json {
        print_json(&intake)
    } else {
        print_intake(&intake);
        Ok(())
    }
}

pub(crate) async fn cmd_water_set(
    backend: &Backend,
    glasses: Option<u32>,
    glass_ml: Option<u32>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let update = WaterIntakeUpdate {
        glasses_consumed: glasses,
        ml_per_glass: glass_ml,
    };
    if update.glasses_consumed.is_none() && update.ml_per_glass.is_none() {
        bail!("Nothing to update. Pass --glasses and/or --glass-ml");
    }
    validate_water_intake_update(&update)?;
    let date = parse_date(date)?;
    let intake = backend.update_water_intake(date, &update).await?;

    if json {
        print_json(&intake)
    } else {
        print_intake(&intake);
        Ok(())
    }
}

/// Add glasses to the day's count. Negative amounts count down, never below 0.
pub(crate) async fn cmd_water_add(
    backend: &Backend,
    amount: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let current = backend
        .water_intake(date)
        .await?
        .map_or(0, |w| w.glasses_consumed);
    let glasses = u32::try_from((i64::from(current) + amount).max(0)).unwrap_or(u32::MAX);
    let intake = backend
        .update_water_intake(
            date,
            &WaterIntakeUpdate {
                glasses_consumed: Some(glasses),
                ml_per_glass: None,
            },
        )
        .await?;

    if json {
        print_json(&intake)
    } else {
        print_intake(&intake);
        Ok(())
    }
}

fn progress_bar(percentage: f64) -> String {
    const WIDTH: usize = 20;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

fn print_status(status: &WaterIntakeStatus) {
    println!(
        "{} {:.1}%  {} / {} ml",
        progress_bar(status.progress_percentage),
        status.progress_percentage,
        status.total_ml,
        status.daily_goal_ml
    );
    if status.remaining_ml == 0 {
        println!("Daily water goal reached");
    } else {
        println!(
            "{} ml to go, about {} more glasses of {} ml",
            status.remaining_ml, status.glasses_needed, status.ml_per_glass
        );
    }
}

pub(crate) async fn cmd_water_status(
    backend: &Backend,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let status = backend.water_status(date).await?;
    if json {
        print_json(&status)
    } else {
        println!("Water for {}", format_display(date));
        print_status(&status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_args_parse_activity() {
        let update = ProfileArgs {
            height: None,
            age: Some(40),
            gender: None,
            activity: Some("High".into()),
            glass_size: None,
        }
        .into_update()
        .unwrap();
        assert_eq!(update.activity_level, Some(ActivityLevel::High));
        assert_eq!(update.age, Some(40));

        let bad = ProfileArgs {
            height: None,
            age: None,
            gender: None,
            activity: Some("extreme".into()),
            glass_size: None,
        };
        assert!(bad.into_update().is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(50.0), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(140.0), format!("[{}]", "#".repeat(20)));
    }
}
