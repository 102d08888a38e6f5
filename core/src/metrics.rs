use anyhow::{Result, bail};
use chrono::{Duration, Local, NaiveDate};
use tracing::info;
use uuid::Uuid;

use crate::dates::format_iso;
use crate::models::{
    Achievement, AchievementsAndStats, ActivityLevel, DailyTarget, DrinkType, UserStats,
    WaterIntake, WaterIntakeStatus, WeightEntry, WeightGoal, WeightProgress, WeightProgressPoint,
    WeightProgressSummary,
};
use crate::records::{DrinksByDate, PillsByDate, WeightsByDate};
use crate::store::{Store, keys};

pub const XP_PER_LEVEL: u32 = 500;
pub const MAX_PROGRESS_DAYS: u32 = 365;
pub const MAX_STREAK_DAYS: u32 = 365;
/// Glasses of water per day that count as reaching the water goal.
pub const WATER_GOAL: u32 = 10;

pub const BADGE_FIRST_WEIGHT: &str = "first_weight";
pub const BADGE_SEVEN_DAYS: &str = "seven_days";
pub const BADGE_WATER_10: &str = "water_10";

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // avoid printing -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    (xp / XP_PER_LEVEL + 1).max(1)
}

#[must_use]
pub fn xp_to_next_level(xp: u32) -> u32 {
    (level_for_xp(xp) * XP_PER_LEVEL).saturating_sub(xp)
}

// --- Weight progress ---

/// Day-over-day differences and a summary over ascending `entries`.
///
/// The average daily change divides the total change by the number of
/// calendar days between the first and last entry.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_progress(entries: &[WeightEntry], total_days: u32) -> WeightProgress {
    let mut progress = Vec::with_capacity(entries.len());
    let mut previous: Option<f64> = None;
    for entry in entries {
        let difference = previous.map_or(0.0, |p| round_to(entry.weight - p, 1));
        progress.push(WeightProgressPoint {
            date: entry.date,
            weight: entry.weight,
            difference,
        });
        previous = Some(entry.weight);
    }

    let (total_change, average_daily_change) = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) if entries.len() > 1 => {
            let total = last.weight - first.weight;
            let span = (last.date - first.date).num_days().max(1);
            (round_to(total, 1), round_to(total / span as f64, 2))
        }
        _ => (0.0, 0.0),
    };

    WeightProgress {
        progress,
        summary: WeightProgressSummary {
            total_days,
            entries_found: entries.len(),
            total_change,
            average_daily_change,
            start_weight: entries.first().map(|e| e.weight),
            current_weight: entries.last().map(|e| e.weight),
        },
    }
}

/// Consecutive days with a weight entry, walking back from `today`.
#[must_use]
pub fn weight_streak(weights: &WeightsByDate, today: NaiveDate) -> u32 {
    let mut streak = 0;
    while streak < MAX_STREAK_DAYS {
        let day = today - Duration::days(i64::from(streak));
        if !weights.contains_key(&format_iso(day)) {
            break;
        }
        streak += 1;
    }
    streak
}

// --- Achievements ---

/// The fixed badge catalog with zeroed progress.
#[must_use]
pub fn seed_achievements() -> Vec<Achievement> {
    let badge = |badge_type: &str,
                 title: &str,
                 description: &str,
                 icon: &str,
                 color: &str,
                 xp_reward: u32,
                 requirement_count: u32| Achievement {
        id: Uuid::new_v4().to_string(),
        badge_type: badge_type.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        xp_reward,
        requirement_count,
        current_count: 0,
        is_unlocked: false,
        unlocked_at: None,
    };
    vec![
        badge(
            BADGE_FIRST_WEIGHT,
            "Erste Schritte",
            "Erstes Gewicht eingetragen",
            "scale",
            "#4CAF50",
            50,
            1,
        ),
        badge(
            BADGE_SEVEN_DAYS,
            "Gewichts-Warrior",
            "An 7 Tagen Gewicht eingetragen",
            "trending-down",
            "#9C27B0",
            150,
            7,
        ),
        badge(
            BADGE_WATER_10,
            "Wasserdrache",
            "10 Gläser Wasser an einem Tag",
            "water",
            "#2196F3",
            75,
            WATER_GOAL,
        ),
    ]
}

/// Raw inputs for one recomputation, loaded once from the store.
pub struct MetricInputs<'a> {
    pub weights: &'a WeightsByDate,
    pub drinks: &'a DrinksByDate,
    pub pills: &'a PillsByDate,
}

/// Recompute badge progress and stats from scratch.
///
/// `stored` supplies ids and `unlocked_at` stamps of earlier runs; badge
/// types missing from it are seeded. `now` stamps new unlocks.
#[must_use]
pub fn recompute(
    inputs: &MetricInputs<'_>,
    stored: Vec<Achievement>,
    today: NaiveDate,
    now: &str,
) -> AchievementsAndStats {
    let weight_days = u32::try_from(inputs.weights.len()).unwrap_or(u32::MAX);
    let water_today = inputs
        .drinks
        .get(&format_iso(today))
        .map_or(0, |d| d.drinks.get(DrinkType::Wasser));

    let mut achievements = seed_achievements();
    for badge in &mut achievements {
        if let Some(prev) = stored.iter().find(|a| a.badge_type == badge.badge_type) {
            badge.id.clone_from(&prev.id);
            badge.unlocked_at.clone_from(&prev.unlocked_at);
        }
        badge.current_count = match badge.badge_type.as_str() {
            BADGE_FIRST_WEIGHT => weight_days.min(1),
            BADGE_SEVEN_DAYS => weight_days.min(badge.requirement_count),
            BADGE_WATER_10 => water_today,
            _ => 0,
        };
        badge.is_unlocked = badge.current_count >= badge.requirement_count;
        if badge.is_unlocked && badge.unlocked_at.is_none() {
            badge.unlocked_at = Some(now.to_string());
            info!(badge = %badge.badge_type, "achievement unlocked");
        }
    }

    let total_xp = achievements
        .iter()
        .filter(|a| a.is_unlocked)
        .map(|a| a.xp_reward)
        .sum();
    let streak = weight_streak(inputs.weights, today);

    let water_goal_met = |date: &str| {
        inputs
            .drinks
            .get(date)
            .is_some_and(|d| d.drinks.get(DrinkType::Wasser) >= WATER_GOAL)
    };
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

    let stats = UserStats {
        total_xp,
        current_level: level_for_xp(total_xp),
        current_streak_days: streak,
        longest_streak: streak,
        pills_taken_total: inputs.pills.values().map(|p| p.doses_taken()).sum(),
        water_goals_achieved: count(
            inputs
                .drinks
                .keys()
                .filter(|k| water_goal_met(k.as_str()))
                .count(),
        ),
        weight_entries_total: weight_days,
        perfect_days: count(
            inputs
                .pills
                .iter()
                .filter(|(k, p)| p.all_taken() && water_goal_met(k.as_str()))
                .count(),
        ),
        updated_at: now.to_string(),
    };

    AchievementsAndStats {
        achievements,
        stats,
    }
}

// --- Water need ---

pub const ML_PER_KG: f64 = 35.0;
pub const MIN_WATER_ML: u32 = 1500;
pub const MAX_WATER_ML: u32 = 4000;
/// Body weight assumed when no weight has been logged yet.
pub const DEFAULT_BODY_WEIGHT: f64 = 70.0;

/// Daily water need in ml: 35 ml per kg, scaled by activity (medium when
/// unknown) and age, clamped to 1500..=4000.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn daily_water_need(
    weight_kg: f64,
    age: Option<u32>,
    activity: Option<ActivityLevel>,
) -> u32 {
    let multiplier = match activity.unwrap_or(ActivityLevel::Medium) {
        ActivityLevel::Low => 1.0,
        ActivityLevel::Medium => 1.2,
        ActivityLevel::High => 1.5,
    };
    let mut ml = weight_kg * ML_PER_KG * multiplier;
    match age {
        Some(a) if a > 65 => ml *= 0.9,
        Some(a) if a < 25 => ml *= 1.1,
        _ => {}
    }
    let ml = if ml.is_finite() { ml.max(0.0).trunc() } else { 0.0 };
    (ml.min(f64::from(MAX_WATER_ML)) as u32).clamp(MIN_WATER_ML, MAX_WATER_ML)
}

/// Progress towards the day's water goal. Without an intake record the
/// status is empty against `goal_ml`, counted in `glass_ml` glasses.
#[must_use]
pub fn water_status(
    intake: Option<&WaterIntake>,
    goal_ml: u32,
    glass_ml: u32,
) -> WaterIntakeStatus {
    let Some(intake) = intake else {
        return WaterIntakeStatus {
            total_ml: 0,
            daily_goal_ml: goal_ml,
            remaining_ml: goal_ml,
            progress_percentage: 0.0,
            glasses_consumed: 0,
            ml_per_glass: glass_ml,
            glasses_needed: goal_ml / glass_ml.max(1),
        };
    };
    let remaining_ml = intake.daily_goal_ml.saturating_sub(intake.total_ml);
    let progress = if intake.daily_goal_ml == 0 {
        100.0
    } else {
        (f64::from(intake.total_ml) / f64::from(intake.daily_goal_ml) * 100.0).min(100.0)
    };
    WaterIntakeStatus {
        total_ml: intake.total_ml,
        daily_goal_ml: intake.daily_goal_ml,
        remaining_ml,
        progress_percentage: round_to(progress, 1),
        glasses_consumed: intake.glasses_consumed,
        ml_per_glass: intake.ml_per_glass,
        glasses_needed: remaining_ml / intake.ml_per_glass.max(1),
    }
}

// --- Goal targets ---

/// Daily weight change needed to hit `goal` by its target date.
pub fn daily_target(
    goal: &WeightGoal,
    current_weight: f64,
    today: NaiveDate,
) -> Result<DailyTarget> {
    let Some(target_weight) = goal.resolved_target_weight() else {
        bail!("Goal has no target weight");
    };
    let days_remaining = (goal.target_date - today).num_days();
    if days_remaining <= 0 {
        bail!("Target date has already passed");
    }
    let weight_to_lose = current_weight - target_weight;
    #[allow(clippy::cast_precision_loss)]
    let daily = weight_to_lose / days_remaining as f64;
    Ok(DailyTarget {
        target_weight: round_to(target_weight, 1),
        weight_to_lose: round_to(weight_to_lose, 1),
        days_remaining,
        daily_target: round_to(daily, 3),
        suggested_daily_weight: round_to(current_weight - daily, 1),
    })
}

impl Store {
    /// Progress over the trailing `days`-day window ending `today`.
    pub fn weight_progress(&self, days: u32, today: NaiveDate) -> Result<WeightProgress> {
        if days == 0 || days > MAX_PROGRESS_DAYS {
            bail!("Days must be between 1 and {MAX_PROGRESS_DAYS}");
        }
        let start = today - Duration::days(i64::from(days) - 1);
        let entries = self.get_weight_range(start, today)?;
        Ok(summarize_progress(&entries, days))
    }

    /// Recompute achievements and stats from the raw records and persist
    /// both. The two writes are independent.
    pub fn compute_achievements_and_stats(&self, today: NaiveDate) -> Result<AchievementsAndStats> {
        let weights = self.get_all_weights()?;
        let drinks = self.get_all_drinks()?;
        let pills = self.get_all_pills()?;
        let stored: Vec<Achievement> = self.read(keys::ACHIEVEMENTS, Vec::new())?;
        let now = Local::now().to_rfc3339();

        let result = recompute(
            &MetricInputs {
                weights: &weights,
                drinks: &drinks,
                pills: &pills,
            },
            stored,
            today,
            &now,
        );
        self.write(keys::ACHIEVEMENTS, &result.achievements)?;
        self.write(keys::USER_STATS, &result.stats)?;
        Ok(result)
    }

    /// Stored catalog, seeded on first read.
    pub fn get_achievements(&self) -> Result<Vec<Achievement>> {
        let stored: Vec<Achievement> = self.read(keys::ACHIEVEMENTS, Vec::new())?;
        if stored.is_empty() {
            Ok(seed_achievements())
        } else {
            Ok(stored)
        }
    }

    pub fn get_user_stats(&self) -> Result<UserStats> {
        self.read(
            keys::USER_STATS,
            UserStats {
                current_level: 1,
                ..UserStats::default()
            },
        )
    }
}
