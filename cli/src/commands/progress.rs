use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalog_core::metrics::{XP_PER_LEVEL, xp_to_next_level};

use super::helpers::{check_mark, print_json};
use crate::backend::Backend;

pub(crate) async fn cmd_achievements(backend: &Backend, json: bool) -> Result<()> {
    let achievements = backend.achievements_and_stats().await?.achievements;

    if json {
        return print_json(&achievements);
    }

    #[derive(Tabled)]
    struct AchievementRow {
        #[tabled(rename = "")]
        icon: String,
        #[tabled(rename = "Badge")]
        title: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "XP")]
        xp: u32,
        #[tabled(rename = "Unlocked")]
        unlocked: &'static str,
    }

    let rows: Vec<AchievementRow> = achievements
        .iter()
        .map(|a| AchievementRow {
            icon: a.icon.clone(),
            title: a.title.clone(),
            description: a.description.clone(),
            progress: format!("{}/{}", a.current_count, a.requirement_count),
            xp: a.xp_reward,
            unlocked: check_mark(a.is_unlocked),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) async fn cmd_stats(backend: &Backend, json: bool) -> Result<()> {
    let stats = backend.achievements_and_stats().await?.stats;

    if json {
        return print_json(&stats);
    }

    println!(
        "Level {} · {} XP ({} XP to level {}, {XP_PER_LEVEL} XP per level)",
        stats.current_level,
        stats.total_xp,
        xp_to_next_level(stats.total_xp),
        stats.current_level + 1
    );
    println!("Weigh-in streak:     {} days", stats.current_streak_days);
    println!("Longest streak:      {} days", stats.longest_streak);
    println!("Weight entries:      {}", stats.weight_entries_total);
    println!("Pills taken:         {}", stats.pills_taken_total);
    println!("Water goals reached: {}", stats.water_goals_achieved);
    println!("Perfect days:        {}", stats.perfect_days);

    Ok(())
}
