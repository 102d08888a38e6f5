use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// --- Pills ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillTracking {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub morning_taken: bool,
    #[serde(default)]
    pub evening_taken: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl PillTracking {
    #[must_use]
    pub fn doses_taken(&self) -> u32 {
        u32::from(self.morning_taken) + u32::from(self.evening_taken)
    }

    #[must_use]
    pub fn all_taken(&self) -> bool {
        self.morning_taken && self.evening_taken
    }
}

/// Partial update for a day's pill record. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PillUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_taken: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_taken: Option<bool>,
}

// --- Drinks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkType {
    Wasser,
    Abnehmkaffee,
    IngwerKnoblauchTee,
    Wasserkur,
    Kaffee,
}

impl DrinkType {
    pub const ALL: [DrinkType; 5] = [
        DrinkType::Wasser,
        DrinkType::Abnehmkaffee,
        DrinkType::IngwerKnoblauchTee,
        DrinkType::Wasserkur,
        DrinkType::Kaffee,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wasser => "wasser",
            Self::Abnehmkaffee => "abnehmkaffee",
            Self::IngwerKnoblauchTee => "ingwer_knoblauch_tee",
            Self::Wasserkur => "wasserkur",
            Self::Kaffee => "kaffee",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Wasser => "Wasser",
            Self::Abnehmkaffee => "Abnehmkaffee",
            Self::IngwerKnoblauchTee => "Ingwer-Knoblauch-Tee",
            Self::Wasserkur => "Wasserkur",
            Self::Kaffee => "Kaffee",
        }
    }
}

impl fmt::Display for DrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrinkType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        DrinkType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid drink type '{s}'. Must be one of: {}",
                    DrinkType::ALL.map(DrinkType::as_str).join(", ")
                )
            })
    }
}

/// The five named drink counters tracked per day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkCounts {
    #[serde(default)]
    pub wasser: u32,
    #[serde(default)]
    pub abnehmkaffee: u32,
    #[serde(default)]
    pub ingwer_knoblauch_tee: u32,
    #[serde(default)]
    pub wasserkur: u32,
    #[serde(default)]
    pub kaffee: u32,
}

impl DrinkCounts {
    #[must_use]
    pub fn get(&self, drink: DrinkType) -> u32 {
        match drink {
            DrinkType::Wasser => self.wasser,
            DrinkType::Abnehmkaffee => self.abnehmkaffee,
            DrinkType::IngwerKnoblauchTee => self.ingwer_knoblauch_tee,
            DrinkType::Wasserkur => self.wasserkur,
            DrinkType::Kaffee => self.kaffee,
        }
    }

    pub fn set(&mut self, drink: DrinkType, count: u32) {
        let slot = match drink {
            DrinkType::Wasser => &mut self.wasser,
            DrinkType::Abnehmkaffee => &mut self.abnehmkaffee,
            DrinkType::IngwerKnoblauchTee => &mut self.ingwer_knoblauch_tee,
            DrinkType::Wasserkur => &mut self.wasserkur,
            DrinkType::Kaffee => &mut self.kaffee,
        };
        *slot = count;
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        DrinkType::ALL.iter().map(|t| self.get(*t)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkTracking {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub drinks: DrinkCounts,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Sets a single counter to `count`. Negative targets are clamped to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinkUpdate {
    pub drink_type: DrinkType,
    pub count: i64,
}

impl DrinkUpdate {
    #[must_use]
    pub fn clamped_count(&self) -> u32 {
        u32::try_from(self.count.max(0)).unwrap_or(u32::MAX)
    }
}

// --- Weight tracking types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub date: NaiveDate,
    pub weight: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeightEntry {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProgressPoint {
    pub date: NaiveDate,
    pub weight: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProgressSummary {
    pub total_days: u32,
    pub entries_found: usize,
    pub total_change: f64,
    pub average_daily_change: f64,
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProgress {
    pub progress: Vec<WeightProgressPoint>,
    pub summary: WeightProgressSummary,
}

// --- Goals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Percentage,
    FixedWeight,
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => f.write_str("percentage"),
            Self::FixedWeight => f.write_str("fixed_weight"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGoal {
    pub id: String,
    pub goal_type: GoalType,
    pub start_weight: f64,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub target_percentage: Option<f64>,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl WeightGoal {
    /// Target weight in kg, derived from the percentage for percentage goals.
    #[must_use]
    pub fn resolved_target_weight(&self) -> Option<f64> {
        match self.goal_type {
            GoalType::Percentage => self
                .target_percentage
                .map(|p| self.start_weight * (1.0 - p / 100.0)),
            GoalType::FixedWeight => self.target_weight,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeightGoal {
    pub goal_type: GoalType,
    pub start_weight: f64,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub target_percentage: Option<f64>,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTarget {
    pub target_weight: f64,
    pub weight_to_lose: f64,
    pub days_remaining: i64,
    pub daily_target: f64,
    pub suggested_daily_weight: f64,
}

// --- Reminders ---

pub const REMINDER_TYPES: &[&str] = &["pills_morning", "pills_evening", "weight", "drinks"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub reminder_type: String,
    pub time: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub reminder_type: String,
    pub time: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

/// Partial reminder update. `{"is_enabled": false}` alone toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

// --- Settings ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub theme: String,
    pub language: String,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub analytics_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: crate::theme::DEFAULT_THEME.to_string(),
            language: "de".to_string(),
            sound_enabled: true,
            vibration_enabled: true,
            analytics_enabled: true,
        }
    }
}

impl AppSettings {
    pub fn apply(&mut self, update: &AppSettingsUpdate) {
        if let Some(ref theme) = update.theme {
            self.theme.clone_from(theme);
        }
        if let Some(ref language) = update.language {
            self.language.clone_from(language);
        }
        if let Some(v) = update.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = update.vibration_enabled {
            self.vibration_enabled = v;
        }
        if let Some(v) = update.analytics_enabled {
            self.analytics_enabled = v;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_enabled: Option<bool>,
}

impl AppSettingsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.language.is_none()
            && self.sound_enabled.is_none()
            && self.vibration_enabled.is_none()
            && self.analytics_enabled.is_none()
    }
}

// --- Notification settings ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub morning_pills_time: String,
    pub evening_pills_time: String,
    pub water_reminder_times: Vec<String>,
    pub weight_reminder_time: String,
    pub motivation_reminder_time: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub updated_at: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            morning_pills_time: "08:00".to_string(),
            evening_pills_time: "20:00".to_string(),
            water_reminder_times: vec!["10:00".into(), "14:00".into(), "18:00".into()],
            weight_reminder_time: "07:00".to_string(),
            motivation_reminder_time: "19:00".to_string(),
            is_enabled: true,
            updated_at: String::new(),
        }
    }
}

impl NotificationSettings {
    /// Apply an already validated patch.
    pub fn apply(&mut self, update: &NotificationSettingsUpdate) {
        if let Some(ref t) = update.morning_pills_time {
            self.morning_pills_time.clone_from(t);
        }
        if let Some(ref t) = update.evening_pills_time {
            self.evening_pills_time.clone_from(t);
        }
        if let Some(ref times) = update.water_reminder_times {
            self.water_reminder_times.clone_from(times);
        }
        if let Some(ref t) = update.weight_reminder_time {
            self.weight_reminder_time.clone_from(t);
        }
        if let Some(ref t) = update.motivation_reminder_time {
            self.motivation_reminder_time.clone_from(t);
        }
        if let Some(v) = update.is_enabled {
            self.is_enabled = v;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_pills_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_pills_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_reminder_times: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation_reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

impl NotificationSettingsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.morning_pills_time.is_none()
            && self.evening_pills_time.is_none()
            && self.water_reminder_times.is_none()
            && self.weight_reminder_time.is_none()
            && self.motivation_reminder_time.is_none()
            && self.is_enabled.is_none()
    }
}

// --- User profile & water intake ---

pub const DEFAULT_GLASS_ML: u32 = 250;
pub const MAX_GLASS_ML: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        ActivityLevel::ALL
            .into_iter()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!("Invalid activity level '{s}'. Must be one of: low, medium, high")
            })
    }
}

pub const GENDERS: &[&str] = &["male", "female", "other"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    /// Height in cm.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default = "default_glass_ml")]
    pub glass_size: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_glass_ml() -> u32 {
    DEFAULT_GLASS_ML
}

/// Profile patch. Present fields overwrite, absent ones are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glass_size: Option<u32>,
}

impl UserProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.height.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.activity_level.is_none()
            && self.glass_size.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterIntake {
    pub id: String,
    pub date: NaiveDate,
    pub glasses_consumed: u32,
    pub ml_per_glass: u32,
    pub total_ml: u32,
    pub daily_goal_ml: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaterIntakeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glasses_consumed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_per_glass: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterIntakeStatus {
    pub total_ml: u32,
    pub daily_goal_ml: u32,
    pub remaining_ml: u32,
    pub progress_percentage: f64,
    pub glasses_consumed: u32,
    pub ml_per_glass: u32,
    pub glasses_needed: u32,
}

// --- Achievements & stats ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub badge_type: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub xp_reward: u32,
    pub requirement_count: u32,
    #[serde(default)]
    pub current_count: u32,
    #[serde(default)]
    pub is_unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_xp: u32,
    pub current_level: u32,
    pub current_streak_days: u32,
    pub longest_streak: u32,
    pub pills_taken_total: u32,
    pub water_goals_achieved: u32,
    pub weight_entries_total: u32,
    pub perfect_days: u32,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsAndStats {
    pub achievements: Vec<Achievement>,
    pub stats: UserStats,
}

// --- Chat ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatCategory {
    Rezepte,
    Gesundheitstipps,
    Motivation,
    Fitness,
    Ernaehrung,
    Allgemein,
}

impl ChatCategory {
    pub const ALL: [ChatCategory; 6] = [
        ChatCategory::Rezepte,
        ChatCategory::Gesundheitstipps,
        ChatCategory::Motivation,
        ChatCategory::Fitness,
        ChatCategory::Ernaehrung,
        ChatCategory::Allgemein,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rezepte => "rezepte",
            Self::Gesundheitstipps => "gesundheitstipps",
            Self::Motivation => "motivation",
            Self::Fitness => "fitness",
            Self::Ernaehrung => "ernaehrung",
            Self::Allgemein => "allgemein",
        }
    }
}

impl fmt::Display for ChatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        ChatCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid category '{s}'. Must be one of: {}",
                    ChatCategory::ALL.map(ChatCategory::as_str).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedChatMessage {
    pub id: String,
    pub original_message: String,
    pub ai_response: String,
    pub category: ChatCategory,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSavedMessage {
    pub original_message: String,
    pub ai_response: String,
    pub category: ChatCategory,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedMessageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ChatCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ChatCategory,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub message: String,
    pub is_user: bool,
    pub timestamp: String,
}

/// One conversation. Unknown sessions read as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl ChatSession {
    #[must_use]
    pub fn empty(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

// --- Dashboard ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub pills: Option<PillTracking>,
    pub drinks: Option<DrinkTracking>,
    pub weight: Option<WeightEntry>,
    pub active_goal: Option<WeightGoal>,
}

// --- Export / Import types ---

pub const EXPORT_VERSION: i64 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub pills: BTreeMap<String, PillTracking>,
    #[serde(default)]
    pub drinks: BTreeMap<String, DrinkTracking>,
    #[serde(default)]
    pub weights: BTreeMap<String, WeightEntry>,
    #[serde(default)]
    pub goals: Vec<WeightGoal>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub app_settings: AppSettings,
    #[serde(default)]
    pub saved_messages: Vec<SavedChatMessage>,
    #[serde(default)]
    pub user_stats: UserStats,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub notification_settings: NotificationSettings,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub water_intake: BTreeMap<String, WaterIntake>,
    #[serde(default)]
    pub chat_sessions: BTreeMap<String, ChatSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct ImportSummary {
    pub pills_imported: usize,
    pub drinks_imported: usize,
    pub weights_imported: usize,
    pub goals_imported: usize,
    pub reminders_imported: usize,
    pub saved_messages_imported: usize,
    #[serde(default)]
    pub water_intake_imported: usize,
    #[serde(default)]
    pub chat_sessions_imported: usize,
}

// --- Validation ---

/// Validate a weight in kg: finite and strictly positive.
pub fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        bail!("Weight must be a number greater than 0");
    }
    Ok(())
}

/// Validate a new goal: positive start weight, a target matching the goal type,
/// and a target date after the start date.
pub fn validate_new_goal(goal: &NewWeightGoal) -> Result<()> {
    validate_weight(goal.start_weight)?;
    match goal.goal_type {
        GoalType::Percentage => match goal.target_percentage {
            Some(p) if p > 0.0 && p < 100.0 => {}
            Some(_) => bail!("target_percentage must be between 0 and 100"),
            None => bail!("Percentage goals require target_percentage"),
        },
        GoalType::FixedWeight => match goal.target_weight {
            Some(w) => validate_weight(w)?,
            None => bail!("Fixed weight goals require target_weight"),
        },
    }
    if goal.target_date <= goal.start_date {
        bail!("target_date must be after start_date");
    }
    Ok(())
}

pub fn validate_reminder_type(reminder_type: &str) -> Result<String> {
    let lower = reminder_type.trim().to_lowercase();
    if REMINDER_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid reminder type '{reminder_type}'. Must be one of: {}",
            REMINDER_TYPES.join(", ")
        )
    }
}

/// Validate and normalize a 24h `HH:MM` time ("8:05" becomes "08:05").
pub fn validate_reminder_time(time: &str) -> Result<String> {
    let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| anyhow::anyhow!("Invalid time '{time}'. Use HH:MM (24h)"))?;
    Ok(parsed.format("%H:%M").to_string())
}

pub fn validate_new_reminder(reminder: &NewReminder) -> Result<NewReminder> {
    Ok(NewReminder {
        reminder_type: validate_reminder_type(&reminder.reminder_type)?,
        time: validate_reminder_time(&reminder.time)?,
        is_enabled: reminder.is_enabled,
    })
}

/// Validate and normalize the fields present in a reminder patch.
pub fn validate_reminder_update(update: &ReminderUpdate) -> Result<ReminderUpdate> {
    Ok(ReminderUpdate {
        reminder_type: update
            .reminder_type
            .as_deref()
            .map(validate_reminder_type)
            .transpose()?,
        time: update
            .time
            .as_deref()
            .map(validate_reminder_time)
            .transpose()?,
        is_enabled: update.is_enabled,
    })
}

pub fn validate_new_saved_message(message: &NewSavedMessage) -> Result<()> {
    if message.title.trim().is_empty() {
        bail!("Saved message title must not be empty");
    }
    if message.ai_response.trim().is_empty() {
        bail!("Saved message response must not be empty");
    }
    Ok(())
}

pub fn validate_saved_message_update(update: &SavedMessageUpdate) -> Result<()> {
    if update.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
        bail!("Saved message title must not be empty");
    }
    Ok(())
}

/// Validate a settings patch: known theme, non-empty language.
pub fn validate_settings_update(update: &AppSettingsUpdate) -> Result<()> {
    if let Some(ref name) = update.theme {
        if crate::theme::palette(name).is_none() {
            bail!(
                "Unknown theme '{name}'. Must be one of: {}",
                crate::theme::theme_names().join(", ")
            );
        }
    }
    if update.language.as_ref().is_some_and(|l| l.trim().is_empty()) {
        bail!("Language must not be empty");
    }
    Ok(())
}

/// Validate and normalize a notification patch. Every time must be `HH:MM`.
pub fn validate_notification_update(
    update: &NotificationSettingsUpdate,
) -> Result<NotificationSettingsUpdate> {
    let time = |t: Option<&str>| t.map(validate_reminder_time).transpose();
    Ok(NotificationSettingsUpdate {
        morning_pills_time: time(update.morning_pills_time.as_deref())?,
        evening_pills_time: time(update.evening_pills_time.as_deref())?,
        water_reminder_times: update
            .water_reminder_times
            .as_ref()
            .map(|times| {
                times
                    .iter()
                    .map(|t| validate_reminder_time(t))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?,
        weight_reminder_time: time(update.weight_reminder_time.as_deref())?,
        motivation_reminder_time: time(update.motivation_reminder_time.as_deref())?,
        is_enabled: update.is_enabled,
    })
}

fn validate_glass_size(ml: u32) -> Result<()> {
    if ml == 0 || ml > MAX_GLASS_ML {
        bail!("Glass size must be between 1 and {MAX_GLASS_ML} ml");
    }
    Ok(())
}

/// Validate and normalize a profile patch (gender is lowercased).
pub fn validate_profile_update(update: &UserProfileUpdate) -> Result<UserProfileUpdate> {
    if let Some(h) = update.height {
        if !h.is_finite() || h <= 0.0 || h > 300.0 {
            bail!("Height must be between 0 and 300 cm");
        }
    }
    if update.age.is_some_and(|a| a == 0 || a > 130) {
        bail!("Age must be between 1 and 130");
    }
    let gender = match update.gender.as_deref() {
        Some(g) => {
            let lower = g.trim().to_lowercase();
            if !GENDERS.contains(&lower.as_str()) {
                bail!("Invalid gender '{g}'. Must be one of: {}", GENDERS.join(", "));
            }
            Some(lower)
        }
        None => None,
    };
    if let Some(ml) = update.glass_size {
        validate_glass_size(ml)?;
    }
    Ok(UserProfileUpdate {
        gender,
        ..update.clone()
    })
}

pub fn validate_water_intake_update(update: &WaterIntakeUpdate) -> Result<()> {
    if let Some(ml) = update.ml_per_glass {
        validate_glass_size(ml)?;
    }
    Ok(())
}

/// Validate an imported snapshot before anything is written.
pub fn validate_export_data(data: &ExportData) -> Result<()> {
    if data.version > EXPORT_VERSION {
        bail!(
            "Export version {} is newer than supported version {EXPORT_VERSION}",
            data.version
        );
    }
    for (key, entry) in &data.weights {
        check_date_key(key, entry.date, "weight")?;
        validate_weight(entry.weight)
            .map_err(|e| anyhow::anyhow!("Weight entry for {key}: {e}"))?;
    }
    for (key, entry) in &data.pills {
        check_date_key(key, entry.date, "pill")?;
    }
    for (key, entry) in &data.drinks {
        check_date_key(key, entry.date, "drink")?;
    }
    let active = data.goals.iter().filter(|g| g.is_active).count();
    if active > 1 {
        bail!("At most one weight goal may be active, found {active}");
    }
    for reminder in &data.reminders {
        validate_reminder_type(&reminder.reminder_type)?;
        validate_reminder_time(&reminder.time)?;
    }
    if crate::theme::palette(&data.app_settings.theme).is_none() {
        bail!("Unknown theme '{}'", data.app_settings.theme);
    }
    let n = &data.notification_settings;
    for t in [
        &n.morning_pills_time,
        &n.evening_pills_time,
        &n.weight_reminder_time,
        &n.motivation_reminder_time,
    ]
    .into_iter()
    .chain(&n.water_reminder_times)
    {
        validate_reminder_time(t)?;
    }
    for (key, entry) in &data.water_intake {
        check_date_key(key, entry.date, "water intake")?;
    }
    for (key, session) in &data.chat_sessions {
        if *key != session.session_id {
            bail!("chat session keyed '{key}' carries id {}", session.session_id);
        }
    }
    Ok(())
}

fn check_date_key(key: &str, date: NaiveDate, kind: &str) -> Result<()> {
    if key != date.format("%Y-%m-%d").to_string() {
        bail!("{kind} record keyed '{key}' carries date {date}");
    }
    Ok(())
}
