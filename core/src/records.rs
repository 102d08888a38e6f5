use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::dates::format_iso;
use crate::models::{
    AppSettings, AppSettingsUpdate, CategoryCount, ChatCategory, ChatMessage, ChatSession,
    DashboardSummary, DrinkCounts, DrinkTracking, DrinkUpdate, NewReminder, NewSavedMessage,
    NewWeightEntry, NewWeightGoal, NotificationSettings, NotificationSettingsUpdate, PillTracking,
    PillUpdate, Reminder, ReminderUpdate, SavedChatMessage, SavedMessageUpdate, WeightEntry,
    WeightGoal, validate_new_goal, validate_new_reminder, validate_new_saved_message,
    validate_notification_update, validate_reminder_update, validate_saved_message_update,
    validate_settings_update, validate_weight,
};
use crate::store::{Store, keys};

pub type PillsByDate = BTreeMap<String, PillTracking>;
pub type DrinksByDate = BTreeMap<String, DrinkTracking>;
pub type WeightsByDate = BTreeMap<String, WeightEntry>;
pub type ChatSessions = BTreeMap<String, ChatSession>;

pub(crate) fn now() -> String {
    Local::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Store {
    // --- Pills ---

    pub fn get_all_pills(&self) -> Result<PillsByDate> {
        self.read(keys::PILLS, BTreeMap::new())
    }

    pub fn get_pills(&self, date: NaiveDate) -> Result<Option<PillTracking>> {
        Ok(self.get_all_pills()?.remove(&format_iso(date)))
    }

    pub fn upsert_pills(&self, date: NaiveDate, update: &PillUpdate) -> Result<PillTracking> {
        let mut all = self.get_all_pills()?;
        let key = format_iso(date);
        let now = now();
        let record = all.entry(key).or_insert_with(|| PillTracking {
            id: new_id(),
            date,
            morning_taken: false,
            evening_taken: false,
            created_at: now.clone(),
            updated_at: now.clone(),
        });
        if let Some(v) = update.morning_taken {
            record.morning_taken = v;
        }
        if let Some(v) = update.evening_taken {
            record.evening_taken = v;
        }
        record.updated_at = now;
        let saved = record.clone();
        self.write(keys::PILLS, &all)?;
        Ok(saved)
    }

    // --- Drinks ---

    pub fn get_all_drinks(&self) -> Result<DrinksByDate> {
        self.read(keys::DRINKS, BTreeMap::new())
    }

    pub fn get_drinks(&self, date: NaiveDate) -> Result<Option<DrinkTracking>> {
        Ok(self.get_all_drinks()?.remove(&format_iso(date)))
    }

    /// Set one counter for `date`, clamped at zero. Other counters keep
    /// their values (zero for a new day).
    pub fn update_drink(&self, date: NaiveDate, update: &DrinkUpdate) -> Result<DrinkTracking> {
        let mut all = self.get_all_drinks()?;
        let key = format_iso(date);
        let now = now();
        let record = all.entry(key).or_insert_with(|| DrinkTracking {
            id: new_id(),
            date,
            drinks: DrinkCounts::default(),
            created_at: now.clone(),
            updated_at: now.clone(),
        });
        record
            .drinks
            .set(update.drink_type, update.clamped_count());
        record.updated_at = now;
        let saved = record.clone();
        self.write(keys::DRINKS, &all)?;
        Ok(saved)
    }

    // --- Weight Entries ---

    pub fn get_all_weights(&self) -> Result<WeightsByDate> {
        self.read(keys::WEIGHTS, BTreeMap::new())
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        Ok(self.get_all_weights()?.remove(&format_iso(date)))
    }

    /// Insert or overwrite the entry for `entry.date`. Overwrites keep the id.
    pub fn upsert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        validate_weight(entry.weight)?;
        let mut all = self.get_all_weights()?;
        let now = now();
        let record = all
            .entry(format_iso(entry.date))
            .or_insert_with(|| WeightEntry {
                id: new_id(),
                date: entry.date,
                weight: entry.weight,
                created_at: now.clone(),
                updated_at: now.clone(),
            });
        record.weight = entry.weight;
        record.updated_at = now;
        let saved = record.clone();
        self.write(keys::WEIGHTS, &all)?;
        Ok(saved)
    }

    /// Entries with `start <= date <= end`, ascending by date. A reversed
    /// range is empty.
    pub fn get_weight_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        if start > end {
            return Ok(Vec::new());
        }
        let (lo, hi) = (format_iso(start), format_iso(end));
        Ok(self
            .get_all_weights()?
            .range(lo..=hi)
            .map(|(_, e)| e.clone())
            .collect())
    }

    /// Most recent weight logged on or before `date`.
    pub fn latest_weight_on_or_before(&self, date: NaiveDate) -> Result<Option<f64>> {
        Ok(self
            .get_all_weights()?
            .range(..=format_iso(date))
            .next_back()
            .map(|(_, e)| e.weight))
    }

    pub fn delete_weight(&self, date: NaiveDate) -> Result<bool> {
        let mut all = self.get_all_weights()?;
        if all.remove(&format_iso(date)).is_none() {
            return Ok(false);
        }
        self.write(keys::WEIGHTS, &all)?;
        Ok(true)
    }

    // --- Goals ---

    /// All goals, newest first.
    pub fn get_goals(&self) -> Result<Vec<WeightGoal>> {
        let mut goals: Vec<WeightGoal> = self.read(keys::GOALS, Vec::new())?;
        goals.reverse();
        Ok(goals)
    }

    /// Deactivates every stored goal, then appends the new one as active.
    pub fn create_goal(&self, goal: &NewWeightGoal) -> Result<WeightGoal> {
        validate_new_goal(goal)?;
        let mut goals: Vec<WeightGoal> = self.read(keys::GOALS, Vec::new())?;
        for g in &mut goals {
            g.is_active = false;
        }
        let now = now();
        let created = WeightGoal {
            id: new_id(),
            goal_type: goal.goal_type,
            start_weight: goal.start_weight,
            target_weight: goal.target_weight,
            target_percentage: goal.target_percentage,
            start_date: goal.start_date,
            target_date: goal.target_date,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        goals.push(created.clone());
        self.write(keys::GOALS, &goals)?;
        debug!(id = %created.id, "created weight goal");
        Ok(created)
    }

    pub fn get_active_goal(&self) -> Result<Option<WeightGoal>> {
        Ok(self.get_goals()?.into_iter().find(|g| g.is_active))
    }

    // --- Reminders ---

    pub fn get_reminders(&self) -> Result<Vec<Reminder>> {
        self.read(keys::REMINDERS, Vec::new())
    }

    pub fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder> {
        let reminder = validate_new_reminder(reminder)?;
        let mut all = self.get_reminders()?;
        let now = now();
        let created = Reminder {
            id: new_id(),
            reminder_type: reminder.reminder_type,
            time: reminder.time,
            is_enabled: reminder.is_enabled,
            created_at: now.clone(),
            updated_at: now,
        };
        all.push(created.clone());
        self.write(keys::REMINDERS, &all)?;
        Ok(created)
    }

    /// Apply the fields present in `update`. `None` for an unknown id.
    pub fn update_reminder(&self, id: &str, update: &ReminderUpdate) -> Result<Option<Reminder>> {
        let update = validate_reminder_update(update)?;
        let mut all = self.get_reminders()?;
        let Some(reminder) = all.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(reminder_type) = update.reminder_type {
            reminder.reminder_type = reminder_type;
        }
        if let Some(time) = update.time {
            reminder.time = time;
        }
        if let Some(enabled) = update.is_enabled {
            reminder.is_enabled = enabled;
        }
        reminder.updated_at = now();
        let saved = reminder.clone();
        self.write(keys::REMINDERS, &all)?;
        Ok(Some(saved))
    }

    pub fn set_reminder_enabled(&self, id: &str, enabled: bool) -> Result<Option<Reminder>> {
        self.update_reminder(
            id,
            &ReminderUpdate {
                is_enabled: Some(enabled),
                ..ReminderUpdate::default()
            },
        )
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool> {
        let mut all = self.get_reminders()?;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.write(keys::REMINDERS, &all)?;
        Ok(true)
    }

    // --- Settings ---

    pub fn get_settings(&self) -> Result<AppSettings> {
        self.read(keys::APP_SETTINGS, AppSettings::default())
    }

    pub fn update_settings(&self, update: &AppSettingsUpdate) -> Result<AppSettings> {
        validate_settings_update(update)?;
        let normalized = AppSettingsUpdate {
            theme: update.theme.as_ref().map(|t| t.to_lowercase()),
            language: update.language.as_ref().map(|l| l.trim().to_lowercase()),
            ..update.clone()
        };
        let mut settings = self.get_settings()?;
        settings.apply(&normalized);
        self.write(keys::APP_SETTINGS, &settings)?;
        Ok(settings)
    }

    // --- Notification settings ---

    pub fn get_notification_settings(&self) -> Result<NotificationSettings> {
        self.read(keys::NOTIFICATION_SETTINGS, NotificationSettings::default())
    }

    pub fn update_notification_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings> {
        let update = validate_notification_update(update)?;
        let mut settings = self.get_notification_settings()?;
        settings.apply(&update);
        settings.updated_at = now();
        self.write(keys::NOTIFICATION_SETTINGS, &settings)?;
        Ok(settings)
    }

    // --- Chat sessions ---

    pub fn get_chat_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let mut all: ChatSessions = self.read(keys::CHAT_SESSIONS, BTreeMap::new())?;
        Ok(all.remove(session_id))
    }

    /// Append one question and its reply to `session_id`, creating the
    /// session on first use.
    pub fn append_chat_exchange(
        &self,
        session_id: &str,
        question: &str,
        reply: &str,
    ) -> Result<ChatSession> {
        let mut all: ChatSessions = self.read(keys::CHAT_SESSIONS, BTreeMap::new())?;
        let now = now();
        let session = all
            .entry(session_id.to_string())
            .or_insert_with(|| ChatSession {
                created_at: now.clone(),
                ..ChatSession::empty(session_id)
            });
        for (message, is_user) in [(question, true), (reply, false)] {
            session.messages.push(ChatMessage {
                id: new_id(),
                message: message.to_string(),
                is_user,
                timestamp: now.clone(),
            });
        }
        session.updated_at = now;
        let saved = session.clone();
        self.write(keys::CHAT_SESSIONS, &all)?;
        debug!(session_id, messages = saved.messages.len(), "stored chat exchange");
        Ok(saved)
    }

    // --- Saved chat messages ---

    pub fn save_message(&self, message: &NewSavedMessage) -> Result<SavedChatMessage> {
        validate_new_saved_message(message)?;
        let mut all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        let now = now();
        let saved = SavedChatMessage {
            id: new_id(),
            original_message: message.original_message.clone(),
            ai_response: message.ai_response.clone(),
            category: message.category,
            title: message.title.trim().to_string(),
            tags: normalize_tags(&message.tags),
            created_at: now.clone(),
            updated_at: now,
        };
        all.push(saved.clone());
        self.write(keys::SAVED_MESSAGES, &all)?;
        Ok(saved)
    }

    /// Saved messages, newest first, optionally filtered by category and tag.
    pub fn get_saved_messages(
        &self,
        category: Option<ChatCategory>,
        tag: Option<&str>,
    ) -> Result<Vec<SavedChatMessage>> {
        let mut all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        all.reverse();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let tag = tag.map(str::to_lowercase);
        Ok(all
            .into_iter()
            .filter(|m| category.is_none_or(|c| m.category == c))
            .filter(|m| tag.as_ref().is_none_or(|t| m.tags.iter().any(|x| x == t)))
            .collect())
    }

    pub fn get_saved_message(&self, id: &str) -> Result<Option<SavedChatMessage>> {
        let all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        Ok(all.into_iter().find(|m| m.id == id))
    }

    pub fn update_saved_message(
        &self,
        id: &str,
        update: &SavedMessageUpdate,
    ) -> Result<Option<SavedChatMessage>> {
        validate_saved_message_update(update)?;
        let mut all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        let Some(message) = all.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(ref title) = update.title {
            message.title = title.trim().to_string();
        }
        if let Some(category) = update.category {
            message.category = category;
        }
        if let Some(ref tags) = update.tags {
            message.tags = normalize_tags(tags);
        }
        message.updated_at = now();
        let saved = message.clone();
        self.write(keys::SAVED_MESSAGES, &all)?;
        Ok(Some(saved))
    }

    pub fn delete_saved_message(&self, id: &str) -> Result<bool> {
        let mut all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        let before = all.len();
        all.retain(|m| m.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.write(keys::SAVED_MESSAGES, &all)?;
        Ok(true)
    }

    /// Message count per category, only for categories in use.
    pub fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let all: Vec<SavedChatMessage> = self.read(keys::SAVED_MESSAGES, Vec::new())?;
        let mut counts: BTreeMap<ChatCategory, usize> = BTreeMap::new();
        for m in &all {
            *counts.entry(m.category).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect())
    }

    // --- Dashboard ---

    pub fn dashboard(&self, date: NaiveDate) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            date,
            pills: self.get_pills(date)?,
            drinks: self.get_drinks(date)?,
            weight: self.get_weight(date)?,
            active_goal: self.get_active_goal()?,
        })
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let t = tag.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
