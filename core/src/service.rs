use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::metrics;
use crate::models::{
    Achievement, AchievementsAndStats, AppSettings, AppSettingsUpdate, CategoryCount,
    ChatCategory, ChatRequest, ChatResponse, ChatSession, DailyTarget, DashboardSummary,
    DrinkTracking, DrinkUpdate, ExportData, ImportSummary, NewReminder, NewSavedMessage,
    NewWeightEntry, NewWeightGoal, NotificationSettings, NotificationSettingsUpdate,
    PillTracking, PillUpdate, Reminder, ReminderUpdate, SavedChatMessage, SavedMessageUpdate,
    UserProfile, UserProfileUpdate, UserStats, WaterIntake, WaterIntakeStatus, WaterIntakeUpdate,
    WeightEntry, WeightGoal, WeightProgress,
};
use crate::responder;
use crate::store::Store;
use crate::transfer;

/// Single entry point for front ends. Writes that can change badge
/// progress recompute achievements and stats before returning.
pub struct VitalsService {
    store: Store,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl VitalsService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let store = Store::open(db_path)?;
        Ok(Self { store })
    }

    pub fn new_in_memory() -> Result<Self> {
        let store = Store::open_in_memory()?;
        Ok(Self { store })
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn refresh_achievements(&self) -> Result<AchievementsAndStats> {
        self.store.compute_achievements_and_stats(today())
    }

    // --- Dashboard ---

    pub fn dashboard(&self, date: NaiveDate) -> Result<DashboardSummary> {
        self.store.dashboard(date)
    }

    // --- Pills ---

    pub fn get_pills(&self, date: NaiveDate) -> Result<Option<PillTracking>> {
        self.store.get_pills(date)
    }

    pub fn update_pills(&self, date: NaiveDate, update: &PillUpdate) -> Result<PillTracking> {
        let record = self.store.upsert_pills(date, update)?;
        self.refresh_achievements()?;
        Ok(record)
    }

    // --- Drinks ---

    pub fn get_drinks(&self, date: NaiveDate) -> Result<Option<DrinkTracking>> {
        self.store.get_drinks(date)
    }

    pub fn update_drink(&self, date: NaiveDate, update: &DrinkUpdate) -> Result<DrinkTracking> {
        let record = self.store.update_drink(date, update)?;
        self.refresh_achievements()?;
        Ok(record)
    }

    // --- Weight ---

    pub fn log_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        let record = self.store.upsert_weight(entry)?;
        self.refresh_achievements()?;
        Ok(record)
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        self.store.get_weight(date)
    }

    pub fn get_weight_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        self.store.get_weight_range(start, end)
    }

    pub fn delete_weight(&self, date: NaiveDate) -> Result<bool> {
        let deleted = self.store.delete_weight(date)?;
        if deleted {
            self.refresh_achievements()?;
        }
        Ok(deleted)
    }

    pub fn weight_progress(&self, days: u32) -> Result<WeightProgress> {
        self.store.weight_progress(days, today())
    }

    // --- Goals ---

    pub fn get_goals(&self) -> Result<Vec<WeightGoal>> {
        self.store.get_goals()
    }

    pub fn create_goal(&self, goal: &NewWeightGoal) -> Result<WeightGoal> {
        self.store.create_goal(goal)
    }

    pub fn get_active_goal(&self) -> Result<Option<WeightGoal>> {
        self.store.get_active_goal()
    }

    /// Daily target for the active goal, `None` without an active goal.
    pub fn daily_target(&self, current_weight: f64) -> Result<Option<DailyTarget>> {
        crate::models::validate_weight(current_weight)?;
        match self.store.get_active_goal()? {
            Some(goal) => Ok(Some(metrics::daily_target(&goal, current_weight, today())?)),
            None => Ok(None),
        }
    }

    // --- Reminders ---

    pub fn get_reminders(&self) -> Result<Vec<Reminder>> {
        self.store.get_reminders()
    }

    pub fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder> {
        self.store.create_reminder(reminder)
    }

    pub fn update_reminder(&self, id: &str, update: &ReminderUpdate) -> Result<Option<Reminder>> {
        self.store.update_reminder(id, update)
    }

    pub fn set_reminder_enabled(&self, id: &str, enabled: bool) -> Result<Option<Reminder>> {
        self.store.set_reminder_enabled(id, enabled)
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool> {
        self.store.delete_reminder(id)
    }

    // --- Settings ---

    pub fn get_settings(&self) -> Result<AppSettings> {
        self.store.get_settings()
    }

    pub fn update_settings(&self, update: &AppSettingsUpdate) -> Result<AppSettings> {
        self.store.update_settings(update)
    }

    pub fn notification_settings(&self) -> Result<NotificationSettings> {
        self.store.get_notification_settings()
    }

    pub fn update_notification_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings> {
        self.store.update_notification_settings(update)
    }

    // --- Profile & water intake ---

    pub fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.store.get_profile()
    }

    pub fn update_profile(&self, update: &UserProfileUpdate) -> Result<UserProfile> {
        self.store.upsert_profile(update)
    }

    pub fn get_water_intake(&self, date: NaiveDate) -> Result<Option<WaterIntake>> {
        self.store.get_water_intake(date)
    }

    pub fn update_water_intake(
        &self,
        date: NaiveDate,
        update: &WaterIntakeUpdate,
    ) -> Result<WaterIntake> {
        self.store.update_water_intake(date, update)
    }

    pub fn water_status(&self, date: NaiveDate) -> Result<WaterIntakeStatus> {
        self.store.water_intake_status(date)
    }

    // --- Achievements ---

    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        Ok(self.refresh_achievements()?.achievements)
    }

    pub fn user_stats(&self) -> Result<UserStats> {
        Ok(self.refresh_achievements()?.stats)
    }

    pub fn achievements_and_stats(&self) -> Result<AchievementsAndStats> {
        self.refresh_achievements()
    }

    // --- Chat ---

    /// Answer offline and append the exchange to the session's history.
    pub fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let session_id = request
            .session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let response = responder::respond(&request.message);
        self.store
            .append_chat_exchange(&session_id, &request.message, response)?;
        debug!(%session_id, "offline chat reply");
        Ok(ChatResponse {
            response: response.to_string(),
            session_id,
        })
    }

    /// History of `session_id`; empty for an unknown session.
    pub fn chat_history(&self, session_id: &str) -> Result<ChatSession> {
        Ok(self
            .store
            .get_chat_session(session_id)?
            .unwrap_or_else(|| ChatSession::empty(session_id)))
    }

    pub fn save_message(&self, message: &NewSavedMessage) -> Result<SavedChatMessage> {
        self.store.save_message(message)
    }

    pub fn get_saved_messages(
        &self,
        category: Option<ChatCategory>,
        tag: Option<&str>,
    ) -> Result<Vec<SavedChatMessage>> {
        self.store.get_saved_messages(category, tag)
    }

    pub fn get_saved_message(&self, id: &str) -> Result<Option<SavedChatMessage>> {
        self.store.get_saved_message(id)
    }

    pub fn update_saved_message(
        &self,
        id: &str,
        update: &SavedMessageUpdate,
    ) -> Result<Option<SavedChatMessage>> {
        self.store.update_saved_message(id, update)
    }

    pub fn delete_saved_message(&self, id: &str) -> Result<bool> {
        self.store.delete_saved_message(id)
    }

    pub fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        self.store.category_counts()
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        self.store.export_all()
    }

    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        let summary = self.store.import_all(data)?;
        self.refresh_achievements()?;
        Ok(summary)
    }

    pub fn export_json(&self) -> Result<String> {
        let data = self.export_all()?;
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Write a full snapshot into `dir` and return the file path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let json = self.export_json()?;
        Ok(transfer::export_to_file(dir, &json)?)
    }

    /// Import a snapshot file. `None` (cancelled pick) imports nothing.
    pub fn import_file(&self, path: Option<&Path>) -> Result<Option<ImportSummary>> {
        let Some(text) = transfer::import_from_file(path)? else {
            return Ok(None);
        };
        let data: ExportData =
            serde_json::from_str(&text).context("Import file is not a valid export")?;
        Ok(Some(self.import_all(&data)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BADGE_FIRST_WEIGHT;
    use crate::models::DrinkType;

    fn service() -> VitalsService {
        VitalsService::new_in_memory().unwrap()
    }

    #[test]
    fn test_log_weight_unlocks_first_weight() {
        let svc = service();
        svc.log_weight(&NewWeightEntry {
            date: today(),
            weight: 81.2,
        })
        .unwrap();
        let stats = svc.store().get_user_stats().unwrap();
        assert_eq!(stats.weight_entries_total, 1);
        assert_eq!(stats.current_streak_days, 1);
        let first = svc
            .store()
            .get_achievements()
            .unwrap()
            .into_iter()
            .find(|a| a.badge_type == BADGE_FIRST_WEIGHT)
            .unwrap();
        assert!(first.is_unlocked);
    }

    #[test]
    fn test_drink_update_refreshes_stats() {
        let svc = service();
        svc.update_drink(
            today(),
            &DrinkUpdate {
                drink_type: DrinkType::Wasser,
                count: 11,
            },
        )
        .unwrap();
        assert_eq!(svc.store().get_user_stats().unwrap().total_xp, 75);
    }

    #[test]
    fn test_chat_keeps_or_creates_session() {
        let svc = service();
        let kept = svc
            .chat(&ChatRequest {
                message: "Hallo".into(),
                session_id: Some("abc".into()),
            })
            .unwrap();
        assert_eq!(kept.session_id, "abc");
        let fresh = svc
            .chat(&ChatRequest {
                message: "Wasser?".into(),
                session_id: None,
            })
            .unwrap();
        assert!(!fresh.session_id.is_empty());
        assert_eq!(fresh.response, responder::respond("Wasser?"));
    }

    #[test]
    fn test_chat_history_follows_session() {
        let svc = service();
        let first = svc
            .chat(&ChatRequest {
                message: "Wie viel Wasser soll ich trinken?".into(),
                session_id: None,
            })
            .unwrap();
        svc.chat(&ChatRequest {
            message: "Und ein Rezept?".into(),
            session_id: Some(first.session_id.clone()),
        })
        .unwrap();

        let history = svc.chat_history(&first.session_id).unwrap();
        assert_eq!(history.messages.len(), 4);
        assert_eq!(history.messages[1].message, first.response);
        assert_eq!(history.messages[2].message, "Und ein Rezept?");

        let unknown = svc.chat_history("nope").unwrap();
        assert_eq!(unknown.session_id, "nope");
        assert!(unknown.messages.is_empty());
    }

    #[test]
    fn test_daily_target_without_goal() {
        let svc = service();
        assert!(svc.daily_target(80.0).unwrap().is_none());
        assert!(svc.daily_target(-1.0).is_err());
    }

    #[test]
    fn test_export_dir_and_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();
        svc.log_weight(&NewWeightEntry {
            date: today(),
            weight: 79.0,
        })
        .unwrap();
        let path = svc.export_to_dir(dir.path()).unwrap();

        let other = service();
        let summary = other.import_file(Some(&path)).unwrap().unwrap();
        assert_eq!(summary.weights_imported, 1);
        assert_eq!(other.get_weight(today()).unwrap().unwrap().weight, 79.0);
        assert!(other.import_file(None).unwrap().is_none());
    }

    #[test]
    fn test_import_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1,2,3]").unwrap();
        assert!(service().import_file(Some(&path)).is_err());
    }
}
