use anyhow::Result;
use chrono::NaiveDate;

use crate::remote::RemoteClient;
use vitalog_core::models::{
    AchievementsAndStats, AppSettings, AppSettingsUpdate, CategoryCount, ChatCategory,
    ChatRequest, ChatResponse, ChatSession, DailyTarget, DashboardSummary, DrinkTracking,
    DrinkUpdate, ExportData, ImportSummary, NewReminder, NewSavedMessage, NewWeightEntry,
    NewWeightGoal, NotificationSettings, NotificationSettingsUpdate, PillTracking, PillUpdate,
    Reminder, ReminderUpdate, SavedChatMessage, SavedMessageUpdate, UserProfile,
    UserProfileUpdate, WaterIntake, WaterIntakeStatus, WaterIntakeUpdate, WeightEntry,
    WeightGoal, WeightProgress,
};
use vitalog_core::service::VitalsService;

/// Where commands read and write: the local store, or a `vitalog serve`
/// instance when `--server` is given.
pub enum Backend {
    Local(VitalsService),
    Remote(RemoteClient),
}

impl Backend {
    pub async fn dashboard(&self, date: NaiveDate) -> Result<DashboardSummary> {
        match self {
            Self::Local(svc) => svc.dashboard(date),
            Self::Remote(client) => Ok(client.dashboard(date).await?),
        }
    }

    pub async fn get_pills(&self, date: NaiveDate) -> Result<Option<PillTracking>> {
        match self {
            Self::Local(svc) => svc.get_pills(date),
            Self::Remote(client) => Ok(client.get_pills(date).await?),
        }
    }

    pub async fn update_pills(&self, date: NaiveDate, update: &PillUpdate) -> Result<PillTracking> {
        match self {
            Self::Local(svc) => svc.update_pills(date, update),
            Self::Remote(client) => Ok(client.update_pills(date, update).await?),
        }
    }

    pub async fn get_drinks(&self, date: NaiveDate) -> Result<Option<DrinkTracking>> {
        match self {
            Self::Local(svc) => svc.get_drinks(date),
            Self::Remote(client) => Ok(client.get_drinks(date).await?),
        }
    }

    pub async fn update_drink(
        &self,
        date: NaiveDate,
        update: &DrinkUpdate,
    ) -> Result<DrinkTracking> {
        match self {
            Self::Local(svc) => svc.update_drink(date, update),
            Self::Remote(client) => Ok(client.update_drink(date, update).await?),
        }
    }

    pub async fn log_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        match self {
            Self::Local(svc) => svc.log_weight(entry),
            Self::Remote(client) => Ok(client.log_weight(entry).await?),
        }
    }

    pub async fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        match self {
            Self::Local(svc) => svc.get_weight(date),
            Self::Remote(client) => Ok(client.get_weight(date).await?),
        }
    }

    pub async fn delete_weight(&self, date: NaiveDate) -> Result<bool> {
        match self {
            Self::Local(svc) => svc.delete_weight(date),
            Self::Remote(client) => Ok(client.delete_weight(date).await?),
        }
    }

    pub async fn weight_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        match self {
            Self::Local(svc) => svc.get_weight_range(start, end),
            Self::Remote(client) => Ok(client.weight_range(start, end).await?),
        }
    }

    pub async fn weight_progress(&self, days: u32) -> Result<WeightProgress> {
        match self {
            Self::Local(svc) => svc.weight_progress(days),
            Self::Remote(client) => Ok(client.weight_progress(days).await?),
        }
    }

    pub async fn goals(&self) -> Result<Vec<WeightGoal>> {
        match self {
            Self::Local(svc) => svc.get_goals(),
            Self::Remote(client) => Ok(client.goals().await?),
        }
    }

    pub async fn create_goal(&self, goal: &NewWeightGoal) -> Result<WeightGoal> {
        match self {
            Self::Local(svc) => svc.create_goal(goal),
            Self::Remote(client) => Ok(client.create_goal(goal).await?),
        }
    }

    pub async fn active_goal(&self) -> Result<Option<WeightGoal>> {
        match self {
            Self::Local(svc) => svc.get_active_goal(),
            Self::Remote(client) => Ok(client.active_goal().await?),
        }
    }

    pub async fn daily_target(&self, current_weight: f64) -> Result<Option<DailyTarget>> {
        match self {
            Self::Local(svc) => svc.daily_target(current_weight),
            Self::Remote(client) => Ok(client.daily_target(current_weight).await?),
        }
    }

    pub async fn reminders(&self) -> Result<Vec<Reminder>> {
        match self {
            Self::Local(svc) => svc.get_reminders(),
            Self::Remote(client) => Ok(client.reminders().await?),
        }
    }

    pub async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder> {
        match self {
            Self::Local(svc) => svc.create_reminder(reminder),
            Self::Remote(client) => Ok(client.create_reminder(reminder).await?),
        }
    }

    pub async fn update_reminder(
        &self,
        id: &str,
        update: &ReminderUpdate,
    ) -> Result<Option<Reminder>> {
        match self {
            Self::Local(svc) => svc.update_reminder(id, update),
            Self::Remote(client) => Ok(client.update_reminder(id, update).await?),
        }
    }

    pub async fn delete_reminder(&self, id: &str) -> Result<bool> {
        match self {
            Self::Local(svc) => svc.delete_reminder(id),
            Self::Remote(client) => Ok(client.delete_reminder(id).await?),
        }
    }

    pub async fn settings(&self) -> Result<AppSettings> {
        match self {
            Self::Local(svc) => svc.get_settings(),
            Self::Remote(client) => Ok(client.settings().await?),
        }
    }

    pub async fn update_settings(&self, update: &AppSettingsUpdate) -> Result<AppSettings> {
        match self {
            Self::Local(svc) => svc.update_settings(update),
            Self::Remote(client) => Ok(client.update_settings(update).await?),
        }
    }

    pub async fn notification_settings(&self) -> Result<NotificationSettings> {
        match self {
            Self::Local(svc) => svc.notification_settings(),
            Self::Remote(client) => Ok(client.notification_settings().await?),
        }
    }

    pub async fn update_notification_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings> {
        match self {
            Self::Local(svc) => svc.update_notification_settings(update),
            Self::Remote(client) => Ok(client.update_notification_settings(update).await?),
        }
    }

    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        match self {
            Self::Local(svc) => svc.get_profile(),
            Self::Remote(client) => Ok(client.profile().await?),
        }
    }

    pub async fn update_profile(&self, update: &UserProfileUpdate) -> Result<UserProfile> {
        match self {
            Self::Local(svc) => svc.update_profile(update),
            Self::Remote(client) => Ok(client.update_profile(update).await?),
        }
    }

    pub async fn water_intake(&self, date: NaiveDate) -> Result<Option<WaterIntake>> {
        match self {
            Self::Local(svc) => svc.get_water_intake(date),
            Self::Remote(client) => Ok(client.water_intake(date).await?),
        }
    }

    pub async fn update_water_intake(
        &self,
        date: NaiveDate,
        update: &WaterIntakeUpdate,
    ) -> Result<WaterIntake> {
        match self {
            Self::Local(svc) => svc.update_water_intake(date, update),
            Self::Remote(client) => Ok(client.update_water_intake(date, update).await?),
        }
    }

    pub async fn water_status(&self, date: NaiveDate) -> Result<WaterIntakeStatus> {
        match self {
            Self::Local(svc) => svc.water_status(date),
            Self::Remote(client) => Ok(client.water_status(date).await?),
        }
    }

    pub async fn achievements_and_stats(&self) -> Result<AchievementsAndStats> {
        match self {
            Self::Local(svc) => svc.achievements_and_stats(),
            Self::Remote(client) => Ok(AchievementsAndStats {
                achievements: client.achievements().await?,
                stats: client.user_stats().await?,
            }),
        }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        match self {
            Self::Local(svc) => svc.chat(request),
            Self::Remote(client) => Ok(client.chat(request).await?),
        }
    }

    pub async fn chat_history(&self, session_id: &str) -> Result<ChatSession> {
        match self {
            Self::Local(svc) => svc.chat_history(session_id),
            Self::Remote(client) => Ok(client.chat_history(session_id).await?),
        }
    }

    pub async fn saved_messages(
        &self,
        category: Option<ChatCategory>,
        tag: Option<&str>,
    ) -> Result<Vec<SavedChatMessage>> {
        match self {
            Self::Local(svc) => svc.get_saved_messages(category, tag),
            Self::Remote(client) => Ok(client.saved_messages(category, tag).await?),
        }
    }

    pub async fn save_message(&self, message: &NewSavedMessage) -> Result<SavedChatMessage> {
        match self {
            Self::Local(svc) => svc.save_message(message),
            Self::Remote(client) => Ok(client.save_message(message).await?),
        }
    }

    pub async fn get_saved_message(&self, id: &str) -> Result<Option<SavedChatMessage>> {
        match self {
            Self::Local(svc) => svc.get_saved_message(id),
            Self::Remote(client) => Ok(client.get_saved_message(id).await?),
        }
    }

    pub async fn update_saved_message(
        &self,
        id: &str,
        update: &SavedMessageUpdate,
    ) -> Result<Option<SavedChatMessage>> {
        match self {
            Self::Local(svc) => svc.update_saved_message(id, update),
            Self::Remote(client) => Ok(client.update_saved_message(id, update).await?),
        }
    }

    pub async fn delete_saved_message(&self, id: &str) -> Result<bool> {
        match self {
            Self::Local(svc) => svc.delete_saved_message(id),
            Self::Remote(client) => Ok(client.delete_saved_message(id).await?),
        }
    }

    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        match self {
            Self::Local(svc) => svc.category_counts(),
            Self::Remote(client) => Ok(client.category_counts().await?),
        }
    }

    pub async fn export_data(&self) -> Result<ExportData> {
        match self {
            Self::Local(svc) => svc.export_all(),
            Self::Remote(client) => Ok(client.export_data().await?),
        }
    }

    pub async fn import_data(&self, data: &ExportData) -> Result<ImportSummary> {
        match self {
            Self::Local(svc) => svc.import_all(data),
            Self::Remote(client) => Ok(client.import_data(data).await?),
        }
    }
}
