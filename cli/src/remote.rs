use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use vitalog_core::dates::format_iso;
use vitalog_core::models::{
    Achievement, AppSettings, AppSettingsUpdate, CategoryCount, ChatCategory, ChatRequest,
    ChatResponse, ChatSession, DailyTarget, DashboardSummary, DrinkTracking, DrinkUpdate,
    ExportData, ImportSummary, NewReminder, NewSavedMessage, NewWeightEntry, NewWeightGoal,
    NotificationSettings, NotificationSettingsUpdate, PillTracking, PillUpdate, Reminder,
    ReminderUpdate, SavedChatMessage, SavedMessageUpdate, UserProfile, UserProfileUpdate,
    UserStats, WaterIntake, WaterIntakeStatus, WaterIntakeUpdate, WeightEntry, WeightGoal,
    WeightProgress,
};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("server responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request to vitalog server failed")]
    Transport(#[from] reqwest::Error),
}

impl RemoteError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

type RemoteResult<T> = Result<T, RemoteError>;

/// 404 becomes `None`, everything else passes through.
fn optional<T>(result: RemoteResult<T>) -> RemoteResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Typed client for a running `vitalog serve`. Every call is a single
/// attempt; non-2xx responses surface as [`RemoteError::Status`].
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> RemoteResult<Self> {
        let invalid = |reason: String| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "vitalog-cli/{} (health tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// `/api` followed by `segments`, each percent-encoded on its own so an
    /// id can never leave its path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!(%method, %url, "remote request");
        let builder = self.client.request(method, url);
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn checked(builder: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await?;
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> RemoteResult<T> {
        let resp = Self::checked(self.request(Method::GET, segments)).await?;
        Ok(resp.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> RemoteResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = Self::checked(self.request(method, segments).json(body)).await?;
        Ok(resp.json().await?)
    }

    /// `true` if the server deleted something, `false` on 404.
    async fn delete(&self, segments: &[&str]) -> RemoteResult<bool> {
        match Self::checked(self.request(Method::DELETE, segments)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // --- Dashboard, pills, drinks ---

    pub async fn dashboard(&self, date: NaiveDate) -> RemoteResult<DashboardSummary> {
        self.get(&["dashboard", &format_iso(date)]).await
    }

    pub async fn get_pills(&self, date: NaiveDate) -> RemoteResult<Option<PillTracking>> {
        optional(self.get(&["pills", &format_iso(date)]).await)
    }

    pub async fn update_pills(
        &self,
        date: NaiveDate,
        update: &PillUpdate,
    ) -> RemoteResult<PillTracking> {
        self.send_json(Method::PUT, &["pills", &format_iso(date)], update)
            .await
    }

    pub async fn get_drinks(&self, date: NaiveDate) -> RemoteResult<Option<DrinkTracking>> {
        optional(self.get(&["drinks", &format_iso(date)]).await)
    }

    pub async fn update_drink(
        &self,
        date: NaiveDate,
        update: &DrinkUpdate,
    ) -> RemoteResult<DrinkTracking> {
        self.send_json(Method::PUT, &["drinks", &format_iso(date)], update)
            .await
    }

    // --- Water intake & profile ---

    pub async fn water_intake(&self, date: NaiveDate) -> RemoteResult<Option<WaterIntake>> {
        optional(self.get(&["water-intake", &format_iso(date)]).await)
    }

    pub async fn update_water_intake(
        &self,
        date: NaiveDate,
        update: &WaterIntakeUpdate,
    ) -> RemoteResult<WaterIntake> {
        self.send_json(Method::PUT, &["water-intake", &format_iso(date)], update)
            .await
    }

    pub async fn water_status(&self, date: NaiveDate) -> RemoteResult<WaterIntakeStatus> {
        self.get(&["water-intake", &format_iso(date), "status"])
            .await
    }

    pub async fn profile(&self) -> RemoteResult<Option<UserProfile>> {
        self.get(&["user-profile"]).await
    }

    pub async fn update_profile(&self, update: &UserProfileUpdate) -> RemoteResult<UserProfile> {
        self.send_json(Method::POST, &["user-profile"], update)
            .await
    }

    // --- Weight ---

    pub async fn log_weight(&self, entry: &NewWeightEntry) -> RemoteResult<WeightEntry> {
        self.send_json(Method::POST, &["weight"], entry).await
    }

    pub async fn get_weight(&self, date: NaiveDate) -> RemoteResult<Option<WeightEntry>> {
        optional(self.get(&["weight", &format_iso(date)]).await)
    }

    pub async fn delete_weight(&self, date: NaiveDate) -> RemoteResult<bool> {
        self.delete(&["weight", &format_iso(date)]).await
    }

    pub async fn weight_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<WeightEntry>> {
        self.get(&["weight", "range", &format_iso(start), &format_iso(end)])
            .await
    }

    pub async fn weight_progress(&self, days: u32) -> RemoteResult<WeightProgress> {
        self.get(&["weight-progress", &days.to_string()]).await
    }

    // --- Goals ---

    pub async fn goals(&self) -> RemoteResult<Vec<WeightGoal>> {
        self.get(&["weight-goals"]).await
    }

    pub async fn create_goal(&self, goal: &NewWeightGoal) -> RemoteResult<WeightGoal> {
        self.send_json(Method::POST, &["weight-goals"], goal).await
    }

    pub async fn active_goal(&self) -> RemoteResult<Option<WeightGoal>> {
        self.get(&["weight-goals", "active"]).await
    }

    pub async fn daily_target(&self, current_weight: f64) -> RemoteResult<Option<DailyTarget>> {
        let weight = current_weight.to_string();
        optional(
            self.get(&["weight-goals", "daily-target", &weight])
                .await,
        )
    }

    // --- Reminders ---

    pub async fn reminders(&self) -> RemoteResult<Vec<Reminder>> {
        self.get(&["reminders"]).await
    }

    pub async fn create_reminder(&self, reminder: &NewReminder) -> RemoteResult<Reminder> {
        self.send_json(Method::POST, &["reminders"], reminder).await
    }

    pub async fn update_reminder(
        &self,
        id: &str,
        update: &ReminderUpdate,
    ) -> RemoteResult<Option<Reminder>> {
        optional(
            self.send_json(Method::PUT, &["reminders", id], update)
                .await,
        )
    }

    pub async fn delete_reminder(&self, id: &str) -> RemoteResult<bool> {
        self.delete(&["reminders", id]).await
    }

    // --- Settings, achievements ---

    pub async fn settings(&self) -> RemoteResult<AppSettings> {
        self.get(&["settings", "app"]).await
    }

    pub async fn update_settings(&self, update: &AppSettingsUpdate) -> RemoteResult<AppSettings> {
        self.send_json(Method::PUT, &["settings", "app"], update)
            .await
    }

    pub async fn notification_settings(&self) -> RemoteResult<NotificationSettings> {
        self.get(&["settings", "notifications"]).await
    }

    pub async fn update_notification_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> RemoteResult<NotificationSettings> {
        self.send_json(Method::PUT, &["settings", "notifications"], update)
            .await
    }

    pub async fn achievements(&self) -> RemoteResult<Vec<Achievement>> {
        self.get(&["achievements"]).await
    }

    pub async fn user_stats(&self) -> RemoteResult<UserStats> {
        self.get(&["user-stats"]).await
    }

    // --- Chat ---

    pub async fn chat(&self, request: &ChatRequest) -> RemoteResult<ChatResponse> {
        self.send_json(Method::POST, &["health-chat"], request)
            .await
    }

    pub async fn chat_history(&self, session_id: &str) -> RemoteResult<ChatSession> {
        self.get(&["health-chat", session_id]).await
    }

    pub async fn saved_messages(
        &self,
        category: Option<ChatCategory>,
        tag: Option<&str>,
    ) -> RemoteResult<Vec<SavedChatMessage>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(c) = category {
            query.push(("category", c.as_str()));
        }
        if let Some(t) = tag {
            query.push(("tag", t));
        }
        let request = self.request(Method::GET, &["saved-messages"]).query(&query);
        let resp = Self::checked(request).await?;
        Ok(resp.json().await?)
    }

    pub async fn save_message(&self, message: &NewSavedMessage) -> RemoteResult<SavedChatMessage> {
        self.send_json(Method::POST, &["saved-messages"], message)
            .await
    }

    pub async fn get_saved_message(&self, id: &str) -> RemoteResult<Option<SavedChatMessage>> {
        optional(self.get(&["saved-messages", id]).await)
    }

    pub async fn update_saved_message(
        &self,
        id: &str,
        update: &SavedMessageUpdate,
    ) -> RemoteResult<Option<SavedChatMessage>> {
        optional(
            self.send_json(Method::PUT, &["saved-messages", id], update)
                .await,
        )
    }

    pub async fn delete_saved_message(&self, id: &str) -> RemoteResult<bool> {
        self.delete(&["saved-messages", id]).await
    }

    pub async fn category_counts(&self) -> RemoteResult<Vec<CategoryCount>> {
        self.get(&["saved-messages", "categories", "all"]).await
    }

    // --- Export / Import ---

    pub async fn export_data(&self) -> RemoteResult<ExportData> {
        self.get(&["export"]).await
    }

    pub async fn import_data(&self, data: &ExportData) -> RemoteResult<ImportSummary> {
        self.send_json(Method::POST, &["import"], data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::serve_on;
    use vitalog_core::models::{ActivityLevel, DrinkType};
    use vitalog_core::service::VitalsService;

    async fn spawn_server(api_key: Option<&str>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let svc = VitalsService::new_in_memory().unwrap();
        let key = api_key.map(str::to_string);
        tokio::spawn(async move {
            serve_on(listener, svc, key).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_status_error() {
        let url = spawn_server(Some("secret")).await;
        let client = RemoteClient::new(&url, None).unwrap();
        let err = client.settings().await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_weight_roundtrip_with_key() {
        let url = spawn_server(Some("secret")).await;
        let client = RemoteClient::new(&format!("{url}/"), Some("secret".into())).unwrap();

        assert!(client.get_weight(d(2024, 6, 1)).await.unwrap().is_none());
        let entry = client
            .log_weight(&NewWeightEntry {
                date: d(2024, 6, 1),
                weight: 82.4,
            })
            .await
            .unwrap();
        assert!((entry.weight - 82.4).abs() < f64::EPSILON);
        let range = client
            .weight_range(d(2024, 6, 1), d(2024, 6, 30))
            .await
            .unwrap();
        assert_eq!(range.len(), 1);

        assert!(client.delete_weight(d(2024, 6, 1)).await.unwrap());
        assert!(!client.delete_weight(d(2024, 6, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_error_carries_body() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();
        let err = client
            .log_weight(&NewWeightEntry {
                date: d(2024, 6, 1),
                weight: -3.0,
            })
            .await
            .unwrap_err();
        match err {
            RemoteError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_drinks_and_dashboard() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();
        client
            .update_drink(
                d(2024, 6, 1),
                &DrinkUpdate {
                    drink_type: DrinkType::Kaffee,
                    count: 2,
                },
            )
            .await
            .unwrap();
        let summary = client.dashboard(d(2024, 6, 1)).await.unwrap();
        assert_eq!(summary.drinks.unwrap().drinks.kaffee, 2);
        assert!(summary.pills.is_none());
        assert!(client.active_goal().await.unwrap().is_none());
        assert!(client.daily_target(80.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_message_filters() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();
        let saved = client
            .save_message(&NewSavedMessage {
                original_message: "Rezept?".into(),
                ai_response: "Suppe".into(),
                category: ChatCategory::Rezepte,
                title: "Suppe".into(),
                tags: vec!["Abend".into()],
            })
            .await
            .unwrap();

        let by_tag = client.saved_messages(None, Some("abend")).await.unwrap();
        assert_eq!(by_tag.len(), 1);
        let other = client
            .saved_messages(Some(ChatCategory::Fitness), None)
            .await
            .unwrap();
        assert!(other.is_empty());

        let updated = client
            .update_saved_message(
                &saved.id,
                &SavedMessageUpdate {
                    title: Some("Gemüsesuppe".into()),
                    category: None,
                    tags: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Gemüsesuppe");
        assert!(client.get_saved_message("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = RemoteClient::new(&format!("http://{addr}"), None).unwrap();
        assert!(matches!(
            client.reminders().await,
            Err(RemoteError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_stay_in_their_path_segment() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();
        client
            .save_message(&NewSavedMessage {
                original_message: "Rezept?".into(),
                ai_response: "Suppe".into(),
                category: ChatCategory::Rezepte,
                title: "Suppe".into(),
                tags: vec![],
            })
            .await
            .unwrap();

        // Unescaped, this id would resolve to the category counts route.
        assert!(
            client
                .get_saved_message("categories/all")
                .await
                .unwrap()
                .is_none()
        );
        assert!(!client.delete_reminder("../settings/app").await.unwrap());
        assert!(!client.delete_saved_message("a b?c#d").await.unwrap());

        let session = client.chat_history("x/y").await.unwrap();
        assert_eq!(session.session_id, "x/y");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_url_joins_segments_under_api() {
        let client = RemoteClient::new("http://localhost:8080/base/", None).unwrap();
        assert_eq!(
            client.url(&["reminders", "a/b"]).as_str(),
            "http://localhost:8080/base/api/reminders/a%2Fb"
        );
        assert!(matches!(
            RemoteClient::new("not a url", None),
            Err(RemoteError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_profile_water_and_notifications() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();

        assert!(client.profile().await.unwrap().is_none());
        let profile = client
            .update_profile(&UserProfileUpdate {
                activity_level: Some(ActivityLevel::Low),
                glass_size: Some(200),
                ..UserProfileUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(client.profile().await.unwrap(), Some(profile));

        let date = d(2024, 6, 7);
        assert!(client.water_intake(date).await.unwrap().is_none());
        let intake = client
            .update_water_intake(
                date,
                &WaterIntakeUpdate {
                    glasses_consumed: Some(5),
                    ml_per_glass: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(intake.ml_per_glass, 200);
        assert_eq!(intake.total_ml, 1000);
        // 70 kg at low activity
        assert_eq!(intake.daily_goal_ml, 2450);
        let status = client.water_status(date).await.unwrap();
        assert_eq!(status.remaining_ml, 1450);

        let settings = client
            .update_notification_settings(&NotificationSettingsUpdate {
                morning_pills_time: Some("7:15".into()),
                ..NotificationSettingsUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(settings.morning_pills_time, "07:15");
        assert_eq!(
            client.notification_settings().await.unwrap().morning_pills_time,
            "07:15"
        );
    }

    #[tokio::test]
    async fn test_chat_history_roundtrip() {
        let url = spawn_server(None).await;
        let client = RemoteClient::new(&url, None).unwrap();
        let reply = client
            .chat(&ChatRequest {
                message: "Hallo".into(),
                session_id: None,
            })
            .await
            .unwrap();
        let session = client.chat_history(&reply.session_id).await.unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].message, reply.response);
    }
}
