use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use vitalog_core::dates::parse_iso;
use vitalog_core::metrics::{self, MAX_PROGRESS_DAYS};
use vitalog_core::models::{
    Achievement, AppSettings, AppSettingsUpdate, CategoryCount, ChatCategory, ChatRequest,
    ChatResponse, ChatSession, DailyTarget, DashboardSummary, DrinkTracking, DrinkUpdate,
    ExportData, ImportSummary, NewReminder, NewSavedMessage, NewWeightEntry, NewWeightGoal,
    NotificationSettings, NotificationSettingsUpdate, PillTracking, PillUpdate, Reminder,
    ReminderUpdate, SavedChatMessage, SavedMessageUpdate, UserProfile, UserProfileUpdate,
    UserStats, WaterIntake, WaterIntakeStatus, WaterIntakeUpdate, WeightEntry, WeightGoal,
    WeightProgress, validate_export_data, validate_new_goal, validate_new_reminder,
    validate_new_saved_message, validate_notification_update, validate_profile_update,
    validate_reminder_update, validate_saved_message_update, validate_settings_update,
    validate_water_intake_update, validate_weight,
};
use vitalog_core::service::VitalsService;

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<VitalsService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, VitalsService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateWeightRequest {
    date: String,
    weight: f64,
}

#[derive(Deserialize)]
struct SavedMessagesQuery {
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err:#}"))
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    parse_iso(s).map_err(|e| bad_request(&e))
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            warn!(path = %request.uri().path(), "rejected request without valid API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Dashboard ---

async fn get_dashboard(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let date = parse_date(&date)?;
    let summary = state.svc().dashboard(date).context("failed to load dashboard")?;
    Ok(Json(summary))
}

// --- Pills & drinks ---

async fn get_pills(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<PillTracking>, ApiError> {
    let date = parse_date(&date_str)?;
    let record = state
        .svc()
        .get_pills(date)
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound(format!("No pill record for {date_str}")))?;
    Ok(Json(record))
}

async fn put_pills(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(update): Json<PillUpdate>,
) -> Result<Json<PillTracking>, ApiError> {
    let date = parse_date(&date)?;
    let record = state
        .svc()
        .update_pills(date, &update)
        .context("failed to update pills")?;
    Ok(Json(record))
}

async fn get_drinks(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<DrinkTracking>, ApiError> {
    let date = parse_date(&date_str)?;
    let record = state
        .svc()
        .get_drinks(date)
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound(format!("No drink record for {date_str}")))?;
    Ok(Json(record))
}

async fn put_drinks(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(update): Json<DrinkUpdate>,
) -> Result<Json<DrinkTracking>, ApiError> {
    let date = parse_date(&date)?;
    let record = state
        .svc()
        .update_drink(date, &update)
        .context("failed to update drinks")?;
    Ok(Json(record))
}

// --- Weight ---

async fn create_weight(
    State(state): State<AppState>,
    Json(req): Json<CreateWeightRequest>,
) -> Result<Json<WeightEntry>, ApiError> {
    let date = parse_date(&req.date)?;
    validate_weight(req.weight).map_err(|e| bad_request(&e))?;
    let entry = state
        .svc()
        .log_weight(&NewWeightEntry {
            date,
            weight: req.weight,
        })
        .context("failed to upsert weight")?;
    Ok(Json(entry))
}

async fn get_weight(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<WeightEntry>, ApiError> {
    let date = parse_date(&date_str)?;
    let entry = state
        .svc()
        .get_weight(date)
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound(format!("No weight entry for {date_str}")))?;
    Ok(Json(entry))
}

async fn delete_weight(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<StatusCode, ApiError> {
    let date = parse_date(&date_str)?;
    if state.svc().delete_weight(date).context("store error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No weight entry for {date_str}")))
    }
}

async fn get_weight_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<WeightEntry>>, ApiError> {
    let start = parse_date(&start)?;
    let end = parse_date(&end)?;
    if start > end {
        return Err(ApiError::BadRequest(
            "Start date must not be after end date".to_string(),
        ));
    }
    let entries = state
        .svc()
        .get_weight_range(start, end)
        .context("store error")?;
    Ok(Json(entries))
}

async fn get_weight_progress(
    State(state): State<AppState>,
    Path(days): Path<u32>,
) -> Result<Json<WeightProgress>, ApiError> {
    if days == 0 || days > MAX_PROGRESS_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Days must be between 1 and {MAX_PROGRESS_DAYS}"
        )));
    }
    let progress = state
        .svc()
        .weight_progress(days)
        .context("failed to compute weight progress")?;
    Ok(Json(progress))
}

// --- Goals ---

async fn list_goals(State(state): State<AppState>) -> Result<Json<Vec<WeightGoal>>, ApiError> {
    Ok(Json(state.svc().get_goals().context("store error")?))
}

async fn create_goal(
    State(state): State<AppState>,
    Json(req): Json<NewWeightGoal>,
) -> Result<(StatusCode, Json<WeightGoal>), ApiError> {
    validate_new_goal(&req).map_err(|e| bad_request(&e))?;
    let goal = state
        .svc()
        .create_goal(&req)
        .context("failed to create goal")?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn get_active_goal(
    State(state): State<AppState>,
) -> Result<Json<Option<WeightGoal>>, ApiError> {
    Ok(Json(state.svc().get_active_goal().context("store error")?))
}

async fn get_daily_target(
    State(state): State<AppState>,
    Path(current_weight): Path<f64>,
) -> Result<Json<DailyTarget>, ApiError> {
    validate_weight(current_weight).map_err(|e| bad_request(&e))?;
    let goal = state
        .svc()
        .get_active_goal()
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound("No active weight goal".to_string()))?;
    let target = metrics::daily_target(&goal, current_weight, Local::now().date_naive())
        .map_err(|e| bad_request(&e))?;
    Ok(Json(target))
}

// --- Reminders ---

async fn list_reminders(State(state): State<AppState>) -> Result<Json<Vec<Reminder>>, ApiError> {
    Ok(Json(state.svc().get_reminders().context("store error")?))
}

async fn create_reminder(
    State(state): State<AppState>,
    Json(req): Json<NewReminder>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    validate_new_reminder(&req).map_err(|e| bad_request(&e))?;
    let reminder = state
        .svc()
        .create_reminder(&req)
        .context("failed to create reminder")?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn update_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReminderUpdate>,
) -> Result<Json<Reminder>, ApiError> {
    validate_reminder_update(&req).map_err(|e| bad_request(&e))?;
    let reminder = state
        .svc()
        .update_reminder(&id, &req)
        .context("failed to update reminder")?
        .ok_or_else(|| ApiError::NotFound(format!("Reminder {id} not found")))?;
    Ok(Json(reminder))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.svc().delete_reminder(&id).context("store error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Reminder {id} not found")))
    }
}

// --- Settings ---

async fn get_settings(State(state): State<AppState>) -> Result<Json<AppSettings>, ApiError> {
    Ok(Json(state.svc().get_settings().context("store error")?))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(req): Json<AppSettingsUpdate>,
) -> Result<Json<AppSettings>, ApiError> {
    validate_settings_update(&req).map_err(|e| bad_request(&e))?;
    let settings = state
        .svc()
        .update_settings(&req)
        .context("failed to update settings")?;
    Ok(Json(settings))
}

async fn get_notification_settings(
    State(state): State<AppState>,
) -> Result<Json<NotificationSettings>, ApiError> {
    Ok(Json(
        state.svc().notification_settings().context("store error")?,
    ))
}

async fn put_notification_settings(
    State(state): State<AppState>,
    Json(req): Json<NotificationSettingsUpdate>,
) -> Result<Json<NotificationSettings>, ApiError> {
    validate_notification_update(&req).map_err(|e| bad_request(&e))?;
    let settings = state
        .svc()
        .update_notification_settings(&req)
        .context("failed to update notification settings")?;
    Ok(Json(settings))
}

// --- Profile & water intake ---

async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<Option<UserProfile>>, ApiError> {
    Ok(Json(state.svc().get_profile().context("store error")?))
}

async fn post_profile(
    State(state): State<AppState>,
    Json(req): Json<UserProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    validate_profile_update(&req).map_err(|e| bad_request(&e))?;
    let profile = state
        .svc()
        .update_profile(&req)
        .context("failed to save profile")?;
    Ok(Json(profile))
}

async fn get_water_intake(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<WaterIntake>, ApiError> {
    let date = parse_date(&date_str)?;
    let record = state
        .svc()
        .get_water_intake(date)
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound(format!("No water intake for {date_str}")))?;
    Ok(Json(record))
}

async fn put_water_intake(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(update): Json<WaterIntakeUpdate>,
) -> Result<Json<WaterIntake>, ApiError> {
    let date = parse_date(&date)?;
    validate_water_intake_update(&update).map_err(|e| bad_request(&e))?;
    let record = state
        .svc()
        .update_water_intake(date, &update)
        .context("failed to update water intake")?;
    Ok(Json(record))
}

async fn get_water_status(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WaterIntakeStatus>, ApiError> {
    let date = parse_date(&date)?;
    let status = state
        .svc()
        .water_status(date)
        .context("failed to compute water status")?;
    Ok(Json(status))
}

// --- Achievements ---

async fn get_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let achievements = state
        .svc()
        .achievements()
        .context("failed to compute achievements")?;
    Ok(Json(achievements))
}

async fn get_user_stats(State(state): State<AppState>) -> Result<Json<UserStats>, ApiError> {
    let stats = state
        .svc()
        .user_stats()
        .context("failed to compute stats")?;
    Ok(Json(stats))
}

// --- Chat ---

async fn health_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    Ok(Json(state.svc().chat(&req).context("failed to record chat")?))
}

async fn get_chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    Ok(Json(
        state.svc().chat_history(&session_id).context("store error")?,
    ))
}

async fn list_saved_messages(
    State(state): State<AppState>,
    Query(query): Query<SavedMessagesQuery>,
) -> Result<Json<Vec<SavedChatMessage>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(str::parse::<ChatCategory>)
        .transpose()
        .map_err(|e| bad_request(&e))?;
    let tag = query.tag.as_deref().filter(|t| !t.is_empty());
    let messages = state
        .svc()
        .get_saved_messages(category, tag)
        .context("store error")?;
    Ok(Json(messages))
}

async fn save_message(
    State(state): State<AppState>,
    Json(req): Json<NewSavedMessage>,
) -> Result<(StatusCode, Json<SavedChatMessage>), ApiError> {
    validate_new_saved_message(&req).map_err(|e| bad_request(&e))?;
    let saved = state
        .svc()
        .save_message(&req)
        .context("failed to save message")?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_saved_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SavedChatMessage>, ApiError> {
    let message = state
        .svc()
        .get_saved_message(&id)
        .context("store error")?
        .ok_or_else(|| ApiError::NotFound(format!("Saved message {id} not found")))?;
    Ok(Json(message))
}

async fn update_saved_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SavedMessageUpdate>,
) -> Result<Json<SavedChatMessage>, ApiError> {
    validate_saved_message_update(&req).map_err(|e| bad_request(&e))?;
    let message = state
        .svc()
        .update_saved_message(&id, &req)
        .context("failed to update saved message")?
        .ok_or_else(|| ApiError::NotFound(format!("Saved message {id} not found")))?;
    Ok(Json(message))
}

async fn delete_saved_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.svc().delete_saved_message(&id).context("store error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Saved message {id} not found")))
    }
}

async fn saved_message_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    Ok(Json(state.svc().category_counts().context("store error")?))
}

// --- Export / Import ---

async fn export_data(State(state): State<AppState>) -> Result<Json<ExportData>, ApiError> {
    let data = state.svc().export_all().context("failed to export data")?;
    Ok(Json(data))
}

async fn import_data(
    State(state): State<AppState>,
    Json(data): Json<ExportData>,
) -> Result<Json<ImportSummary>, ApiError> {
    validate_export_data(&data).map_err(|e| bad_request(&e))?;
    let summary = state
        .svc()
        .import_all(&data)
        .context("failed to import data")?;
    Ok(Json(summary))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard/{date}", get(get_dashboard))
        .route("/api/pills/{date}", get(get_pills).put(put_pills))
        .route("/api/drinks/{date}", get(get_drinks).put(put_drinks))
        .route("/api/weight", post(create_weight))
        .route("/api/weight/range/{start}/{end}", get(get_weight_range))
        .route("/api/weight/{date}", get(get_weight).delete(delete_weight))
        .route("/api/weight-progress/{days}", get(get_weight_progress))
        .route("/api/weight-goals", get(list_goals).post(create_goal))
        .route("/api/weight-goals/active", get(get_active_goal))
        .route(
            "/api/weight-goals/daily-target/{weight}",
            get(get_daily_target),
        )
        .route("/api/reminders", get(list_reminders).post(create_reminder))
        .route(
            "/api/reminders/{id}",
            put(update_reminder).delete(delete_reminder),
        )
        .route("/api/settings/app", get(get_settings).put(put_settings))
        .route(
            "/api/settings/notifications",
            get(get_notification_settings).put(put_notification_settings),
        )
        .route("/api/user-profile", get(get_profile).post(post_profile))
        .route(
            "/api/water-intake/{date}",
            get(get_water_intake).put(put_water_intake),
        )
        .route("/api/water-intake/{date}/status", get(get_water_status))
        .route("/api/achievements", get(get_achievements))
        .route("/api/user-stats", get(get_user_stats))
        .route("/api/health-chat", post(health_chat))
        .route("/api/health-chat/{session_id}", get(get_chat_history))
        .route(
            "/api/saved-messages",
            get(list_saved_messages).post(save_message),
        )
        .route(
            "/api/saved-messages/categories/all",
            get(saved_message_categories),
        )
        .route(
            "/api/saved-messages/{id}",
            get(get_saved_message)
                .put(update_saved_message)
                .delete(delete_saved_message),
        )
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

pub async fn start_server(
    svc: VitalsService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key {
        Some(ref key) if new_api_key => {
            eprintln!("Generated new API key: {key}");
            eprintln!("Include in requests: Authorization: Bearer {key}");
        }
        Some(ref key) => {
            let shown = key.get(..4).unwrap_or_default();
            info!("API key: {shown}... (see api_key file in data directory)");
        }
        None => {
            warn!("authentication disabled (--no-auth), API is open to anyone");
            if bind != "127.0.0.1" && bind != "localhost" {
                warn!("listening on {bind} with no authentication");
            }
        }
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve `svc` on an already bound listener. Used to run the API in-process.
#[cfg(test)]
pub(crate) async fn serve_on(
    listener: tokio::net::TcpListener,
    svc: VitalsService,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let app = build_router(AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key,
    });
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        AppState {
            svc: Arc::new(Mutex::new(VitalsService::new_in_memory().unwrap())),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app.oneshot(get_request("/api/settings/app")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/settings/app")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/settings/app")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(Some("secret".to_string()));

        let response = app.oneshot(get_request("/api/settings/app")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn settings_defaults_and_update() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(get_request("/api/settings/app"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["theme"], "pink");
        assert_eq!(json["language"], "de");

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/settings/app",
                &serde_json::json!({ "theme": "blue" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["theme"], "blue");

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/settings/app",
                &serde_json::json!({ "theme": "purple" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn weight_create_and_fetch() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weight",
                &serde_json::json!({ "date": "2024-06-01", "weight": 80.5 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_request("/api/weight/2024-06-01"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["weight"], 80.5);

        let response = app
            .clone()
            .oneshot(get_request("/api/weight/range/2024-05-01/2024-06-30"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app
            .oneshot(get_request("/api/weight/2024-06-02"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn weight_validation_errors() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weight",
                &serde_json::json!({ "date": "2024-06-01", "weight": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weight",
                &serde_json::json!({ "date": "01.06.2024", "weight": 80 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get_request("/api/weight-progress/400"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn drinks_put_clamps_negative() {
        let app = test_app(None);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/drinks/2024-06-01",
                &serde_json::json!({ "drink_type": "wasser", "count": -2 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["drinks"]["wasser"], 0);
    }

    #[tokio::test]
    async fn goals_keep_single_active() {
        let app = test_app(None);
        let goal = serde_json::json!({
            "goal_type": "fixed_weight",
            "start_weight": 80.0,
            "target_weight": 75.0,
            "start_date": "2024-01-01",
            "target_date": "2030-01-01",
        });

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/weight-goals", &goal))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/weight-goals"))
            .await
            .unwrap();
        let goals = body_json(response).await;
        let active = goals
            .as_array()
            .unwrap()
            .iter()
            .filter(|g| g["is_active"] == true)
            .count();
        assert_eq!(active, 1);

        let response = app
            .oneshot(get_request("/api/weight-goals/daily-target/79.0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["target_weight"], 75.0);
    }

    #[tokio::test]
    async fn daily_target_without_goal_returns_404() {
        let app = test_app(None);
        let response = app
            .oneshot(get_request("/api/weight-goals/daily-target/79.0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reminder_toggle_and_delete() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/reminders",
                &serde_json::json!({ "reminder_type": "drinks", "time": "10:00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/reminders/{id}"),
                &serde_json::json!({ "is_enabled": false }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["is_enabled"], false);

        let delete = || {
            axum::http::Request::delete(format!("/api/reminders/{id}"))
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_and_saved_messages() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/health-chat",
                &serde_json::json!({ "message": "Wie viel Wasser soll ich trinken?" }),
            ))
            .await
            .unwrap();
        let chat = body_json(response).await;
        assert!(chat["response"].as_str().unwrap().contains("Wasser"));
        assert!(!chat["session_id"].as_str().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/saved-messages",
                &serde_json::json!({
                    "original_message": "Wie viel Wasser?",
                    "ai_response": chat["response"],
                    "category": "gesundheitstipps",
                    "title": "Wasser",
                    "tags": ["wasser"],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(get_request("/api/saved-messages?category=gesundheitstipps"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(get_request("/api/saved-messages?category=rezepte"))
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(get_request("/api/saved-messages?category=nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get_request("/api/saved-messages/categories/all"))
            .await
            .unwrap();
        let counts = body_json(response).await;
        assert_eq!(counts[0]["category"], "gesundheitstipps");
        assert_eq!(counts[0]["count"], 1);
    }

    #[tokio::test]
    async fn chat_history_keeps_both_sides() {
        let app = test_app(None);

        for message in ["Hallo", "Schlaf"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/health-chat",
                    &serde_json::json!({ "message": message, "session_id": "s-1" }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/health-chat/s-1"))
            .await
            .unwrap();
        let session = body_json(response).await;
        let messages = session["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["message"], "Hallo");
        assert_eq!(messages[0]["is_user"], true);
        assert_eq!(messages[1]["is_user"], false);

        let response = app
            .oneshot(get_request("/api/health-chat/unknown"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["messages"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn profile_missing_then_saved() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(get_request("/api/user-profile"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.is_null());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user-profile",
                &serde_json::json!({ "age": 30, "activity_level": "high" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let profile = body_json(response).await;
        assert_eq!(profile["activity_level"], "high");
        assert_eq!(profile["glass_size"], 250);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/user-profile",
                &serde_json::json!({ "gender": "robot" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn water_intake_update_and_status() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(get_request("/api/water-intake/2024-06-07"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(get_request("/api/water-intake/2024-06-07/status"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["remaining_ml"], 2940);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/water-intake/2024-06-07",
                &serde_json::json!({ "glasses_consumed": 6 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["total_ml"], 1500);

        let response = app
            .clone()
            .oneshot(get_request("/api/water-intake/2024-06-07/status"))
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["remaining_ml"], 1440);
        assert_eq!(status["glasses_needed"], 5);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/water-intake/2024-06-07",
                &serde_json::json!({ "ml_per_glass": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notification_settings_defaults_and_update() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(get_request("/api/settings/notifications"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["morning_pills_time"], "08:00");
        assert_eq!(json["water_reminder_times"].as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/settings/notifications",
                &serde_json::json!({ "evening_pills_time": "21:30", "is_enabled": false }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["evening_pills_time"], "21:30");
        assert_eq!(json["is_enabled"], false);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/settings/notifications",
                &serde_json::json!({ "water_reminder_times": ["25:00"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn achievements_after_weight() {
        let app = test_app(None);
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/weight",
                &serde_json::json!({ "date": today, "weight": 80.0 }),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(get_request("/api/achievements"))
            .await
            .unwrap();
        let achievements = body_json(response).await;
        let first = achievements
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["badge_type"] == "first_weight")
            .unwrap()
            .clone();
        assert_eq!(first["is_unlocked"], true);

        let response = app.oneshot(get_request("/api/user-stats")).await.unwrap();
        let stats = body_json(response).await;
        assert_eq!(stats["current_streak_days"], 1);
        assert_eq!(stats["current_level"], 1);
    }

    #[tokio::test]
    async fn export_then_import_roundtrip() {
        let source = test_app(None);
        source
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/pills/2024-06-01",
                &serde_json::json!({ "morning_taken": true }),
            ))
            .await
            .unwrap();
        let response = source.oneshot(get_request("/api/export")).await.unwrap();
        let exported = body_json(response).await;

        let target = test_app(None);
        let response = target
            .clone()
            .oneshot(json_request("POST", "/api/import", &exported))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["pills_imported"], 1);

        let response = target
            .oneshot(get_request("/api/pills/2024-06-01"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["morning_taken"], true);
    }

    #[tokio::test]
    async fn import_invalid_snapshot_returns_400() {
        let app = test_app(None);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/import",
                &serde_json::json!({ "version": 99, "exported_at": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
