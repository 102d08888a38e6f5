use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{EXPORT_VERSION, ExportData, ImportSummary, validate_export_data};
use crate::store::{Store, keys};

pub const EXPORT_MIME: &str = "application/json";
pub const EXPORT_EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Export failed")]
    Export(#[source] std::io::Error),

    #[error("Import failed")]
    Import(#[source] std::io::Error),

    #[error("Import failed: only .json files can be imported")]
    NotJson(PathBuf),
}

/// Write `json` to a new, uniquely named file in `dir` and return its path.
pub fn export_to_file(dir: &Path, json: &str) -> Result<PathBuf, TransferError> {
    fs::create_dir_all(dir).map_err(TransferError::Export)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let path = dir.join(format!("vitalog-export-{stamp}-{suffix}.{EXPORT_EXTENSION}"));
    fs::write(&path, json).map_err(TransferError::Export)?;
    info!(path = %path.display(), bytes = json.len(), "wrote export file");
    Ok(path)
}

/// Read the full text of a picked export file. `None` means the pick was
/// cancelled and yields `None`.
pub fn import_from_file(path: Option<&Path>) -> Result<Option<String>, TransferError> {
    let Some(path) = path else {
        debug!("import cancelled");
        return Ok(None);
    };
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXPORT_EXTENSION));
    if !is_json {
        return Err(TransferError::NotJson(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(TransferError::Import)?;
    Ok(Some(text))
}

impl Store {
    /// Snapshot of every stored key.
    pub fn export_all(&self) -> Result<ExportData> {
        let mut goals = self.get_goals()?;
        goals.reverse();
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            pills: self.get_all_pills()?,
            drinks: self.get_all_drinks()?,
            weights: self.get_all_weights()?,
            goals,
            reminders: self.get_reminders()?,
            app_settings: self.get_settings()?,
            saved_messages: self.read(keys::SAVED_MESSAGES, Vec::new())?,
            user_stats: self.get_user_stats()?,
            achievements: self.get_achievements()?,
            notification_settings: self.get_notification_settings()?,
            user_profile: self.get_profile()?,
            water_intake: self.get_all_water_intake()?,
            chat_sessions: self.read(keys::CHAT_SESSIONS, BTreeMap::new())?,
        })
    }

    /// Replace every key with the snapshot's contents. Nothing is written
    /// if the snapshot fails validation.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        validate_export_data(data)?;

        self.write(keys::PILLS, &data.pills)?;
        self.write(keys::DRINKS, &data.drinks)?;
        self.write(keys::WEIGHTS, &data.weights)?;
        self.write(keys::GOALS, &data.goals)?;
        self.write(keys::REMINDERS, &data.reminders)?;
        self.write(keys::APP_SETTINGS, &data.app_settings)?;
        self.write(keys::SAVED_MESSAGES, &data.saved_messages)?;
        self.write(keys::USER_STATS, &data.user_stats)?;
        self.write(keys::ACHIEVEMENTS, &data.achievements)?;
        self.write(keys::NOTIFICATION_SETTINGS, &data.notification_settings)?;
        match data.user_profile {
            Some(ref profile) => self.write(keys::USER_PROFILE, profile)?,
            None => {
                self.remove(keys::USER_PROFILE)?;
            }
        }
        self.write(keys::WATER_INTAKE, &data.water_intake)?;
        self.write(keys::CHAT_SESSIONS, &data.chat_sessions)?;

        Ok(ImportSummary {
            pills_imported: data.pills.len(),
            drinks_imported: data.drinks.len(),
            weights_imported: data.weights.len(),
            goals_imported: data.goals.len(),
            reminders_imported: data.reminders.len(),
            saved_messages_imported: data.saved_messages.len(),
            water_intake_imported: data.water_intake.len(),
            chat_sessions_imported: data.chat_sessions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChatCategory, GoalType, NewReminder, NewSavedMessage, NewWeightEntry, NewWeightGoal,
        PillUpdate, UserProfileUpdate, WaterIntakeUpdate,
    };
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn populated_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_weight(&NewWeightEntry {
                date: d(2024, 6, 1),
                weight: 80.0,
            })
            .unwrap();
        store
            .upsert_pills(
                d(2024, 6, 1),
                &PillUpdate {
                    morning_taken: Some(true),
                    evening_taken: None,
                },
            )
            .unwrap();
        for target in [76.0, 74.0] {
            store
                .create_goal(&NewWeightGoal {
                    goal_type: GoalType::FixedWeight,
                    start_weight: 80.0,
                    target_weight: Some(target),
                    target_percentage: None,
                    start_date: d(2024, 6, 1),
                    target_date: d(2024, 9, 1),
                })
                .unwrap();
        }
        store
            .create_reminder(&NewReminder {
                reminder_type: "weight".into(),
                time: "07:00".into(),
                is_enabled: true,
            })
            .unwrap();
        store
            .save_message(&NewSavedMessage {
                original_message: "q".into(),
                ai_response: "a".into(),
                category: ChatCategory::Fitness,
                title: "t".into(),
                tags: vec![],
            })
            .unwrap();
        store
            .upsert_profile(&UserProfileUpdate {
                age: Some(40),
                ..UserProfileUpdate::default()
            })
            .unwrap();
        store
            .update_water_intake(
                d(2024, 6, 1),
                &WaterIntakeUpdate {
                    glasses_consumed: Some(5),
                    ml_per_glass: None,
                },
            )
            .unwrap();
        store.append_chat_exchange("s1", "Hallo", "Hi").unwrap();
        store
    }

    #[test]
    fn test_export_to_file_then_import_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let json = "{\"version\":1,\"umlaut\":\"Gläser\"}\n";
        let path = export_to_file(&dir.path().join("exports"), json).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("vitalog-export-"));
        assert!(name.ends_with(".json"));
        let back = import_from_file(Some(&path)).unwrap().unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_export_file_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = export_to_file(dir.path(), "{}").unwrap();
        let b = export_to_file(dir.path(), "{}").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_export_into_file_path_fails_generic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = export_to_file(&blocker, "{}").unwrap_err();
        assert!(matches!(err, TransferError::Export(_)));
        assert_eq!(err.to_string(), "Export failed");
    }

    #[test]
    fn test_import_cancelled() {
        assert!(import_from_file(None).unwrap().is_none());
    }

    #[test]
    fn test_import_rejects_non_json_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("data.txt");
        fs::write(&txt, "{}").unwrap();
        assert!(matches!(
            import_from_file(Some(&txt)),
            Err(TransferError::NotJson(_))
        ));
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            import_from_file(Some(&missing)),
            Err(TransferError::Import(_))
        ));
    }

    #[test]
    fn test_snapshot_roundtrip_between_stores() {
        let source = populated_store();
        let data = source.export_all().unwrap();
        let json = serde_json::to_string_pretty(&data).unwrap();

        let target = Store::open_in_memory().unwrap();
        let parsed: ExportData = serde_json::from_str(&json).unwrap();
        let summary = target.import_all(&parsed).unwrap();
        assert_eq!(summary.weights_imported, 1);
        assert_eq!(summary.goals_imported, 2);
        assert_eq!(summary.reminders_imported, 1);
        assert_eq!(summary.saved_messages_imported, 1);
        assert_eq!(summary.water_intake_imported, 1);
        assert_eq!(summary.chat_sessions_imported, 1);
        assert_eq!(target.get_profile().unwrap(), source.get_profile().unwrap());
        assert_eq!(
            target.get_chat_session("s1").unwrap(),
            source.get_chat_session("s1").unwrap()
        );

        assert_eq!(target.get_goals().unwrap(), source.get_goals().unwrap());
        let mut again = target.export_all().unwrap();
        again.exported_at.clone_from(&data.exported_at);
        assert_eq!(serde_json::to_string_pretty(&again).unwrap(), json);
    }

    #[test]
    fn test_import_invalid_writes_nothing() {
        let store = populated_store();
        let mut data = store.export_all().unwrap();
        for g in &mut data.goals {
            g.is_active = true;
        }
        let target = Store::open_in_memory().unwrap();
        assert!(target.import_all(&data).is_err());
        assert!(target.keys().unwrap().is_empty());
    }

    #[test]
    fn test_import_without_profile_clears_it() {
        let store = populated_store();
        let data = Store::open_in_memory().unwrap().export_all().unwrap();
        store.import_all(&data).unwrap();
        assert!(store.get_profile().unwrap().is_none());
        assert!(store.get_chat_session("s1").unwrap().is_none());
    }

    #[test]
    fn test_import_newer_version_rejected() {
        let store = Store::open_in_memory().unwrap();
        let mut data = store.export_all().unwrap();
        data.version = EXPORT_VERSION + 1;
        assert!(store.import_all(&data).is_err());
    }
}
