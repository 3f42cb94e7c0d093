use crate::errors::AppError;
use crate::models::AppData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, info};

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!("loaded {} sleep entries from {}", data.entries.len(), path.display());
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

pub async fn commit(path: &Path, data: &mut AppData, next: AppData) -> Result<(), AppError> {
    persist_data(path, &next).await?;
    *data = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EffectiveSleepPolicy;
    use crate::models::NewSleepEntry;
    use crate::repository::SleepRepository;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("sleep_tracker_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_data() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.entries.is_empty());
        assert_eq!(data.preferences.daily_sleep_goal, 8.0);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_data() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.entries.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_data_reloads() {
        let path = temp_path("roundtrip");
        let mut data = AppData::default();
        data.entries
            .upsert(
                NewSleepEntry {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    bedtime: "23:00".into(),
                    waketime: "07:00".into(),
                    sleep_quality: 80,
                    interruptions: 0,
                    fell_asleep_quickly: true,
                    woke_up_refreshed: true,
                    notes: Some("new pillow".into()),
                    sleep_stages: None,
                },
                EffectiveSleepPolicy::None,
            )
            .unwrap();
        data.preferences.name = "Sam".into();

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;

        assert_eq!(loaded.entries, data.entries);
        assert_eq!(loaded.preferences.name, "Sam");
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn failed_write_leaves_data_untouched() {
        let mut data = AppData::default();
        let mut next = data.clone();
        next.preferences.name = "Sam".into();

        let err = commit(&env::temp_dir(), &mut data, next.clone()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(data.preferences.name, "");

        let path = temp_path("commit");
        commit(&path, &mut data, next).await.unwrap();
        assert_eq!(data.preferences.name, "Sam");
        assert_eq!(load_data(&path).await.preferences.name, "Sam");
        let _ = fs::remove_file(&path).await;
    }
}
