use crate::assessment::{AssessmentRequest, AssessmentResult, QUESTIONS, Question, score_answers};
use crate::errors::AppError;
use crate::models::{
    AggregateWindow, AssessmentRecord, DashboardResponse, EntryRangeQuery, ImportReport,
    LastNightResponse, NewSleepEntry, RecomputeResponse, SleepEntry, StatsQuery, UserPreferences,
};
use crate::repository::SleepRepository;
use crate::state::AppState;
use crate::stats::{build_dashboard, build_window, last_night};
use crate::storage::commit;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Local};
use tracing::{info, warn};
use uuid::Uuid;

pub async fn list_entries(
    State(state): State<AppState>,
    Query(range): Query<EntryRangeQuery>,
) -> Json<Vec<SleepEntry>> {
    let data = state.data.lock().await;
    Json(data.entries.in_range(range.start, range.end))
}

pub async fn upsert_entry(
    State(state): State<AppState>,
    Json(draft): Json<NewSleepEntry>,
) -> Result<Json<SleepEntry>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let entry = next.entries.upsert(draft, state.config.stage_policy)?;
    commit(&state.data_path, &mut data, next).await?;

    info!("saved sleep entry {} for {}", entry.id, entry.date);
    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<NewSleepEntry>,
) -> Result<Json<SleepEntry>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let entry = next
        .entries
        .update(id, draft, state.config.stage_policy)?
        .ok_or_else(|| AppError::not_found(format!("no sleep entry with id {id}")))?;
    commit(&state.data_path, &mut data, next).await?;

    info!("updated sleep entry {id}");
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    if !next.entries.delete(id) {
        return Err(AppError::not_found(format!("no sleep entry with id {id}")));
    }
    commit(&state.data_path, &mut data, next).await?;

    info!("deleted sleep entry {id}");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recompute_entries(
    State(state): State<AppState>,
) -> Result<Json<RecomputeResponse>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let updated = next.entries.recompute_all(state.config.stage_policy)?;
    commit(&state.data_path, &mut data, next).await?;

    info!("recomputed stage snapshots for {updated} entries");
    Ok(Json(RecomputeResponse { updated }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<AggregateWindow>, AppError> {
    let data = state.data.lock().await;
    let window = build_window(data.entries.list(), query.period, state.config.same_day_policy)?;
    Ok(Json(window))
}

pub async fn get_last_night(
    State(state): State<AppState>,
) -> Result<Json<LastNightResponse>, AppError> {
    let data = state.data.lock().await;
    let snapshot = last_night(data.entries.list(), state.config.stage_policy)?;
    Ok(Json(LastNightResponse {
        date: Local::now().date_naive() - Duration::days(1),
        last_night: snapshot,
    }))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let data = state.data.lock().await;
    let dashboard = build_dashboard(
        data.entries.list(),
        data.preferences.daily_sleep_goal,
        state.config.stage_policy,
        state.config.same_day_policy,
    )?;
    Ok(Json(dashboard))
}

pub async fn export_entries(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data.lock().await;
    let csv = data.entries.export_all()?;

    info!("exported {} sleep entries", data.entries.len());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sleep-data.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn import_entries(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportReport>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let report = next.entries.import_all(&body)?;
    if report.imported > 0 {
        commit(&state.data_path, &mut data, next).await?;
    }

    if report.skipped > 0 {
        warn!("import skipped {} malformed rows", report.skipped);
    }
    info!("imported {} sleep entries", report.imported);
    Ok(Json(report))
}

pub async fn get_questions() -> Json<[Question; 5]> {
    Json(QUESTIONS)
}

pub async fn submit_assessment(
    State(state): State<AppState>,
    Json(request): Json<AssessmentRequest>,
) -> Result<Json<AssessmentResult>, AppError> {
    let result = score_answers(&request.answers)?;

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.assessments.push(AssessmentRecord {
        date: Local::now().date_naive(),
        score: result.score,
        category: result.category,
    });
    commit(&state.data_path, &mut data, next).await?;

    info!("recorded sleep assessment with score {}", result.score);
    Ok(Json(result))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    let data = state.data.lock().await;
    Json(data.preferences.clone())
}

pub async fn put_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<UserPreferences>,
) -> Result<Json<UserPreferences>, AppError> {
    preferences.validate()?;

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.preferences = preferences.clone();
    commit(&state.data_path, &mut data, next).await?;

    info!("updated user preferences");
    Ok(Json(preferences))
}
