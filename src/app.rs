use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/entries", get(handlers::list_entries).post(handlers::upsert_entry))
        .route("/api/entries/recompute", post(handlers::recompute_entries))
        .route(
            "/api/entries/:id",
            put(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/last-night", get(handlers::get_last_night))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/export", get(handlers::export_entries))
        .route("/api/import", post(handlers::import_entries))
        .route(
            "/api/assessment",
            get(handlers::get_questions).post(handlers::submit_assessment),
        )
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .with_state(state)
}
