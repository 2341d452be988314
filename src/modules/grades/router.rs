use axum::{Router, routing::put};

use crate::state::AppState;

use super::controller::upsert_process_scores;

/// Initialize the grades router, nested under /sections
/// Routes: PUT /{section_id}/process-scores
pub fn init_grades_router() -> Router<AppState> {
    Router::new().route("/{section_id}/process-scores", put(upsert_process_scores))
}
