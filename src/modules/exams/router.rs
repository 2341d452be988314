use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    allocate_exam_roster, create_exam_session, get_exam_session, list_exam_sessions,
    update_exam_session,
};

/// Initialize the exam sessions router
/// Routes: POST /, GET /, GET /{id}, PUT /{id}, POST /{id}/roster
pub fn init_exam_sessions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam_session).get(list_exam_sessions))
        .route("/{id}", get(get_exam_session).put(update_exam_session))
        .route("/{id}/roster", post(allocate_exam_roster))
}
