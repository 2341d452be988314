use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{allocate_batch, allocate_course, allocate_term, force_allocate};

/// Initialize the allocation router
/// Routes: POST /courses, POST /batch, POST /terms/{term_id}, POST /force
pub fn init_allocation_router() -> Router<AppState> {
    Router::new()
        .route("/courses", post(allocate_course))
        .route("/batch", post(allocate_batch))
        .route("/terms/{term_id}", post(allocate_term))
        .route("/force", post(force_allocate))
}
