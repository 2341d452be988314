//! Student domain model.
//!
//! Student master records are managed by an external directory; the
//! allocators only read them (active flag and id ordering).

use crate::ids::StudentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Student entity as read by the allocation engines.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    /// Unique identifier for the student
    pub id: StudentId,
    /// Registrar-issued student code (e.g. "SV001")
    pub code: String,
    /// Full display name
    pub full_name: String,
    /// Whether the student is active; inactive students are never allocated
    pub is_active: bool,
    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the record was last updated
    pub updated_at: DateTime<Utc>,
}
