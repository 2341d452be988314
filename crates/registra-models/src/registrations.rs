//! Registration domain model.

use crate::ids::{RegistrationId, SectionId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle status of a registration. Records are never deleted;
/// withdrawal is represented by the status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Pending,
    Withdrawn,
}

/// A student's enrollment record in one section.
///
/// Invariant: at most one active registration per (student, course,
/// term), enforced by the allocators before insertion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Registration {
    /// Unique identifier for the registration
    pub id: RegistrationId,
    /// Registered student
    pub student_id: StudentId,
    /// Section the student is enrolled in
    pub section_id: SectionId,
    /// Lifecycle status
    pub status: RegistrationStatus,
    /// Free-form annotation (e.g. "auto-allocation", "forced-allocation")
    pub note: Option<String>,
    /// When the registration was made
    pub registered_at: DateTime<Utc>,
}
