//! Exam scheduling domain models and DTOs.

use crate::ids::{ExamSessionId, InvigilatorId, RoomId, SectionId, StudentId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use registra_core::PaginationMeta;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// One entry of the fixed, ordered time-slot catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimeSlot {
    /// Catalog position (1-based, ascending through the day)
    pub id: i32,
    /// Slot code (e.g. "S03")
    pub code: String,
    /// Wall-clock start of the slot
    pub start_time: NaiveTime,
    /// Wall-clock end of the slot
    pub end_time: NaiveTime,
}

/// A scheduled, room-and-invigilator-bound exam sitting for one section.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamSession {
    /// Unique identifier for the session
    pub id: ExamSessionId,
    /// Session code (e.g. "EX-CS101-01")
    pub code: String,
    /// Section the exam is for
    pub section_id: SectionId,
    /// Room the exam takes place in
    pub room_id: RoomId,
    /// Calendar day of the exam
    pub exam_day: NaiveDate,
    /// First occupied slot of the window
    pub start_slot: i32,
    /// Slot the window runs up to (half-open: the window is `[start, end)`)
    pub end_slot: i32,
    /// Invigilator supervising the sitting
    pub invigilator_id: InvigilatorId,
    /// Seat capacity of the sitting
    pub capacity: i32,
    /// Seats filled so far; only mutated by the roster allocator
    pub filled: i32,
    /// Free-form annotation
    pub note: Option<String>,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the session was last updated
    pub updated_at: DateTime<Utc>,
}

/// Exam session hydrated with display fields from joined tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamSessionDetail {
    pub id: ExamSessionId,
    pub code: String,
    pub section_id: SectionId,
    /// Code of the examined section
    pub section_code: String,
    /// Code of the course the section offers
    pub course_code: String,
    /// Name of the course the section offers
    pub course_name: String,
    pub room_id: RoomId,
    /// Code of the exam room
    pub room_code: String,
    pub exam_day: NaiveDate,
    pub start_slot: i32,
    pub end_slot: i32,
    /// Wall-clock start of the window
    pub start_time: NaiveTime,
    /// Wall-clock end of the window
    pub end_time: NaiveTime,
    pub invigilator_id: InvigilatorId,
    /// Name of the invigilator
    pub invigilator_name: String,
    pub capacity: i32,
    pub filled: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for scheduling a new exam session.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExamSessionDto {
    /// Session code (1-64 characters, unique)
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    /// Section the exam is for
    pub section_id: SectionId,
    /// Room the exam takes place in
    pub room_id: RoomId,
    /// Calendar day of the exam
    pub exam_day: NaiveDate,
    /// First occupied slot
    pub start_slot: i32,
    /// Slot the window runs up to (exclusive)
    pub end_slot: i32,
    /// Invigilator supervising the sitting
    pub invigilator_id: InvigilatorId,
    /// Seat capacity (0 or more)
    #[validate(range(min = 0))]
    pub capacity: i32,
    /// Free-form annotation
    pub note: Option<String>,
}

/// Keeps `"field": null` distinguishable from an absent field, so an
/// update can clear an optional column.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DTO for editing an exam session; conflicts are re-validated with the
/// session's own id excluded.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExamSessionDto {
    /// New room
    pub room_id: Option<RoomId>,
    /// New calendar day
    pub exam_day: Option<NaiveDate>,
    /// New first slot
    pub start_slot: Option<i32>,
    /// New end slot (exclusive)
    pub end_slot: Option<i32>,
    /// New invigilator
    pub invigilator_id: Option<InvigilatorId>,
    /// New seat capacity (may not drop below the filled count)
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    /// New annotation; send `null` to clear it, omit to keep it
    #[serde(default, deserialize_with = "explicit_null")]
    pub note: Option<Option<String>>,
}

/// Paginated list of exam sessions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedExamSessionsResponse {
    pub data: Vec<ExamSessionDetail>,
    pub meta: PaginationMeta,
}

/// Outcome of one roster-fill pass over an exam session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterReport {
    /// Session the roster belongs to
    pub exam_session_id: ExamSessionId,
    /// Session code
    pub code: String,
    /// Seat capacity of the session
    pub capacity: i32,
    /// Filled count before this pass
    pub filled_before: i32,
    /// Filled count after this pass
    pub filled_after: i32,
    /// Number of seat allocations inserted
    pub inserted: i64,
    /// Students seated by this pass, in ascending-id order
    pub student_ids: Vec<StudentId>,
    /// Free seats remaining after this pass
    pub seats_left: i64,
}
