//! Academic result domain model.
//!
//! Results are written by the grading subsystem and read by the
//! prerequisite validator and the exam roster allocator.

use crate::ids::{AcademicResultId, SectionId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Highest classification rank that still counts as a pass.
///
/// Ranks are ordered best-first (1 = excellent ... 4 = pass,
/// 5 = fail), so "passed" means `classification_rank <= 4`.
pub const PASSING_RANK_MAX: i16 = 4;

/// Minimum process score (0-10 scale) qualifying a student to sit an exam.
pub const EXAM_PROCESS_SCORE_MIN: f64 = 4.0;

/// Per-(student, section) academic result record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicResult {
    /// Unique identifier for the result row
    pub id: AcademicResultId,
    /// Student the result belongs to
    pub student_id: StudentId,
    /// Section the result was earned in
    pub section_id: SectionId,
    /// Continuous-assessment score (0-10), gates exam eligibility
    pub process_score: Option<f64>,
    /// Exam score (0-10)
    pub exam_score: Option<f64>,
    /// Combined total score (0-10)
    pub total_score: Option<f64>,
    /// Classification rank; `<=` [`PASSING_RANK_MAX`] counts as a pass
    pub classification_rank: Option<i16>,
    /// Attempt number (1 for first sitting)
    pub attempt: i32,
    /// When the most recent score was entered
    pub graded_at: Option<DateTime<Utc>>,
    /// Timestamp when the row was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the row was last updated
    pub updated_at: DateTime<Utc>,
}
