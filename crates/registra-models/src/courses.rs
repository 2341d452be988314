//! Course, section, and prerequisite-rule domain models.

use crate::ids::{CourseId, PrerequisiteRuleId, SectionId, TermId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Course entity with a fixed credit weight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    /// Unique identifier for the course
    pub id: CourseId,
    /// Course code (e.g. "CS101")
    pub code: String,
    /// Course name
    pub name: String,
    /// Credit weight counted toward a student's term load
    pub credits: i32,
    /// Timestamp when the course was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the course was last updated
    pub updated_at: DateTime<Utc>,
}

/// How a prerequisite must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "prerequisite_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrerequisiteKind {
    /// The prerequisite course must have been passed.
    Pass,
    /// Passing OR being registered for the prerequisite in the same term suffices.
    Concurrent,
}

/// A single prerequisite rule attached to a course.
///
/// Rules are independent AND-conditions: a candidate must satisfy
/// every rule on a course to remain eligible for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PrerequisiteRule {
    /// Unique identifier for the rule
    pub id: PrerequisiteRuleId,
    /// Course the rule gates
    pub course_id: CourseId,
    /// Course that must be passed (or taken concurrently)
    pub prerequisite_course_id: CourseId,
    /// Condition kind
    pub kind: PrerequisiteKind,
    /// Optional minimum total score on the prerequisite course
    pub min_score: Option<f64>,
    /// Optional minimum cumulative passed credits, independent of the
    /// prerequisite course itself
    pub min_credits: Option<i32>,
}

/// Section entity: one offering of a course within a term.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Section {
    /// Unique identifier for the section
    pub id: SectionId,
    /// Section code (e.g. "CS101.01")
    pub code: String,
    /// Course this section offers
    pub course_id: CourseId,
    /// Term this section runs in
    pub term_id: TermId,
    /// Seat capacity
    pub capacity: i32,
    /// Seats taken; only mutated inside committed allocation transactions
    pub occupied: i32,
    /// Timestamp when the section was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the section was last updated
    pub updated_at: DateTime<Utc>,
}
