//! DTOs and reports for the enrollment allocation engine.

use crate::ids::{CourseId, SectionId, StudentId, TermId};
use crate::registrations::{Registration, RegistrationStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

/// Options applied to every registration an allocation run creates.
#[derive(Debug, Clone)]
pub struct AllocationOptions {
    /// Fixed number of students to place into each section; `None`
    /// fills up to each section's remaining capacity.
    pub quota_per_section: Option<i32>,
    /// Status stamped on new registrations.
    pub status: RegistrationStatus,
    /// Note stamped on new registrations.
    pub note: String,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self {
            quota_per_section: None,
            status: RegistrationStatus::Active,
            note: "auto-allocation".to_string(),
        }
    }
}

/// Request body for allocating one course in a term.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AllocateCourseDto {
    /// Term to allocate in
    pub term_id: TermId,
    /// Course to allocate
    pub course_id: CourseId,
    /// Fixed per-section quota (optional; every section must have at
    /// least this many free seats)
    #[validate(range(min = 1))]
    pub quota_per_section: Option<i32>,
    /// Status to stamp on new registrations (default: active)
    pub status: Option<RegistrationStatus>,
    /// Note to stamp on new registrations
    pub note: Option<String>,
}

/// Request body for allocating several courses in a term.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AllocateManyDto {
    /// Term to allocate in
    pub term_id: TermId,
    /// Courses to allocate, each in its own transaction
    #[validate(length(min = 1))]
    pub course_ids: Vec<CourseId>,
    /// Fixed per-section quota applied to every course
    #[validate(range(min = 1))]
    pub quota_per_section: Option<i32>,
    /// Status to stamp on new registrations (default: active)
    pub status: Option<RegistrationStatus>,
    /// Note to stamp on new registrations
    pub note: Option<String>,
}

/// Request body for allocating every course offered in a term.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AllocateTermDto {
    /// Fixed per-section quota applied to every course
    #[validate(range(min = 1))]
    pub quota_per_section: Option<i32>,
    /// Status to stamp on new registrations (default: active)
    pub status: Option<RegistrationStatus>,
    /// Note to stamp on new registrations
    pub note: Option<String>,
}

/// Request body for forcing a single student into a section.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForceAllocateDto {
    /// Student to enroll
    pub student_id: StudentId,
    /// Target section code (resolved within the term)
    #[validate(length(min = 1, max = 64))]
    pub section_code: String,
    /// Term the section runs in
    pub term_id: TermId,
    /// Status to stamp on the registration (default: active)
    pub status: Option<RegistrationStatus>,
    /// Note to stamp on the registration
    pub note: Option<String>,
}

/// Students placed into one section by an allocation run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionAllocation {
    /// Section that received students
    pub section_id: SectionId,
    /// Number of registrations inserted
    pub allocated: i64,
    /// Students placed, in allocation order
    pub student_ids: Vec<StudentId>,
}

/// Candidates dropped before placement, by reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SkippedCounts {
    /// Dropped by the prerequisite pipeline
    pub not_eligible: i64,
    /// Dropped because the course would push them over the term maximum
    pub over_max_credits: i64,
}

/// Outcome of allocating one course in a term.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationReport {
    /// Course that was allocated
    pub course_id: CourseId,
    /// Term the allocation ran in
    pub term_id: TermId,
    /// Sum of remaining seats across the course's sections at the start
    pub total_capacity: i64,
    /// Fixed per-section quota, when one was requested
    pub requested_per_section: Option<i32>,
    /// Total registrations inserted
    pub allocated_total: i64,
    /// Per-section breakdown, in section-id order
    pub allocated: Vec<SectionAllocation>,
    /// Candidates dropped before placement
    pub skipped: SkippedCounts,
}

/// A course that failed inside a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseAllocationError {
    /// Course whose allocation failed
    pub course_id: CourseId,
    /// Machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Structured error payload, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Outcome of a multi-course batch run. Each course commits or rolls
/// back independently; failures are collected, never fatal to siblings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchAllocationReport {
    /// Term the batch ran in
    pub term_id: TermId,
    /// Term minimum credit load used for prioritization
    pub min_credits: i32,
    /// Term maximum credit load used for filtering
    pub max_credits: i32,
    /// Fixed per-section quota, when one was requested
    pub requested_per_section: Option<i32>,
    /// Courses allocated successfully
    pub processed: i64,
    /// Courses that failed
    pub failed: i64,
    /// Per-course reports, in processing order
    pub results: Vec<AllocationReport>,
    /// Per-course failures, in processing order
    pub errors: Vec<CourseAllocationError>,
}

/// Outcome of a forced single allocation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForcedAllocation {
    /// The registration that was inserted
    pub registration: Registration,
    /// Course the section offers
    pub course_id: CourseId,
    /// Term the section runs in
    pub term_id: TermId,
    /// Student's committed credits before this registration
    pub credits_before: i32,
    /// Student's committed credits after this registration
    pub credits_after: i32,
    /// Term maximum the new load was checked against
    pub max_credits: i32,
}
