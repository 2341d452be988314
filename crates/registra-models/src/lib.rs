//! # Registra Models
//!
//! Domain models and DTOs for the Registra API.
//!
//! # Modules
//!
//! - [`ids`]: strongly-typed UUID id newtypes
//! - [`students`]: student directory records
//! - [`terms`]: terms and per-term credit policies
//! - [`courses`]: courses, sections, prerequisite rules
//! - [`registrations`]: enrollment records
//! - [`results`]: academic results and passing thresholds
//! - [`allocation`]: allocation engine DTOs and reports
//! - [`exams`]: exam sessions, time slots, roster reports
//! - [`grades`]: bulk process-score DTOs

pub mod allocation;
pub mod courses;
pub mod exams;
pub mod grades;
pub mod ids;
pub mod registrations;
pub mod results;
pub mod students;
pub mod terms;

// Re-export commonly used types at crate root for convenience
pub use allocation::{
    AllocateCourseDto, AllocateManyDto, AllocateTermDto, AllocationOptions, AllocationReport,
    BatchAllocationReport, CourseAllocationError, ForceAllocateDto, ForcedAllocation,
    SectionAllocation, SkippedCounts,
};
pub use courses::{Course, PrerequisiteKind, PrerequisiteRule, Section};
pub use exams::{
    CreateExamSessionDto, ExamSession, ExamSessionDetail, PaginatedExamSessionsResponse,
    RosterReport, TimeSlot, UpdateExamSessionDto,
};
pub use grades::{ProcessScoreItem, ProcessScoreReport, UpsertProcessScoresDto};
pub use registrations::{Registration, RegistrationStatus};
pub use results::{AcademicResult, EXAM_PROCESS_SCORE_MIN, PASSING_RANK_MAX};
pub use students::Student;
pub use terms::{CreditPolicy, Term, UpsertCreditPolicyDto};
