use utoipa::OpenApi;

use registra_core::{PaginationMeta, PaginationParams};
use registra_models::{
    AllocateCourseDto, AllocateManyDto, AllocateTermDto, AllocationReport, BatchAllocationReport,
    CourseAllocationError, CreateExamSessionDto, CreditPolicy, ExamSessionDetail,
    ForceAllocateDto, ForcedAllocation, PaginatedExamSessionsResponse, ProcessScoreItem,
    ProcessScoreReport, Registration, RegistrationStatus, RosterReport, SectionAllocation,
    SkippedCounts, TimeSlot, UpdateExamSessionDto, UpsertCreditPolicyDto, UpsertProcessScoresDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::terms::controller::get_credit_policy,
        crate::modules::terms::controller::upsert_credit_policy,
        crate::modules::allocation::controller::allocate_course,
        crate::modules::allocation::controller::allocate_batch,
        crate::modules::allocation::controller::allocate_term,
        crate::modules::allocation::controller::force_allocate,
        crate::modules::exams::controller::create_exam_session,
        crate::modules::exams::controller::list_exam_sessions,
        crate::modules::exams::controller::get_exam_session,
        crate::modules::exams::controller::update_exam_session,
        crate::modules::exams::controller::allocate_exam_roster,
        crate::modules::grades::controller::upsert_process_scores,
    ),
    components(
        schemas(
            CreditPolicy,
            UpsertCreditPolicyDto,
            AllocateCourseDto,
            AllocateManyDto,
            AllocateTermDto,
            ForceAllocateDto,
            AllocationReport,
            BatchAllocationReport,
            CourseAllocationError,
            SectionAllocation,
            SkippedCounts,
            ForcedAllocation,
            Registration,
            RegistrationStatus,
            TimeSlot,
            CreateExamSessionDto,
            UpdateExamSessionDto,
            ExamSessionDetail,
            PaginatedExamSessionsResponse,
            RosterReport,
            ProcessScoreItem,
            UpsertProcessScoresDto,
            ProcessScoreReport,
            PaginationMeta,
            PaginationParams,
        )
    ),
    tags(
        (name = "Terms", description = "Per-term credit policies"),
        (name = "Allocation", description = "Enrollment allocation engine"),
        (name = "Exam Sessions", description = "Exam scheduling and seat rosters"),
        (name = "Grades", description = "Bulk process-score entry")
    ),
    info(
        title = "Registra API",
        description = "Enrollment allocation and exam scheduling for academic terms",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
