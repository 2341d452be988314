pub use registra_models::exams::{
    CreateExamSessionDto, ExamSession, ExamSessionDetail, PaginatedExamSessionsResponse,
    RosterReport, TimeSlot, UpdateExamSessionDto,
};
