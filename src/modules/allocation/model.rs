pub use registra_models::allocation::{
    AllocateCourseDto, AllocateManyDto, AllocateTermDto, AllocationOptions, AllocationReport,
    BatchAllocationReport, CourseAllocationError, ForceAllocateDto, ForcedAllocation,
    SectionAllocation, SkippedCounts,
};
