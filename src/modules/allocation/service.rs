use std::collections::HashSet;

use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;

use registra_core::AppError;
use registra_models::ids::{CourseId, SectionId, StudentId, TermId};
use registra_models::{
    AllocateCourseDto, AllocateManyDto, AllocateTermDto, AllocationOptions, AllocationReport,
    BatchAllocationReport, CourseAllocationError, ForceAllocateDto, ForcedAllocation, Registration,
    SectionAllocation, SkippedCounts,
};

use crate::modules::allocation::eligibility;
use crate::modules::terms::ledger::{self, CreditLedger};
use crate::modules::terms::model::CreditPolicy;
use crate::modules::terms::service::TermPolicyService;

struct SectionSeats {
    id: SectionId,
    remaining: i64,
}

pub struct AllocationService;

impl AllocationService {
    fn options_from(
        quota_per_section: Option<i32>,
        status: Option<registra_models::RegistrationStatus>,
        note: Option<String>,
    ) -> AllocationOptions {
        let defaults = AllocationOptions::default();
        AllocationOptions {
            quota_per_section,
            status: status.unwrap_or(defaults.status),
            note: note.unwrap_or(defaults.note),
        }
    }

    /// Allocate one course in a term.
    #[instrument(skip(db))]
    pub async fn allocate_course_in_term(
        db: &PgPool,
        dto: AllocateCourseDto,
    ) -> Result<AllocationReport, AppError> {
        let policy = TermPolicyService::resolve_policy(db, dto.term_id).await?;
        let mut ledger = CreditLedger::load(db, dto.term_id).await?;
        let opts = Self::options_from(dto.quota_per_section, dto.status, dto.note);

        Self::allocate_course(db, dto.term_id, dto.course_id, &opts, &policy, &mut ledger).await
    }

    /// Allocate one course inside its own transaction, consulting and
    /// updating the shared credit ledger.
    ///
    /// The transaction commits only after every section insert and
    /// occupancy update succeeds; any error rolls the whole course back
    /// and leaves the ledger untouched.
    async fn allocate_course(
        db: &PgPool,
        term_id: TermId,
        course_id: CourseId,
        opts: &AllocationOptions,
        policy: &CreditPolicy,
        ledger: &mut CreditLedger,
    ) -> Result<AllocationReport, AppError> {
        let mut tx = db.begin().await?;

        let course_credits = sqlx::query_scalar::<_, i32>(
            "SELECT credits FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::not_found(
                "COURSE_NOT_FOUND",
                anyhow::anyhow!("Course {course_id} not found"),
            )
        })?;

        // Lock the course's sections for the whole run so concurrent
        // allocations and forced enrollments serialize on them.
        let section_rows = sqlx::query_as::<_, (SectionId, i32, i32)>(
            r#"SELECT id, capacity, occupied
               FROM sections
               WHERE course_id = $1 AND term_id = $2
               ORDER BY id ASC
               FOR UPDATE"#,
        )
        .bind(course_id)
        .bind(term_id)
        .fetch_all(&mut *tx)
        .await?;

        if section_rows.is_empty() {
            return Err(AppError::not_found(
                "NO_SECTION_FOR_COURSE_IN_TERM",
                anyhow::anyhow!("Course {course_id} has no sections in term {term_id}"),
            ));
        }

        let sections: Vec<SectionSeats> = section_rows
            .into_iter()
            .map(|(id, capacity, occupied)| SectionSeats {
                id,
                remaining: i64::from(capacity - occupied).max(0),
            })
            .collect();
        let total_capacity: i64 = sections.iter().map(|s| s.remaining).sum();

        if let Some(quota) = opts.quota_per_section {
            let not_enough: Vec<_> = sections
                .iter()
                .filter(|s| s.remaining < i64::from(quota))
                .map(|s| json!({ "section_id": s.id, "remaining": s.remaining }))
                .collect();

            if !not_enough.is_empty() {
                return Err(AppError::conflict(
                    "QUOTA_EXCEEDS_SECTION_CAPACITY",
                    anyhow::anyhow!(
                        "Requested {quota} students per section but {} section(s) have fewer free seats",
                        not_enough.len()
                    ),
                )
                .with_details(json!({
                    "requested_per_section": quota,
                    "not_enough_sections": not_enough,
                })));
            }
        }

        // Active students not yet registered for this course in this
        // term, in ascending id order. A withdrawn registration does
        // not block re-allocation.
        let candidates = sqlx::query_scalar::<_, StudentId>(
            r#"SELECT st.id
               FROM students st
               WHERE st.is_active
                 AND NOT EXISTS (
                     SELECT 1
                     FROM registrations r
                     JOIN sections s ON s.id = r.section_id
                     WHERE r.student_id = st.id
                       AND s.course_id = $1
                       AND s.term_id = $2
                       AND r.status <> 'withdrawn'
                 )
               ORDER BY st.id ASC"#,
        )
        .bind(course_id)
        .bind(term_id)
        .fetch_all(&mut *tx)
        .await?;

        let candidate_count = candidates.len();
        let within_max: Vec<StudentId> = candidates
            .into_iter()
            .filter(|id| ledger.committed(*id) + course_credits <= policy.max_credits)
            .collect();
        let over_max_credits = (candidate_count - within_max.len()) as i64;

        // Students below the term minimum load go first.
        let (under_min, at_or_above): (Vec<StudentId>, Vec<StudentId>) = within_max
            .into_iter()
            .partition(|id| ledger.committed(*id) < policy.min_credits);
        let mut ordered = under_min;
        ordered.extend(at_or_above);
        let ordered_count = ordered.len();

        let eligible =
            eligibility::filter_eligible(&mut *tx, course_id, term_id, ordered).await?;
        let not_eligible = (ordered_count - eligible.len()) as i64;

        let mut will_allocate = total_capacity.min(eligible.len() as i64);

        if let Some(quota) = opts.quota_per_section {
            will_allocate = i64::from(quota) * sections.len() as i64;

            if (eligible.len() as i64) < will_allocate {
                return Err(AppError::conflict(
                    "INSUFFICIENT_ELIGIBLE_CANDIDATES",
                    anyhow::anyhow!(
                        "Quota needs {will_allocate} eligible students but only {} qualify",
                        eligible.len()
                    ),
                )
                .with_details(json!({
                    "requested_per_section": quota,
                    "required_total": will_allocate,
                    "eligible_total": eligible.len(),
                })));
            }
        }

        let skipped = SkippedCounts {
            not_eligible,
            over_max_credits,
        };

        if will_allocate <= 0 {
            tx.commit().await?;
            return Ok(AllocationReport {
                course_id,
                term_id,
                total_capacity,
                requested_per_section: opts.quota_per_section,
                allocated_total: 0,
                allocated: Vec::new(),
                skipped,
            });
        }

        let pool: Vec<StudentId> = eligible
            .into_iter()
            .take(will_allocate as usize)
            .collect();

        let mut ptr = 0usize;
        let mut allocated_total = 0i64;
        let mut allocated = Vec::new();

        for sec in &sections {
            let take_count = opts
                .quota_per_section
                .map_or(sec.remaining, i64::from);
            if take_count <= 0 {
                continue;
            }
            if ptr >= pool.len() {
                break;
            }

            let end = (ptr + take_count as usize).min(pool.len());
            let take = &pool[ptr..end];

            let inserted = sqlx::query(
                r#"INSERT INTO registrations (student_id, section_id, status, note)
                   SELECT t.student_id, $2, $3, $4
                   FROM UNNEST($1::uuid[]) AS t(student_id)"#,
            )
            .bind(take)
            .bind(sec.id)
            .bind(opts.status)
            .bind(&opts.note)
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64;

            if inserted > 0 {
                sqlx::query(
                    "UPDATE sections SET occupied = occupied + $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(inserted as i32)
                .bind(sec.id)
                .execute(&mut *tx)
                .await?;
            }

            allocated_total += inserted;
            allocated.push(SectionAllocation {
                section_id: sec.id,
                allocated: inserted,
                student_ids: take[..inserted as usize].to_vec(),
            });
            ptr += take.len();
        }

        tx.commit().await?;

        // Only committed work feeds the ledger.
        for detail in &allocated {
            for student_id in &detail.student_ids {
                ledger.record(*student_id, course_credits);
            }
        }

        Ok(AllocationReport {
            course_id,
            term_id,
            total_capacity,
            requested_per_section: opts.quota_per_section,
            allocated_total,
            allocated,
            skipped,
        })
    }

    /// Allocate several courses in a term. Each course runs in its own
    /// transaction; a failed course is recorded and never aborts its
    /// siblings. The credit ledger carries committed allocations from
    /// course to course.
    #[instrument(skip(db))]
    pub async fn allocate_many_courses(
        db: &PgPool,
        dto: AllocateManyDto,
    ) -> Result<BatchAllocationReport, AppError> {
        let policy = TermPolicyService::resolve_policy(db, dto.term_id).await?;
        let mut ledger = CreditLedger::load(db, dto.term_id).await?;
        let opts = Self::options_from(dto.quota_per_section, dto.status, dto.note);

        let mut seen = HashSet::new();
        let course_ids: Vec<CourseId> = dto
            .course_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for course_id in course_ids {
            match Self::allocate_course(db, dto.term_id, course_id, &opts, &policy, &mut ledger)
                .await
            {
                Ok(report) => results.push(report),
                Err(err) => errors.push(CourseAllocationError {
                    course_id,
                    code: err.code.to_string(),
                    message: err.error.to_string(),
                    details: err.details,
                }),
            }
        }

        Ok(BatchAllocationReport {
            term_id: dto.term_id,
            min_credits: policy.min_credits,
            max_credits: policy.max_credits,
            requested_per_section: opts.quota_per_section,
            processed: results.len() as i64,
            failed: errors.len() as i64,
            results,
            errors,
        })
    }

    /// Allocate every course that offers a section in the term.
    #[instrument(skip(db))]
    pub async fn allocate_all_courses(
        db: &PgPool,
        term_id: TermId,
        dto: AllocateTermDto,
    ) -> Result<BatchAllocationReport, AppError> {
        let course_ids = sqlx::query_scalar::<_, CourseId>(
            "SELECT DISTINCT course_id FROM sections WHERE term_id = $1 ORDER BY course_id ASC",
        )
        .bind(term_id)
        .fetch_all(db)
        .await?;

        Self::allocate_many_courses(
            db,
            AllocateManyDto {
                term_id,
                course_ids,
                quota_per_section: dto.quota_per_section,
                status: dto.status,
                note: dto.note,
            },
        )
        .await
    }

    /// Force a single student into a section, bypassing the batch
    /// planner but not the guard checks.
    #[instrument(skip(db))]
    pub async fn force_allocate(
        db: &PgPool,
        dto: ForceAllocateDto,
    ) -> Result<ForcedAllocation, AppError> {
        let mut tx = db.begin().await?;

        let is_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM students WHERE id = $1",
        )
        .bind(dto.student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::not_found(
                "STUDENT_NOT_FOUND",
                anyhow::anyhow!("Student {} not found", dto.student_id),
            )
        })?;
        if !is_active {
            return Err(AppError::conflict(
                "STUDENT_NOT_ACTIVE",
                anyhow::anyhow!("Student {} is not active", dto.student_id),
            ));
        }

        let (section_id, course_id, capacity, occupied) =
            sqlx::query_as::<_, (SectionId, CourseId, i32, i32)>(
                r#"SELECT id, course_id, capacity, occupied
                   FROM sections
                   WHERE code = $1 AND term_id = $2
                   FOR UPDATE"#,
            )
            .bind(&dto.section_code)
            .bind(dto.term_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "SECTION_NOT_FOUND",
                    anyhow::anyhow!(
                        "Section {} not found in term {}",
                        dto.section_code,
                        dto.term_id
                    ),
                )
            })?;

        if occupied >= capacity {
            return Err(AppError::conflict(
                "SECTION_FULL",
                anyhow::anyhow!("Section {} has no free seats", dto.section_code),
            )
            .with_details(json!({ "capacity": capacity, "occupied": occupied })));
        }

        let in_section = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                   SELECT 1 FROM registrations
                   WHERE student_id = $1 AND section_id = $2 AND status <> 'withdrawn'
               )"#,
        )
        .bind(dto.student_id)
        .bind(section_id)
        .fetch_one(&mut *tx)
        .await?;
        if in_section {
            return Err(AppError::conflict(
                "ALREADY_REGISTERED_SECTION",
                anyhow::anyhow!(
                    "Student {} is already registered in section {}",
                    dto.student_id,
                    dto.section_code
                ),
            ));
        }

        let in_course = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                   SELECT 1
                   FROM registrations r
                   JOIN sections s ON s.id = r.section_id
                   WHERE r.student_id = $1
                     AND s.course_id = $2
                     AND s.term_id = $3
                     AND r.status <> 'withdrawn'
               )"#,
        )
        .bind(dto.student_id)
        .bind(course_id)
        .bind(dto.term_id)
        .fetch_one(&mut *tx)
        .await?;
        if in_course {
            return Err(AppError::conflict(
                "ALREADY_REGISTERED_COURSE_IN_TERM",
                anyhow::anyhow!(
                    "Student {} already holds a section of this course in term {}",
                    dto.student_id,
                    dto.term_id
                ),
            ));
        }

        let policy = TermPolicyService::resolve_policy(&mut *tx, dto.term_id).await?;

        let course_credits =
            sqlx::query_scalar::<_, i32>("SELECT credits FROM courses WHERE id = $1")
                .bind(course_id)
                .fetch_one(&mut *tx)
                .await?;

        let credits_before =
            ledger::committed_credits(&mut *tx, dto.term_id, dto.student_id).await?;
        if credits_before + course_credits > policy.max_credits {
            return Err(AppError::conflict(
                "EXCEEDS_MAX_CREDITS",
                anyhow::anyhow!(
                    "Registration would put student {} at {} credits, above the term maximum {}",
                    dto.student_id,
                    credits_before + course_credits,
                    policy.max_credits
                ),
            )
            .with_details(json!({
                "committed": credits_before,
                "course_credits": course_credits,
                "max_credits": policy.max_credits,
            })));
        }

        if !eligibility::check_student(&mut *tx, course_id, dto.term_id, dto.student_id).await? {
            return Err(AppError::conflict(
                "PREREQUISITE_NOT_SATISFIED",
                anyhow::anyhow!(
                    "Student {} does not satisfy the prerequisites of this course",
                    dto.student_id
                ),
            ));
        }

        let defaults = AllocationOptions::default();
        let registration = sqlx::query_as::<_, Registration>(
            r#"INSERT INTO registrations (student_id, section_id, status, note)
               VALUES ($1, $2, $3, $4)
               RETURNING id, student_id, section_id, status, note, registered_at"#,
        )
        .bind(dto.student_id)
        .bind(section_id)
        .bind(dto.status.unwrap_or(defaults.status))
        .bind(dto.note.as_deref().unwrap_or("forced-allocation"))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE sections SET occupied = occupied + 1, updated_at = NOW() WHERE id = $1")
            .bind(section_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ForcedAllocation {
            registration,
            course_id,
            term_id: dto.term_id,
            credits_before,
            credits_after: credits_before + course_credits,
            max_credits: policy.max_credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use registra_models::PrerequisiteKind;

    use crate::modules::testing::{
        seed_course, seed_policy, seed_prerequisite, seed_registration, seed_result, seed_section,
        seed_student, seed_students, seed_term, seed_withdrawn_registration,
    };

    fn dto(term_id: TermId, course_id: CourseId) -> AllocateCourseDto {
        AllocateCourseDto {
            term_id,
            course_id,
            quota_per_section: None,
            status: None,
            note: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_fills_sections_in_id_order(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        let sec_a = seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 2).await;
        let sec_b = seed_section(&pool, SectionId::from_u128(2), "CS101-02", course_id, term_id, 3).await;
        let students = seed_students(&pool, 7).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.total_capacity, 5);
        assert_eq!(report.allocated_total, 5);
        assert_eq!(report.allocated.len(), 2);
        assert_eq!(report.allocated[0].section_id, sec_a);
        assert_eq!(report.allocated[0].student_ids, &students[0..2]);
        assert_eq!(report.allocated[1].section_id, sec_b);
        assert_eq!(report.allocated[1].student_ids, &students[2..5]);
        assert_eq!(report.skipped.not_eligible, 0);
        assert_eq!(report.skipped.over_max_credits, 0);

        let occupied = sqlx::query_scalar::<_, i32>("SELECT occupied FROM sections WHERE id = $1")
            .bind(sec_a)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(occupied, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_skips_already_registered_and_inactive(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        let section = seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;
        let students = seed_students(&pool, 3).await;
        seed_student(&pool, StudentId::from_u128(99), "ST099", false).await;
        seed_registration(&pool, students[0], section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        // only the two active, unregistered students are placed
        assert_eq!(report.allocated_total, 2);
        assert_eq!(report.allocated[0].student_ids, &students[1..3]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_pass_prerequisite_filters_failures(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        let prior_term = seed_term(&pool, "2024-2").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let prereq = seed_course(&pool, "CS100", 3).await;
        let course_id = seed_course(&pool, "CS200", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Pass, None, None).await;
        let prereq_section =
            seed_section(&pool, SectionId::from_u128(10), "CS100-01", prereq, prior_term, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "CS200-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 3).await;
        // students[0] passed, students[1] failed, students[2] never took it
        seed_result(&pool, students[0], prereq_section, Some(3), Some(7.5)).await;
        seed_result(&pool, students[1], prereq_section, Some(5), Some(2.0)).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.skipped.not_eligible, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_concurrent_prerequisite_accepts_registration(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let prereq = seed_course(&pool, "MA101", 3).await;
        let course_id = seed_course(&pool, "PH101", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Concurrent, None, None).await;
        let prereq_section =
            seed_section(&pool, SectionId::from_u128(10), "MA101-01", prereq, term_id, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "PH101-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 2).await;
        // students[0] is taking the prerequisite this term; students[1] is not
        seed_registration(&pool, students[0], prereq_section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.skipped.not_eligible, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_pass_prerequisite_enforces_min_score(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        let prior_term = seed_term(&pool, "2024-2").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let prereq = seed_course(&pool, "CS100", 3).await;
        let course_id = seed_course(&pool, "CS200", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Pass, Some(7.0), None).await;
        let prereq_section =
            seed_section(&pool, SectionId::from_u128(10), "CS100-01", prereq, prior_term, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "CS200-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 2).await;
        // both passed; only students[0] scored at or above 7.0
        seed_result(&pool, students[0], prereq_section, Some(2), Some(8.0)).await;
        seed_result(&pool, students[1], prereq_section, Some(4), Some(6.0)).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.skipped.not_eligible, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_prerequisite_enforces_min_credits(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        let prior_term = seed_term(&pool, "2024-2").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let prereq = seed_course(&pool, "CS100", 3).await;
        let extra = seed_course(&pool, "MA100", 4).await;
        let course_id = seed_course(&pool, "CS200", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Pass, None, Some(6)).await;
        let prereq_section =
            seed_section(&pool, SectionId::from_u128(10), "CS100-01", prereq, prior_term, 50).await;
        let extra_section =
            seed_section(&pool, SectionId::from_u128(11), "MA100-01", extra, prior_term, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "CS200-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 2).await;
        // both passed the prerequisite, but only students[0] holds
        // 3 + 4 = 7 passed credits against the rule's minimum of 6
        seed_result(&pool, students[0], prereq_section, Some(3), Some(7.0)).await;
        seed_result(&pool, students[0], extra_section, Some(3), Some(7.0)).await;
        seed_result(&pool, students[1], prereq_section, Some(3), Some(7.0)).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.skipped.not_eligible, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_withdrawn_registration_does_not_satisfy_concurrent_prerequisite(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let prereq = seed_course(&pool, "MA101", 3).await;
        let course_id = seed_course(&pool, "PH101", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Concurrent, None, None).await;
        let prereq_section =
            seed_section(&pool, SectionId::from_u128(10), "MA101-01", prereq, term_id, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "PH101-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 1).await;
        seed_withdrawn_registration(&pool, students[0], prereq_section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 0);
        assert_eq!(report.skipped.not_eligible, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_withdrawn_registration_frees_credits_and_seat(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 20).await;
        let heavy = seed_course(&pool, "HEAVY", 18).await;
        let course_id = seed_course(&pool, "CS101", 4).await;
        let heavy_section =
            seed_section(&pool, SectionId::from_u128(10), "HEAVY-01", heavy, term_id, 50).await;
        let section =
            seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 1).await;
        // both enrollments were abandoned; neither holds credits nor
        // blocks taking the course again
        seed_withdrawn_registration(&pool, students[0], heavy_section).await;
        seed_withdrawn_registration(&pool, students[0], section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.skipped.over_max_credits, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_excludes_students_over_max_credits(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 20).await;
        let heavy = seed_course(&pool, "HEAVY", 18).await;
        let medium = seed_course(&pool, "MEDIUM", 16).await;
        let course_id = seed_course(&pool, "CS101", 4).await;
        let heavy_section =
            seed_section(&pool, SectionId::from_u128(10), "HEAVY-01", heavy, term_id, 50).await;
        let medium_section =
            seed_section(&pool, SectionId::from_u128(11), "MEDIUM-01", medium, term_id, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;

        let students = seed_students(&pool, 3).await;
        // students[0] would land at 22 of 20 credits; students[1] lands
        // exactly on the maximum and stays in
        seed_registration(&pool, students[0], heavy_section).await;
        seed_registration(&pool, students[1], medium_section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 2);
        assert_eq!(
            report.allocated[0].student_ids,
            vec![students[1], students[2]]
        );
        assert_eq!(report.skipped.over_max_credits, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_prioritizes_students_under_minimum_load(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 10, 30).await;
        let filler = seed_course(&pool, "FILL", 12).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        let filler_section =
            seed_section(&pool, SectionId::from_u128(10), "FILL-01", filler, term_id, 50).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 1).await;

        let students = seed_students(&pool, 2).await;
        // students[0] (lower id) already meets the minimum; students[1] does not
        seed_registration(&pool, students[0], filler_section).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 1);
        assert_eq!(report.allocated[0].student_ids, vec![students[1]]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_quota_rejects_short_sections(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;
        let small = seed_section(&pool, SectionId::from_u128(2), "CS101-02", course_id, term_id, 2).await;
        seed_students(&pool, 20).await;

        let mut request = dto(term_id, course_id);
        request.quota_per_section = Some(5);
        let err = AllocationService::allocate_course_in_term(&pool, request)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "QUOTA_EXCEEDS_SECTION_CAPACITY");
        let details = err.details.unwrap();
        assert_eq!(details["requested_per_section"], 5);
        assert_eq!(
            details["not_enough_sections"][0]["section_id"],
            small.to_string()
        );

        // nothing committed
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_quota_requires_enough_eligible(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;
        seed_section(&pool, SectionId::from_u128(2), "CS101-02", course_id, term_id, 10).await;
        seed_students(&pool, 7).await;

        let mut request = dto(term_id, course_id);
        request.quota_per_section = Some(4);
        let err = AllocationService::allocate_course_in_term(&pool, request)
            .await
            .unwrap_err();

        assert_eq!(err.code, "INSUFFICIENT_ELIGIBLE_CANDIDATES");
        let details = err.details.unwrap();
        assert_eq!(details["required_total"], 8);
        assert_eq!(details["eligible_total"], 7);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_quota_places_exactly_quota_per_section(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;
        seed_section(&pool, SectionId::from_u128(2), "CS101-02", course_id, term_id, 10).await;
        let students = seed_students(&pool, 9).await;

        let mut request = dto(term_id, course_id);
        request.quota_per_section = Some(3);
        let report = AllocationService::allocate_course_in_term(&pool, request)
            .await
            .unwrap();

        assert_eq!(report.allocated_total, 6);
        assert_eq!(report.allocated[0].student_ids, &students[0..3]);
        assert_eq!(report.allocated[1].student_ids, &students[3..6]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_without_sections_fails(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;

        let err = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NO_SECTION_FOR_COURSE_IN_TERM");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_without_policy_fails(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 10).await;

        let err = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap_err();

        assert_eq!(err.code, "POLICY_NOT_FOUND");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_full_sections_commit_empty_report(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let course_id = seed_course(&pool, "CS101", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 0).await;
        seed_students(&pool, 3).await;

        let report = AllocationService::allocate_course_in_term(&pool, dto(term_id, course_id))
            .await
            .unwrap();

        assert_eq!(report.total_capacity, 0);
        assert_eq!(report.allocated_total, 0);
        assert!(report.allocated.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_batch_ledger_carries_between_courses(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 6).await;
        let first = seed_course(&pool, "CS101", 4).await;
        let second = seed_course(&pool, "CS102", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", first, term_id, 1).await;
        seed_section(&pool, SectionId::from_u128(2), "CS102-01", second, term_id, 2).await;
        let students = seed_students(&pool, 2).await;

        let report = AllocationService::allocate_many_courses(
            &pool,
            AllocateManyDto {
                term_id,
                course_ids: vec![first, second],
                quota_per_section: None,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 0);
        // first course seats students[0]; its 4 credits push them past
        // the 6-credit maximum, so the second course only takes students[1]
        assert_eq!(report.results[0].allocated[0].student_ids, vec![students[0]]);
        assert_eq!(report.results[1].allocated[0].student_ids, vec![students[1]]);
        assert_eq!(report.results[1].skipped.over_max_credits, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_batch_failures_do_not_abort_siblings(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let good = seed_course(&pool, "CS101", 3).await;
        let orphan = seed_course(&pool, "CS999", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", good, term_id, 5).await;
        seed_students(&pool, 3).await;

        let report = AllocationService::allocate_many_courses(
            &pool,
            AllocateManyDto {
                term_id,
                course_ids: vec![orphan, good, good],
                quota_per_section: None,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap();

        // duplicate course id is collapsed, the orphan fails on its own
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].course_id, orphan);
        assert_eq!(report.errors[0].code, "NO_SECTION_FOR_COURSE_IN_TERM");
        assert_eq!(report.results[0].allocated_total, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocate_all_courses_in_term(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 30).await;
        let first = seed_course(&pool, "CS101", 3).await;
        let second = seed_course(&pool, "CS102", 3).await;
        seed_section(&pool, SectionId::from_u128(1), "CS101-01", first, term_id, 5).await;
        seed_section(&pool, SectionId::from_u128(2), "CS102-01", second, term_id, 5).await;
        seed_students(&pool, 4).await;

        let report = AllocationService::allocate_all_courses(
            &pool,
            term_id,
            AllocateTermDto::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 2);
        let total: i64 = report.results.iter().map(|r| r.allocated_total).sum();
        assert_eq!(total, 8);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_force_allocate_succeeds_and_reports_credits(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 20).await;
        let course_id = seed_course(&pool, "CS101", 4).await;
        let section =
            seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 5).await;
        let students = seed_students(&pool, 1).await;

        let outcome = AllocationService::force_allocate(
            &pool,
            ForceAllocateDto {
                student_id: students[0],
                section_code: "CS101-01".to_string(),
                term_id,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.registration.student_id, students[0]);
        assert_eq!(outcome.registration.section_id, section);
        assert_eq!(outcome.credits_before, 0);
        assert_eq!(outcome.credits_after, 4);

        let occupied = sqlx::query_scalar::<_, i32>("SELECT occupied FROM sections WHERE id = $1")
            .bind(section)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(occupied, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_force_allocate_guards(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 5).await;
        let course_id = seed_course(&pool, "CS101", 4).await;
        let full = seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 1).await;
        seed_section(&pool, SectionId::from_u128(2), "CS101-02", course_id, term_id, 5).await;
        let students = seed_students(&pool, 2).await;
        seed_student(&pool, StudentId::from_u128(99), "ST099", false).await;
        seed_registration(&pool, students[0], full).await;

        let force = |student_id, section_code: &str| ForceAllocateDto {
            student_id,
            section_code: section_code.to_string(),
            term_id,
            status: None,
            note: None,
        };

        let err = AllocationService::force_allocate(&pool, force(StudentId::from_u128(99), "CS101-02"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "STUDENT_NOT_ACTIVE");

        let err = AllocationService::force_allocate(&pool, force(StudentId::from_u128(7), "CS101-02"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "STUDENT_NOT_FOUND");

        let err = AllocationService::force_allocate(&pool, force(students[1], "CS101-01"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "SECTION_FULL");

        let err = AllocationService::force_allocate(&pool, force(students[0], "CS101-02"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "ALREADY_REGISTERED_COURSE_IN_TERM");

        let err = AllocationService::force_allocate(&pool, force(students[1], "CS101-03"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "SECTION_NOT_FOUND");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_force_allocate_after_withdrawal(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 20).await;
        let course_id = seed_course(&pool, "CS101", 4).await;
        let section =
            seed_section(&pool, SectionId::from_u128(1), "CS101-01", course_id, term_id, 5).await;
        let students = seed_students(&pool, 1).await;
        seed_withdrawn_registration(&pool, students[0], section).await;

        let outcome = AllocationService::force_allocate(
            &pool,
            ForceAllocateDto {
                student_id: students[0],
                section_code: "CS101-01".to_string(),
                term_id,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap();

        // the withdrawn row neither blocks the seat nor holds credits
        assert_eq!(outcome.credits_before, 0);
        assert_eq!(outcome.credits_after, 4);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_force_allocate_enforces_credits_and_prerequisites(pool: PgPool) {
        let term_id = seed_term(&pool, "2025-1").await;
        seed_policy(&pool, term_id, 0, 6).await;
        let filler = seed_course(&pool, "FILL", 4).await;
        let prereq = seed_course(&pool, "CS100", 3).await;
        let course_id = seed_course(&pool, "CS200", 3).await;
        seed_prerequisite(&pool, course_id, prereq, PrerequisiteKind::Pass, None, None).await;
        let filler_section =
            seed_section(&pool, SectionId::from_u128(10), "FILL-01", filler, term_id, 5).await;
        seed_section(&pool, SectionId::from_u128(1), "CS200-01", course_id, term_id, 5).await;
        let students = seed_students(&pool, 2).await;
        seed_registration(&pool, students[0], filler_section).await;

        // 4 committed + 3 requested > 6 maximum
        let err = AllocationService::force_allocate(
            &pool,
            ForceAllocateDto {
                student_id: students[0],
                section_code: "CS200-01".to_string(),
                term_id,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "EXCEEDS_MAX_CREDITS");
        assert_eq!(err.details.unwrap()["committed"], 4);

        // students[1] never passed the prerequisite
        let err = AllocationService::force_allocate(
            &pool,
            ForceAllocateDto {
                student_id: students[1],
                section_code: "CS200-01".to_string(),
                term_id,
                status: None,
                note: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "PREREQUISITE_NOT_SATISFIED");
    }
}
