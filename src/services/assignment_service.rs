use crate::entities::{
    UNKNOWN_LABEL, assignment_def_entity as assignment_defs,
    assignment_def_template_entity as templates, assignment_entity as assignments,
    profile_entity as profiles, submission_entity as submissions,
    submission_file_entity as submission_files,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::services::context::{load_apollonyars, load_profile_context, load_profile_contexts, single};
use crate::services::log_service::{actions, write_log};
use crate::utils::{format_compact_datetime, format_date};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};

/// Submissions keep the order they were given in.
pub async fn submission_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<submissions::Model>,
) -> AppResult<Vec<SubmissionResponse>> {
    let files = submission_files::Entity::find()
        .filter(submission_files::Column::SubmissionId.is_in(rows.iter().map(|s| s.id).collect::<Vec<_>>()))
        .order_by_asc(submission_files::Column::Id)
        .all(db)
        .await?;
    let template_ids: BTreeSet<i32> = files.iter().map(|f| f.template_id).collect();
    let titles: HashMap<i32, String> = templates::Entity::find()
        .filter(templates::Column::Id.is_in(template_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.title))
        .collect();
    let assessors = load_apollonyars(db, rows.iter().filter_map(|s| s.assessor_apollonyar_id)).await?;

    let mut files_by_submission: HashMap<i32, Vec<SubmissionFileResponse>> = HashMap::new();
    for file in files {
        let title = titles.get(&file.template_id).cloned();
        files_by_submission
            .entry(file.submission_id)
            .or_default()
            .push(SubmissionFileResponse::new(file, title));
    }

    Ok(rows
        .into_iter()
        .map(|s| SubmissionResponse {
            assessor: s
                .assessor_apollonyar_id
                .and_then(|id| assessors.get(&id))
                .map(ApollonyarSummary::from),
            files: files_by_submission.remove(&s.id).unwrap_or_default(),
            id: s.id,
            assignment_id: s.assignment_id,
            submitted_at: s.submitted_at,
            grade: s.grade,
            feedback: s.feedback,
            assessed_at: s.assessed_at,
        })
        .collect())
}

pub async fn assignment_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<assignments::Model>,
) -> AppResult<Vec<AssignmentResponse>> {
    let contexts = load_profile_contexts(db, rows.iter().map(|a| a.profile_id)).await?;
    let def_ids: BTreeSet<i32> = rows.iter().map(|a| a.assignment_def_id).collect();
    let defs: HashMap<i32, assignment_defs::Model> = assignment_defs::Entity::find()
        .filter(assignment_defs::Column::Id.is_in(def_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    // newest first, so the head of each list is the latest submission
    let history = submissions::Entity::find()
        .filter(submissions::Column::AssignmentId.is_in(rows.iter().map(|a| a.id).collect::<Vec<_>>()))
        .order_by_desc(submissions::Column::SubmittedAt)
        .order_by_desc(submissions::Column::Id)
        .all(db)
        .await?;
    let mut by_assignment: HashMap<i32, Vec<SubmissionResponse>> = HashMap::new();
    for view in submission_views(db, history).await? {
        by_assignment.entry(view.assignment_id).or_default().push(view);
    }

    Ok(rows
        .into_iter()
        .map(|a| {
            let ctx = contexts.get(&a.profile_id);
            let def = defs.get(&a.assignment_def_id);
            let submissions = by_assignment.remove(&a.id).unwrap_or_default();
            let latest = submissions.first();
            let status = AssignmentStatus::from_latest(latest);
            let unknown = || UNKNOWN_LABEL.to_string();
            AssignmentResponse {
                assignment_title: def.map(|d| d.title.clone()).unwrap_or_else(unknown),
                is_required: def.is_some_and(|d| d.is_required),
                student_name: ctx.map(|c| c.student_name()).unwrap_or_else(unknown),
                phone: ctx.map(|c| c.phone()).unwrap_or_else(unknown),
                course: ctx.map(|c| c.course_name()).unwrap_or_else(unknown),
                term: ctx.map(|c| c.term_name()).unwrap_or_else(unknown),
                apollonyar: ctx.map(|c| c.apollonyar_name()).unwrap_or_else(unknown),
                student_id: a.profile_id,
                submission_date: latest.map(|s| format_compact_datetime(s.submitted_at)),
                review_date: latest
                    .and_then(|s| s.assessed_at)
                    .map(format_compact_datetime),
                grade: latest.and_then(|s| s.grade),
                status_label: status.label().to_string(),
                status,
                submissions,
                id: a.id,
                profile_id: a.profile_id,
                assignment_def_id: a.assignment_def_id,
                deadline: a.deadline,
            }
        })
        .collect())
}

fn parse_due_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::field("due_date", "Expected a date as YYYY-MM-DD"))
}

#[derive(Clone)]
pub struct AssignmentService {
    pool: DatabaseConnection,
}

impl AssignmentService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_assignments(
        &self,
        query: &AssignmentQuery,
    ) -> AppResult<PaginatedResponse<AssignmentResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let status = match query.status.as_deref() {
            Some(raw) => Some(AssignmentStatus::parse(raw).ok_or_else(|| {
                AppError::field("status", "Expected one of: not_submitted, pending_review, reviewed")
            })?),
            None => None,
        };

        let mut select = assignments::Entity::find();
        if let Some(profile_id) = query.profile_id {
            select = select.filter(assignments::Column::ProfileId.eq(profile_id));
        }
        if let Some(def_id) = query.assignment_def_id {
            select = select.filter(assignments::Column::AssignmentDefId.eq(def_id));
        }
        let select = select
            .order_by_asc(assignments::Column::Deadline)
            .order_by_asc(assignments::Column::Id);

        // status comes from the latest submission, so that filter runs on the views
        let Some(status) = status else {
            let total = select.clone().count(&self.pool).await?;
            let rows = select
                .limit(params.get_limit())
                .offset(params.get_offset())
                .all(&self.pool)
                .await?;
            let items = assignment_views(&self.pool, rows).await?;
            return Ok(PaginatedResponse::new(items, &params, total));
        };

        let matching: Vec<AssignmentResponse> = assignment_views(&self.pool, select.all(&self.pool).await?)
            .await?
            .into_iter()
            .filter(|a| a.status == status)
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(params.get_offset() as usize)
            .take(params.get_limit() as usize)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// `student` limits access to assignments of that user's own profiles.
    pub async fn get_assignment(&self, id: i32, student: Option<i32>) -> AppResult<AssignmentResponse> {
        let assignment = self.find_owned(id, student).await?;
        single(assignment_views(&self.pool, vec![assignment]).await?)
    }

    pub async fn submit(
        &self,
        id: i32,
        student: Option<i32>,
        request: SubmitAssignmentRequest,
    ) -> AppResult<SubmissionResponse> {
        let assignment = self.find_owned(id, student).await?;

        let allowed: BTreeSet<i32> = templates::Entity::find()
            .filter(templates::Column::AssignmentDefId.eq(assignment.assignment_def_id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let mut errors = FieldErrors::new();
        if request.files.is_empty() {
            errors.add("files", "At least one file is required");
        }
        for (i, file) in request.files.iter().enumerate() {
            if !allowed.contains(&file.template_id) {
                errors.add(
                    &format!("files[{i}].template_id"),
                    "Template does not belong to this assignment",
                );
            }
            if file.file.trim().is_empty() {
                errors.add(&format!("files[{i}].file"), "This field is required");
            }
        }
        errors.into_result()?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let submission = submissions::ActiveModel {
            assignment_id: Set(assignment.id),
            assessor_apollonyar_id: Set(None),
            submitted_at: Set(now),
            grade: Set(None),
            feedback: Set(None),
            assessed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        for file in request.files {
            submission_files::ActiveModel {
                submission_id: Set(submission.id),
                template_id: Set(file.template_id),
                file: Set(file.file.trim().to_string()),
                description: Set(file.description),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        log::info!("Submission {} received for assignment {}", submission.id, assignment.id);
        single(submission_views(&self.pool, vec![submission]).await?)
    }

    pub async fn update_due_date(
        &self,
        id: i32,
        actor: Option<i32>,
        request: UpdateDueDateRequest,
    ) -> AppResult<AssignmentResponse> {
        let assignment = self.find(id).await?;
        let new_date = parse_due_date(&request.due_date)?;
        let ctx = load_profile_context(&self.pool, assignment.profile_id).await?;
        let title = assignment_defs::Entity::find_by_id(assignment.assignment_def_id)
            .one(&self.pool)
            .await?
            .map(|d| d.title)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let old_date = format_date(assignment.deadline.date_naive());
        let txn = self.pool.begin().await?;
        let mut model = assignment.into_active_model();
        model.deadline = Set(new_date.and_time(chrono::NaiveTime::MIN).and_utc());
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        write_log(
            &txn,
            actions::CHANGE_DUE_DATE,
            actor,
            Some(updated.profile_id),
            format!(
                "مهلت تکلیف {} هنرجو {} از {} به {} تغییر یافت",
                title,
                ctx.student_ref(),
                old_date,
                format_date(new_date)
            ),
            request.reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        single(assignment_views(&self.pool, vec![updated]).await?)
    }

    pub async fn list_submissions(
        &self,
        query: &SubmissionQuery,
    ) -> AppResult<PaginatedResponse<SubmissionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = submissions::Entity::find();
        if let Some(assignment_id) = query.assignment_id {
            select = select.filter(submissions::Column::AssignmentId.eq(assignment_id));
        }
        match query.graded {
            Some(true) => select = select.filter(submissions::Column::Grade.is_not_null()),
            Some(false) => select = select.filter(submissions::Column::Grade.is_null()),
            None => {}
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(submissions::Column::SubmittedAt)
            .order_by_desc(submissions::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = submission_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_submission(&self, id: i32) -> AppResult<SubmissionResponse> {
        let row = self.find_submission(id).await?;
        single(submission_views(&self.pool, vec![row]).await?)
    }

    pub async fn delete_submission(&self, id: i32) -> AppResult<()> {
        let result = submissions::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Submission not found".to_string()));
        }
        Ok(())
    }

    pub async fn grade_submission(
        &self,
        id: i32,
        assessor: Option<i32>,
        request: GradeSubmissionRequest,
    ) -> AppResult<SubmissionResponse> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&request.grade) {
            return Err(AppError::field(
                "grade",
                format!("Grade must be between {MIN_GRADE} and {MAX_GRADE}"),
            ));
        }
        let submission = self.find_submission(id).await?;
        let assignment = self.find(submission.assignment_id).await?;
        let ctx = load_profile_context(&self.pool, assignment.profile_id).await?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let mut model = submission.into_active_model();
        model.grade = Set(Some(request.grade));
        model.feedback = Set(request.feedback.filter(|f| !f.trim().is_empty()));
        model.assessor_apollonyar_id = Set(assessor);
        model.assessed_at = Set(Some(now));
        model.updated_at = Set(now);
        let graded = model.update(&txn).await?;
        write_log(
            &txn,
            actions::GRADE_SUBMISSION,
            assessor,
            Some(assignment.profile_id),
            format!("نمره {} برای تکلیف هنرجو {} ثبت شد", request.grade, ctx.student_ref()),
            None,
        )
        .await?;
        txn.commit().await?;

        single(submission_views(&self.pool, vec![graded]).await?)
    }

    async fn find(&self, id: i32) -> AppResult<assignments::Model> {
        assignments::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))
    }

    async fn find_owned(&self, id: i32, student: Option<i32>) -> AppResult<assignments::Model> {
        let assignment = self.find(id).await?;
        if let Some(user_id) = student {
            let owner = profiles::Entity::find_by_id(assignment.profile_id)
                .one(&self.pool)
                .await?
                .map(|p| p.user_id);
            if owner != Some(user_id) {
                // other students' work is invisible, not forbidden
                return Err(AppError::NotFound("Assignment not found".to_string()));
            }
        }
        Ok(assignment)
    }

    async fn find_submission(&self, id: i32) -> AppResult<submissions::Model> {
        submissions::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::log_entity;
    use crate::services::curriculum_service::CurriculumService;
    use crate::test_utils::*;
    use chrono::TimeZone;

    async fn setup_assignment(db: &DatabaseConnection) -> (crate::entities::user_entity::Model, AssignmentDefResponse, i32) {
        let (user, _, term, profile) = enrolled_student(db, "09121234567").await;
        let def = CurriculumService::new(db.clone())
            .create_assignment_def(CreateAssignmentDefRequest {
                term_id: term.id,
                title: "Scales".into(),
                deadline: Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap(),
                is_required: true,
                templates: vec![CreateTemplateRequest {
                    title: "Recording".into(),
                    file: "templates/recording.txt".into(),
                    is_help_file: false,
                }],
            })
            .await
            .unwrap();
        let assignment = assignments::Entity::find()
            .filter(assignments::Column::ProfileId.eq(profile.id))
            .one(db)
            .await
            .unwrap()
            .unwrap();
        (user, def, assignment.id)
    }

    #[tokio::test]
    async fn test_submit_then_grade_drives_status() {
        let db = setup_test_db().await;
        let (user, def, assignment_id) = setup_assignment(&db).await;
        let staff = create_staff(&db, "09120000001", false).await;
        let service = AssignmentService::new(db.clone());

        let fresh = service.get_assignment(assignment_id, None).await.unwrap();
        assert_eq!(fresh.status, AssignmentStatus::NotSubmitted);
        assert_eq!(fresh.status_label, "ارسال نشده");

        let submission = service
            .submit(
                assignment_id,
                Some(user.id),
                SubmitAssignmentRequest {
                    files: vec![SubmissionFileInput {
                        template_id: def.templates[0].id,
                        file: "uploads/scales.mp3".into(),
                        description: None,
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(submission.files.len(), 1);
        assert_eq!(submission.files[0].template_title.as_deref(), Some("Recording"));

        let pending = service.get_assignment(assignment_id, Some(user.id)).await.unwrap();
        assert_eq!(pending.status, AssignmentStatus::PendingReview);
        assert!(pending.submission_date.is_some());
        assert!(pending.review_date.is_none());

        let out_of_range = service
            .grade_submission(submission.id, Some(staff.id), GradeSubmissionRequest { grade: 101, feedback: None })
            .await;
        assert!(matches!(out_of_range, Err(AppError::FieldValidation(e)) if e.contains("grade")));

        let graded = service
            .grade_submission(
                submission.id,
                Some(staff.id),
                GradeSubmissionRequest {
                    grade: 85,
                    feedback: Some("Steady tempo".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(graded.grade, Some(85));
        assert!(graded.assessed_at.is_some());
        assert_eq!(graded.assessor.map(|a| a.id), Some(staff.id));

        let reviewed = service.get_assignment(assignment_id, None).await.unwrap();
        assert_eq!(reviewed.status, AssignmentStatus::Reviewed);
        assert_eq!(reviewed.grade, Some(85));

        let query = AssignmentQuery {
            status: Some("reviewed".into()),
            ..Default::default()
        };
        assert_eq!(service.list_assignments(&query).await.unwrap().total, 1);
        let query = AssignmentQuery {
            status: Some("ارسال نشده".into()),
            ..Default::default()
        };
        assert_eq!(service.list_assignments(&query).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_foreign_template_and_student() {
        let db = setup_test_db().await;
        let (_, _, assignment_id) = setup_assignment(&db).await;
        let stranger = create_user(&db, "09127654321").await;
        let service = AssignmentService::new(db.clone());

        let wrong_template = service
            .submit(
                assignment_id,
                None,
                SubmitAssignmentRequest {
                    files: vec![SubmissionFileInput {
                        template_id: 999,
                        file: "uploads/x.mp3".into(),
                        description: None,
                    }],
                },
            )
            .await;
        assert!(matches!(wrong_template, Err(AppError::FieldValidation(e)) if e.contains("files[0].template_id")));

        let other_student = service
            .submit(assignment_id, Some(stranger.id), SubmitAssignmentRequest { files: vec![] })
            .await;
        assert!(matches!(other_student, Err(AppError::NotFound(_))));
        assert_eq!(submissions::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_due_date_logs_change() {
        let db = setup_test_db().await;
        let (_, _, assignment_id) = setup_assignment(&db).await;
        let staff = create_staff(&db, "09120000001", false).await;
        let service = AssignmentService::new(db.clone());

        let bad = service
            .update_due_date(
                assignment_id,
                Some(staff.id),
                UpdateDueDateRequest {
                    due_date: "2025/11/01".into(),
                    reason: None,
                },
            )
            .await;
        assert!(matches!(bad, Err(AppError::FieldValidation(_))));

        let updated = service
            .update_due_date(
                assignment_id,
                Some(staff.id),
                UpdateDueDateRequest {
                    due_date: "2025-11-01".into(),
                    reason: Some("sick leave".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.deadline, Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap());

        let logs = log_entity::Entity::find().all(&db).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, actions::CHANGE_DUE_DATE);
        let description = logs[0].description.clone().unwrap_or_default();
        assert!(description.contains("2025/10/10"));
        assert!(description.contains("2025/11/01"));
        assert!(description.contains("sick leave"));
    }
}
