use crate::entities::{
    assignment_def_entity as defs, assignment_def_template_entity as templates,
    assignment_entity as assignments, call_def_entity as call_defs, profile_entity as profiles,
    term_entity as terms,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::services::course_service::required;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::{HashMap, HashSet};

/// Creates the missing assignments of one definition for the given profiles.
/// Returns how many rows were inserted.
async fn instantiate_def<C: ConnectionTrait>(
    db: &C,
    def: &defs::Model,
    profile_ids: &[i32],
) -> AppResult<usize> {
    if profile_ids.is_empty() {
        return Ok(0);
    }
    let existing: HashSet<i32> = assignments::Entity::find()
        .filter(assignments::Column::AssignmentDefId.eq(def.id))
        .filter(assignments::Column::ProfileId.is_in(profile_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.profile_id)
        .collect();

    let now = Utc::now();
    let mut created = 0;
    for &profile_id in profile_ids.iter().filter(|id| !existing.contains(id)) {
        assignments::ActiveModel {
            profile_id: Set(profile_id),
            assignment_def_id: Set(def.id),
            deadline: Set(def.deadline),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }
    Ok(created)
}

/// Gives a profile every assignment of its term it does not have yet.
pub async fn instantiate_term_assignments<C: ConnectionTrait>(
    db: &C,
    profile_id: i32,
    term_id: i32,
) -> AppResult<usize> {
    let term_defs = defs::Entity::find()
        .filter(defs::Column::TermId.eq(term_id))
        .all(db)
        .await?;
    let mut created = 0;
    for def in &term_defs {
        created += instantiate_def(db, def, &[profile_id]).await?;
    }
    Ok(created)
}

/// Assignment definitions with templates, and call campaigns
#[derive(Clone)]
pub struct CurriculumService {
    pool: DatabaseConnection,
}

impl CurriculumService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_assignment_defs(
        &self,
        query: &CatalogQuery,
    ) -> AppResult<PaginatedResponse<AssignmentDefResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = defs::Entity::find();
        if let Some(term_id) = query.term_id {
            select = select.filter(defs::Column::TermId.eq(term_id));
        }
        if let Some(course_id) = query.course_id {
            select = select.filter(defs::Column::TermId.is_in(self.course_term_ids(course_id).await?));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(defs::Column::Title.contains(search));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_asc(defs::Column::Deadline)
            .order_by_asc(defs::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|d| d.id).collect();
        let mut by_def: HashMap<i32, Vec<templates::Model>> = HashMap::new();
        for t in templates::Entity::find()
            .filter(templates::Column::AssignmentDefId.is_in(ids))
            .order_by_asc(templates::Column::Id)
            .all(&self.pool)
            .await?
        {
            by_def.entry(t.assignment_def_id).or_default().push(t);
        }

        let items = rows
            .into_iter()
            .map(|d| {
                let ts = by_def.remove(&d.id).unwrap_or_default();
                AssignmentDefResponse::new(d, ts)
            })
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_assignment_def(&self, id: i32) -> AppResult<AssignmentDefResponse> {
        let def = self.find_def(id).await?;
        let ts = templates::Entity::find()
            .filter(templates::Column::AssignmentDefId.eq(id))
            .order_by_asc(templates::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(AssignmentDefResponse::new(def, ts))
    }

    /// Creates the definition with its templates and hands it out to every
    /// profile currently in the term.
    pub async fn create_assignment_def(
        &self,
        request: CreateAssignmentDefRequest,
    ) -> AppResult<AssignmentDefResponse> {
        let mut errors = FieldErrors::new();
        if request.title.trim().is_empty() {
            errors.add("title", "This field is required");
        }
        if terms::Entity::find_by_id(request.term_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            errors.add("term_id", "Term does not exist");
        }
        for (i, t) in request.templates.iter().enumerate() {
            if t.title.trim().is_empty() || t.file.trim().is_empty() {
                errors.add("templates", format!("Template {} needs a title and a file", i + 1));
            }
        }
        errors.into_result()?;

        let txn = self.pool.begin().await?;
        let now = Utc::now();
        let def = defs::ActiveModel {
            term_id: Set(request.term_id),
            title: Set(request.title.trim().to_string()),
            deadline: Set(request.deadline),
            is_required: Set(request.is_required),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut created_templates = Vec::with_capacity(request.templates.len());
        for t in request.templates {
            created_templates.push(insert_template(&txn, def.id, t).await?);
        }

        let profile_ids: Vec<i32> = profiles::Entity::find()
            .filter(profiles::Column::TermId.eq(def.term_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let handed_out = instantiate_def(&txn, &def, &profile_ids).await?;
        txn.commit().await?;

        log::info!(
            "Created assignment def {} for term {} ({} assignments)",
            def.id,
            def.term_id,
            handed_out
        );
        Ok(AssignmentDefResponse::new(def, created_templates))
    }

    /// Editing the deadline does not move deadlines already handed out;
    /// per-student deadlines are changed through `update_due_date`.
    pub async fn update_assignment_def(
        &self,
        id: i32,
        request: UpdateAssignmentDefRequest,
    ) -> AppResult<AssignmentDefResponse> {
        let mut model = self.find_def(id).await?.into_active_model();
        if let Some(title) = request.title.as_deref() {
            model.title = Set(required("title", title)?);
        }
        if let Some(deadline) = request.deadline {
            model.deadline = Set(deadline);
        }
        if let Some(is_required) = request.is_required {
            model.is_required = Set(is_required);
        }
        model.updated_at = Set(Utc::now());
        model.update(&self.pool).await?;
        self.get_assignment_def(id).await
    }

    pub async fn delete_assignment_def(&self, id: i32) -> AppResult<()> {
        let result = defs::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Assignment definition not found".to_string()));
        }
        Ok(())
    }

    pub async fn add_template(
        &self,
        def_id: i32,
        request: CreateTemplateRequest,
    ) -> AppResult<TemplateResponse> {
        self.find_def(def_id).await?;
        required("title", &request.title)?;
        required("file", &request.file)?;
        Ok(insert_template(&self.pool, def_id, request).await?.into())
    }

    pub async fn delete_template(&self, def_id: i32, template_id: i32) -> AppResult<()> {
        let result = templates::Entity::delete_many()
            .filter(templates::Column::Id.eq(template_id))
            .filter(templates::Column::AssignmentDefId.eq(def_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Template not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_call_defs(
        &self,
        query: &CatalogQuery,
    ) -> AppResult<PaginatedResponse<CallDefResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = call_defs::Entity::find();
        if let Some(term_id) = query.term_id {
            select = select.filter(call_defs::Column::TermId.eq(term_id));
        }
        if let Some(course_id) = query.course_id {
            select = select
                .filter(call_defs::Column::TermId.is_in(self.course_term_ids(course_id).await?));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(call_defs::Column::Title.contains(search));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(call_defs::Column::StartDueDate)
            .order_by_asc(call_defs::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(CallDefResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_call_def(&self, id: i32) -> AppResult<CallDefResponse> {
        Ok(self.find_call_def(id).await?.into())
    }

    pub async fn create_call_def(&self, request: CreateCallDefRequest) -> AppResult<CallDefResponse> {
        let mut errors = FieldErrors::new();
        if request.title.trim().is_empty() {
            errors.add("title", "This field is required");
        }
        if terms::Entity::find_by_id(request.term_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            errors.add("term_id", "Term does not exist");
        }
        if request.start_due_date > request.end_due_date {
            errors.add("end_due_date", "End must not be before start");
        }
        errors.into_result()?;

        let now = Utc::now();
        let def = call_defs::ActiveModel {
            term_id: Set(request.term_id),
            title: Set(request.title.trim().to_string()),
            start_due_date: Set(request.start_due_date),
            end_due_date: Set(request.end_due_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(def.into())
    }

    pub async fn update_call_def(
        &self,
        id: i32,
        request: UpdateCallDefRequest,
    ) -> AppResult<CallDefResponse> {
        let existing = self.find_call_def(id).await?;

        let mut errors = FieldErrors::new();
        if let Some(term_id) = request.term_id
            && terms::Entity::find_by_id(term_id).one(&self.pool).await?.is_none()
        {
            errors.add("term_id", "Term does not exist");
        }
        if request.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.add("title", "This field is required");
        }
        let start = request.start_due_date.unwrap_or(existing.start_due_date);
        let end = request.end_due_date.unwrap_or(existing.end_due_date);
        if start > end {
            errors.add("end_due_date", "End must not be before start");
        }
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(term_id) = request.term_id {
            model.term_id = Set(term_id);
        }
        if let Some(title) = request.title {
            model.title = Set(title.trim().to_string());
        }
        model.start_due_date = Set(start);
        model.end_due_date = Set(end);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?.into())
    }

    /// Calls logged under the campaign keep their rows.
    pub async fn delete_call_def(&self, id: i32) -> AppResult<()> {
        let result = call_defs::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Call definition not found".to_string()));
        }
        Ok(())
    }

    async fn course_term_ids(&self, course_id: i32) -> AppResult<Vec<i32>> {
        Ok(terms::Entity::find()
            .filter(terms::Column::CourseId.eq(course_id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect())
    }

    async fn find_def(&self, id: i32) -> AppResult<defs::Model> {
        defs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment definition not found".to_string()))
    }

    async fn find_call_def(&self, id: i32) -> AppResult<call_defs::Model> {
        call_defs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Call definition not found".to_string()))
    }
}

async fn insert_template<C: ConnectionTrait>(
    db: &C,
    def_id: i32,
    request: CreateTemplateRequest,
) -> AppResult<templates::Model> {
    let now = Utc::now();
    Ok(templates::ActiveModel {
        assignment_def_id: Set(def_id),
        title: Set(request.title.trim().to_string()),
        file: Set(request.file.trim().to_string()),
        is_help_file: Set(request.is_help_file),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn def_request(term_id: i32) -> CreateAssignmentDefRequest {
        CreateAssignmentDefRequest {
            term_id,
            title: "Scales in C".into(),
            deadline: Utc::now() + Duration::days(7),
            is_required: true,
            templates: vec![CreateTemplateRequest {
                title: "Recording".into(),
                file: "templates/recording.pdf".into(),
                is_help_file: false,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_def_hands_out_assignments() {
        let db = setup_test_db().await;
        let (_, course, term, profile) = enrolled_student(&db, "09121234567").await;
        let other = create_user(&db, "09127654321").await;
        let outsider_term = create_term(&db, course.id, "Term 2", 0).await;
        create_profile(&db, other.id, course.id, Some(outsider_term.id)).await;

        let service = CurriculumService::new(db.clone());
        let def = service.create_assignment_def(def_request(term.id)).await.unwrap();
        assert_eq!(def.templates.len(), 1);

        let handed = assignments::Entity::find().all(&db).await.unwrap();
        assert_eq!(handed.len(), 1);
        assert_eq!(handed[0].profile_id, profile.id);
        assert_eq!(handed[0].deadline, def.deadline);

        // idempotent for profiles that already have it
        assert_eq!(instantiate_term_assignments(&db, profile.id, term.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_def_rejects_unknown_term() {
        let db = setup_test_db().await;
        let service = CurriculumService::new(db);
        let result = service.create_assignment_def(def_request(42)).await;
        assert!(matches!(result, Err(AppError::FieldValidation(e)) if e.contains("term_id")));
    }

    #[tokio::test]
    async fn test_call_def_date_range() {
        let db = setup_test_db().await;
        let course = create_course(&db, "Piano").await;
        let term = create_term(&db, course.id, "T1", 0).await;
        let service = CurriculumService::new(db);
        let now = Utc::now();

        let bad = service
            .create_call_def(CreateCallDefRequest {
                term_id: term.id,
                title: "Welcome calls".into(),
                start_due_date: now,
                end_due_date: now - Duration::days(1),
            })
            .await;
        assert!(matches!(bad, Err(AppError::FieldValidation(e)) if e.contains("end_due_date")));

        let ok = service
            .create_call_def(CreateCallDefRequest {
                term_id: term.id,
                title: "Welcome calls".into(),
                start_due_date: now,
                end_due_date: now + Duration::days(3),
            })
            .await
            .unwrap();
        let listed = service
            .list_call_defs(&CatalogQuery {
                course_id: Some(course.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.data[0].id, ok.id);
    }
}
