use crate::entities::{
    course_entity as courses, group_entity as groups, profile_entity as profiles,
    term_entity as terms,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

/// Courses, their terms and the groups inside each term
#[derive(Clone)]
pub struct CourseService {
    pool: DatabaseConnection,
}

impl CourseService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_courses(
        &self,
        query: &CatalogQuery,
    ) -> AppResult<PaginatedResponse<CourseResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = courses::Entity::find();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(courses::Column::Name.contains(search));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_asc(courses::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let mut term_counts: HashMap<i32, u64> = HashMap::new();
        let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
        for term in terms::Entity::find()
            .filter(terms::Column::CourseId.is_in(ids))
            .all(&self.pool)
            .await?
        {
            *term_counts.entry(term.course_id).or_default() += 1;
        }

        let items = rows
            .into_iter()
            .map(|c| {
                let count = term_counts.get(&c.id).copied().unwrap_or(0);
                CourseResponse::new(c, count)
            })
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_course(&self, id: i32) -> AppResult<CourseResponse> {
        let course = self.find_course(id).await?;
        let term_count = terms::Entity::find()
            .filter(terms::Column::CourseId.eq(id))
            .count(&self.pool)
            .await?;
        Ok(CourseResponse::new(course, term_count))
    }

    pub async fn create_course(&self, request: CreateCourseRequest) -> AppResult<CourseResponse> {
        let name = required("name", &request.name)?;
        let now = Utc::now();
        let course = courses::ActiveModel {
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Created course {}", course.id);
        Ok(CourseResponse::new(course, 0))
    }

    pub async fn update_course(
        &self,
        id: i32,
        request: UpdateCourseRequest,
    ) -> AppResult<CourseResponse> {
        let mut model = self.find_course(id).await?.into_active_model();
        if let Some(name) = request.name.as_deref() {
            model.name = Set(required("name", name)?);
        }
        model.updated_at = Set(Utc::now());
        model.update(&self.pool).await?;
        self.get_course(id).await
    }

    /// Cascades to terms, groups, definitions, profiles and their records.
    pub async fn delete_course(&self, id: i32) -> AppResult<()> {
        let result = courses::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        log::info!("Deleted course {id} with its terms and enrollments");
        Ok(())
    }

    pub async fn list_terms(&self, query: &CatalogQuery) -> AppResult<PaginatedResponse<TermResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = terms::Entity::find();
        if let Some(course_id) = query.course_id {
            select = select.filter(terms::Column::CourseId.eq(course_id));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(terms::Column::Name.contains(search));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(terms::Column::StartDate)
            .order_by_asc(terms::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(TermResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_term(&self, id: i32) -> AppResult<TermResponse> {
        Ok(self.find_term(id).await?.into())
    }

    pub async fn create_term(&self, request: CreateTermRequest) -> AppResult<TermResponse> {
        let mut errors = FieldErrors::new();
        if request.name.trim().is_empty() {
            errors.add("name", "This field is required");
        }
        if courses::Entity::find_by_id(request.course_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            errors.add("course_id", "Course does not exist");
        }
        if request.price < 0 {
            errors.add("price", "Price cannot be negative");
        }
        if request.start_date > request.end_date {
            errors.add("end_date", "End date must not be before start date");
        }
        errors.into_result()?;

        let now = Utc::now();
        let term = terms::ActiveModel {
            course_id: Set(request.course_id),
            name: Set(request.name.trim().to_string()),
            price: Set(request.price),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Created term {} in course {}", term.id, term.course_id);
        Ok(term.into())
    }

    pub async fn update_term(&self, id: i32, request: UpdateTermRequest) -> AppResult<TermResponse> {
        let existing = self.find_term(id).await?;

        let mut errors = FieldErrors::new();
        if let Some(course_id) = request.course_id.filter(|c| *c != existing.course_id) {
            if courses::Entity::find_by_id(course_id).one(&self.pool).await?.is_none() {
                errors.add("course_id", "Course does not exist");
            } else if self.count_profiles(profiles::Column::TermId, id).await? > 0 {
                errors.add("course_id", "Term has enrolled profiles and cannot move to another course");
            }
        }
        if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.add("name", "This field is required");
        }
        if request.price.is_some_and(|p| p < 0) {
            errors.add("price", "Price cannot be negative");
        }
        let start = request.start_date.unwrap_or(existing.start_date);
        let end = request.end_date.unwrap_or(existing.end_date);
        if start > end {
            errors.add("end_date", "End date must not be before start date");
        }
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(course_id) = request.course_id {
            model.course_id = Set(course_id);
        }
        if let Some(name) = request.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(price) = request.price {
            model.price = Set(price);
        }
        model.start_date = Set(start);
        model.end_date = Set(end);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn delete_term(&self, id: i32) -> AppResult<()> {
        let result = terms::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Term not found".to_string()));
        }
        log::info!("Deleted term {id}");
        Ok(())
    }

    pub async fn list_groups(&self, query: &CatalogQuery) -> AppResult<PaginatedResponse<GroupResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = groups::Entity::find();
        if let Some(term_id) = query.term_id {
            select = select.filter(groups::Column::TermId.eq(term_id));
        }
        if let Some(course_id) = query.course_id {
            let term_ids: Vec<i32> = terms::Entity::find()
                .filter(terms::Column::CourseId.eq(course_id))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            select = select.filter(groups::Column::TermId.is_in(term_ids));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(groups::Column::Title.contains(search));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_asc(groups::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(GroupResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_group(&self, id: i32) -> AppResult<GroupResponse> {
        Ok(self.find_group(id).await?.into())
    }

    pub async fn create_group(&self, request: CreateGroupRequest) -> AppResult<GroupResponse> {
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
        errors.into_result()?;

        let now = Utc::now();
        let group = groups::ActiveModel {
            term_id: Set(request.term_id),
            title: Set(request.title.trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(group.into())
    }

    pub async fn update_group(&self, id: i32, request: UpdateGroupRequest) -> AppResult<GroupResponse> {
        let existing = self.find_group(id).await?;
        let moved_to = request.term_id.filter(|t| *t != existing.term_id);
        let mut model = existing.into_active_model();
        if let Some(term_id) = moved_to {
            if terms::Entity::find_by_id(term_id).one(&self.pool).await?.is_none() {
                return Err(AppError::field("term_id", "Term does not exist"));
            }
            if self.count_profiles(profiles::Column::GroupId, id).await? > 0 {
                return Err(AppError::field(
                    "term_id",
                    "Group has enrolled profiles and cannot move to another term",
                ));
            }
            model.term_id = Set(term_id);
        }
        if let Some(title) = request.title.as_deref() {
            model.title = Set(required("title", title)?);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn delete_group(&self, id: i32) -> AppResult<()> {
        let result = groups::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Group not found".to_string()));
        }
        Ok(())
    }

    async fn count_profiles(&self, column: profiles::Column, id: i32) -> AppResult<u64> {
        Ok(profiles::Entity::find()
            .filter(column.eq(id))
            .count(&self.pool)
            .await?)
    }

    async fn find_course(&self, id: i32) -> AppResult<courses::Model> {
        courses::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    async fn find_term(&self, id: i32) -> AppResult<terms::Model> {
        terms::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Term not found".to_string()))
    }

    async fn find_group(&self, id: i32) -> AppResult<groups::Model> {
        groups::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }
}

/// Trimmed value, or a field error when blank
pub(crate) fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::field(field, "This field is required"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{assignment_entity, profile_entity};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_term_validation() {
        let db = setup_test_db().await;
        let service = CourseService::new(db.clone());
        let course = create_course(&db, "Guitar").await;

        let bad = service
            .create_term(CreateTermRequest {
                course_id: 999,
                name: "T".into(),
                price: -5,
                start_date: date(2025, 10, 1),
                end_date: date(2025, 9, 1),
            })
            .await;
        match bad {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains("course_id"));
                assert!(errors.contains("price"));
                assert!(errors.contains("end_date"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }

        let term = service
            .create_term(CreateTermRequest {
                course_id: course.id,
                name: "Autumn".into(),
                price: 5_000_000,
                start_date: date(2025, 9, 1),
                end_date: date(2025, 12, 1),
            })
            .await
            .unwrap();
        assert_eq!(term.start_date_formatted, "2025/09/01");

        let shrink = service
            .update_term(
                term.id,
                UpdateTermRequest {
                    end_date: Some(date(2025, 8, 1)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(shrink, Err(AppError::FieldValidation(_))));
        assert_eq!(service.get_course(course.id).await.unwrap().term_count, 1);
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let db = setup_test_db().await;
        let (_, course, term, profile) = enrolled_student(&db, "09121234567").await;
        let group = create_group(&db, term.id, "A").await;
        let service = CourseService::new(db.clone());

        let now = Utc::now();
        let def = crate::entities::assignment_def_entity::ActiveModel {
            term_id: Set(term.id),
            title: Set("Scales".into()),
            deadline: Set(now),
            is_required: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        assignment_entity::ActiveModel {
            profile_id: Set(profile.id),
            assignment_def_id: Set(def.id),
            deadline: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        service.delete_course(course.id).await.unwrap();

        assert!(terms::Entity::find_by_id(term.id).one(&db).await.unwrap().is_none());
        assert!(groups::Entity::find_by_id(group.id).one(&db).await.unwrap().is_none());
        assert!(profile_entity::Entity::find_by_id(profile.id).one(&db).await.unwrap().is_none());
        assert_eq!(assignment_entity::Entity::find().count(&db).await.unwrap(), 0);
        assert!(matches!(service.get_course(course.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_enrolled_term_cannot_change_course() {
        let db = setup_test_db().await;
        let (_, course, term, profile) = enrolled_student(&db, "09121234567").await;
        let other = create_course(&db, "Violin").await;
        let service = CourseService::new(db.clone());

        let moved = service
            .update_term(
                term.id,
                UpdateTermRequest {
                    course_id: Some(other.id),
                    ..Default::default()
                },
            )
            .await;
        match moved {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains("course_id")),
            other => panic!("expected field error, got {other:?}"),
        }
        let term = service.get_term(term.id).await.unwrap();
        assert_eq!(term.course_id, course.id);
        assert_eq!(profile.course_id, term.course_id);

        // Same course is a no-op move
        let renamed = service
            .update_term(
                term.id,
                UpdateTermRequest {
                    course_id: Some(course.id),
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Renamed");

        let empty = create_term(&db, course.id, "Unused", 0).await;
        let moved = service
            .update_term(
                empty.id,
                UpdateTermRequest {
                    course_id: Some(other.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.course_id, other.id);
    }

    #[tokio::test]
    async fn test_enrolled_group_cannot_change_term() {
        let db = setup_test_db().await;
        let (_, course, term, profile) = enrolled_student(&db, "09121234567").await;
        let group = create_group(&db, term.id, "A").await;
        let other_term = create_term(&db, course.id, "Term 2", 0).await;
        let mut active = profile.into_active_model();
        active.group_id = Set(Some(group.id));
        active.update(&db).await.unwrap();
        let service = CourseService::new(db.clone());

        let moved = service
            .update_group(
                group.id,
                UpdateGroupRequest {
                    term_id: Some(other_term.id),
                    ..Default::default()
                },
            )
            .await;
        match moved {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains("term_id")),
            other => panic!("expected field error, got {other:?}"),
        }
        assert_eq!(service.get_group(group.id).await.unwrap().term_id, term.id);

        let spare = create_group(&db, term.id, "B").await;
        let moved = service
            .update_group(
                spare.id,
                UpdateGroupRequest {
                    term_id: Some(other_term.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.term_id, other_term.id);
    }

    #[tokio::test]
    async fn test_groups_filter_by_course() {
        let db = setup_test_db().await;
        let service = CourseService::new(db.clone());
        let piano = create_course(&db, "Piano").await;
        let violin = create_course(&db, "Violin").await;
        let t1 = create_term(&db, piano.id, "P1", 0).await;
        let t2 = create_term(&db, violin.id, "V1", 0).await;
        create_group(&db, t1.id, "A").await;
        create_group(&db, t2.id, "B").await;

        let page = service
            .list_groups(&CatalogQuery {
                course_id: Some(violin.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].title, "B");
    }
}
