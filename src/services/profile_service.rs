use crate::entities::{
    CallStatus, Choice, ProfileStatus, ProfileType, UNKNOWN_LABEL, apollonyar_entity as apollonyars,
    assignment_entity as assignments, call_entity as calls, course_entity as courses,
    group_entity as groups, medal_def_entity as medal_defs, medal_entity as medals,
    note_entity as notes, profile_entity as profiles, profiles::DEFAULT_HEARTS,
    term_entity as terms, user_entity as users,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::services::assignment_service::assignment_views;
use crate::services::call_service::{call_views, note_views, parse_call_fields};
use crate::services::context::{
    ProfileContext, load_apollonyars, load_profile_context, load_profile_contexts, single,
};
use crate::services::curriculum_service::instantiate_term_assignments;
use crate::services::log_service::{actions, recent_profile_logs, write_log};
use crate::utils::{format_date, normalize_phone};
use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};

fn term_summary(term: &terms::Model, course: Option<&courses::Model>) -> TermSummary {
    TermSummary {
        id: term.id,
        name: term.name.clone(),
        price: term.price,
        start_date: term.start_date,
        end_date: term.end_date,
        course: course.filter(|c| c.id == term.course_id).map(CourseSummary::from),
    }
}

/// Every course the student is enrolled in, one entry per profile
async fn enrollments_by_user<C: ConnectionTrait>(
    db: &C,
    user_ids: BTreeSet<i32>,
) -> AppResult<HashMap<i32, Vec<EnrolledCourse>>> {
    let siblings = profiles::Entity::find()
        .filter(profiles::Column::UserId.is_in(user_ids))
        .order_by_asc(profiles::Column::Id)
        .all(db)
        .await?;
    let course_names: HashMap<i32, String> = courses::Entity::find()
        .filter(courses::Column::Id.is_in(siblings.iter().map(|p| p.course_id).collect::<BTreeSet<_>>()))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let term_names: HashMap<i32, String> = terms::Entity::find()
        .filter(terms::Column::Id.is_in(siblings.iter().filter_map(|p| p.term_id).collect::<BTreeSet<_>>()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    let mut by_user: HashMap<i32, Vec<EnrolledCourse>> = HashMap::new();
    for p in siblings {
        by_user.entry(p.user_id).or_default().push(EnrolledCourse {
            course_id: p.course_id,
            course_name: course_names
                .get(&p.course_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            term_id: p.term_id,
            term_name: p.term_id.and_then(|id| term_names.get(&id).cloned()),
            enrollment_id: p.id,
        });
    }
    Ok(by_user)
}

pub async fn profile_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<profiles::Model>,
) -> AppResult<Vec<ProfileResponse>> {
    let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
    let mut contexts = load_profile_contexts(db, ids.iter().copied()).await?;

    let group_ids: BTreeSet<i32> = rows.iter().filter_map(|p| p.group_id).collect();
    let group_map: HashMap<i32, groups::Model> = groups::Entity::find()
        .filter(groups::Column::Id.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    let sales = load_apollonyars(db, rows.iter().filter_map(|p| p.sales_representative_id)).await?;

    let mut earned: HashMap<i32, Vec<i32>> = HashMap::new();
    for medal in medals::Entity::find()
        .filter(medals::Column::ProfileId.is_in(ids.clone()))
        .order_by_asc(medals::Column::AwardedAt)
        .all(db)
        .await?
    {
        earned.entry(medal.profile_id).or_default().push(medal.medal_def_id);
    }
    let enrollments = enrollments_by_user(db, rows.iter().map(|p| p.user_id).collect()).await?;

    let mut views = Vec::with_capacity(rows.len());
    for p in rows {
        let action_logs = recent_profile_logs(db, p.id).await?;
        let ctx = contexts.remove(&p.id).unwrap_or_else(|| ProfileContext {
            profile: p.clone(),
            user: None,
            course: None,
            term: None,
            apollonyar: None,
        });
        let user = ctx.user.as_ref();
        let term = ctx.term.as_ref();
        views.push(ProfileResponse {
            name: ctx.student_name(),
            phone: ctx.phone(),
            term_name: ctx.term_name(),
            apollonyar_name: ctx.apollonyar_name(),
            user: user.map(UserSummary::from),
            term: term.map(|t| term_summary(t, ctx.course.as_ref())),
            group: p.group_id.and_then(|id| group_map.get(&id)).map(GroupSummary::from),
            apollonyar: ctx.apollonyar.as_ref().map(ApollonyarSummary::from),
            sales_representative: p
                .sales_representative_id
                .and_then(|id| sales.get(&id))
                .map(ApollonyarSummary::from),
            birth_year: user.and_then(|u| u.birthday).map(|b| b.year()),
            city: user.and_then(|u| u.city.clone()).filter(|c| !c.is_empty()),
            student_type: p.profile_type.label().to_string(),
            enrollment_status: p.status.enrollment_label().to_string(),
            access_status: p.status.access_label().to_string(),
            term_start_date: term.map(|t| format_date(t.start_date)),
            term_end_date: term.map(|t| format_date(t.end_date)),
            apollonyar_telegram_id: ctx.apollonyar.as_ref().and_then(|a| a.telegram_id.clone()),
            apollonyar_id: p.apollonyar_id,
            course_id: p.course_id,
            total_course_fee: term.map(|t| t.price).unwrap_or(0),
            earned_medal_ids: earned.remove(&p.id).unwrap_or_default(),
            action_logs,
            enrolled_courses: enrollments.get(&p.user_id).cloned().unwrap_or_default(),
            score: p.stars,
            id: p.id,
            profile_type: p.profile_type,
            status: p.status,
            hearts: p.hearts,
            stars: p.stars,
            created_at: p.created_at,
            updated_at: p.updated_at,
        });
    }
    Ok(views)
}

fn parse_type(raw: &str) -> AppResult<ProfileType> {
    ProfileType::parse_choice(raw).ok_or_else(|| {
        AppError::field("type", format!("Expected one of: {}", ProfileType::allowed_values()))
    })
}

fn parse_status(raw: &str) -> AppResult<ProfileStatus> {
    ProfileStatus::parse_status(raw).ok_or_else(|| {
        AppError::field("status", format!("Expected one of: {}", ProfileStatus::allowed_values()))
    })
}

/// Enrollments and everything staff do to them
#[derive(Clone)]
pub struct ProfileService {
    pool: DatabaseConnection,
}

impl ProfileService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_profiles(&self, query: &ProfileQuery) -> AppResult<PaginatedResponse<ProfileResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = profiles::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(profiles::Column::UserId.eq(user_id));
        }
        if let Some(course_id) = query.course_id {
            select = select.filter(profiles::Column::CourseId.eq(course_id));
        }
        if let Some(term_id) = query.term_id {
            select = select.filter(profiles::Column::TermId.eq(term_id));
        }
        if let Some(group_id) = query.group_id {
            select = select.filter(profiles::Column::GroupId.eq(group_id));
        }
        if let Some(apollonyar_id) = query.apollonyar_id {
            select = select.filter(profiles::Column::ApollonyarId.eq(apollonyar_id));
        }
        if let Some(raw) = query.status.as_deref() {
            select = select.filter(profiles::Column::Status.eq(parse_status(raw)?));
        }
        if let Some(raw) = query.profile_type.as_deref() {
            select = select.filter(profiles::Column::ProfileType.eq(parse_type(raw)?));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let phone = normalize_phone(search);
            let matching: Vec<i32> = users::Entity::find()
                .filter(
                    Condition::any()
                        .add(users::Column::FirstName.contains(search))
                        .add(users::Column::LastName.contains(search))
                        .add(users::Column::PhoneNumber.contains(&phone)),
                )
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect();
            select = select.filter(profiles::Column::UserId.is_in(matching));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(profiles::Column::CreatedAt)
            .order_by_desc(profiles::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = profile_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_profile(&self, id: i32) -> AppResult<ProfileResponse> {
        let row = self.find(id).await?;
        single(profile_views(&self.pool, vec![row]).await?)
    }

    /// Profiles owned by a student account
    pub async fn my_profiles(&self, user_id: i32) -> AppResult<Vec<ProfileResponse>> {
        let rows = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .order_by_asc(profiles::Column::Id)
            .all(&self.pool)
            .await?;
        profile_views(&self.pool, rows).await
    }

    pub async fn create_profile(&self, request: CreateProfileRequest) -> AppResult<ProfileResponse> {
        let mut errors = FieldErrors::new();

        if users::Entity::find_by_id(request.user_id).one(&self.pool).await?.is_none() {
            errors.add("user_id", "User does not exist");
        }
        let term = match request.term_id {
            Some(id) => {
                let term = terms::Entity::find_by_id(id).one(&self.pool).await?;
                if term.is_none() {
                    errors.add("term_id", "Term does not exist");
                }
                term
            }
            None => None,
        };
        let course_id = match (request.course_id, &term) {
            (Some(id), _) => {
                if courses::Entity::find_by_id(id).one(&self.pool).await?.is_none() {
                    errors.add("course_id", "Course does not exist");
                }
                Some(id)
            }
            (None, Some(term)) => Some(term.course_id),
            (None, None) => {
                if request.term_id.is_none() {
                    errors.add("course_id", "Either course_id or term_id is required");
                }
                None
            }
        };
        if let (Some(term), Some(course_id)) = (&term, course_id)
            && term.course_id != course_id
        {
            errors.add("term_id", "Term belongs to another course");
        }
        if let Some(group_id) = request.group_id {
            match groups::Entity::find_by_id(group_id).one(&self.pool).await? {
                None => errors.add("group_id", "Group does not exist"),
                Some(group) if request.term_id != Some(group.term_id) => {
                    errors.add("group_id", "Group belongs to another term")
                }
                Some(_) => {}
            }
        }
        if let Some(id) = request.apollonyar_id
            && apollonyars::Entity::find_by_id(id).one(&self.pool).await?.is_none()
        {
            errors.add("apollonyar_id", "Apollonyar does not exist");
        }
        if let Some(id) = request.sales_representative_id
            && apollonyars::Entity::find_by_id(id).one(&self.pool).await?.is_none()
        {
            errors.add("sales_representative_id", "Apollonyar does not exist");
        }
        let profile_type = match request.profile_type.as_deref() {
            Some(raw) => ProfileType::parse_choice(raw).or_else(|| {
                errors.add("type", format!("Expected one of: {}", ProfileType::allowed_values()));
                None
            }),
            None => Some(ProfileType::TermBased),
        };
        let status = match request.status.as_deref() {
            Some(raw) => ProfileStatus::parse_status(raw).or_else(|| {
                errors.add("status", format!("Expected one of: {}", ProfileStatus::allowed_values()));
                None
            }),
            None => Some(ProfileStatus::Active),
        };
        if request.hearts.is_some_and(|h| h < 0) {
            errors.add("hearts", "Must not be negative");
        }
        if request.stars.is_some_and(|s| s < 0.0) {
            errors.add("stars", "Must not be negative");
        }
        errors.into_result()?;
        let (Some(course_id), Some(profile_type), Some(status)) = (course_id, profile_type, status) else {
            return Err(AppError::ValidationError("Invalid profile".to_string()));
        };

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let profile = profiles::ActiveModel {
            user_id: Set(request.user_id),
            course_id: Set(course_id),
            term_id: Set(request.term_id),
            group_id: Set(request.group_id),
            apollonyar_id: Set(request.apollonyar_id),
            sales_representative_id: Set(request.sales_representative_id),
            profile_type: Set(profile_type),
            status: Set(status),
            hearts: Set(request.hearts.unwrap_or(DEFAULT_HEARTS)),
            stars: Set(request.stars.unwrap_or(0.0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        if let Some(term_id) = profile.term_id {
            instantiate_term_assignments(&txn, profile.id, term_id).await?;
        }
        txn.commit().await?;

        log::info!("Profile {} created for user {}", profile.id, profile.user_id);
        self.get_profile(profile.id).await
    }

    pub async fn update_profile(&self, id: i32, request: UpdateProfileRequest) -> AppResult<ProfileResponse> {
        let existing = self.find(id).await?;

        let mut errors = FieldErrors::new();
        if let Some(group_id) = request.group_id {
            match groups::Entity::find_by_id(group_id).one(&self.pool).await? {
                None => errors.add("group_id", "Group does not exist"),
                Some(group) if existing.term_id != Some(group.term_id) => {
                    errors.add("group_id", "Group belongs to another term")
                }
                Some(_) => {}
            }
        }
        if let Some(rep) = request.sales_representative_id
            && apollonyars::Entity::find_by_id(rep).one(&self.pool).await?.is_none()
        {
            errors.add("sales_representative_id", "Apollonyar does not exist");
        }
        if request.hearts.is_some_and(|h| h < 0) {
            errors.add("hearts", "Must not be negative");
        }
        if request.stars.is_some_and(|s| s < 0.0) {
            errors.add("stars", "Must not be negative");
        }
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if request.group_id.is_some() {
            model.group_id = Set(request.group_id);
        }
        if request.sales_representative_id.is_some() {
            model.sales_representative_id = Set(request.sales_representative_id);
        }
        if let Some(hearts) = request.hearts {
            model.hearts = Set(hearts);
        }
        if let Some(stars) = request.stars {
            model.stars = Set(stars);
        }
        model.updated_at = Set(Utc::now());
        let row = model.update(&self.pool).await?;
        single(profile_views(&self.pool, vec![row]).await?)
    }

    pub async fn delete_profile(&self, id: i32) -> AppResult<()> {
        let result = profiles::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        Ok(())
    }

    /// Earliest deadline first
    pub async fn assignments(&self, id: i32) -> AppResult<Vec<AssignmentResponse>> {
        self.find(id).await?;
        let rows = assignments::Entity::find()
            .filter(assignments::Column::ProfileId.eq(id))
            .order_by_asc(assignments::Column::Deadline)
            .order_by_asc(assignments::Column::Id)
            .all(&self.pool)
            .await?;
        assignment_views(&self.pool, rows).await
    }

    pub async fn calls(&self, id: i32) -> AppResult<Vec<CallResponse>> {
        self.find(id).await?;
        let rows = calls::Entity::find()
            .filter(calls::Column::ProfileId.eq(id))
            .order_by_desc(calls::Column::CallTimestamp)
            .order_by_desc(calls::Column::Id)
            .all(&self.pool)
            .await?;
        call_views(&self.pool, rows).await
    }

    pub async fn notes(&self, id: i32) -> AppResult<Vec<NoteResponse>> {
        self.find(id).await?;
        let rows = notes::Entity::find()
            .filter(notes::Column::ProfileId.eq(id))
            .order_by_desc(notes::Column::Timestamp)
            .order_by_desc(notes::Column::Id)
            .all(&self.pool)
            .await?;
        note_views(&self.pool, rows).await
    }

    pub async fn log_call(&self, id: i32, actor: Option<i32>, request: LogCallRequest) -> AppResult<CallResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;

        let mut errors = FieldErrors::new();
        let (call_type, status) =
            parse_call_fields(Some(&request.call_type), request.status.as_deref(), &mut errors);
        if let Some(def_id) = request.call_def_id
            && crate::entities::call_def_entity::Entity::find_by_id(def_id)
                .one(&self.pool)
                .await?
                .is_none()
        {
            errors.add("call_def_id", "Call definition does not exist");
        }
        errors.into_result()?;
        let Some(call_type) = call_type else {
            return Err(AppError::field("type", "This field is required"));
        };

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let call = calls::ActiveModel {
            profile_id: Set(id),
            call_def_id: Set(request.call_def_id),
            caller_id: Set(actor),
            call_type: Set(call_type),
            status: Set(status.unwrap_or(CallStatus::Pending)),
            call_timestamp: Set(request.call_timestamp.unwrap_or(now)),
            description: Set(request.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        write_log(
            &txn,
            actions::LOG_CALL,
            actor,
            Some(id),
            format!("تماس {} برای هنرجو {} ثبت شد", call_type.label(), ctx.student_ref()),
            None,
        )
        .await?;
        txn.commit().await?;

        single(call_views(&self.pool, vec![call]).await?)
    }

    pub async fn add_note(&self, id: i32, actor: Option<i32>, request: AddNoteRequest) -> AppResult<NoteResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let body = request
            .body()
            .map(|b| b.trim().to_string())
            .ok_or_else(|| AppError::field("note", "This field is required"))?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let note = notes::ActiveModel {
            profile_id: Set(id),
            author_apollonyar_id: Set(actor),
            note: Set(body),
            timestamp: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        write_log(
            &txn,
            actions::ADD_NOTE,
            actor,
            Some(id),
            format!("یادداشت جدید برای هنرجو {} اضافه شد", ctx.student_ref()),
            None,
        )
        .await?;
        txn.commit().await?;

        single(note_views(&self.pool, vec![note]).await?)
    }

    pub async fn remove_note(&self, id: i32, actor: Option<i32>, request: RemoveNoteRequest) -> AppResult<()> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let note = notes::Entity::find_by_id(request.note_id)
            .filter(notes::Column::ProfileId.eq(id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

        let txn = self.pool.begin().await?;
        write_log(
            &txn,
            actions::REMOVE_NOTE,
            actor,
            Some(id),
            format!("یادداشت از هنرجو {} حذف شد", ctx.student_ref()),
            None,
        )
        .await?;
        notes::Entity::delete_by_id(note.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Awarding adds a star. The same medal cannot be awarded twice.
    pub async fn add_medal(&self, id: i32, actor: Option<i32>, request: AddMedalRequest) -> AppResult<MedalResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let def = medal_defs::Entity::find_by_id(request.medal_def_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Medal not found".to_string()))?;
        let already = medals::Entity::find()
            .filter(medals::Column::ProfileId.eq(id))
            .filter(medals::Column::MedalDefId.eq(def.id))
            .count(&self.pool)
            .await?;
        if already > 0 {
            return Err(AppError::ValidationError("This medal has already been awarded".to_string()));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let medal = medals::ActiveModel {
            profile_id: Set(id),
            medal_def_id: Set(def.id),
            giver_apollonyar_id: Set(actor),
            description: Set(request.description.filter(|d| !d.trim().is_empty())),
            awarded_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let stars = ctx.profile.stars + 1.0;
        let mut profile = ctx.profile.clone().into_active_model();
        profile.stars = Set(stars);
        profile.updated_at = Set(now);
        profile.update(&txn).await?;
        write_log(
            &txn,
            actions::AWARD_MEDAL,
            actor,
            Some(id),
            format!("مدال {} به هنرجو {} اعطا شد", def.title, ctx.student_ref()),
            None,
        )
        .await?;
        txn.commit().await?;

        let giver = load_apollonyars(&self.pool, actor).await?;
        Ok(MedalResponse::new(
            medal,
            &def,
            actor.and_then(|a| giver.get(&a)).map(ApollonyarSummary::from),
        ))
    }

    /// Takes back the star the award gave, never going below zero.
    pub async fn remove_medal(&self, id: i32, actor: Option<i32>, request: RemoveMedalRequest) -> AppResult<()> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let medal = medals::Entity::find()
            .filter(medals::Column::ProfileId.eq(id))
            .filter(medals::Column::MedalDefId.eq(request.medal_def_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Medal not found".to_string()))?;
        let title = medal_defs::Entity::find_by_id(medal.medal_def_id)
            .one(&self.pool)
            .await?
            .map(|d| d.title)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        write_log(
            &txn,
            actions::REMOVE_MEDAL,
            actor,
            Some(id),
            format!("مدال {} از هنرجو {} حذف شد", title, ctx.student_ref()),
            None,
        )
        .await?;
        medals::Entity::delete_by_id(medal.id).exec(&txn).await?;
        let stars = (ctx.profile.stars - 1.0).max(0.0);
        let mut profile = ctx.profile.clone().into_active_model();
        profile.stars = Set(stars);
        profile.updated_at = Set(now);
        profile.update(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Moves the profile to another term of its course. A group outside the new
    /// term is dropped and the new term's assignments are handed out.
    pub async fn change_term(&self, id: i32, actor: Option<i32>, request: ChangeTermRequest) -> AppResult<ProfileResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let term = terms::Entity::find_by_id(request.term_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Term not found".to_string()))?;

        let mut errors = FieldErrors::new();
        if term.course_id != ctx.profile.course_id {
            errors.add("term_id", "Term belongs to another course");
        }
        let requested_group = match request.group_id {
            Some(group_id) => match groups::Entity::find_by_id(group_id).one(&self.pool).await? {
                None => {
                    errors.add("group_id", "Group does not exist");
                    None
                }
                Some(group) if group.term_id != term.id => {
                    errors.add("group_id", "Group belongs to another term");
                    None
                }
                Some(group) => Some(group.id),
            },
            None => None,
        };
        errors.into_result()?;

        let group_id = match requested_group {
            Some(id) => Some(id),
            None => match ctx.profile.group_id {
                Some(current) => groups::Entity::find_by_id(current)
                    .one(&self.pool)
                    .await?
                    .filter(|g| g.term_id == term.id)
                    .map(|g| g.id),
                None => None,
            },
        };

        let txn = self.pool.begin().await?;
        let mut model = ctx.profile.clone().into_active_model();
        model.term_id = Set(Some(term.id));
        model.group_id = Set(group_id);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        instantiate_term_assignments(&txn, id, term.id).await?;
        write_log(
            &txn,
            actions::CHANGE_TERM,
            actor,
            Some(id),
            format!(
                "ترم هنرجو {} از {} به {} تغییر یافت",
                ctx.student_ref(),
                ctx.term_name(),
                term.name
            ),
            request.reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        single(profile_views(&self.pool, vec![updated]).await?)
    }

    pub async fn change_apollonyar(
        &self,
        id: i32,
        actor: Option<i32>,
        request: ChangeApollonyarRequest,
    ) -> AppResult<ProfileResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let apollonyar = apollonyars::Entity::find_by_id(request.apollonyar_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Apollonyar not found".to_string()))?;

        let txn = self.pool.begin().await?;
        let mut model = ctx.profile.clone().into_active_model();
        model.apollonyar_id = Set(Some(apollonyar.id));
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        write_log(
            &txn,
            actions::CHANGE_APOLLONYAR,
            actor,
            Some(id),
            format!(
                "آپولون‌یار هنرجو {} از {} به {} تغییر یافت",
                ctx.student_ref(),
                ctx.apollonyar_name(),
                apollonyar.full_name()
            ),
            request.reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        single(profile_views(&self.pool, vec![updated]).await?)
    }

    pub async fn change_type(&self, id: i32, actor: Option<i32>, request: ChangeTypeRequest) -> AppResult<ProfileResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let new_type = parse_type(&request.profile_type)?;
        let old_type = ctx.profile.profile_type;

        let txn = self.pool.begin().await?;
        let mut model = ctx.profile.clone().into_active_model();
        model.profile_type = Set(new_type);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        write_log(
            &txn,
            actions::CHANGE_TYPE,
            actor,
            Some(id),
            format!(
                "نوع هنرجو {} از {} به {} تغییر یافت",
                ctx.student_ref(),
                old_type.label(),
                new_type.label()
            ),
            request.reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        single(profile_views(&self.pool, vec![updated]).await?)
    }

    pub async fn change_status(
        &self,
        id: i32,
        actor: Option<i32>,
        request: ChangeStatusRequest,
    ) -> AppResult<ProfileResponse> {
        let ctx = load_profile_context(&self.pool, id).await?;
        let new_status = parse_status(&request.status)?;
        let old_status = ctx.profile.status;

        let txn = self.pool.begin().await?;
        let mut model = ctx.profile.clone().into_active_model();
        model.status = Set(new_status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        write_log(
            &txn,
            actions::CHANGE_STATUS,
            actor,
            Some(id),
            format!(
                "وضعیت هنرجو {} از {} به {} تغییر یافت",
                ctx.student_ref(),
                old_status.enrollment_label(),
                new_status.enrollment_label()
            ),
            request.reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        single(profile_views(&self.pool, vec![updated]).await?)
    }

    async fn find(&self, id: i32) -> AppResult<profiles::Model> {
        profiles::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{assignment_def_entity, log_entity};
    use crate::test_utils::*;
    use chrono::TimeZone;

    fn create_request(user_id: i32) -> CreateProfileRequest {
        CreateProfileRequest {
            user_id,
            course_id: None,
            term_id: None,
            group_id: None,
            apollonyar_id: None,
            sales_representative_id: None,
            profile_type: None,
            status: None,
            hearts: None,
            stars: None,
        }
    }

    async fn insert_def(db: &DatabaseConnection, term_id: i32, title: &str) {
        let now = Utc::now();
        assignment_def_entity::ActiveModel {
            term_id: Set(term_id),
            title: Set(title.into()),
            deadline: Set(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()),
            is_required: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_missing_references() {
        let db = setup_test_db().await;
        let user = create_user(&db, "09121234567").await;
        let service = ProfileService::new(db);

        let result = service
            .create_profile(CreateProfileRequest {
                term_id: Some(404),
                group_id: Some(405),
                apollonyar_id: Some(406),
                ..create_request(user.id)
            })
            .await;
        match result {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains("term_id"));
                assert!(errors.contains("group_id"));
                assert!(errors.contains("apollonyar_id"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_enforces_course_hierarchy() {
        let db = setup_test_db().await;
        let user = create_user(&db, "09121234567").await;
        let piano = create_course(&db, "Piano").await;
        let violin = create_course(&db, "Violin").await;
        let piano_term = create_term(&db, piano.id, "Term 1", 1_000).await;
        let violin_term = create_term(&db, violin.id, "Term 1", 1_000).await;
        let violin_group = create_group(&db, violin_term.id, "Evening").await;
        insert_def(&db, piano_term.id, "Scales").await;
        let service = ProfileService::new(db.clone());

        let mismatch = service
            .create_profile(CreateProfileRequest {
                course_id: Some(violin.id),
                term_id: Some(piano_term.id),
                ..create_request(user.id)
            })
            .await;
        assert!(matches!(mismatch, Err(AppError::FieldValidation(e)) if e.contains("term_id")));

        let foreign_group = service
            .create_profile(CreateProfileRequest {
                term_id: Some(piano_term.id),
                group_id: Some(violin_group.id),
                ..create_request(user.id)
            })
            .await;
        assert!(matches!(foreign_group, Err(AppError::FieldValidation(e)) if e.contains("group_id")));

        let created = service
            .create_profile(CreateProfileRequest {
                term_id: Some(piano_term.id),
                profile_type: Some("خودخوان".into()),
                ..create_request(user.id)
            })
            .await
            .unwrap();
        assert_eq!(created.course_id, piano.id);
        assert_eq!(created.student_type, "خودخوان");
        assert_eq!(created.hearts, DEFAULT_HEARTS);
        assert_eq!(created.term_start_date.as_deref(), Some("2025/09/01"));
        assert_eq!(created.enrolled_courses.len(), 1);
        assert_eq!(service.assignments(created.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_change_status_and_type_accept_only_known_values() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let staff = create_staff(&db, "09120000001", false).await;
        let service = ProfileService::new(db.clone());

        let bad = service
            .change_status(
                profile.id,
                Some(staff.id),
                ChangeStatusRequest {
                    status: "frozen".into(),
                    reason: None,
                },
            )
            .await;
        assert!(matches!(bad, Err(AppError::FieldValidation(e)) if e.contains("status")));

        let suspended = service
            .change_status(
                profile.id,
                Some(staff.id),
                ChangeStatusRequest {
                    status: "مسدود".into(),
                    reason: Some("unpaid".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(suspended.status, ProfileStatus::Suspended);
        assert_eq!(suspended.access_status, "غیرفعال");

        let bad_type = service
            .change_type(
                profile.id,
                Some(staff.id),
                ChangeTypeRequest {
                    profile_type: "online".into(),
                    reason: None,
                },
            )
            .await;
        assert!(matches!(bad_type, Err(AppError::FieldValidation(e)) if e.contains("type")));

        let changed = service
            .change_type(
                profile.id,
                Some(staff.id),
                ChangeTypeRequest {
                    profile_type: "self-study".into(),
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(changed.profile_type, ProfileType::SelfStudy);

        let view = service.get_profile(profile.id).await.unwrap();
        assert_eq!(view.action_logs.len(), 2);
        assert_eq!(view.action_logs[0].action, actions::CHANGE_TYPE);
        assert_eq!(log_entity::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_change_term_stays_in_course_and_drops_stale_group() {
        let db = setup_test_db().await;
        let (_, course, term, profile) = enrolled_student(&db, "09121234567").await;
        let old_group = create_group(&db, term.id, "Morning").await;
        service_set_group(&db, &profile, old_group.id).await;
        let next = create_term(&db, course.id, "Term 2", 9_000_000).await;
        insert_def(&db, next.id, "Arpeggios").await;
        let other_course = create_course(&db, "Guitar").await;
        let foreign = create_term(&db, other_course.id, "Term 1", 1).await;
        let service = ProfileService::new(db.clone());

        let rejected = service
            .change_term(
                profile.id,
                None,
                ChangeTermRequest {
                    term_id: foreign.id,
                    group_id: None,
                    reason: None,
                },
            )
            .await;
        assert!(matches!(rejected, Err(AppError::FieldValidation(e)) if e.contains("term_id")));

        let missing = service
            .change_term(
                profile.id,
                None,
                ChangeTermRequest {
                    term_id: 999,
                    group_id: None,
                    reason: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let moved = service
            .change_term(
                profile.id,
                None,
                ChangeTermRequest {
                    term_id: next.id,
                    group_id: None,
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.term.as_ref().map(|t| t.id), Some(next.id));
        assert!(moved.group.is_none());
        assert_eq!(moved.total_course_fee, 9_000_000);
        assert_eq!(service.assignments(profile.id).await.unwrap().len(), 1);
    }

    async fn service_set_group(db: &DatabaseConnection, profile: &profiles::Model, group_id: i32) {
        let mut model = profile.clone().into_active_model();
        model.group_id = Set(Some(group_id));
        model.update(db).await.unwrap();
    }

    #[tokio::test]
    async fn test_medal_awarded_once_and_adds_star() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let staff = create_staff(&db, "09120000001", false).await;
        let now = Utc::now();
        let def = medal_defs::ActiveModel {
            title: Set("Perfect attendance".into()),
            description: Set(String::new()),
            icon: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let service = ProfileService::new(db);

        let unknown = service
            .add_medal(profile.id, Some(staff.id), AddMedalRequest { medal_def_id: 999, description: None })
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));

        let medal = service
            .add_medal(profile.id, Some(staff.id), AddMedalRequest { medal_def_id: def.id, description: None })
            .await
            .unwrap();
        assert_eq!(medal.giver.map(|g| g.id), Some(staff.id));

        let twice = service
            .add_medal(profile.id, Some(staff.id), AddMedalRequest { medal_def_id: def.id, description: None })
            .await;
        assert!(matches!(twice, Err(AppError::ValidationError(_))));

        let view = service.get_profile(profile.id).await.unwrap();
        assert_eq!(view.earned_medal_ids, vec![def.id]);
        assert_eq!(view.stars, 1.0);
        assert_eq!(view.score, 1.0);

        service
            .remove_medal(profile.id, Some(staff.id), RemoveMedalRequest { medal_def_id: def.id })
            .await
            .unwrap();
        let again = service
            .remove_medal(profile.id, Some(staff.id), RemoveMedalRequest { medal_def_id: def.id })
            .await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        assert_eq!(service.get_profile(profile.id).await.unwrap().stars, 0.0);
    }

    #[tokio::test]
    async fn test_notes_and_calls_through_profile() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let staff = create_staff(&db, "09120000001", false).await;
        let service = ProfileService::new(db);

        let empty = service
            .add_note(profile.id, Some(staff.id), AddNoteRequest { note: None, text: Some("  ".into()) })
            .await;
        assert!(matches!(empty, Err(AppError::FieldValidation(e)) if e.contains("note")));

        let note = service
            .add_note(
                profile.id,
                Some(staff.id),
                AddNoteRequest {
                    note: None,
                    text: Some("Prefers evening lessons".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(note.author, staff.full_name());
        assert_eq!(service.notes(profile.id).await.unwrap().len(), 1);

        let call = service
            .log_call(
                profile.id,
                Some(staff.id),
                LogCallRequest {
                    call_def_id: None,
                    call_type: "قسط".into(),
                    status: None,
                    description: None,
                    call_timestamp: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(call.status, CallStatus::Pending);
        assert_eq!(call.caller.map(|c| c.id), Some(staff.id));
        assert_eq!(service.calls(profile.id).await.unwrap().len(), 1);

        service
            .remove_note(profile.id, Some(staff.id), RemoveNoteRequest { note_id: note.id })
            .await
            .unwrap();
        assert!(service.notes(profile.id).await.unwrap().is_empty());
        let missing = service
            .remove_note(profile.id, Some(staff.id), RemoveNoteRequest { note_id: note.id })
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
