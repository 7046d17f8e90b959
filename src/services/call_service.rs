use crate::entities::{
    CallStatus, CallType, Choice, UNKNOWN_LABEL, call_def_entity as call_defs, call_entity as calls,
    note_entity as notes,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::services::context::{load_apollonyars, load_profile_contexts, single};
use crate::utils::format_date;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::{BTreeSet, HashMap};

pub async fn call_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<calls::Model>,
) -> AppResult<Vec<CallResponse>> {
    let contexts = load_profile_contexts(db, rows.iter().map(|c| c.profile_id)).await?;
    let callers = load_apollonyars(db, rows.iter().filter_map(|c| c.caller_id)).await?;
    let def_ids: BTreeSet<i32> = rows.iter().filter_map(|c| c.call_def_id).collect();
    let defs: HashMap<i32, call_defs::Model> = call_defs::Entity::find()
        .filter(call_defs::Column::Id.is_in(def_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    Ok(rows
        .into_iter()
        .map(|call| {
            let ctx = contexts.get(&call.profile_id);
            let def_title = call.call_def_id.and_then(|id| defs.get(&id)).map(|d| d.title.clone());
            let unknown = || UNKNOWN_LABEL.to_string();
            CallResponse {
                type_label: call.call_type.label().to_string(),
                call_status: call.status.label().to_string(),
                caller: call
                    .caller_id
                    .and_then(|id| callers.get(&id))
                    .map(ApollonyarSummary::from),
                topic: def_title
                    .clone()
                    .unwrap_or_else(|| call.call_type.value().to_string()),
                call_def: def_title,
                student_name: ctx.map(|c| c.student_name()).unwrap_or_else(unknown),
                phone: ctx.map(|c| c.phone()).unwrap_or_else(unknown),
                hearts: ctx.map(|c| c.profile.hearts).unwrap_or(0),
                course: ctx.map(|c| c.course_name()).unwrap_or_else(unknown),
                term: ctx.map(|c| c.term_name()).unwrap_or_else(unknown),
                apollonyar: ctx.map(|c| c.apollonyar_name()).unwrap_or_else(unknown),
                student_id: call.profile_id,
                id: call.id,
                profile_id: call.profile_id,
                call_type: call.call_type,
                status: call.status,
                call_timestamp: call.call_timestamp,
                description: call.description,
                call_def_id: call.call_def_id,
            }
        })
        .collect())
}

pub async fn note_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<notes::Model>,
) -> AppResult<Vec<NoteResponse>> {
    let authors = load_apollonyars(db, rows.iter().filter_map(|n| n.author_apollonyar_id)).await?;
    Ok(rows
        .into_iter()
        .map(|note| {
            let author = note.author_apollonyar_id.and_then(|id| authors.get(&id));
            NoteResponse {
                date: format_date(note.timestamp.date_naive()),
                author_apollonyar: author.map(ApollonyarSummary::from),
                author: author
                    .map(|a| a.full_name())
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                id: note.id,
                profile_id: note.profile_id,
                note: note.note,
                timestamp: note.timestamp,
            }
        })
        .collect())
}

/// Call type and status given as wire value or label
pub(crate) fn parse_call_fields(
    call_type: Option<&str>,
    status: Option<&str>,
    errors: &mut FieldErrors,
) -> (Option<CallType>, Option<CallStatus>) {
    let call_type = call_type.and_then(|raw| {
        let parsed = CallType::parse_choice(raw);
        if parsed.is_none() {
            errors.add("type", format!("Expected one of: {}", CallType::allowed_values()));
        }
        parsed
    });
    let status = status.and_then(|raw| {
        let parsed = CallStatus::parse_choice(raw);
        if parsed.is_none() {
            errors.add("status", format!("Expected one of: {}", CallStatus::allowed_values()));
        }
        parsed
    });
    (call_type, status)
}

#[derive(Clone)]
pub struct CallService {
    pool: DatabaseConnection,
}

impl CallService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_calls(&self, query: &CallQuery) -> AppResult<PaginatedResponse<CallResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut errors = FieldErrors::new();
        let (call_type, status) =
            parse_call_fields(query.call_type.as_deref(), query.status.as_deref(), &mut errors);
        errors.into_result()?;

        let mut select = calls::Entity::find();
        if let Some(profile_id) = query.profile_id {
            select = select.filter(calls::Column::ProfileId.eq(profile_id));
        }
        if let Some(caller_id) = query.caller_id {
            select = select.filter(calls::Column::CallerId.eq(caller_id));
        }
        if let Some(def_id) = query.call_def_id {
            select = select.filter(calls::Column::CallDefId.eq(def_id));
        }
        if let Some(call_type) = call_type {
            select = select.filter(calls::Column::CallType.eq(call_type));
        }
        if let Some(status) = status {
            select = select.filter(calls::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(calls::Column::CallTimestamp)
            .order_by_desc(calls::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = call_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_call(&self, id: i32) -> AppResult<CallResponse> {
        let row = self.find(id).await?;
        single(call_views(&self.pool, vec![row]).await?)
    }

    pub async fn update_call(&self, id: i32, request: UpdateCallRequest) -> AppResult<CallResponse> {
        let existing = self.find(id).await?;

        let mut errors = FieldErrors::new();
        let (call_type, status) =
            parse_call_fields(request.call_type.as_deref(), request.status.as_deref(), &mut errors);
        if let Some(def_id) = request.call_def_id
            && call_defs::Entity::find_by_id(def_id).one(&self.pool).await?.is_none()
        {
            errors.add("call_def_id", "Call definition does not exist");
        }
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if request.call_def_id.is_some() {
            model.call_def_id = Set(request.call_def_id);
        }
        if let Some(call_type) = call_type {
            model.call_type = Set(call_type);
        }
        if let Some(status) = status {
            model.status = Set(status);
        }
        if request.description.is_some() {
            model.description = Set(request.description);
        }
        if let Some(ts) = request.call_timestamp {
            model.call_timestamp = Set(ts);
        }
        model.updated_at = Set(Utc::now());
        let row = model.update(&self.pool).await?;
        single(call_views(&self.pool, vec![row]).await?)
    }

    pub async fn delete_call(&self, id: i32) -> AppResult<()> {
        let result = calls::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Call not found".to_string()));
        }
        Ok(())
    }

    async fn find(&self, id: i32) -> AppResult<calls::Model> {
        calls::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Call not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone};

    async fn insert_call(
        db: &DatabaseConnection,
        profile_id: i32,
        call_def_id: Option<i32>,
        status: CallStatus,
        at: chrono::DateTime<Utc>,
    ) -> calls::Model {
        let now = Utc::now();
        calls::ActiveModel {
            profile_id: Set(profile_id),
            call_def_id: Set(call_def_id),
            caller_id: Set(None),
            call_type: Set(CallType::Installment),
            status: Set(status),
            call_timestamp: Set(at),
            description: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_call_view_topic_and_filters() {
        let db = setup_test_db().await;
        let (_, _, term, profile) = enrolled_student(&db, "09121234567").await;
        let now = Utc::now();
        let def = call_defs::ActiveModel {
            term_id: Set(term.id),
            title: Set("Mid-term check-in".into()),
            start_due_date: Set(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()),
            end_due_date: Set(Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let older = insert_call(&db, profile.id, None, CallStatus::NotAnswered, now - Duration::days(2)).await;
        insert_call(&db, profile.id, Some(def.id), CallStatus::Successful, now).await;

        let service = CallService::new(db);
        let all = service.list_calls(&CallQuery::default()).await.unwrap();
        assert_eq!(all.data.len(), 2);
        assert_eq!(all.data[0].topic, "Mid-term check-in");
        assert_eq!(all.data[1].topic, "installment");
        assert_eq!(all.data[1].call_status, "بی‌پاسخ");
        assert_eq!(all.data[0].hearts, 3);
        assert_eq!(all.data[0].term, "Term 1");

        let query = CallQuery {
            status: Some("بی‌پاسخ".into()),
            ..Default::default()
        };
        let filtered = service.list_calls(&query).await.unwrap();
        assert_eq!(filtered.data.len(), 1);
        assert_eq!(filtered.data[0].id, older.id);

        let bad = CallQuery {
            call_type: Some("sms".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.list_calls(&bad).await,
            Err(AppError::FieldValidation(e)) if e.contains("type")
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_call() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let at = Utc.with_ymd_and_hms(2025, 10, 2, 9, 30, 0).unwrap();
        let call = insert_call(&db, profile.id, None, CallStatus::Pending, at).await;
        let service = CallService::new(db);

        let updated = service
            .update_call(
                call.id,
                UpdateCallRequest {
                    status: Some("successful".into()),
                    description: Some("Agreed on a new schedule".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, CallStatus::Successful);
        assert_eq!(updated.call_timestamp, at);

        let missing_def = service
            .update_call(
                call.id,
                UpdateCallRequest {
                    call_def_id: Some(999),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(missing_def, Err(AppError::FieldValidation(e)) if e.contains("call_def_id")));

        service.delete_call(call.id).await.unwrap();
        assert!(matches!(service.get_call(call.id).await, Err(AppError::NotFound(_))));
    }
}
