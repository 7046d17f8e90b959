use crate::entities::log_entity as logs;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::context::load_apollonyars;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Audit action names, stored verbatim in `logs.action`
pub mod actions {
    pub const LOG_CALL: &str = "ثبت تماس";
    pub const ADD_NOTE: &str = "افزودن یادداشت";
    pub const REMOVE_NOTE: &str = "حذف یادداشت";
    pub const AWARD_MEDAL: &str = "اعطای مدال";
    pub const REMOVE_MEDAL: &str = "حذف مدال";
    pub const CHANGE_TERM: &str = "تغییر ترم";
    pub const CHANGE_APOLLONYAR: &str = "تغییر آپولون‌یار";
    pub const CHANGE_TYPE: &str = "تغییر نوع هنرجو";
    pub const CHANGE_STATUS: &str = "تغییر وضعیت هنرجو";
    pub const CHANGE_DUE_DATE: &str = "تغییر مهلت تکلیف";
    pub const UPDATE_INSTALLMENTS: &str = "ویرایش اقساط";
    pub const GENERATE_INSTALLMENTS: &str = "ایجاد اقساط";
    pub const GRADE_SUBMISSION: &str = "ثبت نمره تکلیف";
}

/// Number of recent entries embedded in a profile view
pub const PROFILE_LOG_LIMIT: u64 = 20;

/// Appends an audit entry. Runs on whatever connection or transaction the
/// caller is using so the entry commits together with the change.
pub async fn write_log<C: ConnectionTrait>(
    db: &C,
    action: &str,
    issuer: Option<i32>,
    profile_id: Option<i32>,
    description: String,
    reason: Option<&str>,
) -> AppResult<logs::Model> {
    let description = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{description} - دلیل: {reason}"),
        None => description,
    };
    let now = Utc::now();
    let entry = logs::ActiveModel {
        action: Set(action.to_string()),
        issuer_apollonyar_id: Set(issuer),
        profile_id: Set(profile_id),
        description: Set(Some(description)),
        timestamp: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("audit: {} (issuer={:?}, profile={:?})", action, issuer, profile_id);
    Ok(entry)
}

/// Newest entries for one profile, with issuer names resolved
pub async fn recent_profile_logs<C: ConnectionTrait>(
    db: &C,
    profile_id: i32,
) -> AppResult<Vec<LogResponse>> {
    let rows = logs::Entity::find()
        .filter(logs::Column::ProfileId.eq(profile_id))
        .order_by_desc(logs::Column::Timestamp)
        .order_by_desc(logs::Column::Id)
        .limit(PROFILE_LOG_LIMIT)
        .all(db)
        .await?;
    to_views(db, rows).await
}

async fn to_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<logs::Model>,
) -> AppResult<Vec<LogResponse>> {
    let issuers = load_apollonyars(db, rows.iter().filter_map(|l| l.issuer_apollonyar_id)).await?;
    Ok(rows
        .into_iter()
        .map(|l| {
            let issuer = l.issuer_apollonyar_id.and_then(|id| issuers.get(&id));
            LogResponse::new(l, issuer)
        })
        .collect())
}

#[derive(Clone)]
pub struct LogService {
    pool: DatabaseConnection,
}

impl LogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_logs(&self, query: &LogQuery) -> AppResult<PaginatedResponse<LogResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = logs::Entity::find();
        if let Some(profile_id) = query.profile_id {
            select = select.filter(logs::Column::ProfileId.eq(profile_id));
        }
        if let Some(issuer) = query.issuer_apollonyar_id {
            select = select.filter(logs::Column::IssuerApollonyarId.eq(issuer));
        }
        if let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) {
            select = select.filter(logs::Column::Action.eq(action));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(logs::Column::Timestamp)
            .order_by_desc(logs::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let items = to_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_log(&self, id: i32) -> AppResult<LogResponse> {
        let row = logs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Log not found".to_string()))?;
        to_views(&self.pool, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::InternalError("Log view missing".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_write_log_appends_reason_and_lists_newest_first() {
        let db = setup_test_db().await;
        let staff = create_staff(&db, "09120000001", false).await;

        write_log(&db, actions::ADD_NOTE, Some(staff.id), None, "first".into(), None)
            .await
            .unwrap();
        let second = write_log(
            &db,
            actions::CHANGE_TERM,
            None,
            None,
            "second".into(),
            Some("  moved  "),
        )
        .await
        .unwrap();
        assert_eq!(second.description.as_deref(), Some("second - دلیل: moved"));

        let service = LogService::new(db.clone());
        let page = service.list_logs(&LogQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].action, actions::CHANGE_TERM);
        assert_eq!(page.data[0].issuer_name, SYSTEM_ISSUER);
        assert_eq!(page.data[1].issuer_name, staff.full_name());
    }

    #[tokio::test]
    async fn test_get_missing_log() {
        let db = setup_test_db().await;
        let service = LogService::new(db);
        assert!(matches!(service.get_log(99).await, Err(AppError::NotFound(_))));
    }
}
