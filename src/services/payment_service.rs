use crate::entities::{
    Choice, InstallmentStatus, PaymentMethod, TransactionType, UNKNOWN_LABEL, VerificationStatus,
    installment_entity as installments, transaction_entity as transactions,
    transaction_note_entity as transaction_notes, user_entity as users,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::services::context::{
    ProfileContext, load_apollonyars, load_profile_context, load_profile_contexts, single,
};
use crate::services::discount_code_service::consume_code;
use crate::services::log_service::{actions, write_log};
use crate::utils::{days_remaining, format_compact_datetime, format_date, today};
use chrono::{Months, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};

/// Longest schedule `generate_installments` will produce
pub const MAX_INSTALLMENTS: u32 = 36;
/// Label of installment rows in the payment timeline
const INSTALLMENT_LABEL: &str = "قسط";

/// Splits `total` into `count` equal parts; the last part absorbs the remainder.
/// Every part is positive only when `total >= count`.
pub fn split_amount(total: i64, count: u32) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }
    let n = i64::from(count);
    let base = total / n;
    let mut parts = vec![base; count as usize];
    if let Some(last) = parts.last_mut() {
        *last += total - base * n;
    }
    parts
}

/// `count` due dates starting at `start`, `interval_months` apart. Day of
/// month is clamped to the end of shorter months.
pub fn schedule_dates(start: NaiveDate, count: u32, interval_months: u32) -> AppResult<Vec<NaiveDate>> {
    (0..count)
        .map(|i| {
            start
                .checked_add_months(Months::new(i * interval_months))
                .ok_or_else(|| AppError::field("start_date", "Schedule runs past the supported date range"))
        })
        .collect()
}

/// Newest first; entries on the same day keep their input order.
pub fn sort_timeline(entries: &mut [PaymentEntry]) {
    entries.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}

fn installment_entry(row: &installments::Model) -> PaymentEntry {
    let label = row.status.label().to_string();
    PaymentEntry {
        id: format!("installment_{}", row.id),
        kind: PaymentKind::Installment,
        type_label: INSTALLMENT_LABEL.to_string(),
        amount: row.due_amount,
        date: format_date(row.due_date),
        method: INSTALLMENT_LABEL.to_string(),
        status: label.clone(),
        payment_status: label,
        transaction_id: row.transaction_id,
        due_date: Some(format_date(row.due_date)),
        sort_key: row.due_date,
    }
}

fn transaction_entry(row: &transactions::Model) -> PaymentEntry {
    let label = row.verification_status.label().to_string();
    let day = row.timestamp.date_naive();
    PaymentEntry {
        id: format!("transaction_{}", row.id),
        kind: PaymentKind::Transaction,
        type_label: row.transaction_type.label().to_string(),
        amount: row.amount,
        date: format_date(day),
        method: row.payment_method.label().to_string(),
        status: label.clone(),
        payment_status: label,
        transaction_id: Some(row.id),
        due_date: None,
        sort_key: day,
    }
}

fn installment_view(
    row: installments::Model,
    ctx: Option<&ProfileContext>,
    today: NaiveDate,
) -> InstallmentResponse {
    let unknown = || UNKNOWN_LABEL.to_string();
    InstallmentResponse {
        student_name: ctx.map(|c| c.student_name()).unwrap_or_else(unknown),
        phone: ctx.map(|c| c.phone()).unwrap_or_else(unknown),
        due_date_formatted: format_date(row.due_date),
        days_remaining: days_remaining(row.due_date, today),
        payment_status: row.status.label().to_string(),
        term: ctx.map(|c| c.term_name()).unwrap_or_else(unknown),
        course: ctx.map(|c| c.course_name()).unwrap_or_else(unknown),
        apollonyar: ctx.map(|c| c.apollonyar_name()).unwrap_or_else(unknown),
        course_status: ctx
            .map(|c| c.profile.status.course_status_label().to_string())
            .unwrap_or_else(unknown),
        student_id: row.profile_id,
        id: row.id,
        profile_id: row.profile_id,
        transaction_id: row.transaction_id,
        due_amount: row.due_amount,
        due_date: row.due_date,
        status: row.status,
        is_splited: row.is_splited,
    }
}

pub async fn installment_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<installments::Model>,
) -> AppResult<Vec<InstallmentResponse>> {
    let contexts = load_profile_contexts(db, rows.iter().map(|r| r.profile_id)).await?;
    let today = today();
    Ok(rows
        .into_iter()
        .map(|r| {
            let ctx = contexts.get(&r.profile_id);
            installment_view(r, ctx, today)
        })
        .collect())
}

pub async fn transaction_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<transactions::Model>,
) -> AppResult<Vec<TransactionResponse>> {
    let user_ids: BTreeSet<i32> = rows.iter().map(|t| t.target_user_id).collect();
    let targets: HashMap<i32, users::Model> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let notes = transaction_notes::Entity::find()
        .filter(transaction_notes::Column::TransactionId.is_in(rows.iter().map(|t| t.id).collect::<Vec<_>>()))
        .order_by_asc(transaction_notes::Column::Timestamp)
        .all(db)
        .await?;
    let authors = load_apollonyars(db, notes.iter().filter_map(|n| n.author_apollonyar_id)).await?;
    let mut notes_by_tx: HashMap<i32, Vec<TransactionNoteResponse>> = HashMap::new();
    for note in notes {
        let author = note.author_apollonyar_id.and_then(|id| authors.get(&id));
        notes_by_tx
            .entry(note.transaction_id)
            .or_default()
            .push(TransactionNoteResponse {
                id: note.id,
                transaction_id: note.transaction_id,
                note: note.note,
                timestamp: note.timestamp,
                author_apollonyar: author.map(ApollonyarSummary::from),
                author: author
                    .map(|a| a.full_name())
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            });
    }

    Ok(rows
        .into_iter()
        .map(|t| TransactionResponse {
            target_user: targets.get(&t.target_user_id).map(UserSummary::from),
            type_label: t.transaction_type.label().to_string(),
            date_time: format_compact_datetime(t.timestamp),
            tracking_number: t
                .reference_number
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            payment_method_label: t.payment_method.label().to_string(),
            status_label: t.verification_status.label().to_string(),
            notes: notes_by_tx.remove(&t.id).unwrap_or_default(),
            id: t.id,
            target_user_id: t.target_user_id,
            amount: t.amount,
            transaction_type: t.transaction_type,
            timestamp: t.timestamp,
            reference_number: t.reference_number,
            payment_method: t.payment_method,
            verification_status: t.verification_status,
            verification_timestamp: t.verification_timestamp,
            receipt_image: t.receipt_image,
            created_at: t.created_at,
            updated_at: t.updated_at,
        })
        .collect())
}

/// A settling transaction must exist and belong to the installment's student.
async fn check_settling_transaction<C: ConnectionTrait>(
    db: &C,
    transaction_id: i32,
    student_id: i32,
    field: &str,
    errors: &mut FieldErrors,
) -> AppResult<()> {
    match transactions::Entity::find_by_id(transaction_id).one(db).await? {
        None => errors.add(field, "Transaction does not exist"),
        Some(tx) if tx.target_user_id != student_id => {
            errors.add(field, "Transaction belongs to another student")
        }
        Some(_) => {}
    }
    Ok(())
}

fn parse_choice_field<T: Choice>(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<T> {
    let parsed = T::parse_choice(raw);
    if parsed.is_none() {
        errors.add(field, format!("Expected one of: {}", T::allowed_values()));
    }
    parsed
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let mut errors = FieldErrors::new();

        let mut select = transactions::Entity::find();
        if let Some(user_id) = query.target_user_id {
            select = select.filter(transactions::Column::TargetUserId.eq(user_id));
        }
        if let Some(raw) = query.verification_status.as_deref()
            && let Some(status) = parse_choice_field::<VerificationStatus>(raw, "verification_status", &mut errors)
        {
            select = select.filter(transactions::Column::VerificationStatus.eq(status));
        }
        if let Some(raw) = query.transaction_type.as_deref()
            && let Some(kind) = parse_choice_field::<TransactionType>(raw, "type", &mut errors)
        {
            select = select.filter(transactions::Column::TransactionType.eq(kind));
        }
        errors.into_result()?;

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(transactions::Column::Timestamp)
            .order_by_desc(transactions::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = transaction_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_transaction(&self, id: i32) -> AppResult<TransactionResponse> {
        let row = self.find_transaction(id).await?;
        single(transaction_views(&self.pool, vec![row]).await?)
    }

    pub async fn create_transaction(&self, request: CreateTransactionRequest) -> AppResult<TransactionResponse> {
        let mut errors = FieldErrors::new();
        if users::Entity::find_by_id(request.target_user_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            errors.add("target_user_id", "User does not exist");
        }
        if request.amount <= 0 {
            errors.add("amount", "Amount must be positive");
        }
        let kind = parse_choice_field::<TransactionType>(&request.transaction_type, "type", &mut errors);
        let method = parse_choice_field::<PaymentMethod>(&request.payment_method, "payment_method", &mut errors);
        errors.into_result()?;
        let (Some(kind), Some(method)) = (kind, method) else {
            return Err(AppError::ValidationError("Invalid transaction".to_string()));
        };

        let now = Utc::now();
        let row = transactions::ActiveModel {
            target_user_id: Set(request.target_user_id),
            amount: Set(request.amount),
            transaction_type: Set(kind),
            timestamp: Set(request.timestamp.unwrap_or(now)),
            reference_number: Set(request.reference_number),
            payment_method: Set(method),
            verification_status: Set(VerificationStatus::Pending),
            verification_timestamp: Set(None),
            receipt_image: Set(request.receipt_image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Recorded transaction {} for user {}", row.id, row.target_user_id);
        single(transaction_views(&self.pool, vec![row]).await?)
    }

    pub async fn update_transaction(
        &self,
        id: i32,
        request: UpdateTransactionRequest,
    ) -> AppResult<TransactionResponse> {
        let existing = self.find_transaction(id).await?;

        let mut errors = FieldErrors::new();
        if request.amount.is_some_and(|a| a <= 0) {
            errors.add("amount", "Amount must be positive");
        }
        let kind = request
            .transaction_type
            .as_deref()
            .and_then(|raw| parse_choice_field::<TransactionType>(raw, "type", &mut errors));
        let method = request
            .payment_method
            .as_deref()
            .and_then(|raw| parse_choice_field::<PaymentMethod>(raw, "payment_method", &mut errors));
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(amount) = request.amount {
            model.amount = Set(amount);
        }
        if let Some(kind) = kind {
            model.transaction_type = Set(kind);
        }
        if let Some(method) = method {
            model.payment_method = Set(method);
        }
        if let Some(ts) = request.timestamp {
            model.timestamp = Set(ts);
        }
        if request.reference_number.is_some() {
            model.reference_number = Set(request.reference_number);
        }
        if request.receipt_image.is_some() {
            model.receipt_image = Set(request.receipt_image);
        }
        model.updated_at = Set(Utc::now());
        let row = model.update(&self.pool).await?;
        single(transaction_views(&self.pool, vec![row]).await?)
    }

    /// Installments it settled stay, with the link cleared.
    pub async fn delete_transaction(&self, id: i32) -> AppResult<()> {
        let result = transactions::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }
        Ok(())
    }

    pub async fn verify_transaction(
        &self,
        id: i32,
        request: VerifyTransactionRequest,
    ) -> AppResult<TransactionResponse> {
        let existing = self.find_transaction(id).await?;
        let status = VerificationStatus::parse_choice(&request.status).ok_or_else(|| {
            AppError::field(
                "status",
                format!("Expected one of: {}", VerificationStatus::allowed_values()),
            )
        })?;

        let now = Utc::now();
        let mut model = existing.into_active_model();
        model.verification_status = Set(status);
        model.verification_timestamp = Set((status != VerificationStatus::Pending).then_some(now));
        model.updated_at = Set(now);
        let row = model.update(&self.pool).await?;
        log::info!("Transaction {} marked {}", row.id, status);
        single(transaction_views(&self.pool, vec![row]).await?)
    }

    pub async fn add_transaction_note(
        &self,
        id: i32,
        author: Option<i32>,
        request: AddTransactionNoteRequest,
    ) -> AppResult<TransactionResponse> {
        let existing = self.find_transaction(id).await?;
        let note = request.note.trim();
        if note.is_empty() {
            return Err(AppError::field("note", "This field is required"));
        }
        let now = Utc::now();
        transaction_notes::ActiveModel {
            transaction_id: Set(existing.id),
            author_apollonyar_id: Set(author),
            note: Set(note.to_string()),
            timestamp: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        single(transaction_views(&self.pool, vec![existing]).await?)
    }

    pub async fn list_installments(
        &self,
        query: &InstallmentQuery,
    ) -> AppResult<PaginatedResponse<InstallmentResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = installments::Entity::find();
        if let Some(profile_id) = query.profile_id {
            select = select.filter(installments::Column::ProfileId.eq(profile_id));
        }
        if let Some(raw) = query.status.as_deref() {
            let status = InstallmentStatus::parse_choice(raw).ok_or_else(|| {
                AppError::field("status", format!("Expected one of: {}", InstallmentStatus::allowed_values()))
            })?;
            select = select.filter(installments::Column::Status.eq(status));
        }
        if query.overdue == Some(true) {
            select = select
                .filter(installments::Column::Status.eq(InstallmentStatus::Pending))
                .filter(installments::Column::DueDate.lt(today()));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_asc(installments::Column::DueDate)
            .order_by_asc(installments::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = installment_views(&self.pool, rows).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_installment(&self, id: i32) -> AppResult<InstallmentResponse> {
        let row = self.find_installment(id).await?;
        single(installment_views(&self.pool, vec![row]).await?)
    }

    pub async fn create_installment(&self, request: CreateInstallmentRequest) -> AppResult<InstallmentResponse> {
        let mut errors = FieldErrors::new();
        let ctx = match load_profile_context(&self.pool, request.profile_id).await {
            Ok(ctx) => Some(ctx),
            Err(AppError::NotFound(_)) => {
                errors.add("profile_id", "Profile does not exist");
                None
            }
            Err(e) => return Err(e),
        };
        if request.due_amount <= 0 {
            errors.add("due_amount", "Amount must be positive");
        }
        let status = match request.status.as_deref() {
            Some(raw) => parse_choice_field::<InstallmentStatus>(raw, "status", &mut errors),
            None => Some(InstallmentStatus::Pending),
        };
        if let (Some(tx_id), Some(ctx)) = (request.transaction_id, &ctx) {
            check_settling_transaction(&self.pool, tx_id, ctx.profile.user_id, "transaction_id", &mut errors).await?;
        }
        errors.into_result()?;

        let now = Utc::now();
        let row = installments::ActiveModel {
            profile_id: Set(request.profile_id),
            transaction_id: Set(request.transaction_id),
            due_amount: Set(request.due_amount),
            due_date: Set(request.due_date),
            status: Set(status.unwrap_or(InstallmentStatus::Pending)),
            is_splited: Set(request.is_splited),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(installment_view(row, ctx.as_ref(), today()))
    }

    pub async fn update_installment(
        &self,
        id: i32,
        request: UpdateInstallmentRequest,
    ) -> AppResult<InstallmentResponse> {
        let existing = self.find_installment(id).await?;
        let ctx = load_profile_context(&self.pool, existing.profile_id).await?;

        let mut errors = FieldErrors::new();
        if request.due_amount.is_some_and(|a| a <= 0) {
            errors.add("due_amount", "Amount must be positive");
        }
        let status = request
            .status
            .as_deref()
            .and_then(|raw| parse_choice_field::<InstallmentStatus>(raw, "status", &mut errors));
        if let Some(tx_id) = request.transaction_id {
            check_settling_transaction(&self.pool, tx_id, ctx.profile.user_id, "transaction_id", &mut errors).await?;
        }
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(amount) = request.due_amount {
            model.due_amount = Set(amount);
        }
        if let Some(date) = request.due_date {
            model.due_date = Set(date);
        }
        if let Some(status) = status {
            model.status = Set(status);
        }
        if request.transaction_id.is_some() {
            model.transaction_id = Set(request.transaction_id);
        }
        if let Some(is_splited) = request.is_splited {
            model.is_splited = Set(is_splited);
        }
        model.updated_at = Set(Utc::now());
        let row = model.update(&self.pool).await?;
        Ok(installment_view(row, Some(&ctx), today()))
    }

    pub async fn delete_installment(&self, id: i32) -> AppResult<()> {
        let result = installments::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Installment not found".to_string()));
        }
        Ok(())
    }

    /// Installments of the profile and transactions of its student, newest first.
    pub async fn profile_payments(&self, profile_id: i32) -> AppResult<Vec<PaymentEntry>> {
        let ctx = load_profile_context(&self.pool, profile_id).await?;

        let plan = installments::Entity::find()
            .filter(installments::Column::ProfileId.eq(profile_id))
            .order_by_asc(installments::Column::DueDate)
            .all(&self.pool)
            .await?;
        let paid = transactions::Entity::find()
            .filter(transactions::Column::TargetUserId.eq(ctx.profile.user_id))
            .order_by_desc(transactions::Column::Timestamp)
            .all(&self.pool)
            .await?;

        let mut entries: Vec<PaymentEntry> = plan.iter().map(installment_entry).collect();
        entries.extend(paid.iter().map(transaction_entry));
        sort_timeline(&mut entries);
        Ok(entries)
    }

    pub async fn profile_installments(&self, profile_id: i32) -> AppResult<Vec<InstallmentResponse>> {
        let rows = installments::Entity::find()
            .filter(installments::Column::ProfileId.eq(profile_id))
            .order_by_asc(installments::Column::DueDate)
            .order_by_asc(installments::Column::Id)
            .all(&self.pool)
            .await?;
        installment_views(&self.pool, rows).await
    }

    /// Replaces the whole plan of a profile. Nothing changes unless every row is valid.
    pub async fn update_installments(
        &self,
        profile_id: i32,
        actor: Option<i32>,
        request: UpdateInstallmentsRequest,
    ) -> AppResult<Vec<InstallmentResponse>> {
        let ctx = load_profile_context(&self.pool, profile_id).await?;

        let mut errors = FieldErrors::new();
        let mut statuses = Vec::with_capacity(request.installments.len());
        for (i, item) in request.installments.iter().enumerate() {
            if item.amount <= 0 {
                errors.add(&format!("installments[{i}].amount"), "Amount must be positive");
            }
            let status = match item.status.as_deref() {
                Some(raw) => parse_choice_field::<InstallmentStatus>(raw, &format!("installments[{i}].status"), &mut errors),
                None => Some(InstallmentStatus::Pending),
            };
            statuses.push(status.unwrap_or(InstallmentStatus::Pending));
            if let Some(tx_id) = item.transaction_id {
                check_settling_transaction(
                    &self.pool,
                    tx_id,
                    ctx.profile.user_id,
                    &format!("installments[{i}].transaction_id"),
                    &mut errors,
                )
                .await?;
            }
        }
        errors.into_result()?;

        let txn = self.pool.begin().await?;
        installments::Entity::delete_many()
            .filter(installments::Column::ProfileId.eq(profile_id))
            .exec(&txn)
            .await?;
        let now = Utc::now();
        let count = request.installments.len();
        for (item, status) in request.installments.into_iter().zip(statuses) {
            installments::ActiveModel {
                profile_id: Set(profile_id),
                transaction_id: Set(item.transaction_id),
                due_amount: Set(item.amount),
                due_date: Set(item.due_date),
                status: Set(status),
                is_splited: Set(item.is_splited),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        write_log(
            &txn,
            actions::UPDATE_INSTALLMENTS,
            actor,
            Some(profile_id),
            format!("اقساط هنرجو {} به {} قسط به‌روزرسانی شد", ctx.student_ref(), count),
            None,
        )
        .await?;
        txn.commit().await?;

        self.profile_installments(profile_id).await
    }

    /// Splits what is still owed for the term into a fresh schedule,
    /// replacing pending installments and keeping paid or refunded ones.
    pub async fn generate_installments(
        &self,
        profile_id: i32,
        actor: Option<i32>,
        request: GenerateInstallmentsRequest,
    ) -> AppResult<Vec<InstallmentResponse>> {
        let ctx = load_profile_context(&self.pool, profile_id).await?;

        let mut errors = FieldErrors::new();
        if request.count == 0 || request.count > MAX_INSTALLMENTS {
            errors.add("count", format!("Must be between 1 and {MAX_INSTALLMENTS}"));
        }
        if request.interval_months == 0 {
            errors.add("interval_months", "Must be at least 1");
        }
        if ctx.term.is_none() {
            errors.add("term_id", "Profile has no term to bill");
        }
        errors.into_result()?;
        let term_price = ctx.term.as_ref().map(|t| t.price).unwrap_or(0);
        let dates = schedule_dates(request.start_date, request.count, request.interval_months)?;

        let txn = self.pool.begin().await?;
        let discount = match request.discount_code.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(code) => consume_code(&txn, code).await?.installment_price.unwrap_or(0),
            None => 0,
        };
        let already_paid: i64 = installments::Entity::find()
            .filter(installments::Column::ProfileId.eq(profile_id))
            .filter(installments::Column::Status.eq(InstallmentStatus::Paid))
            .all(&txn)
            .await?
            .iter()
            .map(|i| i.due_amount)
            .sum();
        let due = term_price - discount - already_paid;
        if due <= 0 {
            // dropping the transaction rolls back the discount usage
            return Err(AppError::ValidationError("Nothing is left to pay for this profile".to_string()));
        }
        if due < i64::from(request.count) {
            return Err(AppError::field(
                "count",
                format!("Only {due} is left to pay, which cannot be split into {} installments", request.count),
            ));
        }

        installments::Entity::delete_many()
            .filter(installments::Column::ProfileId.eq(profile_id))
            .filter(installments::Column::Status.eq(InstallmentStatus::Pending))
            .exec(&txn)
            .await?;
        let now = Utc::now();
        let split = request.count > 1;
        for (amount, due_date) in split_amount(due, request.count).into_iter().zip(dates) {
            installments::ActiveModel {
                profile_id: Set(profile_id),
                transaction_id: Set(None),
                due_amount: Set(amount),
                due_date: Set(due_date),
                status: Set(InstallmentStatus::Pending),
                is_splited: Set(split),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        write_log(
            &txn,
            actions::GENERATE_INSTALLMENTS,
            actor,
            Some(profile_id),
            format!(
                "مبلغ {} برای هنرجو {} در {} قسط تقسیم شد",
                due,
                ctx.student_ref(),
                request.count
            ),
            None,
        )
        .await?;
        txn.commit().await?;

        self.profile_installments(profile_id).await
    }

    async fn find_transaction(&self, id: i32) -> AppResult<transactions::Model> {
        transactions::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    async fn find_installment(&self, id: i32) -> AppResult<installments::Model> {
        installments::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Installment not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::discount_code_entity;
    use crate::test_utils::*;
    use chrono::Duration;

    #[test]
    fn test_split_amount_remainder_on_last() {
        assert_eq!(split_amount(100, 3), vec![33, 33, 34]);
        assert_eq!(split_amount(90, 3), vec![30, 30, 30]);
        assert_eq!(split_amount(3, 3), vec![1, 1, 1]);
        assert!(split_amount(10, 0).is_empty());
        for count in 1..=12 {
            assert_eq!(split_amount(9_000_001, count).iter().sum::<i64>(), 9_000_001);
        }
    }

    #[test]
    fn test_schedule_dates_clamp_month_end() {
        let dates = schedule_dates(date(2025, 1, 31), 3, 1).unwrap();
        assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)]);
        let quarterly = schedule_dates(date(2025, 10, 1), 2, 3).unwrap();
        assert_eq!(quarterly, vec![date(2025, 10, 1), date(2026, 1, 1)]);
    }

    #[test]
    fn test_sort_timeline_newest_first() {
        let entry = |id: &str, day: NaiveDate| PaymentEntry {
            id: id.into(),
            kind: PaymentKind::Installment,
            type_label: String::new(),
            amount: 1,
            date: format_date(day),
            method: String::new(),
            status: String::new(),
            payment_status: String::new(),
            transaction_id: None,
            due_date: None,
            sort_key: day,
        };
        let mut entries = vec![
            entry("a", date(2025, 1, 1)),
            entry("b", date(2025, 3, 1)),
            entry("c", date(2025, 2, 1)),
        ];
        sort_timeline(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_generate_installments_sums_to_amount_due() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let service = PaymentService::new(db.clone());

        // one installment already paid is kept and subtracted
        service
            .create_installment(CreateInstallmentRequest {
                profile_id: profile.id,
                due_amount: 1_000_000,
                due_date: date(2025, 8, 1),
                status: Some("paid".into()),
                transaction_id: None,
                is_splited: false,
            })
            .await
            .unwrap();
        let now = Utc::now();
        discount_code_entity::ActiveModel {
            code: Set("EARLY".into()),
            cash_price: Set(None),
            installment_price: Set(Some(500_000)),
            max_usage: Set(1),
            usage_count: Set(0),
            expiration_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let plan = service
            .generate_installments(
                profile.id,
                None,
                GenerateInstallmentsRequest {
                    count: 3,
                    start_date: date(2025, 9, 1),
                    interval_months: 1,
                    discount_code: Some("early".into()),
                },
            )
            .await
            .unwrap();
        let pending: Vec<&InstallmentResponse> =
            plan.iter().filter(|i| i.status == InstallmentStatus::Pending).collect();
        assert_eq!(pending.len(), 3);
        // 9_000_000 - 500_000 - 1_000_000
        assert_eq!(pending.iter().map(|i| i.due_amount).sum::<i64>(), 7_500_000);
        assert_eq!(pending[2].due_date, date(2025, 11, 1));
        assert!(pending.iter().all(|i| i.is_splited));
        assert_eq!(plan.len(), 4);

        // the code is used up now
        let again = service
            .generate_installments(
                profile.id,
                None,
                GenerateInstallmentsRequest {
                    count: 2,
                    start_date: date(2025, 9, 1),
                    interval_months: 1,
                    discount_code: Some("EARLY".into()),
                },
            )
            .await;
        assert!(matches!(again, Err(AppError::FieldValidation(e)) if e.contains("discount_code")));
    }

    #[tokio::test]
    async fn test_generate_rejects_more_installments_than_left_to_pay() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let service = PaymentService::new(db.clone());

        let pending = service
            .create_installment(CreateInstallmentRequest {
                profile_id: profile.id,
                due_amount: 3_000_000,
                due_date: date(2025, 9, 1),
                status: None,
                transaction_id: None,
                is_splited: false,
            })
            .await
            .unwrap();
        service
            .create_installment(CreateInstallmentRequest {
                profile_id: profile.id,
                due_amount: 8_999_998,
                due_date: date(2025, 8, 1),
                status: Some("paid".into()),
                transaction_id: None,
                is_splited: false,
            })
            .await
            .unwrap();

        let request = |count| GenerateInstallmentsRequest {
            count,
            start_date: date(2025, 9, 1),
            interval_months: 1,
            discount_code: None,
        };
        let result = service.generate_installments(profile.id, None, request(3)).await;
        assert!(matches!(result, Err(AppError::FieldValidation(e)) if e.contains("count")));
        // rejected before touching the existing schedule
        assert!(installments::Entity::find_by_id(pending.id).one(&db).await.unwrap().is_some());

        let plan = service.generate_installments(profile.id, None, request(2)).await.unwrap();
        let amounts: Vec<i64> = plan
            .iter()
            .filter(|i| i.status == InstallmentStatus::Pending)
            .map(|i| i.due_amount)
            .collect();
        assert_eq!(amounts, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_installment_cannot_use_other_students_transaction() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let stranger = create_user(&db, "09127654321").await;
        let foreign = create_transaction(&db, stranger.id, 1_000).await;
        let service = PaymentService::new(db.clone());

        let result = service
            .update_installments(
                profile.id,
                None,
                UpdateInstallmentsRequest {
                    installments: vec![
                        InstallmentInput {
                            amount: 1_000,
                            due_date: date(2025, 9, 1),
                            status: Some("paid".into()),
                            transaction_id: Some(foreign.id),
                            is_splited: false,
                        },
                        InstallmentInput {
                            amount: 2_000,
                            due_date: date(2025, 10, 1),
                            status: Some("late".into()),
                            transaction_id: None,
                            is_splited: false,
                        },
                    ],
                },
            )
            .await;
        match result {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains("installments[0].transaction_id"));
                assert!(errors.contains("installments[1].status"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }
        assert!(service.profile_installments(profile.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_timeline_and_days_remaining() {
        let db = setup_test_db().await;
        let (user, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let own = create_transaction(&db, user.id, 3_000_000).await;
        let service = PaymentService::new(db.clone());

        let due = today() + Duration::days(10);
        let plan = service
            .update_installments(
                profile.id,
                None,
                UpdateInstallmentsRequest {
                    installments: vec![
                        InstallmentInput {
                            amount: 3_000_000,
                            due_date: today() - Duration::days(30),
                            status: Some("پرداخت شده".into()),
                            transaction_id: Some(own.id),
                            is_splited: true,
                        },
                        InstallmentInput {
                            amount: 6_000_000,
                            due_date: due,
                            status: None,
                            transaction_id: None,
                            is_splited: true,
                        },
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(plan[1].days_remaining, 10);
        assert_eq!(plan[1].payment_status, "در انتظار");
        assert_eq!(plan[0].course_status, "فعال");

        let timeline = service.profile_payments(profile.id).await.unwrap();
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].id, format!("installment_{}", plan[1].id));
        assert_eq!(timeline[1].id, format!("transaction_{}", own.id));
        assert!(timeline.windows(2).all(|w| w[0].sort_key >= w[1].sort_key));

        let logs = crate::entities::log_entity::Entity::find().all(&db).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, actions::UPDATE_INSTALLMENTS);
    }

    #[tokio::test]
    async fn test_verify_transaction_and_notes() {
        let db = setup_test_db().await;
        let user = create_user(&db, "09121234567").await;
        let staff = create_staff(&db, "09120000001", false).await;
        let tx = create_transaction(&db, user.id, 500).await;
        let service = PaymentService::new(db);

        let bad = service
            .verify_transaction(tx.id, VerifyTransactionRequest { status: "approved".into() })
            .await;
        assert!(matches!(bad, Err(AppError::FieldValidation(_))));

        let verified = service
            .verify_transaction(tx.id, VerifyTransactionRequest { status: "valid".into() })
            .await
            .unwrap();
        assert_eq!(verified.verification_status, VerificationStatus::Valid);
        assert!(verified.verification_timestamp.is_some());
        assert_eq!(verified.tracking_number, UNKNOWN_LABEL);

        let with_note = service
            .add_transaction_note(tx.id, Some(staff.id), AddTransactionNoteRequest { note: "Checked receipt".into() })
            .await
            .unwrap();
        assert_eq!(with_note.notes.len(), 1);
        assert_eq!(with_note.notes[0].author, staff.full_name());
    }
}
