use crate::entities::discount_code_entity as discount_codes;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::utils::generate_discount_code;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const GENERATED_CODE_LEN: usize = 8;
const DEFAULT_MAX_USAGE: i32 = 1;

/// Looks up a code that can be applied right now and bumps its usage.
/// Runs on the caller's connection so the usage commits with the payment plan.
pub async fn consume_code<C: ConnectionTrait>(db: &C, code: &str) -> AppResult<discount_codes::Model> {
    let found = discount_codes::Entity::find()
        .filter(discount_codes::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await?
        .ok_or_else(|| AppError::field("discount_code", "Discount code does not exist"))?;

    if found.is_expired(Utc::now()) {
        return Err(AppError::field("discount_code", "Discount code has expired"));
    }
    if found.is_exhausted() {
        return Err(AppError::field("discount_code", "Discount code has no uses left"));
    }

    let mut model = found.clone().into_active_model();
    model.usage_count = Set(found.usage_count + 1);
    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Clone)]
pub struct DiscountCodeService {
    pool: DatabaseConnection,
}

impl DiscountCodeService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_codes(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<DiscountCodeResponse>> {
        let total = discount_codes::Entity::find().count(&self.pool).await?;
        let now = Utc::now();
        let items = discount_codes::Entity::find()
            .order_by_desc(discount_codes::Column::CreatedAt)
            .order_by_desc(discount_codes::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|c| DiscountCodeResponse::new(c, now))
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_code(&self, id: i32) -> AppResult<DiscountCodeResponse> {
        Ok(DiscountCodeResponse::new(self.find(id).await?, Utc::now()))
    }

    /// A random code is generated when none is given.
    pub async fn create_code(&self, request: CreateDiscountCodeRequest) -> AppResult<DiscountCodeResponse> {
        let code = match request.code.as_deref().map(normalize_code).filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => self.unused_random_code().await?,
        };

        let mut errors = FieldErrors::new();
        self.check_code_free(&code, None, &mut errors).await?;
        check_amounts(request.cash_price, request.installment_price, request.max_usage, &mut errors);
        errors.into_result()?;

        let now = Utc::now();
        let created = discount_codes::ActiveModel {
            code: Set(code),
            cash_price: Set(request.cash_price),
            installment_price: Set(request.installment_price),
            max_usage: Set(request.max_usage.unwrap_or(DEFAULT_MAX_USAGE)),
            usage_count: Set(0),
            expiration_date: Set(request.expiration_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Created discount code {}", created.code);
        Ok(DiscountCodeResponse::new(created, now))
    }

    pub async fn update_code(
        &self,
        id: i32,
        request: UpdateDiscountCodeRequest,
    ) -> AppResult<DiscountCodeResponse> {
        let existing = self.find(id).await?;

        let mut errors = FieldErrors::new();
        let code = request.code.as_deref().map(normalize_code);
        if let Some(code) = &code {
            if code.is_empty() {
                errors.add("code", "This field is required");
            } else {
                self.check_code_free(code, Some(id), &mut errors).await?;
            }
        }
        check_amounts(request.cash_price, request.installment_price, request.max_usage, &mut errors);
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(code) = code {
            model.code = Set(code);
        }
        if request.cash_price.is_some() {
            model.cash_price = Set(request.cash_price);
        }
        if request.installment_price.is_some() {
            model.installment_price = Set(request.installment_price);
        }
        if let Some(max_usage) = request.max_usage {
            model.max_usage = Set(max_usage);
        }
        if request.expiration_date.is_some() {
            model.expiration_date = Set(request.expiration_date);
        }
        model.updated_at = Set(Utc::now());
        Ok(DiscountCodeResponse::new(model.update(&self.pool).await?, Utc::now()))
    }

    pub async fn delete_code(&self, id: i32) -> AppResult<()> {
        let result = discount_codes::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Discount code not found".to_string()));
        }
        Ok(())
    }

    /// Reports whether a code can be applied now, without consuming it.
    pub async fn validate_code(&self, request: ValidateDiscountCodeRequest) -> AppResult<DiscountValidationResponse> {
        let code = normalize_code(&request.code);
        let found = discount_codes::Entity::find()
            .filter(discount_codes::Column::Code.eq(&code))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Discount code not found".to_string()))?;

        let now = Utc::now();
        let reason = if found.is_expired(now) {
            Some("expired".to_string())
        } else if found.is_exhausted() {
            Some("usage_limit_reached".to_string())
        } else {
            None
        };

        Ok(DiscountValidationResponse {
            valid: reason.is_none(),
            reason,
            remaining_uses: (found.max_usage - found.usage_count).max(0),
            cash_price: found.cash_price,
            installment_price: found.installment_price,
            code: found.code,
        })
    }

    async fn find(&self, id: i32) -> AppResult<discount_codes::Model> {
        discount_codes::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Discount code not found".to_string()))
    }

    async fn check_code_free(&self, code: &str, except: Option<i32>, errors: &mut FieldErrors) -> AppResult<()> {
        let mut select = discount_codes::Entity::find().filter(discount_codes::Column::Code.eq(code));
        if let Some(id) = except {
            select = select.filter(discount_codes::Column::Id.ne(id));
        }
        if select.count(&self.pool).await? > 0 {
            errors.add("code", "Discount code already exists");
        }
        Ok(())
    }

    async fn unused_random_code(&self) -> AppResult<String> {
        for _ in 0..10 {
            let code = generate_discount_code(GENERATED_CODE_LEN);
            let taken = discount_codes::Entity::find()
                .filter(discount_codes::Column::Code.eq(&code))
                .count(&self.pool)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
        }
        Err(AppError::InternalError("Could not generate a unique discount code".to_string()))
    }
}

fn check_amounts(
    cash_price: Option<i64>,
    installment_price: Option<i64>,
    max_usage: Option<i32>,
    errors: &mut FieldErrors,
) {
    if cash_price.is_some_and(|p| p < 0) {
        errors.add("cash_price", "Amount cannot be negative");
    }
    if installment_price.is_some_and(|p| p < 0) {
        errors.add("installment_price", "Amount cannot be negative");
    }
    if max_usage.is_some_and(|m| m < 1) {
        errors.add("max_usage", "Must be at least 1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn request(code: Option<&str>) -> CreateDiscountCodeRequest {
        CreateDiscountCodeRequest {
            code: code.map(Into::into),
            cash_price: Some(500_000),
            installment_price: Some(300_000),
            max_usage: Some(1),
            expiration_date: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = setup_test_db().await;
        let service = DiscountCodeService::new(db);
        let created = service.create_code(request(Some("spring25"))).await.unwrap();
        assert_eq!(created.code, "SPRING25");

        let dup = service.create_code(request(Some("SPRING25"))).await;
        assert!(matches!(dup, Err(AppError::FieldValidation(e)) if e.contains("code")));

        let generated = service.create_code(request(None)).await.unwrap();
        assert_eq!(generated.code.len(), GENERATED_CODE_LEN);
    }

    #[tokio::test]
    async fn test_consume_respects_limits() {
        let db = setup_test_db().await;
        let service = DiscountCodeService::new(db.clone());
        service.create_code(request(Some("ONCE"))).await.unwrap();

        let used = consume_code(&db, "once").await.unwrap();
        assert_eq!(used.usage_count, 1);
        assert!(consume_code(&db, "ONCE").await.is_err());

        let report = service
            .validate_code(ValidateDiscountCodeRequest { code: "ONCE".into() })
            .await
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason.as_deref(), Some("usage_limit_reached"));
        assert_eq!(report.remaining_uses, 0);
    }

    #[tokio::test]
    async fn test_expired_code_is_invalid() {
        let db = setup_test_db().await;
        let service = DiscountCodeService::new(db.clone());
        let mut req = request(Some("OLD"));
        req.expiration_date = Some(Utc::now() - Duration::days(1));
        req.max_usage = Some(5);
        service.create_code(req).await.unwrap();

        let report = service
            .validate_code(ValidateDiscountCodeRequest { code: "old".into() })
            .await
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason.as_deref(), Some("expired"));
        assert!(consume_code(&db, "OLD").await.is_err());
    }
}
