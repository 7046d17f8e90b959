use crate::entities::apollonyar_entity as apollonyars;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::utils::{canonical_phone, hash_password, normalize_phone, validate_password};
use chrono::Utc;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct ApollonyarService {
    pool: DatabaseConnection,
}

impl ApollonyarService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_apollonyars(
        &self,
        query: &ApollonyarQuery,
    ) -> AppResult<PaginatedResponse<ApollonyarResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = apollonyars::Entity::find();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(apollonyars::Column::FirstName.contains(search))
                    .add(apollonyars::Column::LastName.contains(search))
                    .add(apollonyars::Column::PhoneNumber.contains(normalize_phone(search))),
            );
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_asc(apollonyars::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ApollonyarResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_apollonyar(&self, id: i32) -> AppResult<ApollonyarResponse> {
        Ok(self.find(id).await?.into())
    }

    pub async fn create_apollonyar(
        &self,
        request: CreateApollonyarRequest,
    ) -> AppResult<ApollonyarResponse> {
        let mut errors = FieldErrors::new();
        if request.first_name.trim().is_empty() {
            errors.add("first_name", "This field is required");
        }
        if request.last_name.trim().is_empty() {
            errors.add("last_name", "This field is required");
        }
        let phone = match canonical_phone(&request.phone_number) {
            Ok(phone) => {
                if self.phone_taken(&phone, None).await? {
                    errors.add("phone_number", "Phone number is already in use");
                }
                phone
            }
            Err(_) => {
                errors.add("phone_number", "Invalid mobile number, expected 09xxxxxxxxx");
                String::new()
            }
        };
        if let Err(AppError::FieldValidation(pw)) = validate_password(&request.password) {
            for (field, msgs) in pw.0 {
                for msg in msgs {
                    errors.add(&field, msg);
                }
            }
        }
        errors.into_result()?;

        let now = Utc::now();
        let staff = apollonyars::ActiveModel {
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            phone_number: Set(phone),
            password_hash: Set(hash_password(&request.password)?),
            telegram_id: Set(request.telegram_id),
            is_admin: Set(request.is_admin),
            is_blocked: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created apollonyar {} (admin={})", staff.id, staff.is_admin);
        Ok(staff.into())
    }

    pub async fn update_apollonyar(
        &self,
        id: i32,
        request: UpdateApollonyarRequest,
    ) -> AppResult<ApollonyarResponse> {
        let existing = self.find(id).await?;
        let mut model = existing.into_active_model();

        if let Some(raw) = request.phone_number.as_deref() {
            let phone = canonical_phone(raw)?;
            if self.phone_taken(&phone, Some(id)).await? {
                return Err(AppError::field("phone_number", "Phone number is already in use"));
            }
            model.phone_number = Set(phone);
        }
        if let Some(password) = request.password.as_deref() {
            validate_password(password)?;
            model.password_hash = Set(hash_password(password)?);
        }
        if let Some(v) = request.first_name {
            model.first_name = Set(v.trim().to_string());
        }
        if let Some(v) = request.last_name {
            model.last_name = Set(v.trim().to_string());
        }
        if request.telegram_id.is_some() {
            model.telegram_id = Set(request.telegram_id);
        }
        if let Some(v) = request.is_admin {
            model.is_admin = Set(v);
        }
        if let Some(v) = request.is_blocked {
            model.is_blocked = Set(v);
        }
        model.updated_at = Set(Utc::now());

        Ok(model.update(&self.pool).await?.into())
    }

    /// Profiles, notes and logs keep their rows with the reference cleared.
    pub async fn delete_apollonyar(&self, id: i32) -> AppResult<()> {
        let result = apollonyars::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Apollonyar not found".to_string()));
        }
        log::info!("Deleted apollonyar {id}");
        Ok(())
    }

    async fn find(&self, id: i32) -> AppResult<apollonyars::Model> {
        apollonyars::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Apollonyar not found".to_string()))
    }

    async fn phone_taken(&self, phone: &str, except: Option<i32>) -> AppResult<bool> {
        let mut select =
            apollonyars::Entity::find().filter(apollonyars::Column::PhoneNumber.eq(phone));
        if let Some(id) = except {
            select = select.filter(apollonyars::Column::Id.ne(id));
        }
        Ok(select.count(&self.pool).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_validates_and_blocks() {
        let db = setup_test_db().await;
        let service = ApollonyarService::new(db.clone());

        let bad = service
            .create_apollonyar(CreateApollonyarRequest {
                first_name: " ".into(),
                last_name: "Rahimi".into(),
                phone_number: "123".into(),
                password: "short".into(),
                telegram_id: None,
                is_admin: false,
            })
            .await;
        match bad {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains("first_name"));
                assert!(errors.contains("phone_number"));
                assert!(errors.contains("password"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }

        let existing = create_staff(&db, "09120000001", false).await;
        let updated = service
            .update_apollonyar(
                existing.id,
                UpdateApollonyarRequest {
                    is_blocked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_blocked);
    }

    #[tokio::test]
    async fn test_delete_clears_profile_reference() {
        let db = setup_test_db().await;
        let (_, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let staff = create_staff(&db, "09120000001", false).await;
        let mut model: crate::entities::profile_entity::ActiveModel = profile.clone().into();
        model.apollonyar_id = Set(Some(staff.id));
        model.update(&db).await.unwrap();

        ApollonyarService::new(db.clone())
            .delete_apollonyar(staff.id)
            .await
            .unwrap();
        let reloaded = crate::entities::profile_entity::Entity::find_by_id(profile.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.apollonyar_id, None);
    }
}
