use crate::entities::{Choice, Sex, user_entity as users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::*;
use crate::utils::{canonical_phone, normalize_phone};
use chrono::Utc;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self, query: &UserQuery) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = users::Entity::find();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let phone = normalize_phone(search);
            select = select.filter(
                Condition::any()
                    .add(users::Column::FirstName.contains(search))
                    .add(users::Column::LastName.contains(search))
                    .add(users::Column::PhoneNumber.contains(&phone)),
            );
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(users::Column::IsActive.eq(is_active));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_user(&self, id: i32) -> AppResult<UserResponse> {
        Ok(self.find(id).await?.into())
    }

    /// Staff-created students have no password until they register or use OTP.
    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<UserResponse> {
        let mut errors = FieldErrors::new();
        let phone = match canonical_phone(&request.phone_number) {
            Ok(phone) => Some(phone),
            Err(_) => {
                errors.add("phone_number", "Invalid mobile number, expected 09xxxxxxxxx");
                None
            }
        };
        let sex = parse_sex(request.sex.as_deref(), &mut errors);
        if let Some(phone) = &phone
            && self.phone_taken(phone, None).await?
        {
            errors.add("phone_number", "Phone number is already registered");
        }
        errors.into_result()?;

        let now = Utc::now();
        let user = users::ActiveModel {
            phone_number: Set(phone.unwrap_or_default()),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            email: Set(request.email.trim().to_string()),
            is_active: Set(true),
            phone_2_number: Set(request.phone_2_number),
            sex: Set(sex),
            birthday: Set(request.birthday),
            country: Set(request.country),
            state_province: Set(request.state_province),
            city: Set(request.city),
            full_address: Set(request.full_address),
            postal_code: Set(request.postal_code),
            photo: Set(request.photo),
            password_hash: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created user {}", user.id);
        Ok(user.into())
    }

    pub async fn update_user(&self, id: i32, request: UpdateUserRequest) -> AppResult<UserResponse> {
        let existing = self.find(id).await?;

        let mut errors = FieldErrors::new();
        let phone = match request.phone_number.as_deref() {
            Some(raw) => match canonical_phone(raw) {
                Ok(phone) => {
                    if self.phone_taken(&phone, Some(id)).await? {
                        errors.add("phone_number", "Phone number is already registered");
                    }
                    Some(phone)
                }
                Err(_) => {
                    errors.add("phone_number", "Invalid mobile number, expected 09xxxxxxxxx");
                    None
                }
            },
            None => None,
        };
        let sex = parse_sex(request.sex.as_deref(), &mut errors);
        errors.into_result()?;

        let mut model = existing.into_active_model();
        if let Some(phone) = phone {
            model.phone_number = Set(phone);
        }
        if let Some(v) = request.first_name {
            model.first_name = Set(v.trim().to_string());
        }
        if let Some(v) = request.last_name {
            model.last_name = Set(v.trim().to_string());
        }
        if let Some(v) = request.email {
            model.email = Set(v.trim().to_string());
        }
        if let Some(v) = request.is_active {
            model.is_active = Set(v);
        }
        if request.phone_2_number.is_some() {
            model.phone_2_number = Set(request.phone_2_number);
        }
        if sex.is_some() {
            model.sex = Set(sex);
        }
        if request.birthday.is_some() {
            model.birthday = Set(request.birthday);
        }
        if request.country.is_some() {
            model.country = Set(request.country);
        }
        if request.state_province.is_some() {
            model.state_province = Set(request.state_province);
        }
        if request.city.is_some() {
            model.city = Set(request.city);
        }
        if request.full_address.is_some() {
            model.full_address = Set(request.full_address);
        }
        if request.postal_code.is_some() {
            model.postal_code = Set(request.postal_code);
        }
        if request.photo.is_some() {
            model.photo = Set(request.photo);
        }
        model.updated_at = Set(Utc::now());

        Ok(model.update(&self.pool).await?.into())
    }

    /// Removes the student together with profiles and transactions.
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let result = users::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        log::info!("Deleted user {id}");
        Ok(())
    }

    async fn find(&self, id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn phone_taken(&self, phone: &str, except: Option<i32>) -> AppResult<bool> {
        let mut select = users::Entity::find().filter(users::Column::PhoneNumber.eq(phone));
        if let Some(id) = except {
            select = select.filter(users::Column::Id.ne(id));
        }
        Ok(select.count(&self.pool).await? > 0)
    }
}

fn parse_sex(raw: Option<&str>, errors: &mut FieldErrors) -> Option<Sex> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let sex = Sex::parse_choice(raw);
    if sex.is_none() {
        errors.add("sex", format!("Expected one of: {}", Sex::allowed_values()));
    }
    sex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn new_user(phone: &str) -> CreateUserRequest {
        CreateUserRequest {
            phone_number: phone.into(),
            first_name: "Ali".into(),
            last_name: "Karimi".into(),
            email: String::new(),
            phone_2_number: None,
            sex: Some("مرد".into()),
            birthday: Some(date(2001, 5, 2)),
            country: None,
            state_province: None,
            city: Some("Tehran".into()),
            full_address: None,
            postal_code: None,
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_create_search_update() {
        let db = setup_test_db().await;
        let service = UserService::new(db);

        let created = service.create_user(new_user("+989121234567")).await.unwrap();
        assert_eq!(created.phone_number, "09121234567");
        assert_eq!(created.sex, Some(Sex::Male));
        assert!(!created.has_password);

        let found = service
            .list_users(&UserQuery {
                page: None,
                per_page: None,
                search: Some("Kari".into()),
                is_active: None,
            })
            .await
            .unwrap();
        assert_eq!(found.total, 1);

        let updated = service
            .update_user(
                created.id,
                UpdateUserRequest {
                    city: Some("Shiraz".into()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Shiraz"));
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_create_collects_field_errors() {
        let db = setup_test_db().await;
        let service = UserService::new(db);
        service.create_user(new_user("09121234567")).await.unwrap();

        let mut dup = new_user("09121234567");
        dup.sex = Some("other".into());
        match service.create_user(dup).await {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains("phone_number"));
                assert!(errors.contains("sex"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_cascades_profiles() {
        let db = setup_test_db().await;
        let (user, _, _, profile) = enrolled_student(&db, "09121234567").await;
        let service = UserService::new(db.clone());

        service.delete_user(user.id).await.unwrap();
        let left = crate::entities::profile_entity::Entity::find_by_id(profile.id)
            .one(&db)
            .await
            .unwrap();
        assert!(left.is_none());
        assert!(matches!(service.delete_user(user.id).await, Err(AppError::NotFound(_))));
    }
}
