use crate::config::{BootstrapConfig, OtpConfig};
use crate::entities::{apollonyar_entity as apollonyars, otp_code_entity as otp_codes, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    otp: OtpConfig,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, otp: OtpConfig) -> Self {
        Self {
            pool,
            jwt_service,
            otp,
        }
    }

    /// Issues a fresh one-time code for a phone, replacing older ones.
    pub async fn request_otp(&self, request: OtpRequest) -> AppResult<OtpRequestResponse> {
        let phone = canonical_phone(&request.phone_number)?;
        let now = Utc::now();

        // rate limit on the newest outstanding code
        let latest = otp_codes::Entity::find()
            .filter(otp_codes::Column::PhoneNumber.eq(&phone))
            .order_by_desc(otp_codes::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        if let Some(latest) = latest
            && now.signed_duration_since(latest.created_at) < Duration::seconds(self.otp.resend_interval)
        {
            return Err(AppError::ValidationError(format!(
                "Please wait {} seconds before requesting a new code",
                self.otp.resend_interval
            )));
        }

        otp_codes::Entity::delete_many()
            .filter(otp_codes::Column::PhoneNumber.eq(&phone))
            .exec(&self.pool)
            .await?;

        let code = generate_otp_code();
        otp_codes::ActiveModel {
            phone_number: Set(phone.clone()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::seconds(self.otp.expires_in)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        // no SMS gateway: the code goes to the operator log
        log::info!("OTP for {phone}: {code}");

        Ok(OtpRequestResponse {
            expires_in: self.otp.expires_in,
            resend_interval: self.otp.resend_interval,
            code: self.otp.expose_code.then_some(code),
        })
    }

    /// Consumes a code and signs the student in, creating the account if needed.
    pub async fn verify_otp(&self, request: OtpVerifyRequest) -> AppResult<AuthResponse> {
        let phone = canonical_phone(&request.phone_number)?;
        let now = Utc::now();

        let stored = otp_codes::Entity::find()
            .filter(otp_codes::Column::PhoneNumber.eq(&phone))
            .filter(otp_codes::Column::Code.eq(request.code.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::field("code", "Invalid code"))?;

        if stored.is_expired(now) {
            otp_codes::Entity::delete_by_id(stored.id)
                .exec(&self.pool)
                .await?;
            return Err(AppError::field("code", "Code has expired"));
        }

        otp_codes::Entity::delete_by_id(stored.id)
            .exec(&self.pool)
            .await?;

        let existing = users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(&phone))
            .one(&self.pool)
            .await?;
        let (user, is_new_user) = match existing {
            Some(user) => (user, false),
            None => {
                let user = users::ActiveModel {
                    phone_number: Set(phone.clone()),
                    first_name: Set(String::new()),
                    last_name: Set(String::new()),
                    email: Set(String::new()),
                    is_active: Set(true),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
                log::info!("Created user {} on first OTP login", user.id);
                (user, true)
            }
        };

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        let mut response = self.student_tokens(user)?;
        response.is_new_user = Some(is_new_user);
        Ok(response)
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let phone = canonical_phone(&request.phone_number)?;
        validate_password(&request.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(&phone))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::field("phone_number", "Phone number is already registered"));
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let user = users::ActiveModel {
            phone_number: Set(phone),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            email: Set(request.email.trim().to_string()),
            is_active: Set(true),
            password_hash: Set(Some(password_hash)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Registered user {}", user.id);
        self.student_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let phone = normalize_phone(&request.phone_number);

        let user = users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(&phone))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid phone number or password".to_string()))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::AuthError("Invalid phone number or password".to_string()))?;
        if !verify_password(&request.password, hash)? {
            return Err(AppError::AuthError("Invalid phone number or password".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        self.student_tokens(user)
    }

    pub async fn staff_login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let phone = normalize_phone(&request.phone_number);

        let staff = apollonyars::Entity::find()
            .filter(apollonyars::Column::PhoneNumber.eq(&phone))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid phone number or password".to_string()))?;

        if !verify_password(&request.password, &staff.password_hash)? {
            return Err(AppError::AuthError("Invalid phone number or password".to_string()));
        }
        if staff.is_blocked {
            log::warn!("Blocked apollonyar {} tried to log in", staff.id);
            return Err(AppError::Forbidden);
        }

        self.staff_tokens(staff)
    }

    /// Exchanges a refresh token for a new access token. The role is read
    /// again from the database so revoked admin rights take effect.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<RefreshTokenResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let id = claims.subject_id()?;

        let access_token = match claims.role {
            Role::Student => {
                let user = self.active_user(id).await?;
                self.jwt_service
                    .generate_access_token(user.id, Role::Student, &user.phone_number)?
            }
            Role::Staff | Role::Admin => {
                let staff = self.active_staff(id).await?;
                self.jwt_service
                    .generate_access_token(staff.id, staff_role(&staff), &staff.phone_number)?
            }
        };

        Ok(RefreshTokenResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn me(&self, id: i32, role: Role) -> AppResult<MeResponse> {
        match role {
            Role::Student => {
                let user = self.active_user(id).await?;
                Ok(MeResponse {
                    role,
                    user: Some(UserResponse::from(user)),
                    staff: None,
                })
            }
            Role::Staff | Role::Admin => {
                let staff = self.active_staff(id).await?;
                Ok(MeResponse {
                    role: staff_role(&staff),
                    user: None,
                    staff: Some(ApollonyarResponse::from(staff)),
                })
            }
        }
    }

    /// Role of an unblocked apollonyar as stored now, not as issued in the token
    pub async fn current_staff_role(&self, id: i32) -> AppResult<Role> {
        let staff = self.active_staff(id).await?;
        Ok(staff_role(&staff))
    }

    /// Makes sure the configured admin account exists and can log in.
    pub async fn ensure_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<()> {
        let (Some(phone), Some(password)) = (&bootstrap.admin_phone, &bootstrap.admin_password)
        else {
            return Ok(());
        };
        let phone = canonical_phone(phone)?;

        let existing = apollonyars::Entity::find()
            .filter(apollonyars::Column::PhoneNumber.eq(&phone))
            .one(&self.pool)
            .await?;
        if let Some(existing) = existing {
            if !existing.is_admin || existing.is_blocked {
                let mut model: apollonyars::ActiveModel = existing.into();
                model.is_admin = Set(true);
                model.is_blocked = Set(false);
                model.updated_at = Set(Utc::now());
                model.update(&self.pool).await?;
                log::info!("Restored admin rights for {phone}");
            }
            return Ok(());
        }

        let now = Utc::now();
        apollonyars::ActiveModel {
            first_name: Set(bootstrap.admin_first_name.clone().unwrap_or_else(|| "مدیر".to_string())),
            last_name: Set(bootstrap.admin_last_name.clone().unwrap_or_else(|| "سیستم".to_string())),
            phone_number: Set(phone.clone()),
            password_hash: Set(hash_password(password)?),
            telegram_id: Set(None),
            is_admin: Set(true),
            is_blocked: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Bootstrapped admin apollonyar {phone}");
        Ok(())
    }

    /// Deletes expired codes; returns how many were removed.
    pub async fn purge_expired_otps(&self) -> AppResult<u64> {
        let result = otp_codes::Entity::delete_many()
            .filter(otp_codes::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    fn student_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, Role::Student, &user.phone_number)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, Role::Student, &user.phone_number)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            role: Role::Student,
            user: Some(UserResponse::from(user)),
            staff: None,
            is_new_user: None,
        })
    }

    fn staff_tokens(&self, staff: apollonyars::Model) -> AppResult<AuthResponse> {
        let role = staff_role(&staff);
        let access_token = self
            .jwt_service
            .generate_access_token(staff.id, role, &staff.phone_number)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(staff.id, role, &staff.phone_number)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            role,
            user: None,
            staff: Some(ApollonyarResponse::from(staff)),
            is_new_user: None,
        })
    }

    async fn active_user(&self, id: i32) -> AppResult<users::Model> {
        let user = users::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;
        if !user.is_active {
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }

    async fn active_staff(&self, id: i32) -> AppResult<apollonyars::Model> {
        let staff = apollonyars::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;
        if staff.is_blocked {
            return Err(AppError::Forbidden);
        }
        Ok(staff)
    }
}

fn staff_role(staff: &apollonyars::Model) -> Role {
    if staff.is_admin { Role::Admin } else { Role::Staff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn service(db: DatabaseConnection, otp: OtpConfig) -> AuthService {
        AuthService::new(db, JwtService::new("test-secret", 60, 120), otp)
    }

    fn exposed() -> OtpConfig {
        OtpConfig {
            expires_in: 300,
            resend_interval: 60,
            expose_code: true,
        }
    }

    #[tokio::test]
    async fn test_otp_is_single_use_and_creates_user() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), exposed());

        let sent = auth
            .request_otp(OtpRequest {
                phone_number: "+989121111111".into(),
            })
            .await
            .unwrap();
        let code = sent.code.unwrap();
        assert_eq!(code.len(), 4);

        let verify = || OtpVerifyRequest {
            phone_number: "09121111111".into(),
            code: code.clone(),
        };
        let session = auth.verify_otp(verify()).await.unwrap();
        assert_eq!(session.is_new_user, Some(true));
        assert_eq!(session.role, Role::Student);
        assert_eq!(session.user.unwrap().phone_number, "09121111111");

        // consumed
        let again = auth.verify_otp(verify()).await;
        assert!(matches!(again, Err(AppError::FieldValidation(_))));
    }

    #[tokio::test]
    async fn test_otp_resend_interval_and_hidden_code() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), OtpConfig::default());

        let req = || OtpRequest {
            phone_number: "09121111111".into(),
        };
        let sent = auth.request_otp(req()).await.unwrap();
        assert!(sent.code.is_none());
        assert!(matches!(
            auth.request_otp(req()).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_otp_rejected_and_purged() {
        let db = setup_test_db().await;
        let auth = service(
            db.clone(),
            OtpConfig {
                expires_in: -1,
                resend_interval: 0,
                expose_code: true,
            },
        );

        let code = auth
            .request_otp(OtpRequest {
                phone_number: "09121111111".into(),
            })
            .await
            .unwrap()
            .code
            .unwrap();
        let result = auth
            .verify_otp(OtpVerifyRequest {
                phone_number: "09121111111".into(),
                code,
            })
            .await;
        assert!(matches!(result, Err(AppError::FieldValidation(_))));

        auth.request_otp(OtpRequest {
            phone_number: "09122222222".into(),
        })
        .await
        .unwrap();
        assert_eq!(auth.purge_expired_otps().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), OtpConfig::default());

        let registered = auth
            .register(RegisterRequest {
                phone_number: "09123334444".into(),
                password: TEST_PASSWORD.into(),
                first_name: "Sara".into(),
                last_name: "Ahmadi".into(),
                email: String::new(),
            })
            .await
            .unwrap();
        assert!(registered.user.unwrap().has_password);

        let duplicate = auth
            .register(RegisterRequest {
                phone_number: "9123334444".into(),
                password: TEST_PASSWORD.into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::FieldValidation(e)) if e.contains("phone_number")));

        let wrong = auth
            .login(LoginRequest {
                phone_number: "09123334444".into(),
                password: "Wrong12345".into(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::AuthError(_))));

        let session = auth
            .login(LoginRequest {
                phone_number: "09123334444".into(),
                password: TEST_PASSWORD.into(),
            })
            .await
            .unwrap();
        let refreshed = auth.refresh_token(&session.refresh_token).await.unwrap();
        assert!(!refreshed.access_token.is_empty());
        assert!(auth.refresh_token(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_staff_login_roles_and_blocking() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), OtpConfig::default());
        let admin = create_staff(&db, "09120000001", true).await;
        let staff = create_staff(&db, "09120000002", false).await;

        let login = |phone: &str| LoginRequest {
            phone_number: phone.into(),
            password: TEST_PASSWORD.into(),
        };
        assert_eq!(auth.staff_login(login("09120000001")).await.unwrap().role, Role::Admin);
        assert_eq!(auth.staff_login(login("09120000002")).await.unwrap().role, Role::Staff);

        let staff_id = staff.id;
        assert_eq!(auth.current_staff_role(staff_id).await.unwrap(), Role::Staff);
        let mut blocked: apollonyars::ActiveModel = staff.into();
        blocked.is_blocked = Set(true);
        blocked.update(&db).await.unwrap();
        assert!(matches!(
            auth.staff_login(login("09120000002")).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            auth.current_staff_role(staff_id).await,
            Err(AppError::Forbidden)
        ));
        assert_eq!(auth.current_staff_role(admin.id).await.unwrap(), Role::Admin);

        let me = auth.me(admin.id, Role::Admin).await.unwrap();
        assert_eq!(me.staff.unwrap().id, admin.id);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), OtpConfig::default());
        let bootstrap = BootstrapConfig {
            admin_phone: Some("09129999999".into()),
            admin_password: Some(TEST_PASSWORD.into()),
            admin_first_name: None,
            admin_last_name: None,
        };
        auth.ensure_admin(&bootstrap).await.unwrap();
        auth.ensure_admin(&bootstrap).await.unwrap();

        let admins = apollonyars::Entity::find().all(&db).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert!(admins[0].is_admin);

        auth.ensure_admin(&BootstrapConfig::default()).await.unwrap();
    }
}
