//! End-to-end checks of the HTTP layer against an in-memory SQLite database.

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, ResponseError, test, web};
use apollon_backend::{
    config::{BootstrapConfig, OtpConfig},
    handlers,
    middlewares::AuthMiddleware,
    services::*,
    utils::JwtService,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};

const ADMIN_PHONE: &str = "09120000001";
const ADMIN_PASSWORD: &str = "Admin12345";

async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

async fn build_app(
    db: DatabaseConnection,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let jwt_service = JwtService::new("integration-secret", 900, 3600);
    let otp = OtpConfig {
        expires_in: 120,
        resend_interval: 60,
        expose_code: true,
    };
    let auth_service = AuthService::new(db.clone(), jwt_service.clone(), otp);
    auth_service
        .ensure_admin(&BootstrapConfig {
            admin_phone: Some(ADMIN_PHONE.to_string()),
            admin_password: Some(ADMIN_PASSWORD.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    App::new()
        .wrap(AuthMiddleware::new(jwt_service))
        .app_data(web::Data::new(auth_service))
        .app_data(web::Data::new(UserService::new(db.clone())))
        .app_data(web::Data::new(ApollonyarService::new(db.clone())))
        .app_data(web::Data::new(CourseService::new(db.clone())))
        .app_data(web::Data::new(CurriculumService::new(db.clone())))
        .app_data(web::Data::new(MedalService::new(db.clone())))
        .app_data(web::Data::new(DiscountCodeService::new(db.clone())))
        .app_data(web::Data::new(ProfileService::new(db.clone())))
        .app_data(web::Data::new(AssignmentService::new(db.clone())))
        .app_data(web::Data::new(CallService::new(db.clone())))
        .app_data(web::Data::new(PaymentService::new(db.clone())))
        .app_data(web::Data::new(LogService::new(db)))
        .configure(handlers::extractor_config)
        .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() }))
        .service(web::scope("/api/v1").configure(handlers::api_config))
}

/// Status of a request that may be rejected by the auth middleware before reaching a handler
async fn status_of<S, R, B>(app: &S, req: R) -> StatusCode
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(e) => e.as_response_error().status_code(),
    }
}

/// Staff login, yielding the access token
macro_rules! staff_login {
    ($app:expr, $phone:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/staff/login")
            .set_json(json!({ "phone_number": $phone, "password": $password }))
            .to_request();
        let body: Value = test::call_and_read_body_json($app, req).await;
        assert_eq!(body["success"], true, "login failed: {body}");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_protected_routes_need_a_token() {
    let app = test::init_service(build_app(setup_db().await).await).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/profiles").to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer("not-a-token"))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_otp_login_is_single_use() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let phone = "09125550000";

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/otp/request")
        .set_json(json!({ "phone_number": phone }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let code = body["data"]["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 4);

    // inside the resend window
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/otp/request")
        .set_json(json!({ "phone_number": phone }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/otp/verify")
        .set_json(json!({ "phone_number": phone, "code": code }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["is_new_user"], true);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/otp/verify")
        .set_json(json!({ "phone_number": phone, "code": code }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["role"], "student");

    let req = test::TestRequest::get()
        .uri("/api/v1/me/profiles")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_role_checks() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let admin = staff_login!(&app, ADMIN_PHONE, ADMIN_PASSWORD);

    let req = test::TestRequest::post()
        .uri("/api/v1/apollonyars")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "first_name": "Neda",
            "last_name": "Karimi",
            "phone_number": "09120000002",
            "password": "Staff12345"
        }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::CREATED);

    let staff = staff_login!(&app, "09120000002", "Staff12345");

    // catalog writes are admin-only
    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(&staff))
        .set_json(json!({ "name": "Violin" }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/courses")
        .insert_header(bearer(&staff))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "phone_number": "09125551111",
            "password": "Student123",
            "first_name": "Ali",
            "last_name": "Rahimi",
            "email": "ali@example.com"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let student = body["data"]["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .insert_header(bearer(&student))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::FORBIDDEN);

    // students have no staff view of their own
    let req = test::TestRequest::get()
        .uri("/api/v1/me/profiles")
        .insert_header(bearer(&staff))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_blocking_staff_revokes_live_tokens() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let admin = staff_login!(&app, ADMIN_PHONE, ADMIN_PASSWORD);

    let req = test::TestRequest::post()
        .uri("/api/v1/apollonyars")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "first_name": "Reza",
            "last_name": "Moradi",
            "phone_number": "09120000003",
            "password": "Staff12345",
            "is_admin": true
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let staff_id = body["data"]["id"].as_i64().unwrap();
    let staff = staff_login!(&app, "09120000003", "Staff12345");

    // demoted: the admin token it still holds no longer opens admin routes
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/apollonyars/{staff_id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "is_admin": false }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(&staff))
        .set_json(json!({ "name": "Setar" }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles")
        .insert_header(bearer(&staff))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/apollonyars/{staff_id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "is_blocked": true }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles")
        .insert_header(bearer(&staff))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_out_of_range_page_is_empty() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let admin = staff_login!(&app, ADMIN_PHONE, ADMIN_PASSWORD);

    let req = test::TestRequest::get()
        .uri("/api/v1/users?page=18446744073709551615&per_page=100")
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["data"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn test_validation_errors_use_the_envelope() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let admin = staff_login!(&app, ADMIN_PHONE, ADMIN_PASSWORD);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(&admin))
        .set_json(json!({ "name": "Piano" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let course_id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/terms")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "course_id": course_id,
            "name": "Autumn",
            "price": 1000,
            "start_date": "2025-12-01",
            "end_date": "2025-09-01"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["end_date"].is_array());

    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(&admin))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles")
        .insert_header(bearer(&admin))
        .set_json(json!({ "user_id": 999, "term_id": 999 }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_profile_status_change_and_course_cascade() {
    let app = test::init_service(build_app(setup_db().await).await).await;
    let admin = staff_login!(&app, ADMIN_PHONE, ADMIN_PASSWORD);

    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(&admin))
        .set_json(json!({ "name": "Setar" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let course_id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/terms")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "course_id": course_id,
            "name": "Term 1",
            "price": 9000000,
            "start_date": "2025-09-01",
            "end_date": "2025-12-01"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let term_id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(&admin))
        .set_json(json!({ "phone_number": "09127778888", "first_name": "Mina", "last_name": "Sadeghi" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles")
        .insert_header(bearer(&admin))
        .set_json(json!({ "user_id": user_id, "term_id": term_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let profile_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["total_course_fee"], 9000000);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/profiles/{profile_id}/change_status"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "status": "paused" }))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/profiles/{profile_id}/change_status"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "status": "معلق", "reason": "unpaid" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "suspended");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/logs?profile_id={profile_id}"))
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["total"].as_u64().unwrap() >= 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/courses/{course_id}"))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/profiles/{profile_id}"))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::NOT_FOUND);
}
