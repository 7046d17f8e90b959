use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::AuthService;

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Student registered", body = AuthResponse),
        (status = 400, description = "Invalid input or phone already registered")
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match auth_service.register(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Wrong phone number or password")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/staff/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Staff logged in", body = AuthResponse),
        (status = 401, description = "Wrong phone number or password"),
        (status = 403, description = "Account is blocked")
    )
)]
pub async fn staff_login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.staff_login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/request",
    tag = "auth",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Code issued", body = OtpRequestResponse),
        (status = 400, description = "Invalid phone number or requested too soon")
    )
)]
pub async fn request_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<OtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.request_otp(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": "Verification code sent"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    tag = "auth",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Code accepted", body = AuthResponse),
        (status = 400, description = "Wrong or expired code")
    )
)]
pub async fn verify_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<OtpVerifyRequest>,
) -> Result<HttpResponse> {
    match auth_service.verify_otp(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/token/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshTokenResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    auth_service: web::Data<AuthService>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse> {
    match auth_service.refresh_token(&request.refresh_token).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(
    auth_service: web::Data<AuthService>,
    identity: Identity,
) -> Result<HttpResponse> {
    match auth_service.me(identity.id, identity.role).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/staff/login", web::post().to(staff_login))
            .route("/otp/request", web::post().to(request_otp))
            .route("/otp/verify", web::post().to(verify_otp))
            .route("/token/refresh", web::post().to(refresh_token))
            .route("/me", web::get().to(me)),
    );
}
