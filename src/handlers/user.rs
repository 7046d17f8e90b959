use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::UserService;

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(UserQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged student list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    identity: Identity,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match user_service.list_users(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Student record", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match user_service.get_user(path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Student created", body = UserResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    identity: Identity,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match user_service.create_user(request.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Student updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match user_service.update_user(path.into_inner(), request.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Student and everything attached removed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match user_service.delete_user(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "User deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::patch().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
