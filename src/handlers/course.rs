use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::CourseService;

#[utoipa::path(
    get,
    path = "/courses",
    tag = "catalog",
    params(CatalogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged course list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_courses(
    course_service: web::Data<CourseService>,
    identity: Identity,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.list_courses(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Course id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Course details", body = CourseResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.get_course(path.into_inner()).await {
        Ok(course) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": course
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/courses",
    tag = "catalog",
    request_body = CreateCourseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_course(
    course_service: web::Data<CourseService>,
    identity: Identity,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.create_course(request.into_inner()).await {
        Ok(course) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": course
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/courses/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn update_course(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateCourseRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service
        .update_course(path.into_inner(), request.into_inner())
        .await
    {
        Ok(course) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": course
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Course id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Course removed"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.delete_course(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Course deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/terms",
    tag = "catalog",
    params(CatalogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged term list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_terms(
    course_service: web::Data<CourseService>,
    identity: Identity,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.list_terms(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/terms/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Term id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Term details", body = TermResponse),
        (status = 404, description = "Term not found")
    )
)]
pub async fn get_term(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.get_term(path.into_inner()).await {
        Ok(term) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": term
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/terms",
    tag = "catalog",
    request_body = CreateTermRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Term created", body = TermResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_term(
    course_service: web::Data<CourseService>,
    identity: Identity,
    request: web::Json<CreateTermRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.create_term(request.into_inner()).await {
        Ok(term) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": term
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/terms/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Term id")),
    request_body = UpdateTermRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Term updated", body = TermResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Term not found")
    )
)]
pub async fn update_term(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateTermRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service
        .update_term(path.into_inner(), request.into_inner())
        .await
    {
        Ok(term) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": term
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/terms/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Term id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Term removed"),
        (status = 404, description = "Term not found")
    )
)]
pub async fn delete_term(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.delete_term(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Term deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups",
    tag = "catalog",
    params(CatalogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged group list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_groups(
    course_service: web::Data<CourseService>,
    identity: Identity,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.list_groups(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 404, description = "Group not found")
    )
)]
pub async fn get_group(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match course_service.get_group(path.into_inner()).await {
        Ok(group) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": group
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "catalog",
    request_body = CreateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_group(
    course_service: web::Data<CourseService>,
    identity: Identity,
    request: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.create_group(request.into_inner()).await {
        Ok(group) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": group
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/groups/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Group id")),
    request_body = UpdateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn update_group(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateGroupRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service
        .update_group(path.into_inner(), request.into_inner())
        .await
    {
        Ok(group) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": group
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group removed"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn delete_group(
    course_service: web::Data<CourseService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match course_service.delete_group(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Group deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn course_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/courses")
            .route("", web::get().to(list_courses))
            .route("", web::post().to(create_course))
            .route("/{id}", web::get().to(get_course))
            .route("/{id}", web::put().to(update_course))
            .route("/{id}", web::patch().to(update_course))
            .route("/{id}", web::delete().to(delete_course)),
    )
    .service(
        web::scope("/terms")
            .route("", web::get().to(list_terms))
            .route("", web::post().to(create_term))
            .route("/{id}", web::get().to(get_term))
            .route("/{id}", web::put().to(update_term))
            .route("/{id}", web::patch().to(update_term))
            .route("/{id}", web::delete().to(delete_term)),
    )
    .service(
        web::scope("/groups")
            .route("", web::get().to(list_groups))
            .route("", web::post().to(create_group))
            .route("/{id}", web::get().to(get_group))
            .route("/{id}", web::put().to(update_group))
            .route("/{id}", web::patch().to(update_group))
            .route("/{id}", web::delete().to(delete_group)),
    );
}
