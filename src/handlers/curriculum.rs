use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::CurriculumService;

#[utoipa::path(
    get,
    path = "/assignment-defs",
    tag = "curriculum",
    params(CatalogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged assignment definition list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_assignment_defs(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match curriculum_service.list_assignment_defs(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/assignment-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Assignment definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Assignment definition details", body = AssignmentDefResponse),
        (status = 404, description = "Assignment definition not found")
    )
)]
pub async fn get_assignment_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match curriculum_service.get_assignment_def(path.into_inner()).await {
        Ok(assignment_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assignment_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/assignment-defs",
    tag = "curriculum",
    request_body = CreateAssignmentDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Assignment definition created", body = AssignmentDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_assignment_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    request: web::Json<CreateAssignmentDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service.create_assignment_def(request.into_inner()).await {
        Ok(assignment_def) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": assignment_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/assignment-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Assignment definition id")),
    request_body = UpdateAssignmentDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Assignment definition updated", body = AssignmentDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Assignment definition not found")
    )
)]
pub async fn update_assignment_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateAssignmentDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service
        .update_assignment_def(path.into_inner(), request.into_inner())
        .await
    {
        Ok(assignment_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assignment_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/assignment-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Assignment definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Assignment definition removed"),
        (status = 404, description = "Assignment definition not found")
    )
)]
pub async fn delete_assignment_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service.delete_assignment_def(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Assignment definition deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/assignment-defs/{id}/templates",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Assignment definition id")),
    request_body = CreateTemplateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Template added", body = TemplateResponse),
        (status = 404, description = "Assignment definition not found")
    )
)]
pub async fn add_template(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<CreateTemplateRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service
        .add_template(path.into_inner(), request.into_inner())
        .await
    {
        Ok(template) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": template
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/assignment-defs/{id}/templates/{template_id}",
    tag = "curriculum",
    params(
        ("id" = i32, Path, description = "Assignment definition id"),
        ("template_id" = i32, Path, description = "Template id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Template removed"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn delete_template(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    let (def_id, template_id) = path.into_inner();
    match curriculum_service.delete_template(def_id, template_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Template deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/call-defs",
    tag = "curriculum",
    params(CatalogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged call definition list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_call_defs(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match curriculum_service.list_call_defs(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/call-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Call definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call definition details", body = CallDefResponse),
        (status = 404, description = "Call definition not found")
    )
)]
pub async fn get_call_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match curriculum_service.get_call_def(path.into_inner()).await {
        Ok(call_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": call_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/call-defs",
    tag = "curriculum",
    request_body = CreateCallDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Call definition created", body = CallDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_call_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    request: web::Json<CreateCallDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service.create_call_def(request.into_inner()).await {
        Ok(call_def) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": call_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/call-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Call definition id")),
    request_body = UpdateCallDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call definition updated", body = CallDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Call definition not found")
    )
)]
pub async fn update_call_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateCallDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service
        .update_call_def(path.into_inner(), request.into_inner())
        .await
    {
        Ok(call_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": call_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/call-defs/{id}",
    tag = "curriculum",
    params(("id" = i32, Path, description = "Call definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call definition removed"),
        (status = 404, description = "Call definition not found")
    )
)]
pub async fn delete_call_def(
    curriculum_service: web::Data<CurriculumService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match curriculum_service.delete_call_def(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Call definition deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn curriculum_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/assignment-defs")
            .route("", web::get().to(list_assignment_defs))
            .route("", web::post().to(create_assignment_def))
            .route("/{id}", web::get().to(get_assignment_def))
            .route("/{id}", web::put().to(update_assignment_def))
            .route("/{id}", web::patch().to(update_assignment_def))
            .route("/{id}", web::delete().to(delete_assignment_def))
            .route("/{id}/templates", web::post().to(add_template))
            .route("/{id}/templates/{template_id}", web::delete().to(delete_template)),
    )
    .service(
        web::scope("/call-defs")
            .route("", web::get().to(list_call_defs))
            .route("", web::post().to(create_call_def))
            .route("/{id}", web::get().to(get_call_def))
            .route("/{id}", web::put().to(update_call_def))
            .route("/{id}", web::patch().to(update_call_def))
            .route("/{id}", web::delete().to(delete_call_def)),
    );
}
