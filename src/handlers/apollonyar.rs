use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::ApollonyarService;

#[utoipa::path(
    get,
    path = "/apollonyars",
    tag = "apollonyars",
    params(ApollonyarQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged staff list"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_apollonyars(
    apollonyar_service: web::Data<ApollonyarService>,
    identity: Identity,
    query: web::Query<ApollonyarQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match apollonyar_service.list_apollonyars(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/apollonyars/{id}",
    tag = "apollonyars",
    params(("id" = i32, Path, description = "Apollonyar id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Staff record", body = ApollonyarResponse),
        (status = 404, description = "Apollonyar not found")
    )
)]
pub async fn get_apollonyar(
    apollonyar_service: web::Data<ApollonyarService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match apollonyar_service.get_apollonyar(path.into_inner()).await {
        Ok(apollonyar) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": apollonyar
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/apollonyars",
    tag = "apollonyars",
    request_body = CreateApollonyarRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Staff account created", body = ApollonyarResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_apollonyar(
    apollonyar_service: web::Data<ApollonyarService>,
    identity: Identity,
    request: web::Json<CreateApollonyarRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match apollonyar_service.create_apollonyar(request.into_inner()).await {
        Ok(apollonyar) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": apollonyar
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/apollonyars/{id}",
    tag = "apollonyars",
    params(("id" = i32, Path, description = "Apollonyar id")),
    request_body = UpdateApollonyarRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Staff account updated", body = ApollonyarResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Apollonyar not found")
    )
)]
pub async fn update_apollonyar(
    apollonyar_service: web::Data<ApollonyarService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateApollonyarRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match apollonyar_service
        .update_apollonyar(path.into_inner(), request.into_inner())
        .await
    {
        Ok(apollonyar) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": apollonyar
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/apollonyars/{id}",
    tag = "apollonyars",
    params(("id" = i32, Path, description = "Apollonyar id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Staff account removed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Apollonyar not found")
    )
)]
pub async fn delete_apollonyar(
    apollonyar_service: web::Data<ApollonyarService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match apollonyar_service.delete_apollonyar(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Apollonyar deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn apollonyar_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/apollonyars")
            .route("", web::get().to(list_apollonyars))
            .route("", web::post().to(create_apollonyar))
            .route("/{id}", web::get().to(get_apollonyar))
            .route("/{id}", web::put().to(update_apollonyar))
            .route("/{id}", web::patch().to(update_apollonyar))
            .route("/{id}", web::delete().to(delete_apollonyar)),
    );
}
