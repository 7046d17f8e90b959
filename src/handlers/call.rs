use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::CallService;

#[utoipa::path(
    get,
    path = "/calls",
    tag = "calls",
    params(CallQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged call list"),
        (status = 400, description = "Invalid filter"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_calls(
    call_service: web::Data<CallService>,
    identity: Identity,
    query: web::Query<CallQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match call_service.list_calls(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/calls/{id}",
    tag = "calls",
    params(("id" = i32, Path, description = "Call id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call details", body = CallResponse),
        (status = 404, description = "Call not found")
    )
)]
pub async fn get_call(
    call_service: web::Data<CallService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match call_service.get_call(path.into_inner()).await {
        Ok(call) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": call
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/calls/{id}",
    tag = "calls",
    params(("id" = i32, Path, description = "Call id")),
    request_body = UpdateCallRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call updated", body = CallResponse),
        (status = 400, description = "Unknown type or status"),
        (status = 404, description = "Call not found")
    )
)]
pub async fn update_call(
    call_service: web::Data<CallService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateCallRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match call_service.update_call(path.into_inner(), request.into_inner()).await {
        Ok(call) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": call
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/calls/{id}",
    tag = "calls",
    params(("id" = i32, Path, description = "Call id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call removed"),
        (status = 404, description = "Call not found")
    )
)]
pub async fn delete_call(
    call_service: web::Data<CallService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match call_service.delete_call(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Call deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn call_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/calls")
            .route("", web::get().to(list_calls))
            .route("/{id}", web::get().to(get_call))
            .route("/{id}", web::put().to(update_call))
            .route("/{id}", web::patch().to(update_call))
            .route("/{id}", web::delete().to(delete_call)),
    );
}
