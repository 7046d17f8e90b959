use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::LogService;

#[utoipa::path(
    get,
    path = "/logs",
    tag = "logs",
    params(LogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged audit log, newest first"),
        (status = 400, description = "Invalid filter"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_logs(
    log_service: web::Data<LogService>,
    identity: Identity,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match log_service.list_logs(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/logs/{id}",
    tag = "logs",
    params(("id" = i32, Path, description = "Log entry id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Log entry details", body = LogResponse),
        (status = 404, description = "Log entry not found")
    )
)]
pub async fn get_log(
    log_service: web::Data<LogService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match log_service.get_log(path.into_inner()).await {
        Ok(log) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": log
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn log_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/logs")
            .route("", web::get().to(list_logs))
            .route("/{id}", web::get().to(get_log)),
    );
}
