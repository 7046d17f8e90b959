use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::models::pagination::PaginationParams;
use crate::services::MedalService;

#[utoipa::path(
    get,
    path = "/medal-defs",
    tag = "medals",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged medal definition list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_medal_defs(
    medal_service: web::Data<MedalService>,
    identity: Identity,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match medal_service.list_medal_defs(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/medal-defs/{id}",
    tag = "medals",
    params(("id" = i32, Path, description = "Medal definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Medal definition details", body = MedalDefResponse),
        (status = 404, description = "Medal definition not found")
    )
)]
pub async fn get_medal_def(
    medal_service: web::Data<MedalService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match medal_service.get_medal_def(path.into_inner()).await {
        Ok(medal_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": medal_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/medal-defs",
    tag = "medals",
    request_body = CreateMedalDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Medal definition created", body = MedalDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_medal_def(
    medal_service: web::Data<MedalService>,
    identity: Identity,
    request: web::Json<CreateMedalDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match medal_service.create_medal_def(request.into_inner()).await {
        Ok(medal_def) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": medal_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/medal-defs/{id}",
    tag = "medals",
    params(("id" = i32, Path, description = "Medal definition id")),
    request_body = UpdateMedalDefRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Medal definition updated", body = MedalDefResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Medal definition not found")
    )
)]
pub async fn update_medal_def(
    medal_service: web::Data<MedalService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateMedalDefRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match medal_service
        .update_medal_def(path.into_inner(), request.into_inner())
        .await
    {
        Ok(medal_def) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": medal_def
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/medal-defs/{id}",
    tag = "medals",
    params(("id" = i32, Path, description = "Medal definition id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Medal definition removed"),
        (status = 404, description = "Medal definition not found")
    )
)]
pub async fn delete_medal_def(
    medal_service: web::Data<MedalService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match medal_service.delete_medal_def(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Medal definition deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn medal_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/medal-defs")
            .route("", web::get().to(list_medal_defs))
            .route("", web::post().to(create_medal_def))
            .route("/{id}", web::get().to(get_medal_def))
            .route("/{id}", web::put().to(update_medal_def))
            .route("/{id}", web::patch().to(update_medal_def))
            .route("/{id}", web::delete().to(delete_medal_def)),
    );
}
