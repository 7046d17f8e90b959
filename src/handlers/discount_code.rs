use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::models::pagination::PaginationParams;
use crate::services::DiscountCodeService;

#[utoipa::path(
    get,
    path = "/discounts",
    tag = "discounts",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged discount code list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_discount_codes(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match discount_code_service.list_codes(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/discounts/{id}",
    tag = "discounts",
    params(("id" = i32, Path, description = "Discount code id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount code details", body = DiscountCodeResponse),
        (status = 404, description = "Discount code not found")
    )
)]
pub async fn get_discount_code(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match discount_code_service.get_code(path.into_inner()).await {
        Ok(discount_code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discount_code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/discounts",
    tag = "discounts",
    request_body = CreateDiscountCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Discount code created", body = DiscountCodeResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_discount_code(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    request: web::Json<CreateDiscountCodeRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match discount_code_service.create_code(request.into_inner()).await {
        Ok(discount_code) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": discount_code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/discounts/{id}",
    tag = "discounts",
    params(("id" = i32, Path, description = "Discount code id")),
    request_body = UpdateDiscountCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount code updated", body = DiscountCodeResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Discount code not found")
    )
)]
pub async fn update_discount_code(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateDiscountCodeRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match discount_code_service
        .update_code(path.into_inner(), request.into_inner())
        .await
    {
        Ok(discount_code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discount_code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/discounts/{id}",
    tag = "discounts",
    params(("id" = i32, Path, description = "Discount code id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount code removed"),
        (status = 404, description = "Discount code not found")
    )
)]
pub async fn delete_discount_code(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_admin() {
        return Ok(e.error_response());
    }

    match discount_code_service.delete_code(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Discount code deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/discounts/validate",
    tag = "discounts",
    request_body = ValidateDiscountCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Whether the code can be used right now", body = DiscountValidationResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn validate_discount_code(
    discount_code_service: web::Data<DiscountCodeService>,
    identity: Identity,
    request: web::Json<ValidateDiscountCodeRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match discount_code_service.validate_code(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn discount_code_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discounts")
            .route("/validate", web::post().to(validate_discount_code))
            .route("", web::get().to(list_discount_codes))
            .route("", web::post().to(create_discount_code))
            .route("/{id}", web::get().to(get_discount_code))
            .route("/{id}", web::put().to(update_discount_code))
            .route("/{id}", web::patch().to(update_discount_code))
            .route("/{id}", web::delete().to(delete_discount_code)),
    );
}
