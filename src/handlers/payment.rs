use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::PaymentService;

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "payments",
    params(TransactionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged transaction list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_transactions(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.list_transactions(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "payments",
    params(("id" = i32, Path, description = "Transaction id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction details", body = TransactionResponse),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.get_transaction(path.into_inner()).await {
        Ok(transaction) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/transactions",
    tag = "payments",
    request_body = CreateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Transaction created", body = TransactionResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_transaction(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.create_transaction(request.into_inner()).await {
        Ok(transaction) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/transactions/{id}",
    tag = "payments",
    params(("id" = i32, Path, description = "Transaction id")),
    request_body = UpdateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction updated", body = TransactionResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn update_transaction(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateTransactionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service
        .update_transaction(path.into_inner(), request.into_inner())
        .await
    {
        Ok(transaction) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "payments",
    params(("id" = i32, Path, description = "Transaction id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction removed"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn delete_transaction(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.delete_transaction(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Transaction deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/transactions/{id}/verify",
    tag = "payments",
    params(("id" = i32, Path, description = "Transaction id")),
    request_body = VerifyTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Verification status set", body = TransactionResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn verify_transaction(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<VerifyTransactionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service
        .verify_transaction(path.into_inner(), request.into_inner())
        .await
    {
        Ok(transaction) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/transactions/{id}/notes",
    tag = "payments",
    params(("id" = i32, Path, description = "Transaction id")),
    request_body = AddTransactionNoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Note attached", body = TransactionResponse),
        (status = 400, description = "Empty note"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn add_transaction_note(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<AddTransactionNoteRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .add_transaction_note(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(transaction) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/installments",
    tag = "installments",
    params(InstallmentQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged installment list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_installments(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    query: web::Query<InstallmentQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.list_installments(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/installments/{id}",
    tag = "installments",
    params(("id" = i32, Path, description = "Installment id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installment details", body = InstallmentResponse),
        (status = 404, description = "Installment not found")
    )
)]
pub async fn get_installment(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.get_installment(path.into_inner()).await {
        Ok(installment) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": installment
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/installments",
    tag = "installments",
    request_body = CreateInstallmentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Installment created", body = InstallmentResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_installment(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    request: web::Json<CreateInstallmentRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.create_installment(request.into_inner()).await {
        Ok(installment) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": installment
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/installments/{id}",
    tag = "installments",
    params(("id" = i32, Path, description = "Installment id")),
    request_body = UpdateInstallmentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installment updated", body = InstallmentResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Installment not found")
    )
)]
pub async fn update_installment(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateInstallmentRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service
        .update_installment(path.into_inner(), request.into_inner())
        .await
    {
        Ok(installment) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": installment
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/installments/{id}",
    tag = "installments",
    params(("id" = i32, Path, description = "Installment id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installment removed"),
        (status = 404, description = "Installment not found")
    )
)]
pub async fn delete_installment(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.delete_installment(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Installment deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::get().to(list_transactions))
            .route("", web::post().to(create_transaction))
            .route("/{id}", web::get().to(get_transaction))
            .route("/{id}", web::put().to(update_transaction))
            .route("/{id}", web::patch().to(update_transaction))
            .route("/{id}", web::delete().to(delete_transaction))
            .route("/{id}/verify", web::post().to(verify_transaction))
            .route("/{id}/notes", web::post().to(add_transaction_note)),
    )
    .service(
        web::scope("/installments")
            .route("", web::get().to(list_installments))
            .route("", web::post().to(create_installment))
            .route("/{id}", web::get().to(get_installment))
            .route("/{id}", web::put().to(update_installment))
            .route("/{id}", web::patch().to(update_installment))
            .route("/{id}", web::delete().to(delete_installment)),
    );
}
