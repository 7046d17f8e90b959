use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::error::AppError;
use crate::services::{PaymentService, ProfileService};

#[utoipa::path(
    get,
    path = "/profiles",
    tag = "profiles",
    params(ProfileQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged enrollment list"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_profiles(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    query: web::Query<ProfileQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.list_profiles(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile details", body = ProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.get_profile(path.into_inner()).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/profiles",
    tag = "profiles",
    request_body = CreateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_profile(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    request: web::Json<CreateProfileRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.create_profile(request.into_inner()).await {
        Ok(profile) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_profile(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service
        .update_profile(path.into_inner(), request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile removed"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn delete_profile(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.delete_profile(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Profile deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}/assignments",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Assignments by deadline", body = Vec<AssignmentResponse>),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn profile_assignments(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.assignments(path.into_inner()).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assignments
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}/calls",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Calls, newest first", body = Vec<CallResponse>),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn profile_calls(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.calls(path.into_inner()).await {
        Ok(calls) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": calls
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}/notes",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Notes, newest first", body = Vec<NoteResponse>),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn profile_notes(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match profile_service.notes(path.into_inner()).await {
        Ok(notes) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": notes
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}/payments",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installments and transactions, newest first", body = Vec<PaymentEntry>),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn profile_payments(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.profile_payments(path.into_inner()).await {
        Ok(payments) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": payments
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/{id}/installments",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installments by due date", body = Vec<InstallmentResponse>),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn profile_installments(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match payment_service.profile_installments(path.into_inner()).await {
        Ok(installments) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": installments
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/profiles/{id}/log_call",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = LogCallRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Call recorded", body = CallResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn log_call(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<LogCallRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .log_call(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(call) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": call
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/profiles/{id}/add_note",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = AddNoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Note added", body = NoteResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn add_note(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<AddNoteRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .add_note(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(note) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": note
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}/remove_note",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = RemoveNoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Note removed"),
        (status = 404, description = "Profile or note not found")
    )
)]
pub async fn remove_note(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<RemoveNoteRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .remove_note(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Note removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{id}/update_installments",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = UpdateInstallmentsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installments replaced", body = Vec<InstallmentResponse>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_installments(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateInstallmentsRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .update_installments(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(installments) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": installments
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/profiles/{id}/generate_installments",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = GenerateInstallmentsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Installment schedule generated", body = Vec<InstallmentResponse>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn generate_installments(
    payment_service: web::Data<PaymentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<GenerateInstallmentsRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .generate_installments(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(installments) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": installments
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/profiles/{id}/add_medal",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = AddMedalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Medal awarded", body = MedalResponse),
        (status = 400, description = "Medal already awarded"),
        (status = 404, description = "Profile or medal definition not found")
    )
)]
pub async fn add_medal(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<AddMedalRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .add_medal(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(medal) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": medal
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}/remove_medal",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = RemoveMedalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Medal taken back"),
        (status = 404, description = "Medal not awarded to this profile")
    )
)]
pub async fn remove_medal(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<RemoveMedalRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .remove_medal(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Medal removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{id}/change_term",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = ChangeTermRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Term changed", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn change_term(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<ChangeTermRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .change_term(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{id}/change_apollonyar",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = ChangeApollonyarRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Apollonyar changed", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn change_apollonyar(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<ChangeApollonyarRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .change_apollonyar(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{id}/change_type",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = ChangeTypeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Student type changed", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn change_type(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<ChangeTypeRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .change_type(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{id}/change_status",
    tag = "profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = ChangeStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Enrollment status changed", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn change_status(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match profile_service
        .change_status(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/profiles",
    tag = "profiles",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The calling student's enrollments", body = Vec<ProfileResponse>),
        (status = 403, description = "Students only")
    )
)]
pub async fn my_profiles(
    profile_service: web::Data<ProfileService>,
    identity: Identity,
) -> Result<HttpResponse> {
    let Some(user_id) = identity.student_id() else {
        return Ok(AppError::PermissionDenied.error_response());
    };

    match profile_service.my_profiles(user_id).await {
        Ok(profiles) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profiles
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn profile_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profiles")
            .route("", web::get().to(list_profiles))
            .route("", web::post().to(create_profile))
            .route("/{id}", web::get().to(get_profile))
            .route("/{id}", web::put().to(update_profile))
            .route("/{id}", web::patch().to(update_profile))
            .route("/{id}", web::delete().to(delete_profile))
            .route("/{id}/assignments", web::get().to(profile_assignments))
            .route("/{id}/calls", web::get().to(profile_calls))
            .route("/{id}/notes", web::get().to(profile_notes))
            .route("/{id}/payments", web::get().to(profile_payments))
            .route("/{id}/installments", web::get().to(profile_installments))
            .route("/{id}/log_call", web::post().to(log_call))
            .route("/{id}/add_note", web::post().to(add_note))
            .route("/{id}/remove_note", web::delete().to(remove_note))
            .route("/{id}/update_installments", web::patch().to(update_installments))
            .route("/{id}/generate_installments", web::post().to(generate_installments))
            .route("/{id}/add_medal", web::post().to(add_medal))
            .route("/{id}/remove_medal", web::delete().to(remove_medal))
            .route("/{id}/change_term", web::patch().to(change_term))
            .route("/{id}/change_apollonyar", web::patch().to(change_apollonyar))
            .route("/{id}/change_type", web::patch().to(change_type))
            .route("/{id}/change_status", web::patch().to(change_status)),
    )
    .service(web::scope("/me").route("/profiles", web::get().to(my_profiles)));
}
