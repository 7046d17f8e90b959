use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::middlewares::Identity;
use crate::models::*;
use crate::services::AssignmentService;

#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    params(AssignmentQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged assignment list"),
        (status = 400, description = "Invalid filter"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_assignments(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    query: web::Query<AssignmentQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match assignment_service.list_assignments(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Assignment with its submissions", body = AssignmentResponse),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn get_assignment(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    // students only see their own
    match assignment_service
        .get_assignment(path.into_inner(), identity.student_id())
        .await
    {
        Ok(assignment) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assignment
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/assignments/{id}/submit",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    request_body = SubmitAssignmentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Files reference templates of another assignment"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn submit_assignment(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<SubmitAssignmentRequest>,
) -> Result<HttpResponse> {
    match assignment_service
        .submit(path.into_inner(), identity.student_id(), request.into_inner())
        .await
    {
        Ok(submission) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": submission
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/assignments/{id}/update_due_date",
    tag = "assignments",
    params(("id" = i32, Path, description = "Assignment id")),
    request_body = UpdateDueDateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deadline moved", body = AssignmentResponse),
        (status = 400, description = "Invalid date"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn update_due_date(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<UpdateDueDateRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match assignment_service
        .update_due_date(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(assignment) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assignment
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/submissions",
    tag = "submissions",
    params(SubmissionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paged submission list"),
        (status = 400, description = "Invalid filter"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_submissions(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    query: web::Query<SubmissionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match assignment_service.list_submissions(&query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "submissions",
    params(("id" = i32, Path, description = "Submission id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission details", body = SubmissionResponse),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn get_submission(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match assignment_service.get_submission(path.into_inner()).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": submission
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/submissions/{id}",
    tag = "submissions",
    params(("id" = i32, Path, description = "Submission id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission removed"),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn delete_submission(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = identity.require_staff() {
        return Ok(e.error_response());
    }

    match assignment_service.delete_submission(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Submission deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/grade",
    tag = "submissions",
    params(("id" = i32, Path, description = "Submission id")),
    request_body = GradeSubmissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission graded", body = SubmissionResponse),
        (status = 400, description = "Grade outside 0..=100"),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn grade_submission(
    assignment_service: web::Data<AssignmentService>,
    identity: Identity,
    path: web::Path<i32>,
    request: web::Json<GradeSubmissionRequest>,
) -> Result<HttpResponse> {
    let actor = match identity.require_staff() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match assignment_service
        .grade_submission(path.into_inner(), Some(actor), request.into_inner())
        .await
    {
        Ok(submission) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": submission
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn assignment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/assignments")
            .route("", web::get().to(list_assignments))
            .route("/{id}", web::get().to(get_assignment))
            .route("/{id}/submit", web::post().to(submit_assignment))
            .route("/{id}/update_due_date", web::patch().to(update_due_date)),
    )
    .service(
        web::scope("/submissions")
            .route("", web::get().to(list_submissions))
            .route("/{id}", web::get().to(get_submission))
            .route("/{id}", web::delete().to(delete_submission))
            .route("/{id}/grade", web::post().to(grade_submission)),
    );
}
