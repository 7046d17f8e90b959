use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    CallStatus, CallType, InstallmentStatus, PaymentMethod, ProfileStatus, ProfileType, Sex,
    TransactionType, VerificationStatus,
};
use crate::handlers;
use crate::models::*;
use crate::utils::Role;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::staff_login,
        handlers::auth::request_otp,
        handlers::auth::verify_otp,
        handlers::auth::refresh_token,
        handlers::auth::me,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::apollonyar::list_apollonyars,
        handlers::apollonyar::get_apollonyar,
        handlers::apollonyar::create_apollonyar,
        handlers::apollonyar::update_apollonyar,
        handlers::apollonyar::delete_apollonyar,
        handlers::course::list_courses,
        handlers::course::get_course,
        handlers::course::create_course,
        handlers::course::update_course,
        handlers::course::delete_course,
        handlers::course::list_terms,
        handlers::course::get_term,
        handlers::course::create_term,
        handlers::course::update_term,
        handlers::course::delete_term,
        handlers::course::list_groups,
        handlers::course::get_group,
        handlers::course::create_group,
        handlers::course::update_group,
        handlers::course::delete_group,
        handlers::curriculum::list_assignment_defs,
        handlers::curriculum::get_assignment_def,
        handlers::curriculum::create_assignment_def,
        handlers::curriculum::update_assignment_def,
        handlers::curriculum::delete_assignment_def,
        handlers::curriculum::add_template,
        handlers::curriculum::delete_template,
        handlers::curriculum::list_call_defs,
        handlers::curriculum::get_call_def,
        handlers::curriculum::create_call_def,
        handlers::curriculum::update_call_def,
        handlers::curriculum::delete_call_def,
        handlers::medal::list_medal_defs,
        handlers::medal::get_medal_def,
        handlers::medal::create_medal_def,
        handlers::medal::update_medal_def,
        handlers::medal::delete_medal_def,
        handlers::discount_code::list_discount_codes,
        handlers::discount_code::get_discount_code,
        handlers::discount_code::create_discount_code,
        handlers::discount_code::update_discount_code,
        handlers::discount_code::delete_discount_code,
        handlers::discount_code::validate_discount_code,
        handlers::profile::list_profiles,
        handlers::profile::get_profile,
        handlers::profile::create_profile,
        handlers::profile::update_profile,
        handlers::profile::delete_profile,
        handlers::profile::profile_assignments,
        handlers::profile::profile_calls,
        handlers::profile::profile_notes,
        handlers::profile::profile_payments,
        handlers::profile::profile_installments,
        handlers::profile::log_call,
        handlers::profile::add_note,
        handlers::profile::remove_note,
        handlers::profile::update_installments,
        handlers::profile::generate_installments,
        handlers::profile::add_medal,
        handlers::profile::remove_medal,
        handlers::profile::change_term,
        handlers::profile::change_apollonyar,
        handlers::profile::change_type,
        handlers::profile::change_status,
        handlers::profile::my_profiles,
        handlers::assignment::list_assignments,
        handlers::assignment::get_assignment,
        handlers::assignment::submit_assignment,
        handlers::assignment::update_due_date,
        handlers::assignment::list_submissions,
        handlers::assignment::get_submission,
        handlers::assignment::delete_submission,
        handlers::assignment::grade_submission,
        handlers::call::list_calls,
        handlers::call::get_call,
        handlers::call::update_call,
        handlers::call::delete_call,
        handlers::payment::list_transactions,
        handlers::payment::get_transaction,
        handlers::payment::create_transaction,
        handlers::payment::update_transaction,
        handlers::payment::delete_transaction,
        handlers::payment::verify_transaction,
        handlers::payment::add_transaction_note,
        handlers::payment::list_installments,
        handlers::payment::get_installment,
        handlers::payment::create_installment,
        handlers::payment::update_installment,
        handlers::payment::delete_installment,
        handlers::action_log::list_logs,
        handlers::action_log::get_log,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            OtpRequest,
            OtpRequestResponse,
            OtpVerifyRequest,
            RefreshTokenRequest,
            RefreshTokenResponse,
            AuthResponse,
            MeResponse,
            Role,
            UserResponse,
            UserSummary,
            CreateUserRequest,
            UpdateUserRequest,
            Sex,
            ApollonyarResponse,
            ApollonyarSummary,
            CreateApollonyarRequest,
            UpdateApollonyarRequest,
            CourseResponse,
            CourseSummary,
            CreateCourseRequest,
            UpdateCourseRequest,
            TermResponse,
            TermSummary,
            CreateTermRequest,
            UpdateTermRequest,
            GroupResponse,
            GroupSummary,
            CreateGroupRequest,
            UpdateGroupRequest,
            AssignmentDefResponse,
            CreateAssignmentDefRequest,
            UpdateAssignmentDefRequest,
            TemplateResponse,
            CreateTemplateRequest,
            CallDefResponse,
            CreateCallDefRequest,
            UpdateCallDefRequest,
            MedalDefResponse,
            CreateMedalDefRequest,
            UpdateMedalDefRequest,
            MedalResponse,
            AddMedalRequest,
            RemoveMedalRequest,
            DiscountCodeResponse,
            CreateDiscountCodeRequest,
            UpdateDiscountCodeRequest,
            ValidateDiscountCodeRequest,
            DiscountValidationResponse,
            ProfileResponse,
            EnrolledCourse,
            CreateProfileRequest,
            UpdateProfileRequest,
            LogCallRequest,
            AddNoteRequest,
            RemoveNoteRequest,
            ChangeTermRequest,
            ChangeApollonyarRequest,
            ChangeTypeRequest,
            ChangeStatusRequest,
            InstallmentInput,
            UpdateInstallmentsRequest,
            GenerateInstallmentsRequest,
            ProfileType,
            ProfileStatus,
            AssignmentResponse,
            AssignmentStatus,
            SubmissionResponse,
            SubmissionFileResponse,
            SubmissionFileInput,
            SubmitAssignmentRequest,
            GradeSubmissionRequest,
            UpdateDueDateRequest,
            CallResponse,
            UpdateCallRequest,
            NoteResponse,
            CallType,
            CallStatus,
            TransactionResponse,
            TransactionNoteResponse,
            CreateTransactionRequest,
            UpdateTransactionRequest,
            VerifyTransactionRequest,
            AddTransactionNoteRequest,
            TransactionType,
            PaymentMethod,
            VerificationStatus,
            InstallmentResponse,
            CreateInstallmentRequest,
            UpdateInstallmentRequest,
            InstallmentStatus,
            PaymentEntry,
            PaymentKind,
            LogResponse,
            ApiError,
            MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, registration, OTP and tokens"),
        (name = "users", description = "Student records"),
        (name = "apollonyars", description = "Staff accounts"),
        (name = "catalog", description = "Courses, terms and groups"),
        (name = "curriculum", description = "Assignment and call definitions"),
        (name = "medals", description = "Medal definitions"),
        (name = "discounts", description = "Discount codes"),
        (name = "profiles", description = "Enrollments and their actions"),
        (name = "assignments", description = "Handed-out assignments"),
        (name = "submissions", description = "Assignment submissions and grading"),
        (name = "calls", description = "Support calls"),
        (name = "payments", description = "Transactions"),
        (name = "installments", description = "Installment schedule"),
        (name = "logs", description = "Audit log"),
    ),
    info(
        title = "Apollon Backend API",
        version = "1.0.0",
        description = "Admin backend for music course enrollments"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/profiles/{id}/change_status"));
        assert!(doc.paths.paths.contains_key("/auth/otp/verify"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
