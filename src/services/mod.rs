pub mod apollonyar_service;
pub mod assignment_service;
pub mod auth_service;
pub mod call_service;
pub mod context;
pub mod course_service;
pub mod curriculum_service;
pub mod discount_code_service;
pub mod log_service;
pub mod medal_service;
pub mod payment_service;
pub mod profile_service;
pub mod user_service;

pub use apollonyar_service::ApollonyarService;
pub use assignment_service::AssignmentService;
pub use auth_service::AuthService;
pub use call_service::CallService;
pub use course_service::CourseService;
pub use curriculum_service::CurriculumService;
pub use discount_code_service::DiscountCodeService;
pub use log_service::LogService;
pub use medal_service::MedalService;
pub use payment_service::PaymentService;
pub use profile_service::ProfileService;
pub use user_service::UserService;
