pub mod action_log;
pub mod apollonyar;
pub mod assignment;
pub mod auth;
pub mod call;
pub mod course;
pub mod curriculum;
pub mod discount_code;
pub mod medal;
pub mod payment;
pub mod profile;
pub mod user;

pub use action_log::log_config;
pub use apollonyar::apollonyar_config;
pub use assignment::assignment_config;
pub use auth::auth_config;
pub use call::call_config;
pub use course::course_config;
pub use curriculum::curriculum_config;
pub use discount_code::discount_code_config;
pub use medal::medal_config;
pub use payment::payment_config;
pub use profile::profile_config;
pub use user::user_config;

use crate::error::AppError;
use actix_web::web;

/// Malformed bodies, query strings and paths answer with the regular 400 envelope.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    );
}

/// Every route under `/api/v1`
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth_config)
        .configure(user_config)
        .configure(apollonyar_config)
        .configure(course_config)
        .configure(curriculum_config)
        .configure(medal_config)
        .configure(discount_code_config)
        .configure(profile_config)
        .configure(assignment_config)
        .configure(call_config)
        .configure(payment_config)
        .configure(log_config);
}
