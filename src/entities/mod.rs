pub mod choice;

pub mod apollonyars;
pub mod assignment_def_templates;
pub mod assignment_defs;
pub mod assignment_submission_files;
pub mod assignment_submissions;
pub mod assignments;
pub mod call_defs;
pub mod calls;
pub mod courses;
pub mod discount_codes;
pub mod groups;
pub mod installments;
pub mod logs;
pub mod medal_defs;
pub mod medals;
pub mod notes;
pub mod otp_codes;
pub mod profiles;
pub mod terms;
pub mod transaction_notes;
pub mod transactions;
pub mod users;

pub use choice::{Choice, UNKNOWN_LABEL};

pub use apollonyars as apollonyar_entity;
pub use assignment_def_templates as assignment_def_template_entity;
pub use assignment_defs as assignment_def_entity;
pub use assignment_submission_files as submission_file_entity;
pub use assignment_submissions as submission_entity;
pub use assignments as assignment_entity;
pub use call_defs as call_def_entity;
pub use calls as call_entity;
pub use courses as course_entity;
pub use discount_codes as discount_code_entity;
pub use groups as group_entity;
pub use installments as installment_entity;
pub use logs as log_entity;
pub use medal_defs as medal_def_entity;
pub use medals as medal_entity;
pub use notes as note_entity;
pub use otp_codes as otp_code_entity;
pub use profiles as profile_entity;
pub use terms as term_entity;
pub use transaction_notes as transaction_note_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use calls::{CallStatus, CallType};
pub use installments::InstallmentStatus;
pub use profiles::{ProfileStatus, ProfileType};
pub use transactions::{PaymentMethod, TransactionType, VerificationStatus};
pub use users::Sex;
