pub mod action_log;
pub mod apollonyar;
pub mod assignment;
pub mod auth;
pub mod call;
pub mod common;
pub mod course;
pub mod curriculum;
pub mod discount_code;
pub mod medal;
pub mod pagination;
pub mod payment;
pub mod profile;
pub mod user;

pub use action_log::*;
pub use apollonyar::*;
pub use assignment::*;
pub use auth::*;
pub use call::*;
pub use common::*;
pub use course::*;
pub use curriculum::*;
pub use discount_code::*;
pub use medal::*;
pub use pagination::*;
pub use payment::*;
pub use profile::*;
pub use user::*;
