pub mod code_generator;
pub mod dates;
pub mod jwt;
pub mod password;
pub mod phone;

pub use code_generator::{generate_discount_code, generate_otp_code};
pub use dates::*;
pub use jwt::*;
pub use password::*;
pub use phone::*;
