//! HTML form handling: CSRF tokens, validation errors, and the shirt and
//! registration forms.

pub mod csrf;
pub mod register;
pub mod shirt;
mod types;

pub use csrf::{CSRF_FIELD, generate_csrf_token, verify_csrf_token};
pub use register::RegisterForm;
pub use shirt::ShirtForm;
pub use types::ValidationErrors;
