//! Database models.

pub mod shirt;
pub mod user;

pub use shirt::{Shirt, ShirtInput};
pub use user::{NewUser, User};
