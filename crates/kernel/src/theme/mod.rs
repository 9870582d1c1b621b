//! Theme engine and template rendering.

mod engine;

pub use engine::ThemeEngine;
