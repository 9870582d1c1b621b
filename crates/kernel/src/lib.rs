//! Kitbag Kernel Library
//!
//! A catalog for football shirt collectors: a public showcase with search,
//! sorting, owner filter and pagination, owner-scoped management of each
//! collector's shirts, and per-collector statistics.
//!
//! The main entry point for running the server is the `kitbag` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod form;
pub mod models;
pub mod routes;
pub mod session;
pub mod showcase;
pub mod state;
pub mod stats;
pub mod theme;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
