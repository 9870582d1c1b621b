//! Shirt photo uploads and storage.

pub mod storage;
pub mod upload;

pub use storage::{FileStorage, LocalFileStorage, PHOTO_PREFIX};
pub use upload::{ALLOWED_IMAGE_TYPES, DEFAULT_MAX_UPLOAD_BYTES, Photo, PhotoError, sanitize_filename};
