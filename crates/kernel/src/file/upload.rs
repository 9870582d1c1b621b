//! Photo upload validation.

use thiserror::Error;

/// Image types accepted for shirt photos, checked against the file content.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Why a photo was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhotoError {
    #[error("No file was submitted.")]
    Empty,

    #[error("The file is too large ({size} bytes, maximum {max} bytes).")]
    TooLarge { size: usize, max: usize },

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
}

/// An uploaded photo whose content has been sniffed.
#[derive(Debug, Clone)]
pub struct Photo {
    pub filename: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl Photo {
    /// Check size and sniff the content type. The client-declared content
    /// type is ignored.
    pub fn validate(filename: &str, data: Vec<u8>, max_bytes: usize) -> Result<Self, PhotoError> {
        if data.is_empty() {
            return Err(PhotoError::Empty);
        }
        if data.len() > max_bytes {
            return Err(PhotoError::TooLarge {
                size: data.len(),
                max: max_bytes,
            });
        }

        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .filter(|mime| ALLOWED_IMAGE_TYPES.contains(mime))
            .ok_or(PhotoError::NotAnImage)?;

        let filename = if filename.trim().is_empty() {
            format!("photo.{}", extension_for(mime_type))
        } else {
            filename.to_string()
        };

        Ok(Self {
            filename,
            mime_type,
            data,
        })
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Reduce a client-supplied name to a safe final path component.
pub fn sanitize_filename(filename: &str) -> String {
    use std::path::Path;

    // Backslashes count as separators regardless of platform.
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let safe: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(200)
        .collect();

    if safe.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        safe
    }
}
