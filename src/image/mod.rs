//! Image payloads and their textual encodings.

pub mod codec;
mod types;

pub use types::{is_image_mime_type, normalize_mime_type, ImageFormat, ImagePayload};
