//! Image payload types shared by the session and the gateway.

use crate::image::codec;
use serde::{Deserialize, Serialize};

/// Image formats the workflow knows how to name and recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a known format.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Trims and lowercases a declared MIME type.
pub fn normalize_mime_type(mime_type: &str) -> String {
    mime_type.trim().to_ascii_lowercase()
}

/// Returns true if the MIME type names an image (starts with `image/`).
pub fn is_image_mime_type(mime_type: &str) -> bool {
    normalize_mime_type(mime_type).starts_with("image/")
}

/// An image held by the session: raw bytes plus their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Declared MIME type (e.g. `image/png`).
    pub mime_type: String,
}

impl ImagePayload {
    /// Creates a payload from bytes and a MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Known format for the declared MIME type, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        codec::encode_base64(&self.data)
    }

    /// Returns the image as a data URL, ready for a rendering surface.
    pub fn to_data_url(&self) -> String {
        codec::encode(&self.data, &self.mime_type)
    }
}
