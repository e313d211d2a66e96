//! Error types for the photo restyling workflow.

/// Generic message shown when a failed edit carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Maximum number of characters kept from a service error body.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Errors that can occur while restyling a photo.
#[derive(Debug, thiserror::Error)]
pub enum StyleShiftError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The selected file is not an image.
    #[error("unsupported media type '{0}': please upload a valid image file")]
    UnsupportedMediaType(String),

    /// Invalid request parameters (no image uploaded, blank prompt, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A generation is already outstanding for this session.
    #[error("an edit is already in progress")]
    GenerationInFlight,

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The prompt was blocked by the service's safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The model answered with commentary instead of an edited image.
    #[error("Model returned text instead of image: {0}...")]
    ModelDeclined(String),

    /// The response contained neither an image nor any text.
    #[error("No image data found in the response.")]
    NoImageInResponse,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StyleShiftError {
    /// Returns true if the error was raised locally, before any request was
    /// sent to the image service. Such errors leave the session untouched.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMediaType(_) | Self::InvalidRequest(_) | Self::GenerationInFlight
        )
    }

    /// Message to record on a failed session.
    ///
    /// Falls back to [`GENERIC_FAILURE_MESSAGE`] when the error carries no
    /// detail of its own. Model commentary counts as detail even when it is
    /// only whitespace.
    pub fn failure_message(&self) -> String {
        let detail = match self {
            Self::Auth(m)
            | Self::UnsupportedMediaType(m)
            | Self::InvalidRequest(m)
            | Self::ContentBlocked(m)
            | Self::Decode(m)
            | Self::Api { message: m, .. } => Some(m.as_str()),
            _ => None,
        };
        if detail.is_some_and(|m| m.trim().is_empty()) {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Collapses whitespace in a service error body and bounds its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = collapsed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}

/// Result type alias for restyling operations.
pub type Result<T> = std::result::Result<T, StyleShiftError>;
