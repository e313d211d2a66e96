//! Gemini (Google) image editing gateway.

use crate::error::{sanitize_error_message, Result, StyleShiftError};
use crate::gateway::{EditGateway, EditedImage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default API host.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Number of characters of model commentary kept in a decline error.
const DECLINE_PREVIEW_CHARS: usize = 100;

/// MIME type assumed for an image part that declares none.
const FALLBACK_MIME_TYPE: &str = "image/png";

/// Environment variables consulted for the API key, in order.
const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for [`GeminiGateway`].
#[derive(Debug, Clone, Default)]
pub struct GeminiGatewayBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiGatewayBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API host (e.g. a local mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the gateway, resolving the API key.
    ///
    /// A missing key is a configuration error reported here, once, rather
    /// than on every request.
    pub fn build(self) -> Result<GeminiGateway> {
        let api_key = self
            .api_key
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok())
            })
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                StyleShiftError::Auth(
                    "GOOGLE_API_KEY (or API_KEY) not set and no API key provided".into(),
                )
            })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiGateway {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gateway that edits images through Gemini's `generateContent` endpoint.
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiGateway {
    /// Creates a new [`GeminiGatewayBuilder`].
    pub fn builder() -> GeminiGatewayBuilder {
        GeminiGatewayBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn edit_impl(
        &self,
        base64_body: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<EditedImage> {
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::new(base64_body, mime_type, prompt);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type,
            prompt_chars = prompt.chars().count(),
            "submitting Gemini edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        let edited = extract_edited_image(&gemini_response)?;

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = %edited.mime_type,
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini edit complete"
        );

        Ok(edited)
    }
}

#[async_trait]
impl EditGateway for GeminiGateway {
    async fn edit_image(
        &self,
        base64_body: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<EditedImage> {
        self.edit_impl(base64_body, mime_type, prompt).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Maps a non-success HTTP response to an error.
fn parse_error(status: u16, text: &str) -> StyleShiftError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(text)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| text.to_string());
    let message = sanitize_error_message(&message);

    if status == 401 || status == 403 {
        return StyleShiftError::Auth(message);
    }
    let lower = message.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return StyleShiftError::ContentBlocked(message);
    }
    StyleShiftError::Api { status, message }
}

/// Picks the edited image out of a Gemini response.
///
/// Parts of the first candidate are scanned in order and the first one with
/// inline image data wins; later parts are ignored. Without an image, any
/// text the model produced becomes a [`StyleShiftError::ModelDeclined`]
/// carrying its first 100 characters, and a response with no text either is
/// [`StyleShiftError::NoImageInResponse`].
pub fn extract_edited_image(response: &GeminiResponse) -> Result<EditedImage> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        let message = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason_message.clone())
            .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
        return Err(StyleShiftError::ContentBlocked(message));
    }

    let image = response
        .first_candidate_parts()
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty());

    if let Some(inline) = image {
        let mime_type = inline
            .mime_type
            .as_deref()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(FALLBACK_MIME_TYPE);
        return Ok(EditedImage {
            data: inline.data.clone(),
            mime_type: mime_type.to_string(),
        });
    }

    match response.text() {
        Some(text) => {
            let preview: String = text.chars().take(DECLINE_PREVIEW_CHARS).collect();
            Err(StyleShiftError::ModelDeclined(preview))
        }
        None => Err(StyleShiftError::NoImageInResponse),
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn new(base64_body: &str, mime_type: &str, prompt: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: mime_type.to_string(),
                    data: base64_body.to_string(),
                },
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
        }
    }
}

/// A `generateContent` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    fn first_candidate_parts(&self) -> &[GeminiPartResponse] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text parts of the first candidate, if there are any.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .first_candidate_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
}
