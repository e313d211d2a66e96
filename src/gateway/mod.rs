//! Edit request gateway: the boundary to the external image-generation service.

mod gemini;

pub use gemini::{
    extract_edited_image, GeminiGateway, GeminiGatewayBuilder, GeminiModel, GeminiResponse,
};

use crate::error::Result;
use crate::image::{codec, ImagePayload};
use async_trait::async_trait;

/// Trait for services that can edit an image according to a text prompt.
///
/// One call is one request: implementations do not retry and do not impose a
/// timeout.
#[async_trait]
pub trait EditGateway: Send + Sync {
    /// Sends the image (base64 body + MIME type) and the prompt to the service
    /// and returns the first image it produced.
    async fn edit_image(&self, base64_body: &str, mime_type: &str, prompt: &str)
        -> Result<EditedImage>;

    /// Returns the name of this gateway for display.
    fn name(&self) -> &str;
}

/// An edited image as returned by the service, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    /// Base64 body of the image.
    pub data: String,
    /// MIME type the service declared for the image.
    pub mime_type: String,
}

impl EditedImage {
    /// Decodes the base64 body into an [`ImagePayload`].
    pub fn into_payload(self) -> Result<ImagePayload> {
        let data = codec::decode_base64(&self.data)?;
        Ok(ImagePayload::new(data, self.mime_type))
    }
}
