//! The restyling session: one uploaded photo, one edit at a time.
//!
//! A session moves through these phases:
//! - `Idle` -> `Uploaded` (image accepted)
//! - `Uploaded` -> `Processing` (generation started)
//! - `Processing` -> `Complete` | `Failed` (generation finished)
//! - `Complete` | `Failed` -> `Processing` (generate again with the same photo)
//! - `Uploaded` | `Processing` | `Complete` | `Failed` -> `Uploaded` (new image accepted)
//! - any -> `Idle` (reset)
//!
//! Starting a generation clears the previous result straight away, so a
//! surface never shows a stale edit next to a spinner.

use crate::download;
use crate::error::{Result, StyleShiftError};
use crate::gateway::{EditGateway, EditedImage};
use crate::image::{is_image_mime_type, normalize_mime_type, ImagePayload};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Observable phase of a [`Session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing uploaded yet.
    #[default]
    Idle,
    /// A photo is loaded and ready to edit.
    Uploaded,
    /// An edit request is outstanding.
    Processing,
    /// The last edit produced an image.
    Complete,
    /// The last edit failed.
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
enum SessionState {
    #[default]
    Idle,
    Uploaded {
        original: ImagePayload,
    },
    Processing {
        original: ImagePayload,
        generation: u64,
    },
    Complete {
        original: ImagePayload,
        generated: ImagePayload,
    },
    Failed {
        original: ImagePayload,
        error: String,
    },
}

/// Everything the gateway needs for one edit, handed out by
/// [`Session::begin_generation`].
#[derive(Debug, Clone)]
#[must_use = "an edit ticket should be sent and its outcome reported back"]
pub struct EditTicket {
    id: u64,
    base64_body: String,
    mime_type: String,
    prompt: String,
}

impl EditTicket {
    /// Generation id this ticket belongs to.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Base64 body of the original image.
    pub fn base64_body(&self) -> &str {
        &self.base64_body
    }

    /// MIME type of the original image.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Prompt describing the new clothing.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Sends this edit through the gateway.
    pub async fn send<G>(&self, gateway: &G) -> Result<EditedImage>
    where
        G: EditGateway + ?Sized,
    {
        tracing::debug!(generation = self.id, gateway = gateway.name(), "sending edit");
        gateway
            .edit_image(&self.base64_body, &self.mime_type, &self.prompt)
            .await
    }
}

/// A single upload/edit/result session.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    last_generation: u64,
}

impl Session {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from(&self.state)
    }

    /// The uploaded photo; present in every phase except `Idle`.
    pub fn original_image(&self) -> Option<&ImagePayload> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Uploaded { original }
            | SessionState::Processing { original, .. }
            | SessionState::Complete { original, .. }
            | SessionState::Failed { original, .. } => Some(original),
        }
    }

    /// The edited photo; present only in `Complete`.
    pub fn generated_image(&self) -> Option<&ImagePayload> {
        match &self.state {
            SessionState::Complete { generated, .. } => Some(generated),
            _ => None,
        }
    }

    /// MIME type of the uploaded photo.
    pub fn mime_type(&self) -> Option<&str> {
        self.original_image().map(|image| image.mime_type.as_str())
    }

    /// Failure description; present only in `Failed`.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Accepts a newly selected photo, replacing whatever the session held.
    ///
    /// Anything whose MIME type is not `image/*` is rejected with
    /// [`StyleShiftError::UnsupportedMediaType`] and the session is left
    /// exactly as it was. The MIME type is stored trimmed and lowercased. Accepting while an edit is outstanding turns that
    /// edit's eventual result stale.
    pub fn accept_image(&mut self, data: Vec<u8>, mime_type: &str) -> Result<()> {
        if !is_image_mime_type(mime_type) {
            tracing::warn!(mime_type, "rejected non-image upload");
            return Err(StyleShiftError::UnsupportedMediaType(mime_type.to_string()));
        }

        let original = ImagePayload::new(data, normalize_mime_type(mime_type));
        tracing::info!(
            from = %self.phase(),
            mime_type = %original.mime_type,
            size_bytes = original.size(),
            "image accepted"
        );
        self.state = SessionState::Uploaded { original };
        Ok(())
    }

    /// Starts an edit of the uploaded photo.
    ///
    /// Moves the session to `Processing`, dropping any previous result or
    /// error, and returns the ticket to send through a gateway. Nothing
    /// changes when no photo is uploaded, the prompt is blank, or an edit is
    /// already outstanding.
    pub fn begin_generation(&mut self, prompt: &str) -> Result<EditTicket> {
        if prompt.trim().is_empty() {
            return Err(StyleShiftError::InvalidRequest("prompt is empty".into()));
        }

        let original = match std::mem::take(&mut self.state) {
            SessionState::Idle => {
                return Err(StyleShiftError::InvalidRequest(
                    "no image has been uploaded".into(),
                ));
            }
            state @ SessionState::Processing { .. } => {
                self.state = state;
                return Err(StyleShiftError::GenerationInFlight);
            }
            SessionState::Uploaded { original }
            | SessionState::Complete { original, .. }
            | SessionState::Failed { original, .. } => original,
        };

        self.last_generation += 1;
        let ticket = EditTicket {
            id: self.last_generation,
            base64_body: original.to_base64(),
            mime_type: original.mime_type.clone(),
            prompt: prompt.to_string(),
        };

        tracing::info!(generation = ticket.id, "edit started");
        self.state = SessionState::Processing {
            original,
            generation: ticket.id,
        };
        Ok(ticket)
    }

    /// Records the outcome of the edit started with `ticket`.
    ///
    /// Returns the new phase, or `None` when the ticket no longer matches the
    /// outstanding edit (the session was reset or got a new photo meanwhile)
    /// and the outcome was discarded.
    pub fn finish_generation(
        &mut self,
        ticket: &EditTicket,
        outcome: Result<EditedImage>,
    ) -> Option<Phase> {
        let original = match std::mem::take(&mut self.state) {
            SessionState::Processing {
                original,
                generation,
            } if generation == ticket.id => original,
            state => {
                tracing::warn!(
                    generation = ticket.id,
                    phase = %Phase::from(&state),
                    "discarding stale edit result"
                );
                self.state = state;
                return None;
            }
        };

        self.state = match outcome.and_then(EditedImage::into_payload) {
            Ok(generated) => {
                tracing::info!(
                    generation = ticket.id,
                    mime_type = %generated.mime_type,
                    size_bytes = generated.size(),
                    "edit complete"
                );
                SessionState::Complete {
                    original,
                    generated,
                }
            }
            Err(e) => {
                tracing::warn!(generation = ticket.id, "edit failed: {e}");
                SessionState::Failed {
                    original,
                    error: e.failure_message(),
                }
            }
        };
        Some(self.phase())
    }

    /// Runs one edit end to end: begin, call the gateway, record the outcome.
    ///
    /// Gateway failures end up in the `Failed` phase and are not returned;
    /// only the local rejections of [`Session::begin_generation`] are.
    pub async fn generate<G>(&mut self, gateway: &G, prompt: &str) -> Result<Phase>
    where
        G: EditGateway + ?Sized,
    {
        let ticket = self.begin_generation(prompt)?;
        let outcome = ticket.send(gateway).await;
        Ok(self
            .finish_generation(&ticket, outcome)
            .unwrap_or_else(|| self.phase()))
    }

    /// Discards everything and returns to `Idle`.
    pub fn reset(&mut self) {
        tracing::info!(from = %self.phase(), "session reset");
        self.state = SessionState::Idle;
    }

    /// Writes the edited photo into `dir` under a timestamped file name.
    pub async fn save_generated(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let generated = self.generated_image().ok_or_else(|| {
            StyleShiftError::InvalidRequest("no edited image to save".into())
        })?;
        download::save_image(generated, dir.as_ref()).await
    }
}

impl From<&SessionState> for Phase {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Idle => Phase::Idle,
            SessionState::Uploaded { .. } => Phase::Uploaded,
            SessionState::Processing { .. } => Phase::Processing,
            SessionState::Complete { .. } => Phase::Complete,
            SessionState::Failed { .. } => Phase::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;
    use crate::gateway::mock::{MockGateway, MockOutcome};
    use crate::image::codec;

    const PHOTO: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    const EDITED: &[u8] = b"edited-bytes";

    fn uploaded() -> Session {
        let mut session = Session::new();
        session.accept_image(PHOTO.to_vec(), "image/png").unwrap();
        session
    }

    fn assert_empty(session: &Session) {
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.original_image().is_none());
        assert!(session.generated_image().is_none());
        assert!(session.mime_type().is_none());
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_new_session_is_idle() {
        assert_empty(&Session::new());
    }

    #[test]
    fn test_accept_image_moves_to_uploaded() {
        let session = uploaded();
        assert_eq!(session.phase(), Phase::Uploaded);
        assert_eq!(
            session.original_image(),
            Some(&ImagePayload::new(PHOTO.to_vec(), "image/png"))
        );
        assert_eq!(session.mime_type(), Some("image/png"));
    }

    #[test]
    fn test_accept_non_image_leaves_session_untouched() {
        let mut session = Session::new();
        let err = session
            .accept_image(b"hello".to_vec(), "text/plain")
            .unwrap_err();
        assert!(matches!(err, StyleShiftError::UnsupportedMediaType(_)));
        assert_empty(&session);

        let mut session = uploaded();
        assert!(session
            .accept_image(b"%PDF".to_vec(), "application/pdf")
            .is_err());
        assert_eq!(session.phase(), Phase::Uploaded);
        assert_eq!(session.original_image().unwrap().data, PHOTO);
    }

    #[tokio::test]
    async fn test_new_image_replaces_previous_result() {
        let mut session = uploaded();
        let gateway = MockGateway::returning_png(EDITED);
        session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(session.phase(), Phase::Complete);

        session.accept_image(b"GIF89a..".to_vec(), "image/gif").unwrap();
        assert_eq!(session.phase(), Phase::Uploaded);
        assert!(session.generated_image().is_none());
        assert_eq!(session.mime_type(), Some("image/gif"));
    }

    #[tokio::test]
    async fn test_new_image_after_failure_clears_error() {
        let mut session = uploaded();
        session
            .generate(&MockGateway::new(MockOutcome::Empty), "tuxedo")
            .await
            .unwrap();
        assert_eq!(session.phase(), Phase::Failed);

        session.accept_image(b"GIF89a..".to_vec(), "image/gif").unwrap();
        assert_eq!(session.phase(), Phase::Uploaded);
        assert!(session.error_message().is_none());
        assert!(session.generated_image().is_none());
        assert_eq!(session.original_image().unwrap().data, b"GIF89a..");
    }

    #[tokio::test]
    async fn test_accepted_mime_type_is_normalized() {
        let mut session = Session::new();
        session.accept_image(PHOTO.to_vec(), " Image/PNG ").unwrap();
        assert_eq!(session.mime_type(), Some("image/png"));

        let gateway = MockGateway::returning_png(EDITED);
        session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(gateway.calls.lock().unwrap()[0].1, "image/png");
    }

    #[tokio::test]
    async fn test_whitespace_commentary_still_counts_as_decline() {
        let mut session = uploaded();
        let gateway = MockGateway::new(MockOutcome::Declined("  ".into()));

        session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(session.phase(), Phase::Failed);
        assert!(session
            .error_message()
            .unwrap()
            .starts_with("Model returned text instead of image:"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut session = uploaded();
        let gateway = MockGateway::returning_png(EDITED);

        let phase = session.generate(&gateway, "Make it a suit").await.unwrap();
        assert_eq!(phase, Phase::Complete);
        assert_eq!(session.generated_image().unwrap().data, EDITED);
        assert_eq!(session.generated_image().unwrap().mime_type, "image/png");
        assert!(session.error_message().is_none());
        assert_eq!(session.original_image().unwrap().data, PHOTO);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, codec::encode_base64(PHOTO));
        assert_eq!(calls[0].1, "image/png");
        assert_eq!(calls[0].2, "Make it a suit");
    }

    #[tokio::test]
    async fn test_generate_declined_records_message() {
        let mut session = uploaded();
        let gateway = MockGateway::new(MockOutcome::Declined("Sorry, I can't do that".into()));

        let phase = session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(phase, Phase::Failed);
        assert!(session.generated_image().is_none());
        assert!(session
            .error_message()
            .unwrap()
            .contains("Sorry, I can't do that"));
    }

    #[tokio::test]
    async fn test_generate_empty_response_is_generic_failure() {
        let mut session = uploaded();
        let gateway = MockGateway::new(MockOutcome::Empty);

        session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(
            session.error_message(),
            Some("No image data found in the response.")
        );
    }

    #[tokio::test]
    async fn test_generate_undecodable_image_fails() {
        let mut session = uploaded();
        let gateway = MockGateway::new(MockOutcome::Image(EditedImage {
            data: "@@@".into(),
            mime_type: "image/png".into(),
        }));

        session.generate(&gateway, "tuxedo").await.unwrap();
        assert_eq!(session.phase(), Phase::Failed);
        assert!(session.error_message().unwrap().starts_with("failed to decode"));
    }

    #[tokio::test]
    async fn test_generate_without_image_is_rejected() {
        let mut session = Session::new();
        let gateway = MockGateway::returning_png(EDITED);

        let err = session.generate(&gateway, "tuxedo").await.unwrap_err();
        assert!(err.is_local());
        assert_empty(&session);
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        let mut session = uploaded();
        let err = session.begin_generation("   ").unwrap_err();
        assert!(matches!(err, StyleShiftError::InvalidRequest(_)));
        assert_eq!(session.phase(), Phase::Uploaded);
    }

    #[test]
    fn test_second_generation_while_processing_is_rejected() {
        let mut session = uploaded();
        let ticket = session.begin_generation("tuxedo").unwrap();

        let err = session.begin_generation("suit").unwrap_err();
        assert!(matches!(err, StyleShiftError::GenerationInFlight));
        assert_eq!(session.phase(), Phase::Processing);

        // The original request is still the one that lands.
        let edited = EditedImage {
            data: codec::encode_base64(EDITED),
            mime_type: "image/png".into(),
        };
        assert_eq!(
            session.finish_generation(&ticket, Ok(edited)),
            Some(Phase::Complete)
        );
    }

    #[tokio::test]
    async fn test_regenerate_clears_previous_result_immediately() {
        let mut session = uploaded();
        let gateway = MockGateway::returning_png(EDITED);
        session.generate(&gateway, "tuxedo").await.unwrap();
        assert!(session.generated_image().is_some());

        let ticket = session.begin_generation("leather jacket").unwrap();
        assert_eq!(session.phase(), Phase::Processing);
        assert!(session.generated_image().is_none());
        assert!(session.error_message().is_none());
        assert_eq!(ticket.base64_body(), codec::encode_base64(PHOTO));
        assert_eq!(ticket.prompt(), "leather jacket");
    }

    #[tokio::test]
    async fn test_retry_after_failure_reuses_original() {
        let mut session = uploaded();
        session
            .generate(&MockGateway::new(MockOutcome::Empty), "tuxedo")
            .await
            .unwrap();
        assert_eq!(session.phase(), Phase::Failed);

        let ticket = session.begin_generation("tuxedo").unwrap();
        assert!(session.error_message().is_none());
        assert_eq!(ticket.mime_type(), "image/png");
        assert_eq!(ticket.base64_body(), codec::encode_base64(PHOTO));
    }

    #[tokio::test]
    async fn test_reset_from_every_phase() {
        let mut session = uploaded();
        session.reset();
        assert_empty(&session);

        let mut session = uploaded();
        let _ticket = session.begin_generation("tuxedo").unwrap();
        session.reset();
        assert_empty(&session);

        let mut session = uploaded();
        session
            .generate(&MockGateway::returning_png(EDITED), "tuxedo")
            .await
            .unwrap();
        session.reset();
        assert_empty(&session);

        let mut session = uploaded();
        session
            .generate(&MockGateway::new(MockOutcome::Empty), "tuxedo")
            .await
            .unwrap();
        session.reset();
        assert_empty(&session);
    }

    #[test]
    fn test_result_after_reset_is_discarded() {
        let mut session = uploaded();
        let ticket = session.begin_generation("tuxedo").unwrap();
        session.reset();

        let outcome = session.finish_generation(&ticket, Err(StyleShiftError::NoImageInResponse));
        assert_eq!(outcome, None);
        assert_empty(&session);
    }

    #[test]
    fn test_result_for_replaced_photo_is_discarded() {
        let mut session = uploaded();
        let stale = session.begin_generation("tuxedo").unwrap();
        session.accept_image(b"GIF89a..".to_vec(), "image/gif").unwrap();
        let current = session.begin_generation("suit").unwrap();
        assert_ne!(stale.id(), current.id());

        let edited = EditedImage {
            data: codec::encode_base64(EDITED),
            mime_type: "image/png".into(),
        };
        assert_eq!(session.finish_generation(&stale, Ok(edited)), None);
        assert_eq!(session.phase(), Phase::Processing);
    }

    #[test]
    fn test_failure_without_detail_uses_generic_message() {
        let mut session = uploaded();
        let ticket = session.begin_generation("tuxedo").unwrap();
        session.finish_generation(
            &ticket,
            Err(StyleShiftError::Api {
                status: 500,
                message: String::new(),
            }),
        );
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.error_message(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_save_generated_requires_result() {
        let session = uploaded();
        let dir = tempfile::tempdir().unwrap();
        assert!(session.save_generated(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_save_generated_writes_file() {
        let mut session = uploaded();
        session
            .generate(&MockGateway::returning_png(EDITED), "tuxedo")
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = session.save_generated(dir.path()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), EDITED);
        assert_eq!(path.extension().unwrap(), "png");
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Processing.to_string(), "processing");
        assert_eq!(Phase::Failed.to_string(), "failed");
    }
}
