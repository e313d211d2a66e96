#![warn(missing_docs)]
//! StyleShift - swap the clothing in a photo with an AI image edit.
//!
//! A [`Session`] holds one uploaded photo and walks it through
//! upload, edit and result. Edits go through an [`EditGateway`]; the
//! bundled [`GeminiGateway`] talks to Google's Gemini image models.
//!
//! # Quick Start
//!
//! ```no_run
//! use styleshift::{find_preset, GeminiGateway, Phase, Session};
//!
//! #[tokio::main]
//! async fn main() -> styleshift::Result<()> {
//!     let gateway = GeminiGateway::builder().build()?;
//!
//!     let mut session = Session::new();
//!     session.accept_image(std::fs::read("me.jpg")?, "image/jpeg")?;
//!
//!     let tuxedo = find_preset("tuxedo").expect("built-in preset");
//!     match session.generate(&gateway, tuxedo.prompt).await? {
//!         Phase::Complete => {
//!             let path = session.save_generated(".").await?;
//!             println!("saved {}", path.display());
//!         }
//!         _ => eprintln!("{}", session.error_message().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `styleshift` command-line tool

pub mod download;
mod error;
pub mod gateway;
pub mod image;
pub mod presets;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, StyleShiftError, GENERIC_FAILURE_MESSAGE};

pub use gateway::{EditGateway, EditedImage, GeminiGateway, GeminiGatewayBuilder, GeminiModel};
pub use image::{codec, ImageFormat, ImagePayload};
pub use presets::{find_preset, StylePreset, DEFAULT_PROMPT, PRESET_STYLES};
pub use session::{EditTicket, Phase, Session};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StyleShiftError};
    pub use crate::gateway::{EditGateway, GeminiGateway};
    pub use crate::presets::{find_preset, StylePreset};
    pub use crate::session::{Phase, Session};
}
