//! Restyle example - swaps the outfit in a photo for a tuxedo.
//!
//! Run with: `cargo run --example restyle -- <photo.jpg>`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use styleshift::{find_preset, GeminiGateway, Phase, Session};

#[tokio::main]
async fn main() -> styleshift::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: restyle <photo.jpg>");

    let gateway = GeminiGateway::builder().build()?;

    let mut session = Session::new();
    session.accept_image(std::fs::read(&input_path)?, "image/jpeg")?;

    let tuxedo = find_preset("tuxedo").expect("built-in preset");
    match session.generate(&gateway, tuxedo.prompt).await? {
        Phase::Complete => {
            let path = session.save_generated(".").await?;
            println!("Edited image saved to {}", path.display());
        }
        phase => println!(
            "Edit ended {phase}: {}",
            session.error_message().unwrap_or_default()
        ),
    }

    Ok(())
}
