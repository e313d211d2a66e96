//! CLI for StyleShift - restyle the clothing in a photo.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use styleshift::presets::preset_for_prompt;
use styleshift::{
    find_preset, GeminiGateway, GeminiModel, ImageFormat, Phase, Session, DEFAULT_PROMPT,
    PRESET_STYLES,
};
use tracing_subscriber::EnvFilter;

/// MIME type declared for files we cannot identify; the session rejects it.
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[derive(Parser)]
#[command(name = "styleshift")]
#[command(about = "Swap the clothing in a photo using AI image editing (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Restyle the clothing in a photo
    Edit(EditArgs),

    /// List the built-in style presets
    Presets,
}

#[derive(Args)]
struct EditArgs {
    /// Photo to restyle
    input: PathBuf,

    /// Built-in style preset id (see `styleshift presets`)
    #[arg(short, long, conflicts_with = "prompt")]
    preset: Option<String>,

    /// Describe the clothing yourself
    #[arg(long)]
    prompt: Option<String>,

    /// Directory to save the edited photo in
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Gemini model to use
    #[arg(short, long, value_enum, default_value = "nano-banana")]
    model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Edit(args) => edit(args, cli.json).await?,
        Commands::Presets => list_presets(cli.json)?,
    }

    Ok(())
}

fn resolve_prompt(args: &EditArgs) -> anyhow::Result<String> {
    if let Some(id) = &args.preset {
        let preset = find_preset(id).ok_or_else(|| {
            anyhow::anyhow!("unknown preset '{id}' (run `styleshift presets` to list them)")
        })?;
        return Ok(preset.prompt.to_string());
    }
    Ok(args
        .prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string()))
}

/// Declared MIME type for a file: extension first, then magic bytes.
fn detect_mime_type(path: &Path, data: &[u8]) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .or_else(|| ImageFormat::from_magic_bytes(data))
        .map(|format| format.mime_type())
        .unwrap_or(UNKNOWN_MIME_TYPE)
}

async fn edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let prompt = resolve_prompt(&args)?;

    // Missing credentials are reported before any file is touched.
    let gateway = GeminiGateway::builder().model(args.model.into()).build()?;

    let data = tokio::fs::read(&args.input).await?;
    let mime_type = detect_mime_type(&args.input, &data);

    let mut session = Session::new();
    session.accept_image(data, mime_type)?;

    let phase = session.generate(&gateway, &prompt).await?;
    let saved = match phase {
        Phase::Complete => Some(session.save_generated(&args.output_dir).await?),
        _ => None,
    };

    if json_output {
        let result = serde_json::json!({
            "success": saved.is_some(),
            "phase": phase,
            "input": args.input.display().to_string(),
            "output": saved.as_ref().map(|p| p.display().to_string()),
            "mime_type": session.generated_image().map(|g| g.mime_type.clone()),
            "size_bytes": session.generated_image().map(|g| g.size()),
            "preset": preset_for_prompt(&prompt).map(|p| p.id),
            "model": gateway.model().as_str(),
            "error": session.error_message(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(path) = &saved {
        println!("Edited image saved to {}", path.display());
    }

    match saved {
        Some(_) => Ok(()),
        None => anyhow::bail!(
            "{}",
            session
                .error_message()
                .unwrap_or(styleshift::GENERIC_FAILURE_MESSAGE)
        ),
    }
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(PRESET_STYLES)?);
        return Ok(());
    }

    println!("Style presets:\n");
    for preset in PRESET_STYLES {
        println!("  {} {} ({})", preset.icon, preset.label, preset.id);
        println!("    {}", preset.prompt);
    }
    Ok(())
}
