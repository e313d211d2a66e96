//! Built-in clothing style presets.

use serde::Serialize;

/// Prompt used when the user has not picked a preset or written their own.
pub const DEFAULT_PROMPT: &str = "Change the person's clothing to a professional business suit.";

/// A named, pre-written prompt offered as a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StylePreset {
    /// Stable identifier (e.g. `tuxedo`).
    pub id: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Prompt sent to the image service.
    pub prompt: &'static str,
    /// Decorative icon.
    pub icon: &'static str,
}

/// The preset catalog, in display order.
pub const PRESET_STYLES: &[StylePreset] = &[
    StylePreset {
        id: "suit-dark",
        label: "Dark Business Suit",
        prompt: "Change the clothing to a professional dark charcoal business suit with a crisp white shirt and tie.",
        icon: "👔",
    },
    StylePreset {
        id: "tuxedo",
        label: "Formal Tuxedo",
        prompt: "Change the clothing to a formal black tuxedo with a bow tie.",
        icon: "🎩",
    },
    StylePreset {
        id: "casual-chic",
        label: "Smart Casual",
        prompt: "Change the clothing to a smart casual outfit, like a blazer with a t-shirt.",
        icon: "👕",
    },
    StylePreset {
        id: "cyberpunk",
        label: "Cyberpunk Techwear",
        prompt: "Change the clothing to futuristic cyberpunk techwear with neon accents.",
        icon: "🤖",
    },
    StylePreset {
        id: "leather",
        label: "Leather Jacket",
        prompt: "Change the clothing to a stylish black leather jacket and jeans.",
        icon: "🧥",
    },
];

/// Looks up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static StylePreset> {
    PRESET_STYLES.iter().find(|preset| preset.id == id)
}

/// Returns the preset whose prompt is exactly `prompt`, if any.
///
/// Lets a surface highlight the matching preset when the prompt was typed.
pub fn preset_for_prompt(prompt: &str) -> Option<&'static StylePreset> {
    PRESET_STYLES.iter().find(|preset| preset.prompt == prompt)
}
