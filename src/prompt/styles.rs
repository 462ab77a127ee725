/// A visual style the user can pick by key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    /// Catalog key.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Guidance emitted into the prompt.
    pub description: &'static str,
}

/// The built-in style catalog, keyed by [`Style::key`].
pub const STYLES: &[Style] = &[
    Style {
        key: "minimal",
        name: "Minimal",
        description: "Lots of negative space, one accent color, thin sans-serif type and calm, precise easing.",
    },
    Style {
        key: "bold",
        name: "Bold",
        description: "Heavy condensed type, saturated color blocks, hard cuts and punchy, fast motion.",
    },
    Style {
        key: "playful",
        name: "Playful",
        description: "Rounded shapes, bouncy overshooting springs, bright palettes and friendly type.",
    },
    Style {
        key: "corporate",
        name: "Corporate",
        description: "Clean grid, restrained blue and gray tones, clear hierarchy and smooth, unobtrusive transitions.",
    },
    Style {
        key: "neon",
        name: "Neon",
        description: "Dark background, glowing outlines with text-shadow and box-shadow, vibrant magenta and cyan accents.",
    },
    Style {
        key: "elegant",
        name: "Elegant",
        description: "Serif display type, muted palette with gold accents, slow fades and long eases.",
    },
    Style {
        key: "retro",
        name: "Retro",
        description: "Warm 70s and 80s palettes, grain and scanline textures, chunky type and step-like motion.",
    },
];

/// Look up a style by key (case-insensitive).
pub fn style(key: &str) -> Option<&'static Style> {
    STYLES.iter().find(|s| s.key.eq_ignore_ascii_case(key.trim()))
}
