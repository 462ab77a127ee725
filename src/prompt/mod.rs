//! Deterministic rendering of the system prompt sent to the model.

mod presets;
mod styles;

pub use presets::Preset;
pub use styles::{STYLES, Style, style};

use crate::foundation::core::{FRAME_RATE, frame_count_for_seconds};
use crate::foundation::error::{LiveError, LiveResult};
use crate::registry::ModuleRegistry;
use std::fmt::Write as _;

/// Four theme color channels, passed through verbatim.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThemeColors {
    /// Main brand color.
    pub primary: String,
    /// Supporting color.
    pub secondary: String,
    /// Highlight color.
    pub accent: String,
    /// Background fill.
    pub background: String,
}

/// Per-session generation settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Authoring template.
    #[serde(default)]
    pub preset: Preset,
    /// Key into the style catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Clip length; must be > 0.
    pub duration_seconds: f64,
    /// Optional theme palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<ThemeColors>,
    /// Reference media, embedded in the prompt in order.
    #[serde(default)]
    pub media_urls: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Scratch,
            style: None,
            duration_seconds: 10.0,
            theme_colors: None,
            media_urls: Vec::new(),
        }
    }
}

impl GenerationConfig {
    /// Scratch preset with the given duration and nothing else.
    pub fn with_duration(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            ..Self::default()
        }
    }

    /// Total frames at the fixed frame rate; fails unless the duration is positive.
    pub fn frame_count(&self) -> LiveResult<u64> {
        frame_count_for_seconds(self.duration_seconds)
    }

    /// Check the only hard constraint on the configuration.
    pub fn validate(&self) -> LiveResult<()> {
        self.frame_count().map(|_| ())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    fn of_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "webm" | "mov" | "m4v" | "mkv" => Self::Video,
            "mp3" | "wav" | "ogg" | "m4a" | "aac" | "flac" => Self::Audio,
            _ => Self::Image,
        }
    }

    /// Registry component used to embed this kind, and the host tag fallback.
    fn components(self) -> (&'static str, &'static str) {
        match self {
            Self::Image => ("Img", "img"),
            Self::Video => ("Video", "video"),
            Self::Audio => ("Audio", "audio"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// Render the system prompt for `config` against `registry`.
///
/// Identical input yields byte-identical output. Only `duration_seconds` is validated.
#[tracing::instrument(skip_all, fields(preset = %config.preset))]
pub fn build_system_prompt(config: &GenerationConfig, registry: &ModuleRegistry) -> LiveResult<String> {
    let frames = config.frame_count()?;
    let names = registry.list_names();
    let has = |n: &str| names.contains(n);

    let mut out = String::with_capacity(4096);
    base_rules(&mut out, &has);
    globals(&mut out, registry);
    technique_hints(&mut out, &has);

    let guidance: Vec<&str> = config
        .preset
        .guidance()
        .iter()
        .filter(|g| g.needs.iter().all(|&n| has(n)))
        .map(|g| g.text)
        .collect();
    if !guidance.is_empty() {
        section(&mut out, &format!("Preset: {}", config.preset.title()));
        for g in guidance {
            bullet(&mut out, g);
        }
    }

    if let Some(key) = config.style.as_deref().filter(|k| !k.trim().is_empty()) {
        match style(key) {
            Some(s) => {
                section(&mut out, &format!("Style: {}", s.name));
                bullet(&mut out, s.description);
            }
            None => tracing::debug!(style = key, "unknown style key, no style block emitted"),
        }
    }

    section(&mut out, "Duration");
    let _ = writeln!(
        out,
        "The animation lasts {} ({frames} frames at {FRAME_RATE} fps). Plan every animation so it completes within frames 0 to {}.",
        seconds_phrase(config.duration_seconds),
        frames - 1
    );

    if !config.media_urls.is_empty() {
        media(&mut out, &config.media_urls, &has);
    }

    if let Some(theme) = &config.theme_colors {
        section(&mut out, "Theme colors");
        out.push_str("Use exactly these colors:\n");
        bullet(&mut out, &format!("primary: {}", theme.primary));
        bullet(&mut out, &format!("secondary: {}", theme.secondary));
        bullet(&mut out, &format!("accent: {}", theme.accent));
        bullet(&mut out, &format!("background: {}", theme.background));
    }

    Ok(out)
}

/// Like [`build_system_prompt`] with the standard registry.
pub fn build_default_system_prompt(config: &GenerationConfig) -> LiveResult<String> {
    build_system_prompt(config, ModuleRegistry::global())
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "## {title}");
}

fn bullet(out: &mut String, text: &str) {
    let _ = writeln!(out, "- {text}");
}

fn base_rules(out: &mut String, has: &impl Fn(&str) -> bool) {
    out.push_str(
        "You write a single animated React component that is rendered frame by frame inside a video surface. Reply with source code only.\n",
    );
    section(out, "Rules");
    bullet(out, "Output only raw JavaScript/JSX code. Do not wrap it in markdown code fences and do not add explanations.");
    bullet(out, "Do not write import statements: every available global listed below is already in scope.");
    bullet(out, "Do not write export statements.");
    bullet(
        out,
        "Define exactly one main component bound to a PascalCase name, for example `const MyComposition = () => { ... };`. Helper components are allowed but must be defined before the main component, which comes last.",
    );
    bullet(out, "Use only the available globals and standard JavaScript built-ins (Math, Array, Object, JSON, String, Number).");
    if has("useCurrentFrame") {
        bullet(out, "Derive all motion from the current frame; never use timers, Date or CSS animations.");
    }
    bullet(out, "Reference media only through the absolute URLs given to you; there is no local file access.");
}

fn globals(out: &mut String, registry: &ModuleRegistry) {
    section(out, "Available globals");
    for (module, names) in registry.modules() {
        let _ = writeln!(out, "- {module}: {}", names.join(", "));
    }
    for (module, names) in registry.modules() {
        for name in names {
            let members = registry.resolve(name).map(|e| e.members()).unwrap_or_default();
            if !members.is_empty() {
                let _ = writeln!(out, "- {module} {name} members: {}", members.join(", "));
            }
        }
    }
}

fn technique_hints(out: &mut String, has: &impl Fn(&str) -> bool) {
    let hints: [(&[&str], &str); 5] = [
        (
            &["useCurrentFrame", "useVideoConfig"],
            "Read time with `const frame = useCurrentFrame();` and `const { fps, width, height, durationInFrames } = useVideoConfig();`.",
        ),
        (
            &["interpolate"],
            "Map frames to values with interpolate(frame, [inStart, inEnd], [outStart, outEnd], { extrapolateLeft: \"clamp\", extrapolateRight: \"clamp\" }).",
        ),
        (
            &["spring"],
            "Use spring({ frame, fps, config: { damping: 200 } }) for natural entrances; it goes from 0 to 1.",
        ),
        (
            &["AbsoluteFill"],
            "Wrap the scene in <AbsoluteFill> and layer elements with absolutely positioned children.",
        ),
        (
            &["Sequence"],
            "Time sections with <Sequence from={startFrame} durationInFrames={length}>; inside it the current frame starts at 0.",
        ),
    ];
    let lines: Vec<&str> = hints
        .iter()
        .filter(|(needs, _)| needs.iter().all(|&n| has(n)))
        .map(|(_, text)| *text)
        .collect();
    if lines.is_empty() {
        return;
    }
    section(out, "Techniques");
    for l in lines {
        bullet(out, l);
    }
}

fn media(out: &mut String, urls: &[String], has: &impl Fn(&str) -> bool) {
    section(out, "Media");
    out.push_str("Embed these assets exactly as written:\n");
    for url in urls {
        let kind = MediaKind::of_url(url);
        let (component, host) = kind.components();
        let tag = if has(component) { component } else { host };
        let style = match kind {
            MediaKind::Audio => "",
            _ => " style={{ width: \"100%\", height: \"100%\", objectFit: \"cover\" }}",
        };
        let _ = writeln!(out, "- {}: <{tag} src=\"{url}\"{style} />", kind.label());
    }
}

fn seconds_phrase(seconds: f64) -> String {
    let n = if seconds.fract() == 0.0 && seconds.abs() < 1e15 {
        format!("{}", seconds as i64)
    } else {
        format!("{seconds}")
    };
    if n == "1" {
        "1 second".to_owned()
    } else {
        format!("{n} seconds")
    }
}

impl std::str::FromStr for GenerationConfig {
    type Err = LiveError;

    /// Parse a JSON configuration and validate it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/prompt/mod.rs"]
mod tests;
