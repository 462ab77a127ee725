use std::fmt;
use std::str::FromStr;

/// Authoring template that adds preset-specific guidance to the system prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Data-driven scenes: counters, charts, labelled statistics.
    Infographics,
    /// Kinetic typography.
    TextAnimation,
    /// A single composed poster with subtle motion.
    Posters,
    /// Slide-like scenes in sequence.
    Presentation,
    /// No extra guidance.
    #[default]
    Scratch,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Preset; 5] = [
        Preset::Infographics,
        Preset::TextAnimation,
        Preset::Posters,
        Preset::Presentation,
        Preset::Scratch,
    ];

    /// Wire/CLI identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Infographics => "infographics",
            Self::TextAnimation => "text-animation",
            Self::Posters => "posters",
            Self::Presentation => "presentation",
            Self::Scratch => "scratch",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Self::Infographics => "Infographics",
            Self::TextAnimation => "Text animation",
            Self::Posters => "Poster",
            Self::Presentation => "Presentation",
            Self::Scratch => "Scratch",
        }
    }

    /// Guidance lines; `needs` gates lines on capability names so that the prompt never mentions
    /// something the registry cannot resolve.
    pub(crate) fn guidance(self) -> &'static [Guidance] {
        match self {
            Self::Infographics => INFOGRAPHICS,
            Self::TextAnimation => TEXT_ANIMATION,
            Self::Posters => POSTERS,
            Self::Presentation => PRESENTATION,
            Self::Scratch => &[],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown preset \"{s}\" (expected one of: {})",
                    Self::ALL.map(Preset::as_str).join(", ")
                )
            })
    }
}

/// One guidance line, emitted only when every capability in `needs` is registered.
pub(crate) struct Guidance {
    pub(crate) needs: &'static [&'static str],
    pub(crate) text: &'static str,
}

const fn line(needs: &'static [&'static str], text: &'static str) -> Guidance {
    Guidance { needs, text }
}

const INFOGRAPHICS: &[Guidance] = &[
    line(&[], "Present two to four key figures, each with a short label."),
    line(
        &["interpolate"],
        "Count numbers up with interpolate(frame, [start, end], [0, value], { extrapolateRight: \"clamp\" }) and round with Math.round.",
    ),
    line(
        &["Sequence"],
        "Reveal each figure in its own <Sequence from={...}> so the statistics appear one after another.",
    ),
    line(&[], "Draw bars, rings or lines with plain <div> and <svg> elements sized from the animated values."),
    line(&[], "Keep text large and legible: at least 48px for figures and 28px for labels."),
];

const TEXT_ANIMATION: &[Guidance] = &[
    line(&[], "The text is the hero: split headlines into words or letters and animate each piece."),
    line(
        &["spring"],
        "Use spring({ frame: frame - delay, fps }) per word or letter with a staggered delay for organic motion.",
    ),
    line(
        &["interpolate"],
        "Fade and slide pieces with interpolate on opacity and transform: translateY(...).",
    ),
    line(&[], "Keep the copy short (at most about 12 words on screen at once) and centered."),
];

const POSTERS: &[Guidance] = &[
    line(&[], "Compose a single strong layout: headline, supporting line and one focal visual."),
    line(&[], "Motion should be subtle: slow zooms, gentle parallax and soft fades."),
    line(
        &["interpolate"],
        "Drive a slow scale from 1 to about 1.05 across the whole duration with interpolate.",
    ),
    line(&[], "Use generous margins and a clear typographic hierarchy."),
];

const PRESENTATION: &[Guidance] = &[
    line(&[], "Structure the clip as three to five slides with a title and one to three bullet points each."),
    line(
        &["Sequence"],
        "Give every slide its own <Sequence from={...} durationInFrames={...}> and split the total duration evenly between them.",
    ),
    line(
        &["interpolate"],
        "Transition between slides with short fades or slides computed with interpolate.",
    ),
    line(&[], "Keep a consistent layout grid and type scale across slides."),
];
