use crate::foundation::error::{LiveError, LiveResult};

/// Fixed frame rate of the preview surface and of every generated composition.
pub const FRAME_RATE: u32 = 30;

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> LiveResult<Self> {
        if den == 0 {
            return Err(LiveError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LiveError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// The fixed preview rate ([`FRAME_RATE`] frames per second).
    pub const fn preview() -> Self {
        Self {
            num: FRAME_RATE,
            den: 1,
        }
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert a duration in seconds to a whole frame count (rounded to nearest).
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Dimensions and timing of the animation surface a component is rendered into.
///
/// The surface is owned by the host, not by the compiler: the same compiled component can be
/// rendered into any configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate of the surface.
    pub fps: Fps,
    /// Total number of frames.
    pub duration_in_frames: u64,
}

impl VideoConfig {
    /// Build a validated configuration at the fixed preview frame rate.
    pub fn new(width: u32, height: u32, duration_in_frames: u64) -> LiveResult<Self> {
        if width == 0 || height == 0 {
            return Err(LiveError::validation("surface width and height must be > 0"));
        }
        if duration_in_frames == 0 {
            return Err(LiveError::validation("duration_in_frames must be > 0"));
        }
        Ok(Self {
            width,
            height,
            fps: Fps::preview(),
            duration_in_frames,
        })
    }

    /// Build a configuration from a duration in seconds.
    pub fn from_seconds(width: u32, height: u32, seconds: f64) -> LiveResult<Self> {
        Self::new(width, height, frame_count_for_seconds(seconds)?)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: Fps::preview(),
            duration_in_frames: 10 * u64::from(FRAME_RATE),
        }
    }
}

/// Derive the total frame count of a clip from its duration in seconds.
///
/// Fails unless `seconds` is finite, strictly positive and long enough to cover one frame.
pub fn frame_count_for_seconds(seconds: f64) -> LiveResult<u64> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(LiveError::validation(format!(
            "durationSeconds must be a finite number > 0, got {seconds}"
        )));
    }
    let frames = Fps::preview().secs_to_frames_round(seconds);
    if frames == 0 {
        return Err(LiveError::validation(format!(
            "durationSeconds {seconds} is shorter than one frame at {FRAME_RATE} fps"
        )));
    }
    Ok(frames)
}
