/// Physical parameters of a damped harmonic spring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SpringConfig {
    pub(crate) damping: f64,
    pub(crate) mass: f64,
    pub(crate) stiffness: f64,
    pub(crate) overshoot_clamping: bool,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            damping: 10.0,
            mass: 1.0,
            stiffness: 100.0,
            overshoot_clamping: false,
        }
    }
}

/// Full set of inputs to a spring sample.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpringParams {
    pub(crate) frame: f64,
    pub(crate) fps: f64,
    pub(crate) config: SpringConfig,
    pub(crate) from: f64,
    pub(crate) to: f64,
    pub(crate) delay: f64,
    pub(crate) duration_in_frames: Option<f64>,
    pub(crate) reverse: bool,
}

// Simulation is normalized to travel from 0 to 1.
#[derive(Clone, Copy, Debug)]
struct SpringState {
    current: f64,
    velocity: f64,
    last_ms: f64,
}

const MAX_STEP_MS: f64 = 64.0;
const MAX_SIMULATED_FRAMES: u64 = 100_000;
const REST_THRESHOLD: f64 = 0.005;

fn advance(s: SpringState, now_ms: f64, cfg: &SpringConfig) -> SpringState {
    let dt = (now_ms - s.last_ms).min(MAX_STEP_MS);
    let (c, m, k) = (cfg.damping, cfg.mass, cfg.stiffness);
    let v0 = -s.velocity;
    let x0 = 1.0 - s.current;
    let zeta = c / (2.0 * (k * m).sqrt());
    let omega0 = (k / m).sqrt();
    let t = dt / 1000.0;

    let (current, velocity) = if zeta < 1.0 {
        let omega1 = omega0 * (1.0 - zeta * zeta).sqrt();
        let (sin1, cos1) = (omega1 * t).sin_cos();
        let envelope = (-zeta * omega0 * t).exp();
        let frag = envelope * (sin1 * ((v0 + zeta * omega0 * x0) / omega1) + x0 * cos1);
        let velocity = zeta * omega0 * frag
            - envelope * (cos1 * (v0 + zeta * omega0 * x0) - omega1 * x0 * sin1);
        (1.0 - frag, velocity)
    } else {
        let envelope = (-omega0 * t).exp();
        let current = 1.0 - envelope * (x0 + (v0 + omega0 * x0) * t);
        let velocity = envelope * (v0 * (t * omega0 - 1.0) + t * x0 * omega0 * omega0);
        (current, velocity)
    };

    SpringState {
        current,
        velocity,
        last_ms: now_ms,
    }
}

fn simulate(frame: f64, fps: f64, cfg: &SpringConfig) -> SpringState {
    let frame = frame.clamp(0.0, MAX_SIMULATED_FRAMES as f64);
    let whole = frame.floor() as u64;
    let rest = frame - whole as f64;
    let mut s = SpringState {
        current: 0.0,
        velocity: 0.0,
        last_ms: 0.0,
    };
    for f in 0..=whole {
        let fv = if f == whole {
            f as f64 + rest
        } else {
            f as f64
        };
        s = advance(s, fv / fps * 1000.0, cfg);
    }
    s
}

/// Number of frames until the spring settles within the rest threshold and stays there.
pub(crate) fn measure_spring(fps: f64, cfg: &SpringConfig) -> u64 {
    let mut s = SpringState {
        current: 0.0,
        velocity: 0.0,
        last_ms: 0.0,
    };
    s = advance(s, 0.0, cfg);
    let mut frame = 0u64;
    let mut settled_at = None;
    let mut quiet = 0u32;
    while frame < MAX_SIMULATED_FRAMES {
        if (s.current - 1.0).abs() < REST_THRESHOLD {
            settled_at.get_or_insert(frame);
            quiet += 1;
            if quiet > 20 {
                break;
            }
        } else {
            settled_at = None;
            quiet = 0;
        }
        frame += 1;
        s = advance(s, frame as f64 / fps * 1000.0, cfg);
    }
    settled_at.unwrap_or(frame)
}

/// Sample a spring animation at `p.frame`.
pub(crate) fn spring(p: &SpringParams) -> f64 {
    let natural = || measure_spring(p.fps, &p.config) as f64;
    let reversed = if p.reverse {
        p.duration_in_frames.unwrap_or_else(natural) - p.frame
    } else {
        p.frame
    };
    let delayed = if p.reverse {
        reversed + p.delay
    } else {
        reversed - p.delay
    };
    let local = match p.duration_in_frames {
        Some(d) if d > 0.0 => delayed / (d / natural()),
        _ => delayed,
    };

    let progress = simulate(local, p.fps, &p.config).current;
    let progress = if p.config.overshoot_clamping {
        progress.min(1.0)
    } else {
        progress
    };
    p.from + (p.to - p.from) * progress
}
