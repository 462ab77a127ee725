use std::f64::consts::PI;

/// Easing curves exposed to generated code through the `Easing` namespace.
///
/// Unlike timeline easing, `apply` does not clamp its input: `interpolate` with `extend`
/// extrapolation feeds progress values outside `[0, 1]` through the curve.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Ease {
    Linear,
    Quad,
    Cubic,
    Poly(f64),
    Sin,
    Circle,
    Exp,
    Back(f64),
    Elastic(f64),
    Bounce,
    Bezier(CubicBezier),
    In(Box<Ease>),
    Out(Box<Ease>),
    InOut(Box<Ease>),
}

impl Ease {
    /// The CSS `ease` curve.
    pub(crate) fn ease() -> Self {
        Self::Bezier(CubicBezier::new(0.42, 0.0, 1.0, 1.0))
    }

    pub(crate) fn apply(&self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Poly(n) => t.powf(*n),
            Self::Sin => 1.0 - (t * PI / 2.0).cos(),
            Self::Circle => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Exp => 2f64.powf(10.0 * (t - 1.0)),
            Self::Back(s) => t * t * ((s + 1.0) * t - s),
            Self::Elastic(bounciness) => {
                let p = bounciness * PI;
                1.0 - (t * PI / 2.0).cos().powi(3) * (t * p).cos()
            }
            Self::Bounce => bounce(t),
            Self::Bezier(b) => b.solve(t),
            Self::In(e) => e.apply(t),
            Self::Out(e) => 1.0 - e.apply(1.0 - t),
            Self::InOut(e) => {
                if t < 0.5 {
                    e.apply(t * 2.0) / 2.0
                } else {
                    1.0 - e.apply((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }
}

fn bounce(t: f64) -> f64 {
    if t < 1.0 / 2.75 {
        return 7.5625 * t * t;
    }
    if t < 2.0 / 2.75 {
        let t2 = t - 1.5 / 2.75;
        return 7.5625 * t2 * t2 + 0.75;
    }
    if t < 2.5 / 2.75 {
        let t2 = t - 2.25 / 2.75;
        return 7.5625 * t2 * t2 + 0.9375;
    }
    let t2 = t - 2.625 / 2.75;
    7.5625 * t2 * t2 + 0.984375
}

/// CSS-style cubic bezier timing curve through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl CubicBezier {
    pub(crate) fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    fn coord(t: f64, p1: f64, p2: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    fn slope(t: f64, p1: f64, p2: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Map progress `x` to curve output `y`.
    pub(crate) fn solve(&self, x: f64) -> f64 {
        if self.x1 == self.y1 && self.x2 == self.y2 {
            return x;
        }
        if x <= 0.0 || x >= 1.0 {
            // Outside the unit interval the curve continues along its end tangents.
            let (slope, x0, y0) = if x <= 0.0 {
                let s = if self.x1 > 0.0 {
                    self.y1 / self.x1
                } else {
                    0.0
                };
                (s, 0.0, 0.0)
            } else {
                let s = if self.x2 < 1.0 {
                    (1.0 - self.y2) / (1.0 - self.x2)
                } else {
                    0.0
                };
                (s, 1.0, 1.0)
            };
            return y0 + slope * (x - x0);
        }

        // Newton-Raphson, falling back to bisection when the slope flattens out.
        let mut t = x;
        for _ in 0..8 {
            let err = Self::coord(t, self.x1, self.x2) - x;
            if err.abs() < 1e-7 {
                return Self::coord(t, self.y1, self.y2);
            }
            let d = Self::slope(t, self.x1, self.x2);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..64 {
            let v = Self::coord(t, self.x1, self.x2);
            if (v - x).abs() < 1e-7 {
                break;
            }
            if v < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
        }
        Self::coord(t, self.y1, self.y2)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
