use crate::animation::color::{Color, parse_css_color};

/// Behaviour of `interpolate` outside of its input range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum Extrapolate {
    /// Continue the slope of the nearest segment.
    #[default]
    Extend,
    /// Hold the nearest output value.
    Clamp,
    /// Return the input unchanged.
    Identity,
}

impl Extrapolate {
    pub(crate) fn parse(s: &str) -> Result<Self, String> {
        match s {
            "extend" => Ok(Self::Extend),
            "clamp" => Ok(Self::Clamp),
            "identity" => Ok(Self::Identity),
            other => Err(format!(
                "extrapolation must be \"extend\", \"clamp\" or \"identity\", got \"{other}\""
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct InterpolateOpts {
    pub(crate) left: Extrapolate,
    pub(crate) right: Extrapolate,
}

fn check_ranges(input: f64, input_range: &[f64], output_len: usize) -> Result<(), String> {
    if input.is_nan() {
        return Err("interpolate: input must be a number, got NaN".to_owned());
    }
    if input_range.len() < 2 {
        return Err("interpolate: inputRange must have at least 2 elements".to_owned());
    }
    if input_range.len() != output_len {
        return Err(format!(
            "interpolate: inputRange ({}) and outputRange ({}) must have the same length",
            input_range.len(),
            output_len
        ));
    }
    for w in input_range.windows(2) {
        if w[1] <= w[0] || w[0].is_nan() || w[1].is_nan() {
            return Err(format!(
                "interpolate: inputRange must be strictly monotonically increasing, got [{}]",
                input_range
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }
    Ok(())
}

fn find_segment(input: f64, input_range: &[f64]) -> usize {
    let mut i = 1;
    while i < input_range.len() - 1 {
        if input_range[i] >= input {
            break;
        }
        i += 1;
    }
    i - 1
}

/// Map `input` through a piecewise-linear function, shaping each segment with `easing`.
///
/// `easing` receives segment-local progress (which may leave `[0, 1]` under `Extend`) and may
/// fail, for instance when it calls back into generated code.
pub(crate) fn interpolate<E>(
    input: f64,
    input_range: &[f64],
    output_range: &[f64],
    opts: InterpolateOpts,
    mut easing: impl FnMut(f64) -> Result<f64, E>,
) -> Result<Result<f64, E>, String> {
    check_ranges(input, input_range, output_range.len())?;
    let i = find_segment(input, input_range);
    let (in_min, in_max) = (input_range[i], input_range[i + 1]);
    let (out_min, out_max) = (output_range[i], output_range[i + 1]);

    let mut x = input;
    if x < in_min {
        match opts.left {
            Extrapolate::Identity => return Ok(Ok(x)),
            Extrapolate::Clamp => x = in_min,
            Extrapolate::Extend => {}
        }
    }
    if x > in_max {
        match opts.right {
            Extrapolate::Identity => return Ok(Ok(x)),
            Extrapolate::Clamp => x = in_max,
            Extrapolate::Extend => {}
        }
    }
    if out_min == out_max {
        return Ok(Ok(out_min));
    }

    let t = (x - in_min) / (in_max - in_min);
    Ok(easing(t).map(|eased| out_min + eased * (out_max - out_min)))
}

/// Map `input` onto a range of CSS colors; the result is always `rgba(...)` notation.
pub(crate) fn interpolate_colors(
    input: f64,
    input_range: &[f64],
    colors: &[String],
) -> Result<String, String> {
    check_ranges(input, input_range, colors.len())?;
    let parsed = colors
        .iter()
        .map(|c| parse_css_color(c))
        .collect::<Result<Vec<Color>, String>>()?;

    let i = find_segment(input, input_range);
    let (in_min, in_max) = (input_range[i], input_range[i + 1]);
    let t = ((input - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
    Ok(Color::lerp(parsed[i], parsed[i + 1], t).to_css())
}
