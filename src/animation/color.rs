/// Straight-alpha RGBA color with channels normalized to `0..1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Color {
    pub(crate) r: f64,
    pub(crate) g: f64,
    pub(crate) b: f64,
    pub(crate) a: f64,
}

impl Color {
    pub(crate) fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub(crate) fn lerp(a: Self, b: Self, t: f64) -> Self {
        let mix = |x: f64, y: f64| x + (y - x) * t;
        Self {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
            a: mix(a.a, b.a),
        }
    }

    /// CSS `rgba(...)` notation with 8-bit color channels.
    pub(crate) fn to_css(self) -> String {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        let a = (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        format!(
            "rgba({}, {}, {}, {})",
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            a
        )
    }
}

/// Parse a CSS color string: hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`, `rgba()`,
/// `hsl()`, `hsla()` or one of a small set of named colors.
pub(crate) fn parse_css_color(s: &str) -> Result<Color, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(args) = func_args(&lower, "rgba").or_else(|| func_args(&lower, "rgb")) {
        let v = parse_components(args)?;
        let (r, g, b) = (v[0] / 255.0, v[1] / 255.0, v[2] / 255.0);
        return Ok(Color::rgba(r, g, b, v.get(3).copied().unwrap_or(1.0)));
    }
    if let Some(args) = func_args(&lower, "hsla").or_else(|| func_args(&lower, "hsl")) {
        let v = parse_components(args)?;
        return Ok(hsla_to_rgba(
            v[0],
            v[1] / 100.0,
            v[2] / 100.0,
            v.get(3).copied().unwrap_or(1.0),
        ));
    }
    named(&lower).ok_or_else(|| format!("unsupported color \"{s}\""))
}

fn func_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_components(args: &str) -> Result<Vec<f64>, String> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("expected 3 or 4 color components, got {}", parts.len()));
    }
    parts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (num, pct) = match p.strip_suffix('%') {
                Some(n) => (n, true),
                None => (p.trim_end_matches("deg"), false),
            };
            let v: f64 = num
                .parse()
                .map_err(|_| format!("invalid color component \"{p}\""))?;
            // Percent alpha is 0..100; percent channels stay in their own scale.
            Ok(if pct && i == 3 { v / 100.0 } else { v })
        })
        .collect()
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn nibble(c: char) -> Result<f64, String> {
        c.to_digit(16)
            .map(|d| f64::from(d * 17) / 255.0)
            .ok_or_else(|| format!("invalid hex digit '{c}'"))
    }
    fn byte(pair: &str) -> Result<f64, String> {
        u8::from_str_radix(pair, 16)
            .map(|b| f64::from(b) / 255.0)
            .map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    let chars: Vec<char> = s.chars().collect();
    match s.len() {
        3 | 4 => {
            let a = if s.len() == 4 { nibble(chars[3])? } else { 1.0 };
            Ok(Color::rgba(
                nibble(chars[0])?,
                nibble(chars[1])?,
                nibble(chars[2])?,
                a,
            ))
        }
        6 | 8 => {
            let a = if s.len() == 8 { byte(&s[6..8])? } else { 1.0 };
            Ok(Color::rgba(byte(&s[0..2])?, byte(&s[2..4])?, byte(&s[4..6])?, a))
        }
        _ => Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

fn named(s: &str) -> Option<Color> {
    let (r, g, b, a) = match s {
        "transparent" => (0, 0, 0, 0.0),
        "black" => (0, 0, 0, 1.0),
        "white" => (255, 255, 255, 1.0),
        "red" => (255, 0, 0, 1.0),
        "green" => (0, 128, 0, 1.0),
        "blue" => (0, 0, 255, 1.0),
        "yellow" => (255, 255, 0, 1.0),
        "orange" => (255, 165, 0, 1.0),
        "purple" => (128, 0, 128, 1.0),
        "pink" => (255, 192, 203, 1.0),
        "gray" | "grey" => (128, 128, 128, 1.0),
        "cyan" => (0, 255, 255, 1.0),
        "magenta" => (255, 0, 255, 1.0),
        _ => return None,
    };
    let c = |v: u8| f64::from(v) / 255.0;
    Some(Color::rgba(c(r), c(g), c(b), a))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Color {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Color::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Color::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}
