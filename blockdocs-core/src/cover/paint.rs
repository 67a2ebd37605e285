//! CSS colors and `linear-gradient(...)` backgrounds

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb()`/`rgba()` or a basic named color
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(args);
        }
        named(&s)
    }

    /// Composite onto white, dropping alpha
    pub fn over_white(self) -> [u8; 3] {
        let a = self.a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
        [blend(self.r), blend(self.g), blend(self.b)]
    }

    fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color {
            a: nibble(3)?,
            ..Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)
        }),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color {
            a: byte(6)?,
            ..Color::rgb(byte(0)?, byte(2)?, byte(4)?)
        }),
        _ => None,
    }
}

fn parse_rgb_function(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| -> Option<u8> {
        match p.strip_suffix('%') {
            Some(pct) => pct
                .parse::<f32>()
                .ok()
                .map(|v| (v.clamp(0.0, 100.0) * 2.55).round() as u8),
            None => p.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8),
        }
    };
    let alpha = match parts.get(3) {
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => p.parse::<f32>().ok()?,
        },
        None => 1.0,
    };

    Some(Color {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    })
}

fn named(name: &str) -> Option<Color> {
    let color = match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "navy" => Color::rgb(0, 0, 128),
        "yellow" => Color::rgb(255, 255, 0),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "teal" => Color::rgb(0, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "transparent" => Color {
            a: 0,
            ..Color::BLACK
        },
        _ => return None,
    };
    Some(color)
}

/// A gradient stop, position in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Color,
    pub position: f32,
}

/// Cover background fill
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Solid(Color),
    /// Drawn along the top-left to bottom-right diagonal
    Gradient(Vec<ColorStop>),
}

impl Background {
    /// Parse a `linear-gradient(...)` first, then a flat color; white when neither parses
    pub fn parse(input: &str) -> Self {
        if let Some(stops) = parse_linear_gradient(input) {
            return Background::Gradient(stops);
        }
        Background::Solid(Color::parse(input).unwrap_or(Color::WHITE))
    }

    /// Color at `t` along the gradient axis
    pub fn color_at(&self, t: f32) -> Color {
        let stops = match self {
            Background::Solid(color) => return *color,
            Background::Gradient(stops) => stops,
        };
        let t = t.clamp(0.0, 1.0);

        let (first, last) = match (stops.first(), stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::WHITE,
        };
        if t <= first.position {
            return first.color;
        }
        for pair in stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if t <= to.position {
                let span = to.position - from.position;
                if span <= f32::EPSILON {
                    return to.color;
                }
                return from.color.lerp(to.color, (t - from.position) / span);
            }
        }
        last.color
    }
}

/// Parse `linear-gradient([direction,] color [pos%], color [pos%], ...)`
///
/// The direction is accepted and ignored. Missing positions are spread
/// evenly between their neighbours.
pub fn parse_linear_gradient(input: &str) -> Option<Vec<ColorStop>> {
    let inner = input
        .trim()
        .strip_prefix("linear-gradient(")?
        .strip_suffix(')')?;

    let mut args = split_top_level(inner);
    if let Some(first) = args.first() {
        let first = first.trim().to_ascii_lowercase();
        if first.starts_with("to ")
            || ["deg", "turn", "rad", "grad"].iter().any(|u| first.ends_with(u))
        {
            args.remove(0);
        }
    }

    let mut raw: Vec<(Color, Option<f32>)> = Vec::new();
    for arg in args {
        let arg = arg.trim();
        let (color, position) = match arg.rsplit_once(' ') {
            Some((color, pos)) if pos.ends_with('%') && !color.trim().is_empty() => {
                let pct = pos.trim_end_matches('%').parse::<f32>().ok()?;
                (color.trim(), Some(pct / 100.0))
            }
            _ => (arg, None),
        };
        raw.push((Color::parse(color)?, position));
    }
    if raw.len() < 2 {
        return None;
    }

    Some(spread_positions(raw))
}

fn spread_positions(raw: Vec<(Color, Option<f32>)>) -> Vec<ColorStop> {
    let n = raw.len();
    let mut positions: Vec<Option<f32>> = raw.iter().map(|(_, p)| *p).collect();
    if positions[0].is_none() {
        positions[0] = Some(0.0);
    }
    if positions[n - 1].is_none() {
        positions[n - 1] = Some(1.0);
    }

    let mut i = 0;
    while i < n {
        if positions[i].is_some() {
            i += 1;
            continue;
        }
        let start = i - 1;
        let mut end = i;
        while positions[end].is_none() {
            end += 1;
        }
        let (from, to) = (positions[start].unwrap_or(0.0), positions[end].unwrap_or(1.0));
        let steps = (end - start) as f32;
        for (k, slot) in positions.iter_mut().enumerate().take(end).skip(i) {
            *slot = Some(from + (to - from) * (k - start) as f32 / steps);
        }
        i = end;
    }

    let mut previous = 0.0f32;
    raw.into_iter()
        .zip(positions)
        .map(|((color, _), position)| {
            previous = position.unwrap_or(previous).max(previous);
            ColorStop {
                color,
                position: previous,
            }
        })
        .collect()
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
