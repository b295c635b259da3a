//! Chart colors: the series palette, color parsing, contrast text colors and
//! heatmap color scales.
//!
//! Colors travel through the pipeline as CSS strings (`#RRGGBB` or `rgb(r,g,b)`),
//! which is what the renderer consumes; [`Rgb8`] is only used for arithmetic.

use ahash::AHashMap;

/// Series palette, indexed by series position modulo its length.
pub const PALETTE: [(&str, &str); 14] = [
    ("Blue", "#356AFF"),
    ("Red", "#E92828"),
    ("Green", "#3BD973"),
    ("Purple", "#604FE9"),
    ("Cyan", "#50F5ED"),
    ("Orange", "#FB8D3D"),
    ("Light Blue", "#799CFF"),
    ("Lilac", "#B554FF"),
    ("Light Green", "#8CFFB4"),
    ("Brown", "#A55F2A"),
    ("Black", "#000000"),
    ("Gray", "#494949"),
    ("Pink", "#FF7DE3"),
    ("Dark Blue", "#002FB4"),
];

pub const LIGHT_TEXT: &str = "#ffffff";
pub const DARK_TEXT: &str = "#333333";

/// Name of the heatmap scheme that uses the min/max color pickers.
pub const CUSTOM_SCHEME: &str = "Custom...";

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()].1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Rgb8 = Rgb8 { r: 255, g: 255, b: 255 };

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    pub fn parse(css: &str) -> Option<Self> {
        let s = css.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let inner = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<f64>().ok());
        let mut channel = || parts.next().flatten().map(|v| v.round().clamp(0.0, 255.0) as u8);
        Some(Rgb8 {
            r: channel()?,
            g: channel()?,
            b: channel()?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `0..=1`.
    pub fn luminance(self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    fn mix(self, other: Rgb8, t: f64) -> Rgb8 {
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb8 {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgb8> {
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some(Rgb8 {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// Pick the label color with the larger luminance difference to `background`.
/// Unparsable backgrounds get dark text.
pub fn choose_text_color(background: &str) -> &'static str {
    let Some(bg) = Rgb8::parse(background) else {
        return DARK_TEXT;
    };
    let bg_l = bg.luminance();
    let diff = |css: &str| {
        Rgb8::parse(css)
            .map(|c| (c.luminance() - bg_l).abs())
            .unwrap_or(0.0)
    };
    if diff(LIGHT_TEXT) >= diff(DARK_TEXT) {
        LIGHT_TEXT
    } else {
        DARK_TEXT
    }
}

/// Color-scale stops as `(position, css color)`, positions ascending in `0..=1`.
pub type ScaleStops = Vec<(f64, String)>;

fn stops(raw: &[(f64, &str)]) -> ScaleStops {
    raw.iter().map(|(p, c)| (*p, (*c).to_string())).collect()
}

/// Heatmap scale used when no scheme is selected.
pub fn default_heatmap_scale() -> ScaleStops {
    stops(&[
        (0.0, "#356aff"),
        (0.125, "#4a7aff"),
        (0.25, "#5d87ff"),
        (0.375, "#7398ff"),
        (0.5, "#b0c3ff"),
        (0.625, "#fb8c8c"),
        (0.75, "#ec6463"),
        (0.875, "#ec4949"),
        (1.0, "#e92827"),
    ])
}

/// Exactly two stops: `[0, min]` and `[1, max]`.
pub fn custom_heatmap_scale(min_color: &str, max_color: &str) -> ScaleStops {
    vec![(0.0, min_color.to_string()), (1.0, max_color.to_string())]
}

/// Stop lists of the renderer's named scales, used to compute label contrast.
pub fn preset_scale(name: &str) -> Option<ScaleStops> {
    let raw: &[(f64, &str)] = match name {
        "Greys" => &[(0.0, "rgb(0,0,0)"), (1.0, "rgb(255,255,255)")],
        "Bluered" => &[(0.0, "rgb(0,0,255)"), (1.0, "rgb(255,0,0)")],
        "Blues" => &[
            (0.0, "rgb(5,10,172)"),
            (0.35, "rgb(40,60,190)"),
            (0.5, "rgb(70,100,245)"),
            (0.6, "rgb(90,120,245)"),
            (0.7, "rgb(106,137,247)"),
            (1.0, "rgb(220,220,220)"),
        ],
        "Reds" => &[
            (0.0, "rgb(220,220,220)"),
            (0.2, "rgb(245,195,157)"),
            (0.4, "rgb(245,160,105)"),
            (1.0, "rgb(178,10,28)"),
        ],
        "RdBu" => &[
            (0.0, "rgb(5,10,172)"),
            (0.35, "rgb(106,137,247)"),
            (0.5, "rgb(190,190,190)"),
            (0.6, "rgb(220,170,132)"),
            (0.7, "rgb(230,145,90)"),
            (1.0, "rgb(178,10,28)"),
        ],
        "Greens" => &[
            (0.0, "rgb(0,68,27)"),
            (0.125, "rgb(0,109,44)"),
            (0.25, "rgb(35,139,69)"),
            (0.375, "rgb(65,171,93)"),
            (0.5, "rgb(116,196,118)"),
            (0.625, "rgb(161,217,155)"),
            (0.75, "rgb(199,233,192)"),
            (0.875, "rgb(229,245,224)"),
            (1.0, "rgb(247,252,245)"),
        ],
        "YlGnBu" => &[
            (0.0, "rgb(8,29,88)"),
            (0.125, "rgb(37,52,148)"),
            (0.25, "rgb(34,94,168)"),
            (0.375, "rgb(29,145,192)"),
            (0.5, "rgb(65,182,196)"),
            (0.625, "rgb(127,205,187)"),
            (0.75, "rgb(199,233,180)"),
            (0.875, "rgb(237,248,217)"),
            (1.0, "rgb(255,255,217)"),
        ],
        "YlOrRd" => &[
            (0.0, "rgb(128,0,38)"),
            (0.125, "rgb(189,0,38)"),
            (0.25, "rgb(227,26,28)"),
            (0.375, "rgb(252,78,42)"),
            (0.5, "rgb(253,141,60)"),
            (0.625, "rgb(254,178,76)"),
            (0.75, "rgb(254,217,118)"),
            (0.875, "rgb(255,237,160)"),
            (1.0, "rgb(255,255,204)"),
        ],
        "Hot" => &[
            (0.0, "rgb(0,0,0)"),
            (0.3, "rgb(230,0,0)"),
            (0.6, "rgb(255,210,0)"),
            (1.0, "rgb(255,255,255)"),
        ],
        "Electric" => &[
            (0.0, "rgb(0,0,0)"),
            (0.15, "rgb(30,0,100)"),
            (0.4, "rgb(120,0,100)"),
            (0.6, "rgb(160,90,0)"),
            (0.8, "rgb(230,200,0)"),
            (1.0, "rgb(255,250,220)"),
        ],
        "Jet" => &[
            (0.0, "rgb(0,0,131)"),
            (0.125, "rgb(0,60,170)"),
            (0.375, "rgb(5,255,255)"),
            (0.625, "rgb(255,255,0)"),
            (0.875, "rgb(250,0,0)"),
            (1.0, "rgb(128,0,0)"),
        ],
        "Viridis" => &[
            (0.0, "#440154"),
            (0.25, "#3b528b"),
            (0.5, "#21918c"),
            (0.75, "#5ec962"),
            (1.0, "#fde725"),
        ],
        _ => return None,
    };
    Some(stops(raw))
}

/// Color at position `t` (clamped to `0..=1`) of a scale, linearly interpolated in RGB.
pub fn interpolate_scale(scale: &[(f64, String)], t: f64) -> Option<Rgb8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let parsed: Vec<(f64, Rgb8)> = scale
        .iter()
        .filter_map(|(p, css)| Rgb8::parse(css).map(|c| (*p, c)))
        .collect();
    let (first, last) = (parsed.first()?, parsed.last()?);
    if t <= first.0 {
        return Some(first.1);
    }
    for pair in parsed.windows(2) {
        let ((p0, c0), (p1, c1)) = (pair[0], pair[1]);
        if t <= p1 {
            let span = p1 - p0;
            let local = if span > 0.0 { (t - p0) / span } else { 1.0 };
            return Some(c0.mix(c1, local));
        }
    }
    Some(last.1)
}

/// Assigns palette colors to labels in first-seen order; repeated labels keep their color.
#[derive(Debug, Default, Clone)]
pub struct OrdinalPalette {
    assigned: AHashMap<String, usize>,
}

impl OrdinalPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, label: &str) -> &'static str {
        let next = self.assigned.len();
        let idx = *self.assigned.entry(label.to_string()).or_insert(next);
        palette_color(idx)
    }
}
