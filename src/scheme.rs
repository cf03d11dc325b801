//! Color schemes and dataset styling.
//!
//! A scheme is a fixed six-color palette cycled across datasets (or across
//! data points for the pie family). Styling is a pure function from unstyled
//! datasets to styled clones; ingestion output is never recolored in place.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{ChartKind, Dataset, Paint};

/// An RGBA color. Serialized as a CSS-style string (`#rrggbb` or
/// `rgba(r, g, b, a)`) so chart data round-trips through JSON unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Rgba {
        Rgba { r, g, b, a: 1.0 }
    }

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Rgba {
        Rgba { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f64) -> Rgba {
        Rgba { a, ..self }
    }

    /// Parse `#RGB`, `#RRGGBB`, `rgb(...)`, `rgba(...)` or a small set of
    /// named colors.
    pub fn parse(s: &str) -> Option<Rgba> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_components(body);
        }
        match s.to_lowercase().as_str() {
            "white" => Some(Rgba::WHITE),
            "black" => Some(Rgba::BLACK),
            "red" => Some(Rgba::opaque(255, 0, 0)),
            "green" => Some(Rgba::opaque(0, 128, 0)),
            "blue" => Some(Rgba::opaque(0, 0, 255)),
            "yellow" => Some(Rgba::opaque(255, 255, 0)),
            "orange" => Some(Rgba::opaque(255, 165, 0)),
            "purple" => Some(Rgba::opaque(128, 0, 128)),
            "gray" | "grey" => Some(Rgba::opaque(128, 128, 128)),
            _ => None,
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::opaque(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Rgba::opaque(r, g, b))
        }
        _ => None,
    }
}

fn parse_components(body: &str) -> Option<Rgba> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = parts[0].parse().ok()?;
    let g = parts[1].parse().ok()?;
    let b = parts[2].parse().ok()?;
    let a = if parts.len() == 4 { parts[3].parse().ok()? } else { 1.0 };
    Some(Rgba::new(r, g, b, a))
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.a - 1.0).abs() < f64::EPSILON {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> String {
        c.to_string()
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(s: String) -> Result<Rgba, String> {
        Rgba::parse(&s).ok_or_else(|| format!("invalid color: {s:?}"))
    }
}

/// A fully random opaque-ish color, used when ingestion needs colors before
/// any scheme is chosen.
pub fn random_color(alpha: f64) -> Rgba {
    let mut rng = rand::thread_rng();
    Rgba::new(rng.gen_range(0..=254), rng.gen_range(0..=254), rng.gen_range(0..=254), alpha)
}

/// A named fixed palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    pub id: &'static str,
    pub name: &'static str,
    pub colors: [Rgba; 6],
}

pub const SCHEMES: [ColorScheme; 5] = [
    ColorScheme {
        id: "default",
        name: "Default",
        colors: [
            Rgba::opaque(0x36, 0xa2, 0xeb),
            Rgba::opaque(0xff, 0x63, 0x84),
            Rgba::opaque(0x4b, 0xc0, 0xc0),
            Rgba::opaque(0xff, 0x9f, 0x40),
            Rgba::opaque(0x99, 0x66, 0xff),
            Rgba::opaque(0xff, 0xcd, 0x56),
        ],
    },
    ColorScheme {
        id: "pastel",
        name: "Pastel",
        colors: [
            Rgba::opaque(0xf1, 0xc0, 0xe8),
            Rgba::opaque(0xcf, 0xba, 0xf0),
            Rgba::opaque(0xa3, 0xc4, 0xf3),
            Rgba::opaque(0x90, 0xdb, 0xf4),
            Rgba::opaque(0x8e, 0xec, 0xf5),
            Rgba::opaque(0x98, 0xf5, 0xe1),
        ],
    },
    ColorScheme {
        id: "vibrant",
        name: "Vibrant",
        colors: [
            Rgba::opaque(0xff, 0x59, 0x5e),
            Rgba::opaque(0xff, 0xca, 0x3a),
            Rgba::opaque(0x8a, 0xc9, 0x26),
            Rgba::opaque(0x19, 0x82, 0xc4),
            Rgba::opaque(0x6a, 0x4c, 0x93),
            Rgba::opaque(0xf1, 0x5b, 0xb5),
        ],
    },
    ColorScheme {
        id: "monochrome",
        name: "Monochrome",
        colors: [
            Rgba::opaque(0x00, 0x00, 0x00),
            Rgba::opaque(0x33, 0x33, 0x33),
            Rgba::opaque(0x66, 0x66, 0x66),
            Rgba::opaque(0x99, 0x99, 0x99),
            Rgba::opaque(0xcc, 0xcc, 0xcc),
            Rgba::opaque(0xff, 0xff, 0xff),
        ],
    },
    ColorScheme {
        id: "earth",
        name: "Earth Tones",
        colors: [
            Rgba::opaque(0x58, 0x2f, 0x0e),
            Rgba::opaque(0x7f, 0x4f, 0x24),
            Rgba::opaque(0x93, 0x66, 0x39),
            Rgba::opaque(0xa6, 0x8a, 0x64),
            Rgba::opaque(0xb6, 0xad, 0x90),
            Rgba::opaque(0xc2, 0xc5, 0xaa),
        ],
    },
];

impl ColorScheme {
    pub fn by_id(id: &str) -> Option<&'static ColorScheme> {
        SCHEMES.iter().find(|s| s.id == id)
    }

    pub fn default_scheme() -> &'static ColorScheme {
        &SCHEMES[0]
    }
}

/// Apply a scheme to datasets, returning styled clones.
///
/// The fields set differ by chart kind: lines get a border color and no fill,
/// bars a solid fill, the pie family one color per data point, radar a single
/// accent with forced fill and distinct points, polar area the palette at
/// reduced opacity.
pub fn styled(
    datasets: &[Dataset],
    kind: ChartKind,
    scheme: &ColorScheme,
    border_width: f64,
) -> Vec<Dataset> {
    datasets
        .iter()
        .enumerate()
        .map(|(index, ds)| {
            let color = scheme.colors[index % scheme.colors.len()];
            let mut out = ds.clone();
            out.border_width = Some(border_width);
            match kind {
                ChartKind::Line => {
                    out.border_color = Some(Paint::Single(color));
                    out.background_color = Some(Paint::Single(color.with_alpha(0.2)));
                    out.fill = Some(false);
                }
                ChartKind::Bar => {
                    out.background_color = Some(Paint::Single(color));
                    out.border_color = Some(Paint::Single(color));
                }
                ChartKind::Pie | ChartKind::Doughnut => {
                    out.background_color = Some(Paint::PerPoint(scheme.colors.to_vec()));
                }
                ChartKind::Radar => {
                    out.fill = Some(true);
                    out.background_color = Some(Paint::Single(color.with_alpha(0.2)));
                    out.border_color = Some(Paint::Single(color));
                    out.point_radius = Some(4.0);
                    out.tension = Some(0.0);
                }
                ChartKind::PolarArea => {
                    out.background_color = Some(Paint::PerPoint(
                        scheme.colors.iter().map(|c| c.with_alpha(0.47)).collect(),
                    ));
                    out.border_color = Some(Paint::PerPoint(scheme.colors.to_vec()));
                }
                ChartKind::Bubble | ChartKind::Scatter => {
                    out.background_color = Some(Paint::Single(color.with_alpha(0.7)));
                    out.border_color = Some(Paint::Single(color));
                }
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse("#FF0000"), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(Rgba::parse("#F00"), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(Rgba::parse("#cccccc"), Some(Rgba::opaque(204, 204, 204)));
        assert_eq!(Rgba::parse("#12345"), None);
    }

    #[test]
    fn test_parse_rgba() {
        assert_eq!(
            Rgba::parse("rgba(75, 192, 192, 0.5)"),
            Some(Rgba::new(75, 192, 192, 0.5))
        );
        assert_eq!(Rgba::parse("rgb(53, 162, 235)"), Some(Rgba::opaque(53, 162, 235)));
        assert_eq!(Rgba::parse("rgba(1, 2)"), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for c in [Rgba::opaque(0x36, 0xa2, 0xeb), Rgba::new(255, 99, 132, 0.5)] {
            assert_eq!(Rgba::parse(&c.to_string()), Some(c));
        }
    }

    #[test]
    fn test_scheme_lookup() {
        assert_eq!(ColorScheme::by_id("pastel").unwrap().name, "Pastel");
        assert!(ColorScheme::by_id("neon").is_none());
    }

    #[test]
    fn test_styled_does_not_mutate_input() {
        let datasets = vec![Dataset::from_numbers("a", vec![1.0, 2.0])];
        let out = styled(&datasets, ChartKind::Line, ColorScheme::default_scheme(), 2.0);
        assert!(datasets[0].border_color.is_none());
        assert!(out[0].border_color.is_some());
        assert_eq!(out[0].fill, Some(false));
    }

    #[test]
    fn test_styled_cycles_palette() {
        let datasets: Vec<Dataset> =
            (0..8).map(|i| Dataset::from_numbers(format!("s{i}"), vec![1.0])).collect();
        let out = styled(&datasets, ChartKind::Bar, ColorScheme::default_scheme(), 1.0);
        assert_eq!(out[0].background_color, out[6].background_color);
        assert_ne!(out[0].background_color, out[1].background_color);
    }

    #[test]
    fn test_pie_colors_per_point() {
        let datasets = vec![Dataset::from_numbers("a", vec![1.0, 2.0, 3.0])];
        let out = styled(&datasets, ChartKind::Pie, ColorScheme::default_scheme(), 1.0);
        match out[0].background_color.as_ref().unwrap() {
            Paint::PerPoint(cs) => assert_eq!(cs.len(), 6),
            Paint::Single(_) => panic!("pie charts color per point"),
        }
    }

    #[test]
    fn test_radar_forces_fill_and_flat_lines() {
        let datasets = vec![Dataset::from_numbers("a", vec![1.0])];
        let out = styled(&datasets, ChartKind::Radar, ColorScheme::default_scheme(), 1.0);
        assert_eq!(out[0].fill, Some(true));
        assert_eq!(out[0].tension, Some(0.0));
    }

    #[test]
    fn test_random_color_alpha() {
        let c = random_color(0.7);
        assert!((c.a - 0.7).abs() < f64::EPSILON);
    }
}
