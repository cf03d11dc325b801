//! Render options and scale assembly.
//!
//! Options are plain data assembled from UI-level settings once per render;
//! nothing here mutates chart data.

use serde::{Deserialize, Serialize};

use crate::data::{ChartKind, ScaleCategory};
use crate::scheme::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn grid_color(&self) -> Rgba {
        match self {
            Theme::Light => Rgba::new(0, 0, 0, 0.1),
            Theme::Dark => Rgba::new(255, 255, 255, 0.1),
        }
    }

    pub fn text_color(&self) -> Rgba {
        match self {
            Theme::Light => Rgba::new(0, 0, 0, 0.8),
            Theme::Dark => Rgba::new(255, 255, 255, 0.8),
        }
    }

    pub fn background_color(&self) -> Rgba {
        match self {
            Theme::Light => Rgba::WHITE,
            Theme::Dark => Rgba::opaque(24, 24, 27),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    #[default]
    Top,
    Left,
    Bottom,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendSettings {
    pub show: bool,
    pub position: LegendPosition,
}

impl Default for LegendSettings {
    fn default() -> Self {
        LegendSettings { show: true, position: LegendPosition::Top }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleSettings {
    pub show: bool,
    pub text: String,
}

impl Default for TitleSettings {
    fn default() -> Self {
        TitleSettings { show: true, text: "Chart Demo".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSettings {
    pub family: String,
    pub size: u32,
}

impl Default for FontSettings {
    fn default() -> Self {
        FontSettings { family: "Arial".to_string(), size: 12 }
    }
}

/// Whether entry animation plays, and whether a looping frame animation
/// keeps running after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    Off,
    #[default]
    Once,
    Loop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSettings {
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: Easing,
    pub mode: AnimationMode,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        AnimationSettings {
            duration_ms: 1000,
            delay_ms: 0,
            easing: Easing::default(),
            mode: AnimationMode::Once,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppearanceSettings {
    pub aspect_ratio: f64,
    pub border_width: f64,
    pub tension: f64,
    pub point_radius: f64,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        AppearanceSettings { aspect_ratio: 2.0, border_width: 1.0, tension: 0.4, point_radius: 4.0 }
    }
}

/// Everything the renderer needs beyond the data itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub title: TitleSettings,
    pub legend: LegendSettings,
    pub animation: AnimationSettings,
    pub font: FontSettings,
    pub appearance: AppearanceSettings,
    pub theme: Theme,
}

/// One cartesian axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub title: Option<String>,
    pub grid_color: Rgba,
    pub text_color: Rgba,
    pub begin_at_zero: bool,
    pub stacked: bool,
    pub draw_grid: bool,
}

impl Axis {
    fn themed(theme: Theme) -> Axis {
        Axis {
            title: None,
            grid_color: theme.grid_color(),
            text_color: theme.text_color(),
            begin_at_zero: false,
            stacked: false,
            draw_grid: true,
        }
    }
}

/// Radial axis for radar and polar-area charts.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialAxis {
    pub grid_color: Rgba,
    pub angle_line_color: Rgba,
    pub point_label_color: Rgba,
    pub begin_at_zero: bool,
}

/// Scale configuration by chart family. Cartesian charts carry x/y and an
/// optional right-hand y1; circular charts carry nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleSet {
    Cartesian { x: Axis, y: Axis, y1: Option<Axis> },
    Radial(RadialAxis),
    None,
}

impl ScaleSet {
    pub fn secondary_axis(&self) -> Option<&Axis> {
        match self {
            ScaleSet::Cartesian { y1, .. } => y1.as_ref(),
            _ => None,
        }
    }
}

/// Assemble the scale set for a render.
///
/// `dual_axis_titles` requests a second y axis with the given
/// (primary, secondary) titles; it only takes effect on line and bar charts.
/// `stacked` marks both cartesian axes stacked.
pub fn scale_set(
    kind: ChartKind,
    options: &ChartOptions,
    dual_axis_titles: Option<(&str, &str)>,
    stacked: bool,
) -> ScaleSet {
    let theme = options.theme;
    match kind.scale_category() {
        ScaleCategory::Cartesian => {
            let x = Axis { stacked, ..Axis::themed(theme) };
            let mut y = Axis { stacked, ..Axis::themed(theme) };
            let dual = dual_axis_titles
                .filter(|_| matches!(kind, ChartKind::Line | ChartKind::Bar));
            let y1 = dual.map(|(primary, secondary)| {
                y.title = Some(primary.to_string());
                Axis {
                    title: Some(secondary.to_string()),
                    // The right axis keeps its ticks but draws no grid lines
                    // over the chart area.
                    draw_grid: false,
                    ..Axis::themed(theme)
                }
            });
            ScaleSet::Cartesian { x, y, y1 }
        }
        ScaleCategory::Radial => ScaleSet::Radial(RadialAxis {
            grid_color: theme.grid_color(),
            angle_line_color: theme.grid_color(),
            point_label_color: theme.text_color(),
            begin_at_zero: true,
        }),
        ScaleCategory::None => ScaleSet::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EaseFamily {
    #[default]
    Linear,
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Elastic,
    Back,
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EaseDirection {
    #[default]
    In,
    Out,
    InOut,
}

/// Easing function for entry animation, named like the web charting
/// convention ("easeInOutQuad" etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub struct Easing {
    family: EaseFamily,
    direction: EaseDirection,
}

impl Easing {
    pub const LINEAR: Easing = Easing { family: EaseFamily::Linear, direction: EaseDirection::In };
    pub const EASE_IN_OUT_QUAD: Easing =
        Easing { family: EaseFamily::Quad, direction: EaseDirection::InOut };

    /// All supported easing names, in menu order.
    pub fn all() -> Vec<Easing> {
        let families = [
            EaseFamily::Quad,
            EaseFamily::Cubic,
            EaseFamily::Quart,
            EaseFamily::Quint,
            EaseFamily::Sine,
            EaseFamily::Expo,
            EaseFamily::Circ,
            EaseFamily::Elastic,
            EaseFamily::Back,
            EaseFamily::Bounce,
        ];
        let mut out = vec![Easing::LINEAR];
        for family in families {
            for direction in [EaseDirection::In, EaseDirection::Out, EaseDirection::InOut] {
                out.push(Easing { family, direction });
            }
        }
        out
    }

    pub fn parse(name: &str) -> Option<Easing> {
        Self::all().into_iter().find(|e| e.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        macro_rules! name {
            ($in:literal, $out:literal, $inout:literal) => {
                match self.direction {
                    EaseDirection::In => $in,
                    EaseDirection::Out => $out,
                    EaseDirection::InOut => $inout,
                }
            };
        }
        match self.family {
            EaseFamily::Linear => "linear",
            EaseFamily::Quad => name!("easeInQuad", "easeOutQuad", "easeInOutQuad"),
            EaseFamily::Cubic => name!("easeInCubic", "easeOutCubic", "easeInOutCubic"),
            EaseFamily::Quart => name!("easeInQuart", "easeOutQuart", "easeInOutQuart"),
            EaseFamily::Quint => name!("easeInQuint", "easeOutQuint", "easeInOutQuint"),
            EaseFamily::Sine => name!("easeInSine", "easeOutSine", "easeInOutSine"),
            EaseFamily::Expo => name!("easeInExpo", "easeOutExpo", "easeInOutExpo"),
            EaseFamily::Circ => name!("easeInCirc", "easeOutCirc", "easeInOutCirc"),
            EaseFamily::Elastic => name!("easeInElastic", "easeOutElastic", "easeInOutElastic"),
            EaseFamily::Back => name!("easeInBack", "easeOutBack", "easeInOutBack"),
            EaseFamily::Bounce => name!("easeInBounce", "easeOutBounce", "easeInOutBounce"),
        }
    }

    /// Map linear progress `t` in [0, 1] to eased progress.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self.direction {
            EaseDirection::In => ease_in(self.family, t),
            EaseDirection::Out => 1.0 - ease_in(self.family, 1.0 - t),
            EaseDirection::InOut => {
                if t < 0.5 {
                    ease_in(self.family, t * 2.0) / 2.0
                } else {
                    1.0 - ease_in(self.family, (1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }
}

fn ease_in(family: EaseFamily, t: f64) -> f64 {
    use std::f64::consts::PI;
    match family {
        EaseFamily::Linear => t,
        EaseFamily::Quad => t * t,
        EaseFamily::Cubic => t * t * t,
        EaseFamily::Quart => t * t * t * t,
        EaseFamily::Quint => t * t * t * t * t,
        EaseFamily::Sine => 1.0 - (t * PI / 2.0).cos(),
        EaseFamily::Expo => {
            if t == 0.0 {
                0.0
            } else {
                (2.0_f64).powf(10.0 * (t - 1.0))
            }
        }
        EaseFamily::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        EaseFamily::Elastic => {
            if t == 0.0 || t == 1.0 {
                t
            } else {
                let p = 0.3;
                let s = p / 4.0;
                -((2.0_f64).powf(10.0 * (t - 1.0)) * ((t - 1.0 - s) * 2.0 * PI / p).sin())
            }
        }
        EaseFamily::Back => {
            let s = 1.70158;
            t * t * ((s + 1.0) * t - s)
        }
        // Bounce is defined by its "out" shape.
        EaseFamily::Bounce => 1.0 - bounce_out(1.0 - t),
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

impl TryFrom<String> for Easing {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Easing::parse(&value).ok_or_else(|| format!("unknown easing '{value}'"))
    }
}

impl From<Easing> for &'static str {
    fn from(value: Easing) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_name_roundtrip() {
        let all = Easing::all();
        assert_eq!(all.len(), 31);
        for easing in all {
            assert_eq!(Easing::parse(easing.as_str()), Some(easing));
        }
        assert_eq!(Easing::parse("easeInOutQuad"), Some(Easing::EASE_IN_OUT_QUAD));
        assert_eq!(Easing::parse("easeWat"), None);
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in Easing::all() {
            assert!(easing.apply(0.0).abs() < 1e-9, "{} at 0", easing.as_str());
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{} at 1", easing.as_str());
        }
    }

    #[test]
    fn test_linear_is_identity() {
        assert_eq!(Easing::LINEAR.apply(0.25), 0.25);
        assert_eq!(Easing::LINEAR.apply(0.75), 0.75);
    }

    #[test]
    fn test_theme_colors() {
        assert_eq!(Theme::Dark.grid_color(), Rgba::new(255, 255, 255, 0.1));
        assert_eq!(Theme::Light.text_color(), Rgba::new(0, 0, 0, 0.8));
    }

    #[test]
    fn test_scale_set_per_kind() {
        let options = ChartOptions::default();
        assert!(matches!(
            scale_set(ChartKind::Line, &options, None, false),
            ScaleSet::Cartesian { y1: None, .. }
        ));
        assert!(matches!(scale_set(ChartKind::Radar, &options, None, false), ScaleSet::Radial(_)));
        assert!(matches!(scale_set(ChartKind::Pie, &options, None, false), ScaleSet::None));
    }

    #[test]
    fn test_dual_axis_only_for_line_and_bar() {
        let options = ChartOptions::default();
        let titles = Some(("Active Users", "New Registrations"));

        let set = scale_set(ChartKind::Bar, &options, titles, false);
        let ScaleSet::Cartesian { y, y1, .. } = set else { panic!("expected cartesian") };
        assert_eq!(y.title.as_deref(), Some("Active Users"));
        let y1 = y1.unwrap();
        assert_eq!(y1.title.as_deref(), Some("New Registrations"));
        assert!(!y1.draw_grid);

        assert!(scale_set(ChartKind::Pie, &options, titles, false).secondary_axis().is_none());
    }

    #[test]
    fn test_stacked_marks_both_axes() {
        let options = ChartOptions::default();
        let ScaleSet::Cartesian { x, y, .. } = scale_set(ChartKind::Bar, &options, None, true)
        else {
            panic!("expected cartesian")
        };
        assert!(x.stacked);
        assert!(y.stacked);
    }

    #[test]
    fn test_default_options() {
        let options = ChartOptions::default();
        assert_eq!(options.animation.duration_ms, 1000);
        assert_eq!(options.appearance.aspect_ratio, 2.0);
        assert_eq!(options.appearance.tension, 0.4);
        assert!(options.legend.show);
        assert_eq!(options.legend.position, LegendPosition::Top);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ChartOptions =
            serde_json::from_str(r#"{"theme":"dark","animation":{"duration_ms":250,"delay_ms":0,"easing":"easeOutBounce","mode":"loop"}}"#)
                .unwrap();
        assert_eq!(options.theme, Theme::Dark);
        assert_eq!(options.animation.duration_ms, 250);
        assert_eq!(options.animation.easing.as_str(), "easeOutBounce");
        assert_eq!(options.animation.mode, AnimationMode::Loop);
        assert_eq!(options.font.size, 12);
    }
}
