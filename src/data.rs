use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scheme::Rgba;

/// Supported chart kinds. Wire names match the usual web charting vocabulary
/// ("polarArea" etc.) so uploaded configs round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChartKind {
    #[serde(rename = "line")]
    #[default]
    Line,
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "radar")]
    Radar,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "doughnut")]
    Doughnut,
    #[serde(rename = "polarArea")]
    PolarArea,
    #[serde(rename = "bubble")]
    Bubble,
    #[serde(rename = "scatter")]
    Scatter,
}

/// Which family of scales a chart kind uses. The options assembler emits
/// exactly one `ScaleSet` variant per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleCategory {
    Cartesian,
    Radial,
    None,
}

impl ChartKind {
    pub fn scale_category(self) -> ScaleCategory {
        match self {
            ChartKind::Line | ChartKind::Bar | ChartKind::Bubble | ChartKind::Scatter => {
                ScaleCategory::Cartesian
            }
            ChartKind::Radar | ChartKind::PolarArea => ScaleCategory::Radial,
            ChartKind::Pie | ChartKind::Doughnut => ScaleCategory::None,
        }
    }

    /// Kinds that color one slice per data point instead of per dataset.
    pub fn colors_per_point(self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Doughnut | ChartKind::PolarArea)
    }

    pub fn parse(s: &str) -> Option<ChartKind> {
        match s {
            "line" => Some(ChartKind::Line),
            "bar" => Some(ChartKind::Bar),
            "radar" => Some(ChartKind::Radar),
            "pie" => Some(ChartKind::Pie),
            "doughnut" => Some(ChartKind::Doughnut),
            "polarArea" | "polar-area" | "polar" => Some(ChartKind::PolarArea),
            "bubble" => Some(ChartKind::Bubble),
            "scatter" => Some(ChartKind::Scatter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Radar => "radar",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::PolarArea => "polarArea",
            ChartKind::Bubble => "bubble",
            ChartKind::Scatter => "scatter",
        }
    }
}

/// One point of dataset data. Uploaded JSON decides the shape, so this is an
/// untagged union; `Bubble` must precede `Xy` so `{x, y, r}` is not eaten by
/// the two-field variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Num(f64),
    Bubble { x: f64, y: f64, r: f64 },
    Xy { x: f64, y: f64 },
    Span([f64; 2]),
    Text(String),
    Null,
}

impl DataValue {
    /// The value plotted on the y axis, if any.
    pub fn y(&self) -> Option<f64> {
        match self {
            DataValue::Num(v) => Some(*v),
            DataValue::Bubble { y, .. } | DataValue::Xy { y, .. } => Some(*y),
            DataValue::Span([_, hi]) => Some(*hi),
            DataValue::Text(s) => s.trim().parse().ok(),
            DataValue::Null => None,
        }
    }

    pub fn x(&self) -> Option<f64> {
        match self {
            DataValue::Bubble { x, .. } | DataValue::Xy { x, .. } => Some(*x),
            DataValue::Span([lo, _]) => Some(*lo),
            _ => None,
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            DataValue::Bubble { r, .. } => Some(*r),
            _ => None,
        }
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Num(v)
    }
}

/// Fill/stroke paint for a dataset: either one color for the whole series or
/// one color per data point (pie-family charts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paint {
    Single(Rgba),
    PerPoint(Vec<Rgba>),
}

impl Paint {
    /// Color for point `index`, cycling per-point palettes.
    pub fn at(&self, index: usize) -> Rgba {
        match self {
            Paint::Single(c) => *c,
            Paint::PerPoint(cs) if cs.is_empty() => Rgba::BLACK,
            Paint::PerPoint(cs) => cs[index % cs.len()],
        }
    }
}

/// Which y axis a dataset is bound to (dual-axis line/bar charts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AxisSlot {
    #[serde(rename = "y")]
    #[default]
    Primary,
    #[serde(rename = "y1")]
    Secondary,
}

/// A single labeled series plus its visual styling.
///
/// Datasets are created fresh on every ingestion or chart-kind switch and are
/// never restyled in place: styling passes clone first (`styled` in the
/// scheme module) so caller-held references never alias host state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "is_primary")]
    pub y_axis: AxisSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

fn is_primary(slot: &AxisSlot) -> bool {
    *slot == AxisSlot::Primary
}

/// JS-style truthiness for dataset labels: any non-empty string, non-zero
/// number, or `true`. Non-string labels are stringified on ingestion.
pub(crate) fn label_is_truthy(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::Bool(b) => *b,
        _ => false,
    }
}

impl Dataset {
    pub fn new(label: impl Into<String>, data: Vec<DataValue>) -> Self {
        Dataset {
            label: label.into(),
            data,
            background_color: None,
            border_color: None,
            border_width: None,
            tension: None,
            fill: None,
            point_radius: None,
            y_axis: AxisSlot::Primary,
            stack: None,
            hidden: false,
        }
    }

    pub fn from_numbers(label: impl Into<String>, values: Vec<f64>) -> Self {
        Dataset::new(label, values.into_iter().map(DataValue::Num).collect())
    }

    pub fn on_secondary_axis(&self) -> bool {
        self.y_axis == AxisSlot::Secondary
    }
}

/// The shape the renderer accepts without transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn new(labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        ChartData { labels, datasets }
    }

    /// The compatibility predicate: `labels` is an array, `datasets` is a
    /// non-empty array, and every dataset carries a truthy label and array
    /// data. Checked on raw JSON so the fast path costs no conversion.
    pub fn value_is_compatible(value: &Value) -> bool {
        let obj = match value.as_object() {
            Some(o) => o,
            None => return false,
        };
        if !obj.get("labels").map_or(false, Value::is_array) {
            return false;
        }
        let datasets = match obj.get("datasets").and_then(Value::as_array) {
            Some(ds) if !ds.is_empty() => ds,
            _ => return false,
        };
        datasets.iter().all(|ds| {
            ds.get("label").map_or(false, label_is_truthy)
                && ds.get("data").map_or(false, Value::is_array)
        })
    }

    /// Same predicate over the typed form, used to validate assembled data.
    pub fn is_valid(&self) -> bool {
        !self.datasets.is_empty() && self.datasets.iter().all(|ds| !ds.label.is_empty())
    }

    /// Fresh deep copy carrying only labels and series content, dropping any
    /// styling so a new render pass starts from unstyled datasets.
    pub fn content_clone(&self) -> ChartData {
        ChartData {
            labels: self.labels.clone(),
            datasets: self
                .datasets
                .iter()
                .map(|ds| Dataset::new(ds.label.clone(), ds.data.clone()))
                .collect(),
        }
    }
}
