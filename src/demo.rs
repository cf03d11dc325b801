//! Built-in demo datasets.
//!
//! Values are randomized on each call within per-series ranges so the demos
//! look alive, while labels and styling stay fixed.

use rand::Rng;

use crate::data::{AxisSlot, ChartData, ChartKind, DataValue, Dataset, Paint};
use crate::scheme::Rgba;

/// Identifier for one of the bundled demo datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemoDataset {
    Sales,
    Users,
    Performance,
    Revenue,
    Demographics,
    Comparison,
    TimeSeries,
}

impl DemoDataset {
    pub const ALL: [DemoDataset; 7] = [
        DemoDataset::Sales,
        DemoDataset::Users,
        DemoDataset::Performance,
        DemoDataset::Revenue,
        DemoDataset::Demographics,
        DemoDataset::Comparison,
        DemoDataset::TimeSeries,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DemoDataset::Sales => "sales",
            DemoDataset::Users => "users",
            DemoDataset::Performance => "performance",
            DemoDataset::Revenue => "revenue",
            DemoDataset::Demographics => "demographics",
            DemoDataset::Comparison => "comparison",
            DemoDataset::TimeSeries => "time-series",
        }
    }

    pub fn parse(s: &str) -> Option<DemoDataset> {
        Self::ALL.iter().copied().find(|d| d.id() == s)
    }

    /// Chart kinds this dataset makes visual sense with. First entry is the
    /// preferred fallback when the requested kind is incompatible.
    pub fn compatible_kinds(&self) -> &'static [ChartKind] {
        match self {
            DemoDataset::Sales | DemoDataset::Users | DemoDataset::Revenue => {
                &[ChartKind::Line, ChartKind::Bar]
            }
            DemoDataset::Performance => &[ChartKind::Radar, ChartKind::PolarArea],
            DemoDataset::Demographics => &[ChartKind::Pie, ChartKind::Doughnut],
            DemoDataset::Comparison => &[ChartKind::Bar],
            DemoDataset::TimeSeries => &[ChartKind::Line],
        }
    }

    /// Correct an incompatible requested kind to this dataset's preferred
    /// kind. The caller persists the result as the new selection.
    pub fn corrected_kind(&self, requested: ChartKind) -> ChartKind {
        // Bubble and scatter bypass dataset selection entirely.
        if matches!(requested, ChartKind::Bubble | ChartKind::Scatter) {
            return requested;
        }
        let compatible = self.compatible_kinds();
        if compatible.contains(&requested) {
            requested
        } else {
            compatible[0]
        }
    }

    /// Axis titles for the dual-axis demos, (primary, secondary).
    pub fn dual_axis_titles(&self) -> Option<(&'static str, &'static str)> {
        match self {
            DemoDataset::Users => Some(("Active Users", "New Registrations")),
            DemoDataset::TimeSeries => Some(("Website Traffic", "Server Load (%)")),
            _ => None,
        }
    }

    pub fn data(&self) -> ChartData {
        match self {
            DemoDataset::Sales => sales(),
            DemoDataset::Users => users(),
            DemoDataset::Performance => performance(),
            DemoDataset::Revenue => revenue(),
            DemoDataset::Demographics => demographics(),
            DemoDataset::Comparison => comparison(),
            DemoDataset::TimeSeries => time_series(),
        }
    }
}

/// `count` random values uniformly drawn from `[min, max)`.
pub fn random_series(count: usize, min: f64, max: f64) -> Vec<DataValue> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| DataValue::Num(rng.gen_range(min..max))).collect()
}

fn month_labels() -> Vec<String> {
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn series(label: &str, data: Vec<DataValue>, border: Rgba, fill_alpha: f64) -> Dataset {
    let mut ds = Dataset::new(label.to_string(), data);
    ds.background_color = Some(Paint::Single(border.with_alpha(fill_alpha)));
    ds.border_color = Some(Paint::Single(border));
    ds
}

const TEAL: Rgba = Rgba::opaque(75, 192, 192);
const RED: Rgba = Rgba::opaque(255, 99, 132);
const BLUE: Rgba = Rgba::opaque(53, 162, 235);
const ORANGE: Rgba = Rgba::opaque(255, 159, 64);

fn sales() -> ChartData {
    let mut a = series("Sales 2023", random_series(12, 40.0, 180.0), TEAL, 0.5);
    a.tension = Some(0.3);
    let mut b = series("Sales 2022", random_series(12, 20.0, 90.0), RED, 0.5);
    b.tension = Some(0.3);
    ChartData::new(month_labels(), vec![a, b])
}

fn users() -> ChartData {
    let labels = ["Q1 2022", "Q2 2022", "Q3 2022", "Q4 2022", "Q1 2023", "Q2 2023", "Q3 2023", "Q4 2023"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let a = series("Active Users", random_series(8, 1000.0, 10000.0), BLUE, 0.5);
    let mut b = series("New Registrations", random_series(8, 400.0, 2000.0), ORANGE, 0.7);
    b.y_axis = AxisSlot::Secondary;
    ChartData::new(labels, vec![a, b])
}

fn performance() -> ChartData {
    let labels = [
        "Speed",
        "Reliability",
        "User Experience",
        "Security",
        "Efficiency",
        "Scalability",
        "Maintainability",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    ChartData::new(
        labels,
        vec![
            series("Product A", random_series(7, 65.0, 95.0), RED, 0.5),
            series("Product B", random_series(7, 25.0, 75.0), TEAL, 0.5),
            series("Product C", random_series(7, 15.0, 80.0), BLUE, 0.5),
        ],
    )
}

fn revenue() -> ChartData {
    let mut datasets = vec![
        series("Hardware", random_series(12, 10000.0, 25000.0), RED, 0.7),
        series("Software", random_series(12, 18000.0, 35000.0), TEAL, 0.7),
        series("Services", random_series(12, 8000.0, 14000.0), BLUE, 0.7),
    ];
    for ds in &mut datasets {
        ds.stack = Some("stack1".to_string());
    }
    ChartData::new(month_labels(), datasets)
}

fn demographics() -> ChartData {
    let labels =
        ["18-24", "25-34", "35-44", "45-54", "55-64", "65+"].iter().map(|s| s.to_string()).collect();
    let palette = [
        Rgba::opaque(255, 99, 132),
        Rgba::opaque(75, 192, 192),
        Rgba::opaque(255, 205, 86),
        Rgba::opaque(54, 162, 235),
        Rgba::opaque(153, 102, 255),
        Rgba::opaque(255, 159, 64),
    ];
    let mut ds = Dataset::new("Age Distribution".to_string(), random_series(6, 1.0, 45.0));
    ds.background_color =
        Some(Paint::PerPoint(palette.iter().map(|c| c.with_alpha(0.7)).collect()));
    ds.border_color = Some(Paint::PerPoint(palette.to_vec()));
    ds.border_width = Some(1.0);
    ChartData::new(labels, vec![ds])
}

fn comparison() -> ChartData {
    let labels = ["North America", "Europe", "Asia", "South America", "Africa", "Australia"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ChartData::new(
        labels,
        vec![
            series("Sales", random_series(6, 9000.0, 41000.0), RED, 0.7),
            series("Profit", random_series(6, 2000.0, 18000.0), TEAL, 0.7),
            series("Market Share (%)", random_series(6, 3.0, 35.0), BLUE, 0.7),
        ],
    )
}

fn time_series() -> ChartData {
    let labels = (0..24).map(|h| format!("{h}:00")).collect();
    let mut traffic = series("Website Traffic", random_series(24, 25.0, 500.0), TEAL, 0.5);
    traffic.tension = Some(0.4);
    traffic.fill = Some(true);
    let mut load = series("Server Load (%)", random_series(24, 5.0, 80.0), RED, 0.5);
    load.tension = Some(0.4);
    load.fill = Some(true);
    load.y_axis = AxisSlot::Secondary;
    ChartData::new(labels, vec![traffic, load])
}

/// Synthesized bubble data: two clouds of (x, y, r) points.
pub fn bubble_data() -> ChartData {
    let mut rng = rand::thread_rng();
    let mut cloud = |label: &str, count: usize| {
        let data = (0..count)
            .map(|_| DataValue::Bubble {
                x: rng.gen_range(0.0..100.0),
                y: rng.gen_range(0.0..100.0),
                r: rng.gen_range(5.0..20.0),
            })
            .collect();
        let mut ds = Dataset::new(label.to_string(), data);
        ds.background_color = Some(Paint::PerPoint(
            (0..count).map(|_| crate::scheme::random_color(0.7)).collect(),
        ));
        ds
    };
    ChartData::new(Vec::new(), vec![cloud("Product Performance", 15), cloud("Competitor Performance", 10)])
}

/// Synthesized scatter data: two 50-point correlation series.
pub fn scatter_data() -> ChartData {
    let mut rng = rand::thread_rng();
    let mut points = |count: usize, x_min: f64, x_max: f64| -> Vec<DataValue> {
        (0..count)
            .map(|_| DataValue::Xy {
                x: rng.gen_range(x_min..x_max),
                y: rng.gen_range(2.0..7.0),
            })
            .collect()
    };
    let mut a = Dataset::new("Correlation: Price vs. Rating".to_string(), points(50, 100.0, 1100.0));
    a.background_color = Some(Paint::Single(RED.with_alpha(0.7)));
    let mut b =
        Dataset::new("Correlation: Features vs. Rating".to_string(), points(50, 5.0, 25.0));
    b.background_color = Some(Paint::Single(BLUE.with_alpha(0.7)));
    ChartData::new(Vec::new(), vec![a, b])
}

/// Pick the demo data for a selection, honoring the bubble/scatter bypass.
pub fn demo_data(dataset: DemoDataset, kind: ChartKind) -> ChartData {
    match kind {
        ChartKind::Bubble => bubble_data(),
        ChartKind::Scatter => scatter_data(),
        _ => dataset.data(),
    }
}
