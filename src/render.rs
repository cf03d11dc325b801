//! PNG chart rendering on top of plotters.
//!
//! One call renders one frame. Frame effects and entry progress come from
//! the caller so a static render and an animation frame go through the same
//! path.

use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::chart::DualCoordChartContext;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::{PI, TAU};
use std::ops::Range;

use crate::data::{ChartData, ChartKind, Dataset};
use crate::options::{ChartOptions, LegendPosition, ScaleSet};
use crate::plugin::FrameEffects;
use crate::scheme::Rgba;

/// Everything needed to draw one frame.
pub struct RenderRequest<'a> {
    pub data: &'a ChartData,
    pub kind: ChartKind,
    pub options: &'a ChartOptions,
    pub scales: &'a ScaleSet,
    pub effects: FrameEffects,
    /// Eased entry progress in [0, 1]; 1.0 once the chart has settled.
    pub progress: f64,
    /// Narrowed (x, y) view ranges for cartesian charts, if zoomed.
    pub zoom: Option<(Range<f64>, Range<f64>)>,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderRequest<'a> {
    pub fn settled(
        data: &'a ChartData,
        kind: ChartKind,
        options: &'a ChartOptions,
        scales: &'a ScaleSet,
        width: u32,
        height: u32,
    ) -> RenderRequest<'a> {
        RenderRequest {
            data,
            kind,
            options,
            scales,
            effects: FrameEffects::default(),
            progress: 1.0,
            zoom: None,
            width,
            height,
        }
    }
}

/// Largest backing buffer a render may allocate, in bytes.
const MAX_SURFACE_BYTES: u64 = 1 << 30;

/// Render one frame to PNG bytes.
pub fn render_png(req: &RenderRequest) -> Result<Vec<u8>> {
    if req.data.datasets.is_empty() {
        anyhow::bail!("cannot render a chart with no datasets");
    }
    if req.width == 0 || req.height == 0 {
        anyhow::bail!("cannot render into a {}x{} surface", req.width, req.height);
    }
    let buffer_len = req.width as u64 * req.height as u64 * 3;
    if buffer_len > MAX_SURFACE_BYTES {
        anyhow::bail!("surface {}x{} exceeds the render size limit", req.width, req.height);
    }

    let mut buffer = vec![0u8; buffer_len as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (req.width, req.height))
            .into_drawing_area();
        root.fill(&to_rgb(req.options.theme.background_color()))
            .context("failed to fill background")?;

        match req.kind {
            ChartKind::Line | ChartKind::Bar => draw_cartesian(req, &root)?,
            ChartKind::Scatter | ChartKind::Bubble => draw_points(req, &root)?,
            ChartKind::Pie | ChartKind::Doughnut => draw_pie(req, &root)?,
            ChartKind::Radar => draw_radar(req, &root)?,
            ChartKind::PolarArea => draw_polar_area(req, &root)?,
        }

        root.present().context("failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(&buffer, req.width, req.height, image::ColorType::Rgb8)
        .context("failed to encode PNG")?;
    Ok(png_bytes)
}

fn to_rgb(c: Rgba) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn to_rgba(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

fn visible(datasets: &[Dataset]) -> impl Iterator<Item = (usize, &Dataset)> {
    datasets.iter().enumerate().filter(|(_, ds)| !ds.hidden)
}

fn pad_range(min: f64, max: f64) -> Range<f64> {
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// y range over the visible datasets bound to the given axis, stacking-aware.
fn value_range(data: &ChartData, secondary: bool, stacked: bool, begin_at_zero: bool) -> Range<f64> {
    let selected: Vec<&Dataset> = visible(&data.datasets)
        .map(|(_, ds)| ds)
        .filter(|ds| ds.on_secondary_axis() == secondary)
        .collect();

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    if stacked {
        let len = selected.iter().map(|ds| ds.data.len()).max().unwrap_or(0);
        for i in 0..len {
            let sum: f64 = selected
                .iter()
                .filter_map(|ds| ds.data.get(i).and_then(|v| v.y()))
                .sum();
            min = min.min(sum.min(0.0));
            max = max.max(sum);
        }
    } else {
        for ds in &selected {
            for v in ds.data.iter().filter_map(|v| v.y()) {
                min = min.min(v);
                max = max.max(v);
            }
        }
    }
    if begin_at_zero || stacked {
        min = min.min(0.0);
    }
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    pad_range(min, max)
}

fn caption_style(options: &ChartOptions) -> TextStyle<'_> {
    (options.font.family.as_str(), options.font.size + 4)
        .into_font()
        .color(&to_rgba(options.theme.text_color()))
}

fn legend_position(position: LegendPosition) -> SeriesLabelPosition {
    match position {
        LegendPosition::Top => SeriesLabelPosition::UpperMiddle,
        LegendPosition::Bottom => SeriesLabelPosition::LowerMiddle,
        LegendPosition::Left => SeriesLabelPosition::MiddleLeft,
        LegendPosition::Right => SeriesLabelPosition::MiddleRight,
    }
}

/// Line and bar charts over category labels.
fn draw_cartesian<DB: DrawingBackend>(
    req: &RenderRequest,
    root: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let ScaleSet::Cartesian { x, y, y1 } = req.scales else {
        anyhow::bail!("cartesian chart requires cartesian scales");
    };
    let data = req.data;
    let options = req.options;
    let stacked = x.stacked && data.datasets.iter().any(|ds| ds.stack.is_some());
    let categories = data.labels.len().max(
        data.datasets.iter().map(|ds| ds.data.len()).max().unwrap_or(0),
    );
    if categories == 0 {
        anyhow::bail!("cannot render a chart with no data points");
    }

    let (x_range, y_range) = match &req.zoom {
        Some((zx, zy)) => (zx.clone(), zy.clone()),
        None => (
            0.0..categories as f64,
            value_range(
                data,
                false,
                stacked,
                y.begin_at_zero || matches!(req.kind, ChartKind::Bar),
            ),
        ),
    };
    let text_color = to_rgba(y.text_color);
    let grid_color = to_rgba(y.grid_color);
    let label_font = (options.font.family.as_str(), options.font.size)
        .into_font()
        .color(&text_color);

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .right_y_label_area_size(if y1.is_some() { 50 } else { 0 });
    if options.title.show {
        builder.caption(&options.title.text, caption_style(options));
    }
    let chart = builder
        .build_cartesian_2d(x_range.clone(), y_range)
        .context("failed to build chart")?;

    let y1_range = value_range(
        data,
        true,
        false,
        y1.as_ref().map_or(false, |a| a.begin_at_zero) || matches!(req.kind, ChartKind::Bar),
    );
    let mut chart = chart.set_secondary_coord(x_range, y1_range);

    let labels = data.labels.clone();
    chart
        .configure_mesh()
        .x_labels(categories.min(30))
        .x_label_formatter(&|v| {
            let idx = *v as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .y_desc(y.title.clone().unwrap_or_default())
        .axis_style(grid_color)
        .light_line_style(grid_color.mix(0.5))
        .bold_line_style(grid_color)
        .label_style(label_font.clone())
        .draw()
        .context("failed to draw mesh")?;

    if let Some(y1_axis) = y1 {
        chart
            .configure_secondary_axes()
            .y_desc(y1_axis.title.clone().unwrap_or_default())
            .axis_style(to_rgba(y1_axis.grid_color))
            .label_style(label_font.clone())
            .draw()
            .context("failed to draw secondary axis")?;
    }

    match req.kind {
        ChartKind::Bar => draw_bars(req, &mut chart, categories, stacked)?,
        _ => draw_lines(req, &mut chart, categories)?,
    }

    if options.legend.show {
        chart
            .configure_series_labels()
            .position(legend_position(options.legend.position))
            .background_style(to_rgb(options.theme.background_color()).mix(0.8))
            .border_style(grid_color)
            .label_font(label_font)
            .draw()
            .context("failed to draw legend")?;
    }
    Ok(())
}

type CategoryChart<'a, DB> = DualCoordChartContext<
    'a,
    DB,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
>;

fn draw_lines<DB: DrawingBackend>(
    req: &RenderRequest,
    chart: &mut CategoryChart<DB>,
    categories: usize,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let options = req.options;
    for (index, ds) in visible(&req.data.datasets) {
        let border = ds.border_color.as_ref().map_or(Rgba::BLACK, |p| p.at(index));
        let stroke = ds.border_width.unwrap_or(options.appearance.border_width).max(1.0) as u32;
        let tension =
            req.effects.tension.unwrap_or_else(|| ds.tension.unwrap_or(options.appearance.tension));

        let mut points: Vec<(f64, f64)> = Vec::new();
        for i in 0..categories {
            if let Some(v) = ds.data.get(i).and_then(|v| v.y()) {
                points.push((i as f64 + 0.5, v * req.progress));
            }
        }
        let path = if tension > 0.0 { smooth(&points, tension) } else { points.clone() };

        let color = to_rgba(border);
        let series = LineSeries::new(path, color.stroke_width(stroke));
        let annotated = if ds.on_secondary_axis() {
            chart.draw_secondary_series(series).context("failed to draw secondary line")?
        } else {
            chart.draw_series(series).context("failed to draw line series")?
        };
        annotated.label(ds.label.clone()).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 12, y)], color.stroke_width(2))
        });

        if options.appearance.point_radius > 0.0 {
            let radius = (options.appearance.point_radius * req.effects.scale) as i32;
            let circles = points.iter().map(|&p| Circle::new(p, radius, color.filled()));
            if ds.on_secondary_axis() {
                chart
                    .draw_secondary_series(circles)
                    .context("failed to draw line points")?;
            } else {
                chart.draw_series(circles).context("failed to draw line points")?;
            }
        }
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    req: &RenderRequest,
    chart: &mut CategoryChart<DB>,
    categories: usize,
    stacked: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let datasets: Vec<(usize, &Dataset)> = visible(&req.data.datasets).collect();
    let series_count = datasets.len().max(1);
    let growth = req.effects.bar_growth * req.progress;

    if stacked {
        let bar_width = 0.8;
        for cat in 0..categories {
            let x_center = cat as f64 + 0.5;
            let mut cumulative = 0.0;
            for (index, ds) in &datasets {
                let Some(v) = ds.data.get(cat).and_then(|v| v.y()) else { continue };
                let fill = ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(*index));
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [
                            (x_center - bar_width / 2.0, cumulative),
                            (x_center + bar_width / 2.0, cumulative + v * growth),
                        ],
                        to_rgba(fill).filled(),
                    )))
                    .context("failed to draw bar")?;
                cumulative += v * growth;
            }
        }
        // Legend entries once per dataset.
        for (index, ds) in &datasets {
            let fill = to_rgba(ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(*index)));
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
                .context("failed to register legend entry")?
                .label(ds.label.clone())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled())
                });
        }
    } else {
        let bar_width = 0.8 / series_count as f64;
        for (slot, (index, ds)) in datasets.iter().enumerate() {
            let fill = to_rgba(ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(*index)));
            let offset = (slot as f64 - (series_count as f64 - 1.0) / 2.0) * bar_width;
            let secondary = ds.on_secondary_axis();

            let bars: Vec<Rectangle<(f64, f64)>> = ds
                .data
                .iter()
                .take(categories)
                .enumerate()
                .filter_map(|(cat, v)| v.y().map(|v| (cat, v)))
                .map(|(cat, v)| {
                    let x_center = cat as f64 + 0.5 + offset;
                    Rectangle::new(
                        [
                            (x_center - bar_width / 2.0, 0.0),
                            (x_center + bar_width / 2.0, v * growth),
                        ],
                        fill.filled(),
                    )
                })
                .collect();

            let annotated = if secondary {
                chart.draw_secondary_series(bars).context("failed to draw secondary bars")?
            } else {
                chart.draw_series(bars).context("failed to draw bars")?
            };
            annotated.label(ds.label.clone()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled())
            });
        }
    }
    Ok(())
}

/// Scatter and bubble charts over numeric x/y points.
fn draw_points<DB: DrawingBackend>(
    req: &RenderRequest,
    root: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let ScaleSet::Cartesian { y, .. } = req.scales else {
        anyhow::bail!("point chart requires cartesian scales");
    };
    let data = req.data;
    let options = req.options;

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    for (_, ds) in visible(&data.datasets) {
        for v in ds.data.iter().filter_map(|v| v.x()) {
            x_min = x_min.min(v);
            x_max = x_max.max(v);
        }
    }
    if !x_min.is_finite() {
        anyhow::bail!("point chart has no x values");
    }
    let (x_range, y_range) = match &req.zoom {
        Some((zx, zy)) => (zx.clone(), zy.clone()),
        None => (pad_range(x_min, x_max), value_range(data, false, false, y.begin_at_zero)),
    };
    let text_color = to_rgba(y.text_color);
    let grid_color = to_rgba(y.grid_color);
    let label_font =
        (options.font.family.as_str(), options.font.size).into_font().color(&text_color);

    let mut builder = ChartBuilder::on(root);
    builder.margin(10).x_label_area_size(40).y_label_area_size(50);
    if options.title.show {
        builder.caption(&options.title.text, caption_style(options));
    }
    let mut chart =
        builder.build_cartesian_2d(x_range, y_range).context("failed to build chart")?;

    chart
        .configure_mesh()
        .axis_style(grid_color)
        .light_line_style(grid_color.mix(0.5))
        .bold_line_style(grid_color)
        .label_style(label_font.clone())
        .draw()
        .context("failed to draw mesh")?;

    for (index, ds) in visible(&data.datasets) {
        let fill = to_rgba(ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(index)));
        let base_radius = options.appearance.point_radius.max(2.0);
        let points: Vec<(f64, f64, f64)> = ds
            .data
            .iter()
            .filter_map(|v| match (v.x(), v.y()) {
                (Some(x), Some(y)) => Some((x, y, v.radius().unwrap_or(base_radius))),
                _ => None,
            })
            .collect();

        chart
            .draw_series(points.into_iter().map(move |(x, y, r)| {
                Circle::new((x, y), (r * req.progress).max(1.0) as i32, fill.filled())
            }))
            .context("failed to draw point series")?
            .label(ds.label.clone())
            .legend(move |(x, y)| Circle::new((x + 6, y), 5, fill.filled()));
    }

    if options.legend.show {
        chart
            .configure_series_labels()
            .position(legend_position(options.legend.position))
            .background_style(to_rgb(options.theme.background_color()).mix(0.8))
            .border_style(grid_color)
            .label_font(label_font)
            .draw()
            .context("failed to draw legend")?;
    }
    Ok(())
}

/// Pie and doughnut charts, drawn from the first dataset.
fn draw_pie<DB: DrawingBackend>(
    req: &RenderRequest,
    root: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let data = req.data;
    let options = req.options;
    let Some((_, ds)) = visible(&data.datasets).next() else {
        anyhow::bail!("pie chart has no visible dataset");
    };

    let values: Vec<f64> = ds.data.iter().filter_map(|v| v.y()).map(|v| v.max(0.0)).collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        anyhow::bail!("pie chart values sum to zero");
    }

    let (w, h) = (req.width as i32, req.height as i32);
    let title_offset = if options.title.show { 20 } else { 0 };
    let center = (w / 2, h / 2 + title_offset / 2);
    let radius = ((w.min(h) as f64) * 0.35 * req.effects.scale).max(10.0);

    if options.title.show {
        draw_title(root, req, w)?;
    }

    // The entry sweep and the rotate plugin both shift slice angles.
    let sweep = TAU * req.progress.clamp(0.0, 1.0);
    let mut start = -PI / 2.0 + req.effects.rotation;
    for (slice, value) in values.iter().enumerate() {
        let angle = sweep * value / total;
        let fill = ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(slice));
        let polygon = sector(center, radius, start, start + angle);
        root.draw(&Polygon::new(polygon, to_rgba(fill).filled()))
            .context("failed to draw pie slice")?;
        if let Some(border) = &ds.border_color {
            let outline = sector(center, radius, start, start + angle);
            let width = ds.border_width.unwrap_or(options.appearance.border_width).max(1.0);
            root.draw(&PathElement::new(
                outline,
                to_rgba(border.at(slice)).stroke_width(width as u32),
            ))
            .context("failed to draw slice border")?;
        }
        start += angle;
    }

    if req.kind == ChartKind::Doughnut {
        root.draw(&Circle::new(
            center,
            (radius * 0.55) as i32,
            to_rgb(options.theme.background_color()).filled(),
        ))
        .context("failed to cut doughnut hole")?;
    }

    if options.legend.show {
        draw_radial_legend(root, req, &data.labels, |slice| {
            ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(slice))
        })?;
    }
    Ok(())
}

/// Radar chart: spokes per label, one closed polygon per dataset.
fn draw_radar<DB: DrawingBackend>(
    req: &RenderRequest,
    root: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let ScaleSet::Radial(axis) = req.scales else {
        anyhow::bail!("radar chart requires a radial scale");
    };
    let data = req.data;
    let options = req.options;
    let spokes = data.labels.len().max(3);
    let max = radial_max(data);

    let (w, h) = (req.width as i32, req.height as i32);
    let center = (w / 2, h / 2);
    let radius = (w.min(h) as f64) * 0.35 * req.effects.scale;
    let grid_color = to_rgba(axis.grid_color);
    let label_style = (options.font.family.as_str(), options.font.size)
        .into_font()
        .color(&to_rgba(axis.point_label_color));

    if options.title.show {
        draw_title(root, req, w)?;
    }

    // Grid rings and angle lines.
    for ring in 1..=5 {
        let r = radius * ring as f64 / 5.0;
        let pts: Vec<(i32, i32)> =
            (0..=spokes).map(|i| spoke_point(center, r, i, spokes)).collect();
        root.draw(&PathElement::new(pts, grid_color.stroke_width(1)))
            .context("failed to draw radar grid")?;
    }
    for i in 0..spokes {
        let tip = spoke_point(center, radius, i, spokes);
        root.draw(&PathElement::new(
            vec![center, tip],
            to_rgba(axis.angle_line_color).stroke_width(1),
        ))
        .context("failed to draw angle line")?;
        if let Some(label) = data.labels.get(i) {
            let anchor = spoke_point(center, radius + 12.0, i, spokes);
            let pos = Pos::new(HPos::Center, VPos::Center);
            root.draw(&Text::new(label.clone(), anchor, label_style.clone().pos(pos)))
                .context("failed to draw spoke label")?;
        }
    }

    for (index, ds) in visible(&data.datasets) {
        let border = ds.border_color.as_ref().map_or(Rgba::BLACK, |p| p.at(index));
        let mut pts: Vec<(i32, i32)> = ds
            .data
            .iter()
            .take(spokes)
            .enumerate()
            .map(|(i, v)| {
                let value = v.y().unwrap_or(0.0).max(0.0) * req.progress;
                spoke_point(center, radius * value / max, i, spokes)
            })
            .collect();
        if let Some(first) = pts.first().copied() {
            pts.push(first);
        }
        if ds.fill == Some(true) {
            if let Some(bg) = &ds.background_color {
                root.draw(&Polygon::new(pts.clone(), to_rgba(bg.at(index)).filled()))
                    .context("failed to fill radar polygon")?;
            }
        }
        let width = ds.border_width.unwrap_or(options.appearance.border_width).max(1.0);
        root.draw(&PathElement::new(pts.clone(), to_rgba(border).stroke_width(width as u32)))
            .context("failed to draw radar polygon")?;
        let point_radius = ds.point_radius.unwrap_or(options.appearance.point_radius) as i32;
        if point_radius > 0 {
            for p in pts.iter().take(spokes) {
                root.draw(&Circle::new(*p, point_radius, to_rgba(border).filled()))
                    .context("failed to draw radar point")?;
            }
        }
    }

    if options.legend.show {
        let labels: Vec<String> = visible(&data.datasets).map(|(_, d)| d.label.clone()).collect();
        let colors: Vec<Rgba> = visible(&data.datasets)
            .map(|(i, d)| d.border_color.as_ref().map_or(Rgba::BLACK, |p| p.at(i)))
            .collect();
        draw_radial_legend(root, req, &labels, |i| colors[i % colors.len().max(1)])?;
    }
    Ok(())
}

/// Polar-area chart: equal-angle sectors with value-scaled radii.
fn draw_polar_area<DB: DrawingBackend>(
    req: &RenderRequest,
    root: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let data = req.data;
    let options = req.options;
    let Some((_, ds)) = visible(&data.datasets).next() else {
        anyhow::bail!("polar-area chart has no visible dataset");
    };
    let values: Vec<f64> = ds.data.iter().filter_map(|v| v.y()).map(|v| v.max(0.0)).collect();
    if values.is_empty() {
        anyhow::bail!("polar-area chart has no values");
    }
    let max = values.iter().cloned().fold(f64::MIN, f64::max).max(1e-9);

    let (w, h) = (req.width as i32, req.height as i32);
    let center = (w / 2, h / 2);
    let radius = (w.min(h) as f64) * 0.35 * req.effects.scale;

    if options.title.show {
        draw_title(root, req, w)?;
    }

    let angle = TAU / values.len() as f64;
    let mut start = -PI / 2.0 + req.effects.rotation;
    for (slice, value) in values.iter().enumerate() {
        let r = radius * (value * req.progress) / max;
        let fill = ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(slice));
        root.draw(&Polygon::new(sector(center, r, start, start + angle), to_rgba(fill).filled()))
            .context("failed to draw polar sector")?;
        start += angle;
    }

    if options.legend.show {
        draw_radial_legend(root, req, &data.labels, |slice| {
            ds.background_color.as_ref().map_or(Rgba::BLACK, |p| p.at(slice))
        })?;
    }
    Ok(())
}

fn draw_title<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    req: &RenderRequest,
    width: i32,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let pos = Pos::new(HPos::Center, VPos::Top);
    root.draw(&Text::new(
        req.options.title.text.clone(),
        (width / 2, 8),
        caption_style(req.options).pos(pos),
    ))
    .context("failed to draw title")?;
    Ok(())
}

/// Simple swatch legend along the bottom for pixel-space charts.
fn draw_radial_legend<DB: DrawingBackend, F: Fn(usize) -> Rgba>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    req: &RenderRequest,
    labels: &[String],
    color_of: F,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let options = req.options;
    let style = (options.font.family.as_str(), options.font.size)
        .into_font()
        .color(&to_rgba(options.theme.text_color()));
    let h = req.height as i32;
    let slot = (req.width as i32) / labels.len().max(1) as i32;
    for (i, label) in labels.iter().enumerate() {
        let x = slot * i as i32 + 10;
        let y = h - 16;
        root.draw(&Rectangle::new(
            [(x, y - 4), (x + 10, y + 6)],
            to_rgba(color_of(i)).filled(),
        ))
        .context("failed to draw legend swatch")?;
        root.draw(&Text::new(label.clone(), (x + 14, y - 4), style.clone()))
            .context("failed to draw legend label")?;
    }
    Ok(())
}

fn radial_max(data: &ChartData) -> f64 {
    let mut max = f64::MIN;
    for (_, ds) in visible(&data.datasets) {
        for v in ds.data.iter().filter_map(|v| v.y()) {
            max = max.max(v);
        }
    }
    if max <= 0.0 {
        1.0
    } else {
        max
    }
}

fn spoke_point(center: (i32, i32), r: f64, index: usize, spokes: usize) -> (i32, i32) {
    let angle = -PI / 2.0 + TAU * index as f64 / spokes as f64;
    (
        center.0 + (r * angle.cos()).round() as i32,
        center.1 + (r * angle.sin()).round() as i32,
    )
}

/// Fan of points approximating a filled circular sector.
fn sector(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start).abs() / 0.05).ceil() as usize).max(2);
    let mut pts = Vec::with_capacity(steps + 2);
    pts.push(center);
    for i in 0..=steps {
        let a = start + (end - start) * i as f64 / steps as f64;
        pts.push((
            center.0 + (radius * a.cos()).round() as i32,
            center.1 + (radius * a.sin()).round() as i32,
        ));
    }
    pts
}

/// Catmull-Rom style smoothing: each segment becomes a sampled cubic whose
/// control points pull toward the neighbors, scaled by tension.
fn smooth(points: &[(f64, f64)], tension: f64) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let t = tension.clamp(0.0, 1.0);
    let at = |i: isize| -> (f64, f64) {
        let i = i.clamp(0, points.len() as isize - 1) as usize;
        points[i]
    };
    let mut out = Vec::with_capacity(points.len() * 8);
    for i in 0..points.len() - 1 {
        let p0 = at(i as isize - 1);
        let p1 = at(i as isize);
        let p2 = at(i as isize + 1);
        let p3 = at(i as isize + 2);
        let c1 = (p1.0 + (p2.0 - p0.0) * t / 6.0, p1.1 + (p2.1 - p0.1) * t / 6.0);
        let c2 = (p2.0 - (p3.0 - p1.0) * t / 6.0, p2.1 - (p3.1 - p1.1) * t / 6.0);
        for step in 0..8 {
            let u = step as f64 / 8.0;
            out.push(cubic(p1, c1, c2, p2, u));
        }
    }
    out.push(points[points.len() - 1]);
    out
}

fn cubic(
    p0: (f64, f64),
    c1: (f64, f64),
    c2: (f64, f64),
    p1: (f64, f64),
    u: f64,
) -> (f64, f64) {
    let v = 1.0 - u;
    let b0 = v * v * v;
    let b1 = 3.0 * v * v * u;
    let b2 = 3.0 * v * u * u;
    let b3 = u * u * u;
    (
        b0 * p0.0 + b1 * c1.0 + b2 * c2.0 + b3 * p1.0,
        b0 * p0.1 + b1 * c1.1 + b2 * c2.1 + b3 * p1.1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataValue;
    use crate::demo::DemoDataset;
    use crate::options::scale_set;
    use crate::scheme::{styled, ColorScheme};

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn styled_demo(dataset: DemoDataset, kind: ChartKind) -> ChartData {
        let data = dataset.data();
        ChartData::new(
            data.labels.clone(),
            styled(&data.datasets, kind, ColorScheme::default_scheme(), 1.0),
        )
    }

    fn render(data: &ChartData, kind: ChartKind) -> Result<Vec<u8>> {
        let options = ChartOptions::default();
        let scales = scale_set(kind, &options, None, false);
        render_png(&RenderRequest::settled(data, kind, &options, &scales, 320, 200))
    }

    #[test]
    fn test_every_kind_renders_png() {
        let cases = [
            (DemoDataset::Sales, ChartKind::Line),
            (DemoDataset::Comparison, ChartKind::Bar),
            (DemoDataset::Demographics, ChartKind::Pie),
            (DemoDataset::Demographics, ChartKind::Doughnut),
            (DemoDataset::Performance, ChartKind::Radar),
            (DemoDataset::Performance, ChartKind::PolarArea),
        ];
        for (dataset, kind) in cases {
            let data = styled_demo(dataset, kind);
            let png = render(&data, kind).unwrap();
            assert_eq!(&png[..8], &PNG_MAGIC, "{kind:?} did not produce a PNG");
        }
    }

    #[test]
    fn test_scatter_and_bubble_render() {
        for (data, kind) in [
            (crate::demo::scatter_data(), ChartKind::Scatter),
            (crate::demo::bubble_data(), ChartKind::Bubble),
        ] {
            let png = render(&data, kind).unwrap();
            assert_eq!(&png[..8], &PNG_MAGIC);
        }
    }

    #[test]
    fn test_empty_data_is_an_error() {
        let data = ChartData::new(Vec::new(), Vec::new());
        assert!(render(&data, ChartKind::Line).is_err());
    }

    #[test]
    fn test_zero_surface_is_an_error() {
        let data = styled_demo(DemoDataset::Sales, ChartKind::Line);
        let options = ChartOptions::default();
        let scales = scale_set(ChartKind::Line, &options, None, false);
        let req = RenderRequest {
            width: 0,
            ..RenderRequest::settled(&data, ChartKind::Line, &options, &scales, 320, 200)
        };
        assert!(render_png(&req).is_err());
    }

    #[test]
    fn test_oversized_surface_is_an_error() {
        let data = styled_demo(DemoDataset::Sales, ChartKind::Line);
        let options = ChartOptions::default();
        let scales = scale_set(ChartKind::Line, &options, None, false);
        // 40000² × 3 overflows a u32 byte count; the guard must reject it
        // without allocating.
        let req = RenderRequest::settled(&data, ChartKind::Line, &options, &scales, 40_000, 40_000);
        assert!(render_png(&req).is_err());
    }

    #[test]
    fn test_pie_of_zeros_is_an_error() {
        let data = ChartData::new(
            vec!["a".into(), "b".into()],
            vec![Dataset::from_numbers("Z", vec![0.0, 0.0])],
        );
        let options = ChartOptions::default();
        let scales = scale_set(ChartKind::Pie, &options, None, false);
        let req = RenderRequest::settled(&data, ChartKind::Pie, &options, &scales, 200, 200);
        assert!(render_png(&req).is_err());
    }

    #[test]
    fn test_hidden_datasets_are_skipped() {
        let mut data = styled_demo(DemoDataset::Sales, ChartKind::Line);
        data.datasets[0].hidden = true;
        let png = render(&data, ChartKind::Line).unwrap();
        assert_eq!(&png[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_null_values_leave_gaps_not_errors() {
        let mut data = styled_demo(DemoDataset::Sales, ChartKind::Line);
        data.datasets[0].data[3] = DataValue::Null;
        assert!(render(&data, ChartKind::Line).is_ok());
    }

    #[test]
    fn test_smooth_passes_through_endpoints() {
        let pts = vec![(0.0, 0.0), (1.0, 2.0), (2.0, 0.5), (3.0, 3.0)];
        let out = smooth(&pts, 0.4);
        assert_eq!(out[0], pts[0]);
        assert_eq!(*out.last().unwrap(), pts[3]);
        assert!(out.len() > pts.len());
    }

    #[test]
    fn test_value_range_stacks() {
        let data = ChartData::new(
            vec!["a".into(), "b".into()],
            vec![
                Dataset::from_numbers("one", vec![1.0, 2.0]),
                Dataset::from_numbers("two", vec![3.0, 4.0]),
            ],
        );
        let range = value_range(&data, false, true, true);
        assert!(range.start <= 0.0);
        assert!(range.end >= 6.0);
    }
}
