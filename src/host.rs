//! Chart lifecycle orchestration.
//!
//! A `ChartHost` owns at most one live `ChartInstance`. Every mutation goes
//! through destroy-before-create: the old instance, including its frame
//! plugins, is dropped as a unit before the replacement is built.

use std::ops::Range;

use anyhow::Result;

use crate::data::{ChartData, ChartKind, Dataset, ScaleCategory};
use crate::demo::{self, DemoDataset};
use crate::options::{scale_set, AnimationMode, ChartOptions, ScaleSet};
use crate::plugin::{effects_at, plugins_for, FramePlugin, TICK_MS};
use crate::render::{render_png, RenderRequest};
use crate::scheme::{styled, ColorScheme, Rgba};

/// Padding subtracted from the container on each axis before sizing.
const RESIZE_PADDING: f64 = 30.0;

/// One live chart: corrected kind, styled data, assembled scales, and the
/// plugin set for its animation mode.
pub struct ChartInstance {
    pub generation: u64,
    pub kind: ChartKind,
    pub data: ChartData,
    pub scales: ScaleSet,
    plugins: Vec<Box<dyn FramePlugin>>,
    elapsed_ms: u64,
    pending_ms: u64,
}

impl ChartInstance {
    pub fn has_loop_animation(&self) -> bool {
        !self.plugins.is_empty()
    }
}

/// Read-only legend row derived from the current data.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgba,
    pub visible: bool,
}

/// Canvas geometry: CSS size as laid out, pixel size after the device pixel
/// ratio is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

pub struct ChartHost {
    dataset: DemoDataset,
    kind: ChartKind,
    scheme: &'static ColorScheme,
    options: ChartOptions,
    user_data: Option<ChartData>,
    hidden: Vec<bool>,
    instance: Option<ChartInstance>,
    generation: u64,
    surface: Surface,
    device_pixel_ratio: f64,
    fullscreen: bool,
    container: (f64, f64),
    pending_resize: Option<(f64, f64)>,
    resizing: bool,
    zoom: Option<(Range<f64>, Range<f64>)>,
}

impl ChartHost {
    pub fn new(options: ChartOptions) -> ChartHost {
        ChartHost {
            dataset: DemoDataset::Sales,
            kind: ChartKind::Line,
            scheme: ColorScheme::default_scheme(),
            options,
            user_data: None,
            hidden: Vec::new(),
            instance: None,
            generation: 0,
            surface: Surface {
                css_width: 800.0,
                css_height: 400.0,
                pixel_width: 800,
                pixel_height: 400,
            },
            device_pixel_ratio: 1.0,
            fullscreen: false,
            container: (830.0, 430.0),
            pending_resize: None,
            resizing: false,
            zoom: None,
        }
    }

    pub fn instance(&self) -> Option<&ChartInstance> {
        self.instance.as_ref()
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Tear down the live instance. Safe to call with none live; plugins go
    /// down with the instance.
    pub fn destroy(&mut self) {
        if self.instance.take().is_some() {
            log::debug!("destroyed chart instance");
        }
    }

    /// Destroy-and-create with the current selections. The requested kind is
    /// corrected against the dataset and the correction is persisted, so the
    /// next rebuild starts from the corrected value.
    pub fn rebuild(&mut self) {
        self.destroy();

        let source = match &self.user_data {
            Some(data) => data.content_clone(),
            None => {
                self.kind = self.dataset.corrected_kind(self.kind);
                demo::demo_data(self.dataset, self.kind)
            }
        };

        let mut datasets =
            styled(&source.datasets, self.kind, self.scheme, self.options.appearance.border_width);
        self.hidden.resize(datasets.len(), false);
        for (ds, hidden) in datasets.iter_mut().zip(&self.hidden) {
            ds.hidden = *hidden;
        }
        let data = ChartData::new(source.labels, datasets);

        let stacked = data.datasets.iter().any(|ds| ds.stack.is_some());
        let dual = if self.user_data.is_none() { self.dataset.dual_axis_titles() } else { None };
        let scales = scale_set(self.kind, &self.options, dual, stacked);
        let plugins = plugins_for(self.kind, &self.options.animation);

        self.generation += 1;
        self.instance = Some(ChartInstance {
            generation: self.generation,
            kind: self.kind,
            data,
            scales,
            plugins,
            elapsed_ms: 0,
            pending_ms: 0,
        });
        log::debug!("built chart instance {} ({:?})", self.generation, self.kind);
    }

    pub fn set_kind(&mut self, kind: ChartKind) {
        self.kind = kind;
        self.rebuild();
    }

    pub fn set_dataset(&mut self, dataset: DemoDataset) {
        self.dataset = dataset;
        self.hidden.clear();
        self.rebuild();
    }

    pub fn set_scheme(&mut self, scheme: &'static ColorScheme) {
        self.scheme = scheme;
        self.rebuild();
    }

    pub fn set_options(&mut self, options: ChartOptions) {
        self.options = options;
        self.rebuild();
    }

    /// Install uploaded or custom data; it replaces the demo dataset until
    /// cleared.
    pub fn set_user_data(&mut self, data: ChartData) {
        self.user_data = Some(data);
        self.hidden.clear();
        self.rebuild();
    }

    pub fn clear_user_data(&mut self) {
        self.user_data = None;
        self.hidden.clear();
        self.rebuild();
    }

    /// Advance the loop animation. Returns true when enough time has
    /// accumulated for a new frame (at least the tick interval).
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        let Some(instance) = self.instance.as_mut() else { return false };
        instance.elapsed_ms += dt_ms;
        if instance.plugins.is_empty() {
            return false;
        }
        instance.pending_ms += dt_ms;
        if instance.pending_ms >= TICK_MS {
            instance.pending_ms = 0;
            true
        } else {
            false
        }
    }

    /// Jump past the entry animation, for one-shot renders that should show
    /// the settled chart.
    pub fn complete_entry(&mut self) {
        let settled = self.options.animation.delay_ms + self.options.animation.duration_ms;
        if let Some(instance) = self.instance.as_mut() {
            instance.elapsed_ms = instance.elapsed_ms.max(settled);
        }
    }

    /// Render the live instance to PNG. A drawing failure logs the error and
    /// falls back to a minimal bar chart so a render always leaves a live
    /// instance behind.
    pub fn render(&mut self) -> Result<Vec<u8>> {
        if self.instance.is_none() {
            self.rebuild();
        }
        let png = self.render_current();
        match png {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                log::error!("chart render failed, using fallback: {err:#}");
                self.install_fallback();
                self.render_current()
            }
        }
    }

    fn render_current(&self) -> Result<Vec<u8>> {
        let instance = self
            .instance
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no chart instance to render"))?;
        let effects = effects_at(&instance.plugins, instance.elapsed_ms);
        let progress = self.entry_progress(instance);
        let zoom = if instance.kind.scale_category() == ScaleCategory::Cartesian {
            self.zoom.clone()
        } else {
            None
        };
        let req = RenderRequest {
            data: &instance.data,
            kind: instance.kind,
            options: &self.options,
            scales: &instance.scales,
            effects,
            progress,
            zoom,
            width: self.surface.pixel_width,
            height: self.surface.pixel_height,
        };
        render_png(&req)
    }

    fn entry_progress(&self, instance: &ChartInstance) -> f64 {
        let animation = &self.options.animation;
        if animation.mode == AnimationMode::Off || animation.duration_ms == 0 {
            return 1.0;
        }
        let since_delay = instance.elapsed_ms.saturating_sub(animation.delay_ms);
        let linear = (since_delay as f64 / animation.duration_ms as f64).min(1.0);
        animation.easing.apply(linear)
    }

    fn install_fallback(&mut self) {
        self.destroy();
        let data = ChartData::new(
            vec!["No data".to_string()],
            vec![Dataset::from_numbers("No data", vec![1.0])],
        );
        let datasets = styled(&data.datasets, ChartKind::Bar, self.scheme, 1.0);
        self.generation += 1;
        self.instance = Some(ChartInstance {
            generation: self.generation,
            kind: ChartKind::Bar,
            data: ChartData::new(data.labels, datasets),
            scales: scale_set(ChartKind::Bar, &self.options, None, false),
            plugins: Vec::new(),
            elapsed_ms: 0,
            pending_ms: 0,
        });
    }

    /// Legend rows for the live instance.
    pub fn legend(&self) -> Vec<LegendEntry> {
        let Some(instance) = &self.instance else { return Vec::new() };
        instance
            .data
            .datasets
            .iter()
            .enumerate()
            .map(|(i, ds)| LegendEntry {
                label: ds.label.clone(),
                color: ds
                    .border_color
                    .as_ref()
                    .or(ds.background_color.as_ref())
                    .map_or(Rgba::BLACK, |p| p.at(i)),
                visible: !ds.hidden,
            })
            .collect()
    }

    /// Flip one series' visibility and rebuild. Out-of-range indices are
    /// ignored.
    pub fn toggle_series_visibility(&mut self, index: usize) {
        if index >= self.hidden.len() {
            let len = self
                .instance
                .as_ref()
                .map_or(0, |instance| instance.data.datasets.len());
            if index >= len {
                return;
            }
            self.hidden.resize(len, false);
        }
        self.hidden[index] = !self.hidden[index];
        self.rebuild();
    }

    /// Fit the canvas to a container. Subtracts the fixed padding, fits the
    /// configured aspect ratio inside what remains, then scales the backing
    /// buffer by the device pixel ratio. Returns the new surface, or None
    /// when the resize is suppressed (guard held or nothing to fit).
    pub fn resize(&mut self, container_width: f64, container_height: f64) -> Option<Surface> {
        if self.resizing {
            return None;
        }
        self.container = (container_width, container_height);
        let avail_w = container_width - RESIZE_PADDING;
        let avail_h = container_height - RESIZE_PADDING;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return None;
        }

        let aspect = self.options.appearance.aspect_ratio.max(0.1);
        let (css_w, css_h) = if avail_w / aspect <= avail_h {
            (avail_w, avail_w / aspect)
        } else {
            (avail_h * aspect, avail_h)
        };

        self.resizing = true;
        self.surface = Surface {
            css_width: css_w,
            css_height: css_h,
            pixel_width: (css_w * self.device_pixel_ratio).round().max(1.0) as u32,
            pixel_height: (css_h * self.device_pixel_ratio).round().max(1.0) as u32,
        };
        Some(self.surface)
    }

    /// Release the resize guard once the triggering layout pass has settled.
    pub fn settle_resize(&mut self) {
        self.resizing = false;
    }

    /// Set an exact pixel surface, bypassing container fitting.
    pub fn set_surface_px(&mut self, width: u32, height: u32) {
        self.surface = Surface {
            css_width: width as f64,
            css_height: height as f64,
            pixel_width: width.max(1),
            pixel_height: height.max(1),
        };
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio.max(0.1);
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Toggle fullscreen and queue a resize against the recorded container
    /// bounds; the driver applies it once the layout settles.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        self.pending_resize = Some(self.container);
    }

    /// Take the deferred resize request, if one is queued.
    pub fn take_pending_resize(&mut self) -> Option<(f64, f64)> {
        self.pending_resize.take()
    }

    pub fn set_zoom(&mut self, x: Range<f64>, y: Range<f64>) {
        self.zoom = Some((x, y));
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = None;
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom.is_some()
    }
}
