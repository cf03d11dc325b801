//! Looping frame animations.
//!
//! Each chart instance owns its plugin list; plugins never touch global
//! state. A plugin maps elapsed wall time to per-frame draw effects which
//! the renderer applies around the data pass.

use std::f64::consts::TAU;

use crate::data::ChartKind;
use crate::options::{AnimationMode, AnimationSettings, Easing};

/// Frame update cadence for looping animations.
pub const TICK_MS: u64 = 50;

/// Draw-time effects for one frame. Identity by default.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEffects {
    /// Rotation about the chart center, radians.
    pub rotation: f64,
    /// Uniform scale about the chart center.
    pub scale: f64,
    /// Bar height factor, 1.0 is full height.
    pub bar_growth: f64,
    /// Line tension override.
    pub tension: Option<f64>,
}

impl Default for FrameEffects {
    fn default() -> Self {
        FrameEffects { rotation: 0.0, scale: 1.0, bar_growth: 1.0, tension: None }
    }
}

pub trait FramePlugin: Send {
    fn id(&self) -> &'static str;
    fn apply(&self, elapsed_ms: u64, effects: &mut FrameEffects);
}

/// Continuous rotation for pie and doughnut charts, one full turn every
/// 3000·2π milliseconds of elapsed time.
pub struct RotateAnimation;

impl FramePlugin for RotateAnimation {
    fn id(&self) -> &'static str {
        "rotate-animation"
    }

    fn apply(&self, elapsed_ms: u64, effects: &mut FrameEffects) {
        effects.rotation = (elapsed_ms as f64 / 3000.0) % TAU;
    }
}

/// Breathing scale for radar and polar-area charts, 0.8..1.0.
pub struct ScalePulse;

impl FramePlugin for ScalePulse {
    fn id(&self) -> &'static str {
        "scale-pulse"
    }

    fn apply(&self, elapsed_ms: u64, effects: &mut FrameEffects) {
        effects.scale = 0.8 + (elapsed_ms as f64 / 1000.0).sin().abs() * 0.2;
    }
}

/// Bar heights oscillate between 80% and 100% of their value.
pub struct BarPulse;

impl FramePlugin for BarPulse {
    fn id(&self) -> &'static str {
        "bar-pulse"
    }

    fn apply(&self, elapsed_ms: u64, effects: &mut FrameEffects) {
        effects.bar_growth = 0.8 + (elapsed_ms as f64 / 1000.0).sin().abs() * 0.2;
    }
}

/// Line tension sweeps from 0 to 1 and restarts, shaped by the configured
/// easing.
pub struct TensionSweep {
    duration_ms: u64,
    easing: Easing,
}

impl TensionSweep {
    pub fn new(duration_ms: u64, easing: Easing) -> TensionSweep {
        TensionSweep { duration_ms: duration_ms.max(1), easing }
    }
}

impl FramePlugin for TensionSweep {
    fn id(&self) -> &'static str {
        "tension-sweep"
    }

    fn apply(&self, elapsed_ms: u64, effects: &mut FrameEffects) {
        let progress = (elapsed_ms % self.duration_ms) as f64 / self.duration_ms as f64;
        effects.tension = Some(self.easing.apply(progress));
    }
}

/// The plugin list for a fresh chart instance. Empty unless the loop mode
/// is selected; the kind decides which effect loops.
pub fn plugins_for(kind: ChartKind, animation: &AnimationSettings) -> Vec<Box<dyn FramePlugin>> {
    if animation.mode != AnimationMode::Loop {
        return Vec::new();
    }
    match kind {
        ChartKind::Line => {
            vec![Box::new(TensionSweep::new(animation.duration_ms, animation.easing))]
        }
        ChartKind::Pie | ChartKind::Doughnut => vec![Box::new(RotateAnimation)],
        ChartKind::Bar => vec![Box::new(BarPulse)],
        ChartKind::Radar | ChartKind::PolarArea => vec![Box::new(ScalePulse)],
        ChartKind::Bubble | ChartKind::Scatter => Vec::new(),
    }
}

/// Fold a plugin list over identity effects.
pub fn effects_at(plugins: &[Box<dyn FramePlugin>], elapsed_ms: u64) -> FrameEffects {
    let mut effects = FrameEffects::default();
    for plugin in plugins {
        plugin.apply(elapsed_ms, &mut effects);
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps() {
        let mut effects = FrameEffects::default();
        RotateAnimation.apply(0, &mut effects);
        assert_eq!(effects.rotation, 0.0);
        // 3000·2π ms is one full turn, so half that is π.
        let half_turn = (3000.0 * TAU / 2.0) as u64;
        RotateAnimation.apply(half_turn, &mut effects);
        assert!((effects.rotation - std::f64::consts::PI).abs() < 1e-3);
        RotateAnimation.apply(half_turn * 2 + 10, &mut effects);
        assert!(effects.rotation < TAU);
    }

    #[test]
    fn test_pulse_stays_in_band() {
        let mut effects = FrameEffects::default();
        for ms in (0..10_000).step_by(37) {
            ScalePulse.apply(ms, &mut effects);
            assert!((0.8..=1.0).contains(&effects.scale));
            BarPulse.apply(ms, &mut effects);
            assert!((0.8..=1.0).contains(&effects.bar_growth));
        }
    }

    #[test]
    fn test_tension_sweep_loops() {
        let sweep = TensionSweep::new(1000, Easing::LINEAR);
        let mut effects = FrameEffects::default();
        sweep.apply(500, &mut effects);
        assert_eq!(effects.tension, Some(0.5));
        sweep.apply(1500, &mut effects);
        assert_eq!(effects.tension, Some(0.5));
        sweep.apply(0, &mut effects);
        assert_eq!(effects.tension, Some(0.0));
    }

    #[test]
    fn test_plugins_only_in_loop_mode() {
        let mut animation = AnimationSettings::default();
        assert!(plugins_for(ChartKind::Pie, &animation).is_empty());
        animation.mode = AnimationMode::Loop;
        assert_eq!(plugins_for(ChartKind::Pie, &animation)[0].id(), "rotate-animation");
        assert_eq!(plugins_for(ChartKind::Radar, &animation)[0].id(), "scale-pulse");
        assert_eq!(plugins_for(ChartKind::Bar, &animation)[0].id(), "bar-pulse");
        assert_eq!(plugins_for(ChartKind::Line, &animation)[0].id(), "tension-sweep");
        assert!(plugins_for(ChartKind::Scatter, &animation).is_empty());
    }

    #[test]
    fn test_effects_fold() {
        let mut animation = AnimationSettings::default();
        animation.mode = AnimationMode::Loop;
        let plugins = plugins_for(ChartKind::Doughnut, &animation);
        let effects = effects_at(&plugins, 1500);
        assert!(effects.rotation > 0.0);
        assert_eq!(effects.scale, 1.0);
    }
}
