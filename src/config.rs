//! Interaction tunables — one struct per component, grouped here so a
//! single s-expression file can override any of them.
//!
//! File format is a flat plist of kebab-case keys:
//!
//! ```text
//! (:pinch-start 0.04 :activation-frames 4 :grid-unit 1.0 :mirror-x nil)
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use lexpr::Value;
use tracing::{debug, warn};

use crate::gesture::{CameraMapping, PinchConfig, RotationConfig, SmoothingConfig};
use crate::hand::LifecycleConfig;
use crate::interaction::{DragConfig, SelectionConfig};
use crate::sexp;
use crate::structure::StructureConfig;

/// Every tunable of the interaction core.
#[derive(Debug, Clone, Default)]
pub struct InteractionConfig {
    pub smoothing: SmoothingConfig,
    pub pinch: PinchConfig,
    pub rotation: RotationConfig,
    pub selection: SelectionConfig,
    pub drag: DragConfig,
    pub structure: StructureConfig,
    pub lifecycle: LifecycleConfig,
    pub camera: CameraMapping,
}

impl InteractionConfig {
    /// Parse a plist of overrides on top of the defaults.
    ///
    /// Unknown keys and values of the wrong type are warned about and
    /// skipped; only a malformed expression is an error.
    pub fn from_sexp(text: &str) -> Result<Self> {
        let mut config = Self::default();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(config);
        }
        let value = lexpr::from_str(trimmed).context("parsing config s-expression")?;
        for (key, v) in sexp::plist_pairs(&value) {
            if !config.apply(key, v) {
                warn!("Ignoring unknown config key :{}", key);
            }
        }
        config.check_consistency();
        Ok(config)
    }

    /// Load overrides from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::from_sexp(&text).with_context(|| format!("in config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply one override.  Returns false if the key is not recognized.
    ///
    /// A value outside its key's range is warned about and the current
    /// setting kept.
    fn apply(&mut self, key: &str, v: &Value) -> bool {
        use Range::*;
        match key {
            // Smoothing
            "blend" => set_f32(&mut self.smoothing.blend, key, v, UnitInterval),
            "fingertip-blend" => set_f32(&mut self.smoothing.fingertip_blend, key, v, UnitInterval),
            "max-velocity" => set_f32(&mut self.smoothing.max_velocity, key, v, Positive),
            "reference-interval-ms" => {
                set_f64(&mut self.smoothing.reference_interval_ms, key, v, Positive)
            }
            "outlier-reseed-frames" => {
                set_u32(&mut self.smoothing.outlier_reseed_frames, key, v, AtLeast(1.0))
            }
            "prediction-factor" => {
                set_f32(&mut self.smoothing.prediction_factor, key, v, NonNegative)
            }

            // Pinch
            "pinch-start" => set_f32(&mut self.pinch.start_distance, key, v, Positive),
            "pinch-stop" => set_f32(&mut self.pinch.stop_distance, key, v, Positive),
            "hand-size-reference" => {
                set_f32(&mut self.pinch.hand_size_reference, key, v, Positive)
            }
            "activation-frames" => {
                set_u32(&mut self.pinch.activation_frames, key, v, AtLeast(1.0))
            }
            "release-frames" => set_u32(&mut self.pinch.release_frames, key, v, AtLeast(1.0)),
            "cooldown-ms" => set_f64(&mut self.pinch.cooldown_ms, key, v, NonNegative),

            // Rotation
            "open-hand-distance" => {
                set_f32(&mut self.rotation.open_hand_distance, key, v, Positive)
            }
            "open-hand-min-fingers" => {
                let mut n = self.rotation.open_hand_min_fingers as u32;
                set_u32(&mut n, key, v, Between(1.0, 5.0));
                self.rotation.open_hand_min_fingers = n as usize;
            }
            "rotation-activation-frames" => {
                set_u32(&mut self.rotation.activation_frames, key, v, AtLeast(1.0))
            }
            "yaw-smoothing" => set_f32(&mut self.rotation.yaw_smoothing, key, v, UnitInterval),
            "rotation-speed" => set_f32(&mut self.rotation.speed, key, v, Positive),
            "rotation-dead-zone" => set_f32(&mut self.rotation.dead_zone, key, v, NonNegative),

            // Selection and drag
            "selection-radius" => set_f32(&mut self.selection.radius, key, v, Positive),
            "dwell-frames" => set_u32(&mut self.selection.dwell_frames, key, v, AtLeast(1.0)),
            "movement-dead-zone" => {
                set_f32(&mut self.drag.movement_dead_zone, key, v, NonNegative)
            }
            "hold-to-move-ms" => set_f64(&mut self.drag.hold_to_move_ms, key, v, NonNegative),

            // Structure, lifecycle, camera
            "grid-unit" => {
                set_f32(&mut self.structure.grid_unit, key, v, AtLeast(MIN_GRID_UNIT))
            }
            "depth" => set_f32(&mut self.structure.depth, key, v, Any),
            "missing-reset-frames" => {
                set_u32(&mut self.lifecycle.missing_reset_frames, key, v, AtLeast(1.0))
            }
            "mirror-x" => self.camera.mirror_x = sexp::as_bool(v),
            "world-scale" => set_f32(&mut self.camera.world_scale, key, v, Positive),

            _ => return false,
        }
        true
    }

    /// Settings that are only valid together.  A conflicting pair falls
    /// back to the defaults for both.
    fn check_consistency(&mut self) {
        if self.pinch.stop_distance < self.pinch.start_distance {
            let defaults = PinchConfig::default();
            warn!(
                "Config :pinch-stop {} is below :pinch-start {}, using defaults {} / {}",
                self.pinch.stop_distance,
                self.pinch.start_distance,
                defaults.stop_distance,
                defaults.start_distance
            );
            self.pinch.start_distance = defaults.start_distance;
            self.pinch.stop_distance = defaults.stop_distance;
        }
    }

    /// Generate s-expression of the effective configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:blend {:.2} :fingertip-blend {:.2} :max-velocity {:.3} :reference-interval-ms {:.1} :outlier-reseed-frames {} :prediction-factor {:.2} \
             :pinch-start {:.3} :pinch-stop {:.3} :hand-size-reference {:.3} :activation-frames {} :release-frames {} :cooldown-ms {:.0} \
             :open-hand-distance {:.3} :open-hand-min-fingers {} :rotation-activation-frames {} :yaw-smoothing {:.2} :rotation-speed {:.2} :rotation-dead-zone {:.3} \
             :selection-radius {:.2} :dwell-frames {} :movement-dead-zone {:.2} :hold-to-move-ms {:.0} \
             :grid-unit {:.2} :depth {:.2} :missing-reset-frames {} :mirror-x {} :world-scale {:.1})",
            self.smoothing.blend,
            self.smoothing.fingertip_blend,
            self.smoothing.max_velocity,
            self.smoothing.reference_interval_ms,
            self.smoothing.outlier_reseed_frames,
            self.smoothing.prediction_factor,
            self.pinch.start_distance,
            self.pinch.stop_distance,
            self.pinch.hand_size_reference,
            self.pinch.activation_frames,
            self.pinch.release_frames,
            self.pinch.cooldown_ms,
            self.rotation.open_hand_distance,
            self.rotation.open_hand_min_fingers,
            self.rotation.activation_frames,
            self.rotation.yaw_smoothing,
            self.rotation.speed,
            self.rotation.dead_zone,
            self.selection.radius,
            self.selection.dwell_frames,
            self.drag.movement_dead_zone,
            self.drag.hold_to_move_ms,
            self.structure.grid_unit,
            self.structure.depth,
            self.lifecycle.missing_reset_frames,
            if self.camera.mirror_x { "t" } else { "nil" },
            self.camera.world_scale,
        )
    }
}

/// Smallest grid unit accepted from a config file.
pub const MIN_GRID_UNIT: f64 = 0.01;

/// Accepted values for a numeric config key.
#[derive(Debug, Clone, Copy)]
enum Range {
    Any,
    Positive,
    NonNegative,
    /// (0, 1]
    UnitInterval,
    AtLeast(f64),
    Between(f64, f64),
}

impl Range {
    fn contains(&self, n: f64) -> bool {
        match *self {
            Self::Any => true,
            Self::Positive => n > 0.0,
            Self::NonNegative => n >= 0.0,
            Self::UnitInterval => n > 0.0 && n <= 1.0,
            Self::AtLeast(min) => n >= min,
            Self::Between(lo, hi) => n >= lo && n <= hi,
        }
    }

    fn describe(&self) -> String {
        match *self {
            Self::Any => "a number".to_string(),
            Self::Positive => "a number > 0".to_string(),
            Self::NonNegative => "a number >= 0".to_string(),
            Self::UnitInterval => "a number in (0, 1]".to_string(),
            Self::AtLeast(min) => format!("a number >= {}", min),
            Self::Between(lo, hi) => format!("a number in [{}, {}]", lo, hi),
        }
    }
}

fn set_f64(slot: &mut f64, key: &str, v: &Value, range: Range) {
    match sexp::as_f64(v) {
        Some(n) if n.is_finite() && range.contains(n) => *slot = n,
        _ => warn!(
            "Config key :{} expects {}, got {}; keeping {}",
            key,
            range.describe(),
            v,
            slot
        ),
    }
}

fn set_f32(slot: &mut f32, key: &str, v: &Value, range: Range) {
    // Range-check after narrowing so values past f32::MAX are rejected.
    match sexp::as_f64(v).map(|n| n as f32) {
        Some(n) if n.is_finite() && range.contains(n as f64) => *slot = n,
        _ => warn!(
            "Config key :{} expects {}, got {}; keeping {}",
            key,
            range.describe(),
            v,
            slot
        ),
    }
}

fn set_u32(slot: &mut u32, key: &str, v: &Value, range: Range) {
    match sexp::as_f64(v) {
        Some(n) if n.fract() == 0.0 && n >= 0.0 && n <= u32::MAX as f64 && range.contains(n) => {
            *slot = n as u32
        }
        _ => warn!(
            "Config key :{} expects an integer, {}, got {}; keeping {}",
            key,
            range.describe(),
            v,
            slot
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = InteractionConfig::default();
        assert_eq!(c.pinch.activation_frames, 3);
        assert_eq!(c.selection.dwell_frames, 3);
        assert_eq!(c.lifecycle.missing_reset_frames, 30);
        assert!((c.structure.grid_unit - 1.0).abs() < 1e-6);
        assert!(c.camera.mirror_x);
    }

    #[test]
    fn test_overrides_applied() {
        let c = InteractionConfig::from_sexp(
            "(:pinch-start 0.04 :activation-frames 5 :hold-to-move-ms 400 :mirror-x nil :grid-unit 0.5)",
        )
        .unwrap();
        assert!((c.pinch.start_distance - 0.04).abs() < 1e-6);
        assert_eq!(c.pinch.activation_frames, 5);
        assert!((c.drag.hold_to_move_ms - 400.0).abs() < 1e-9);
        assert!(!c.camera.mirror_x);
        assert!((c.structure.grid_unit - 0.5).abs() < 1e-6);
        // Untouched keys keep defaults.
        assert_eq!(c.selection.dwell_frames, 3);
    }

    #[test]
    fn test_unknown_and_bad_values_ignored() {
        let c = InteractionConfig::from_sexp("(:no-such-key 1 :dwell-frames -2 :pinch-stop :wide)")
            .unwrap();
        assert_eq!(c.selection.dwell_frames, 3);
        assert!((c.pinch.stop_distance - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_values_keep_defaults() {
        let c = InteractionConfig::from_sexp(
            "(:grid-unit 1e-9 :world-scale 1e300 :blend 0 :fingertip-blend 1.5 \
              :activation-frames 0 :open-hand-min-fingers 6 :selection-radius -1 :cooldown-ms -5)",
        )
        .unwrap();
        let d = InteractionConfig::default();
        assert!((c.structure.grid_unit - d.structure.grid_unit).abs() < 1e-6);
        assert!(c.camera.world_scale.is_finite());
        assert!((c.camera.world_scale - d.camera.world_scale).abs() < 1e-6);
        assert!((c.smoothing.blend - d.smoothing.blend).abs() < 1e-6);
        assert!((c.smoothing.fingertip_blend - d.smoothing.fingertip_blend).abs() < 1e-6);
        assert_eq!(c.pinch.activation_frames, d.pinch.activation_frames);
        assert_eq!(c.rotation.open_hand_min_fingers, d.rotation.open_hand_min_fingers);
        assert!((c.selection.radius - d.selection.radius).abs() < 1e-6);
        assert!((c.pinch.cooldown_ms - d.pinch.cooldown_ms).abs() < 1e-9);

        // Boundary values are accepted.
        let c = InteractionConfig::from_sexp("(:grid-unit 0.01 :blend 1 :open-hand-min-fingers 5)")
            .unwrap();
        assert!((c.structure.grid_unit - 0.01).abs() < 1e-6);
        assert!((c.smoothing.blend - 1.0).abs() < 1e-6);
        assert_eq!(c.rotation.open_hand_min_fingers, 5);
    }

    #[test]
    fn test_inverted_pinch_thresholds_reset() {
        let c = InteractionConfig::from_sexp("(:pinch-start 0.1 :pinch-stop 0.05)").unwrap();
        let d = PinchConfig::default();
        assert!((c.pinch.start_distance - d.start_distance).abs() < 1e-6);
        assert!((c.pinch.stop_distance - d.stop_distance).abs() < 1e-6);
        assert!(c.pinch.stop_distance >= c.pinch.start_distance);

        // Equal thresholds are a valid (hysteresis-free) setting.
        let c = InteractionConfig::from_sexp("(:pinch-start 0.07 :pinch-stop 0.07)").unwrap();
        assert!((c.pinch.start_distance - 0.07).abs() < 1e-6);
        assert!((c.pinch.stop_distance - 0.07).abs() < 1e-6);
    }

    #[test]
    fn test_empty_is_default() {
        let c = InteractionConfig::from_sexp("  ").unwrap();
        assert_eq!(c.rotation.activation_frames, 4);
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(InteractionConfig::from_sexp("(:pinch-start").is_err());
    }

    #[test]
    fn test_config_sexp_round_trips() {
        let mut c = InteractionConfig::default();
        c.rotation.speed = 2.0;
        c.lifecycle.missing_reset_frames = 12;
        let text = c.config_sexp();
        assert!(text.contains(":rotation-speed 2.00"), "got {}", text);
        let parsed = InteractionConfig::from_sexp(&text).unwrap();
        assert_eq!(parsed.lifecycle.missing_reset_frames, 12);
        assert!((parsed.rotation.speed - 2.0).abs() < 1e-6);
    }
}
