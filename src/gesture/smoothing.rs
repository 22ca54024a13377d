//! Keypoint smoothing — per-point exponential blend with outlier freezing
//! and short-horizon motion prediction.

use tracing::debug;

use super::keypoints::{Point3, TrackedPoint, TrackedPoints, TRACKED_COUNT};

// ── Config ─────────────────────────────────────────────────

/// Configuration for keypoint smoothing.
#[derive(Debug, Clone)]
pub struct SmoothingConfig {
    /// Blend factor toward the raw sample for wrist and MCP points.
    pub blend: f32,
    /// Blend factor toward the raw sample for thumb and index tips.
    pub fingertip_blend: f32,
    /// Largest plausible movement (normalized units) per reference interval.
    pub max_velocity: f32,
    /// Interval (ms) `max_velocity` is expressed against.
    pub reference_interval_ms: f64,
    /// Consecutive frozen samples after which a point jumps to the raw value.
    pub outlier_reseed_frames: u32,
    /// Fraction of last frame's motion extrapolated by `predicted`.
    pub prediction_factor: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            blend: 0.35,
            fingertip_blend: 0.6,
            max_velocity: 0.25,
            reference_interval_ms: 33.3,
            outlier_reseed_frames: 5,
            prediction_factor: 0.5,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Smoothed keypoints for one hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedPoints {
    /// Current smoothed values, `None` before the first sample.
    pub current: Option<TrackedPoints>,
    /// Snapshot taken before the latest update.
    pub previous: Option<TrackedPoints>,
    /// Timestamp of the latest accepted update.
    pub last_update_ms: Option<f64>,
    /// Consecutive frozen samples per point.
    rejected: [u32; TRACKED_COUNT],
}

impl SmoothedPoints {
    /// Fold one raw sample in.  Returns how many points were frozen as outliers.
    pub fn update(
        &mut self,
        raw: &TrackedPoints,
        timestamp_ms: f64,
        config: &SmoothingConfig,
    ) -> usize {
        let Some(prior) = self.current else {
            self.current = Some(*raw);
            self.previous = Some(*raw);
            self.last_update_ms = Some(timestamp_ms);
            self.rejected = [0; TRACKED_COUNT];
            return 0;
        };

        let dt_ms = self
            .last_update_ms
            .map(|t| timestamp_ms - t)
            .unwrap_or(config.reference_interval_ms);
        // Bursty or duplicate timestamps must not shrink the bound below one interval.
        let intervals = if config.reference_interval_ms > 0.0 {
            (dt_ms / config.reference_interval_ms).max(1.0) as f32
        } else {
            1.0
        };
        let bound = config.max_velocity * intervals;

        let mut next = prior;
        let mut frozen = 0;
        for p in TrackedPoint::ALL {
            let i = p.index();
            let old = prior[i];
            let new = raw[i];
            if old.distance(&new) > bound {
                self.rejected[i] += 1;
                if self.rejected[i] <= config.outlier_reseed_frames {
                    frozen += 1;
                    continue;
                }
                debug!("Keypoint {:?} re-seeded after {} frozen samples", p, self.rejected[i] - 1);
                self.rejected[i] = 0;
                next[i] = new;
                continue;
            }
            self.rejected[i] = 0;
            let alpha = if p.is_fingertip() {
                config.fingertip_blend
            } else {
                config.blend
            };
            next[i] = old.lerp(&new, alpha);
        }

        self.previous = Some(prior);
        self.current = Some(next);
        self.last_update_ms = Some(timestamp_ms);
        frozen
    }

    pub fn get(&self, p: TrackedPoint) -> Option<Point3> {
        self.current.map(|c| c[p.index()])
    }

    /// Extrapolate a point along its last frame-to-frame motion.
    pub fn predicted(&self, p: TrackedPoint, config: &SmoothingConfig) -> Option<Point3> {
        let current = self.current?[p.index()];
        let previous = self.previous.map(|s| s[p.index()]).unwrap_or(current);
        let velocity = current.sub(&previous);
        Some(current.add(&velocity.scale(config.prediction_factor)))
    }
}

// ── Tests ──────────────────────────────────────────────────
