//! Pinch detection — size-normalized fingertip distance with a debounced
//! idle/pending/active/cooldown lifecycle.
//!
//! Instantaneous samples flicker near the threshold, so activation needs
//! several consecutive hits, release uses a looser stop threshold, and a
//! cooldown blocks immediate re-triggering.

use tracing::debug;

use super::keypoints::{Point3, TrackedPoint, TrackedPoints};

// ── Phase ──────────────────────────────────────────────────

/// Debounced pinch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinchPhase {
    #[default]
    Idle,
    /// Below the start threshold, not yet for enough frames.
    Pending,
    Active,
    /// Released; re-activation blocked until the deadline.
    Cooldown,
}

impl PinchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Cooldown => "cooldown",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Pinch thresholds and debounce counts.
#[derive(Debug, Clone)]
pub struct PinchConfig {
    /// Fingertip distance (normalized, at reference hand size) that starts a pinch.
    pub start_distance: f32,
    /// Looser distance that must be exceeded to end a pinch.
    pub stop_distance: f32,
    /// Wrist→middle-MCP length the thresholds are calibrated for.
    pub hand_size_reference: f32,
    /// Consecutive frames below `start_distance` before activation.
    pub activation_frames: u32,
    /// Consecutive frames above `stop_distance` before release.
    pub release_frames: u32,
    /// Minimum time after a release before the next pinch can begin.
    pub cooldown_ms: f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            start_distance: 0.05,
            stop_distance: 0.08,
            hand_size_reference: 0.15,
            activation_frames: 3,
            release_frames: 2,
            cooldown_ms: 300.0,
        }
    }
}

// ── Debounce state ─────────────────────────────────────────

/// Per-hand pinch debounce state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinchState {
    pub phase: PinchPhase,
    /// Consecutive qualifying frames in `Pending` (below start) or
    /// `Active` (above stop).
    pub frame_count: u32,
    /// Absolute deadline (ms) ending the cooldown.
    pub cooldown_until_ms: f64,
}

/// Transition reported by `PinchState::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchTransition {
    None,
    Started,
    Released,
}

impl PinchState {
    /// Advance the state machine by one frame.
    ///
    /// `below_start` / `below_stop` are the instantaneous threshold tests
    /// for this frame; `now_ms` drives the cooldown deadline.
    pub fn step(
        &mut self,
        below_start: bool,
        below_stop: bool,
        now_ms: f64,
        config: &PinchConfig,
    ) -> PinchTransition {
        match self.phase {
            PinchPhase::Idle => {
                if below_start {
                    self.phase = PinchPhase::Pending;
                    self.frame_count = 1;
                    return self.try_activate(config);
                }
            }
            PinchPhase::Pending => {
                if below_start {
                    self.frame_count += 1;
                    return self.try_activate(config);
                }
                self.phase = PinchPhase::Idle;
                self.frame_count = 0;
            }
            PinchPhase::Active => {
                if below_stop {
                    self.frame_count = 0;
                } else {
                    self.frame_count += 1;
                    if self.frame_count >= config.release_frames.max(1) {
                        self.phase = PinchPhase::Cooldown;
                        self.frame_count = 0;
                        self.cooldown_until_ms = now_ms + config.cooldown_ms;
                        return PinchTransition::Released;
                    }
                }
            }
            PinchPhase::Cooldown => {
                if now_ms >= self.cooldown_until_ms {
                    self.phase = PinchPhase::Idle;
                    self.frame_count = 0;
                }
            }
        }
        PinchTransition::None
    }

    fn try_activate(&mut self, config: &PinchConfig) -> PinchTransition {
        if self.frame_count >= config.activation_frames.max(1) {
            self.phase = PinchPhase::Active;
            self.frame_count = 0;
            PinchTransition::Started
        } else {
            PinchTransition::None
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == PinchPhase::Active
    }

    /// Force back to idle (lifecycle reset).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Detector ───────────────────────────────────────────────

/// Per-frame pinch measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSample {
    /// Raw 3D fingertip distance.
    pub distance: f32,
    /// Hand-size scale applied to both thresholds.
    pub scale: f32,
    pub below_start: bool,
    pub below_stop: bool,
    /// Midpoint between thumb and index tips (camera-normalized).
    pub midpoint: Point3,
}

/// Measure the pinch on smoothed points.
pub fn measure(points: &TrackedPoints, config: &PinchConfig) -> PinchSample {
    let index = points[TrackedPoint::IndexTip.index()];
    let thumb = points[TrackedPoint::ThumbTip.index()];
    let wrist = points[TrackedPoint::Wrist.index()];
    let middle_mcp = points[TrackedPoint::MiddleMcp.index()];

    let distance = index.distance(&thumb);
    let hand_size = wrist.distance(&middle_mcp);
    let scale = if config.hand_size_reference > 0.0 && hand_size > f32::EPSILON {
        hand_size / config.hand_size_reference
    } else {
        1.0
    };

    PinchSample {
        distance,
        scale,
        below_start: distance < config.start_distance * scale,
        below_stop: distance < config.stop_distance * scale,
        midpoint: index.midpoint(&thumb),
    }
}

/// Measure and advance in one call.  Returns the sample and transition.
pub fn update(
    state: &mut PinchState,
    points: &TrackedPoints,
    now_ms: f64,
    config: &PinchConfig,
) -> (PinchSample, PinchTransition) {
    let sample = measure(points, config);
    let transition = state.step(sample.below_start, sample.below_stop, now_ms, config);
    if transition != PinchTransition::None {
        debug!(
            "Pinch {:?}: distance={:.3} scale={:.2}",
            transition, sample.distance, sample.scale
        );
    }
    (sample, transition)
}

// ── Test helpers ───────────────────────────────────────────

/// Points for a hand of reference size with fingertips `gap` apart.
#[cfg(test)]
pub(crate) fn pinch_points(gap: f32) -> TrackedPoints {
    let mut points = [Point3::new(0.5, 0.5, 0.0); super::keypoints::TRACKED_COUNT];
    points[TrackedPoint::Wrist.index()] = Point3::new(0.5, 0.8, 0.0);
    points[TrackedPoint::MiddleMcp.index()] = Point3::new(0.5, 0.65, 0.0);
    points[TrackedPoint::ThumbTip.index()] = Point3::new(0.5, 0.5, 0.0);
    points[TrackedPoint::IndexTip.index()] = Point3::new(0.5 + gap, 0.5, 0.0);
    points
}

// ── Tests ──────────────────────────────────────────────────
