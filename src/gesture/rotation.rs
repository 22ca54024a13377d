//! Open-palm rotation — hand-open classification, palm yaw estimation,
//! and a debounced idle/pending/active lifecycle.
//!
//! Rotation is incremental: while active, the smoothed yaw change since the
//! last applied reference is scaled and added to the structure's yaw, so the
//! structure never snaps to the hand's absolute orientation.

use std::f32::consts::{PI, TAU};

use tracing::debug;

use super::keypoints::{Point3, TrackedPoint, TrackedPoints};

// ── Phase ──────────────────────────────────────────────────

/// Debounced rotation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPhase {
    #[default]
    Idle,
    Pending,
    Active,
}

impl RotationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for open-palm rotation.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Fingertip distance from palm center (normalized) to count as extended.
    pub open_hand_distance: f32,
    /// Extended fingertips required for an open hand.
    pub open_hand_min_fingers: usize,
    /// Consecutive open frames before rotation activates.
    pub activation_frames: u32,
    /// Blend factor for the smoothed yaw (small = heavy smoothing).
    pub yaw_smoothing: f32,
    /// Multiplier from hand yaw change to structure yaw change.
    pub speed: f32,
    /// Yaw changes (radians) at or below this are not applied.
    pub dead_zone: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            open_hand_distance: 0.1,
            open_hand_min_fingers: 3,
            activation_frames: 4,
            yaw_smoothing: 0.15,
            speed: 1.5,
            dead_zone: 0.01,
        }
    }
}

// ── Measurements ───────────────────────────────────────────

/// Wrap an angle to [-π, π].
pub fn wrap_angle(a: f32) -> f32 {
    (a + PI).rem_euclid(TAU) - PI
}

/// Whether enough fingertips are extended away from the palm center.
///
/// `extra_tips` holds the middle, ring and pinky tips.
pub fn is_hand_open(points: &TrackedPoints, extra_tips: &[Point3; 3], config: &RotationConfig) -> bool {
    let palm = points[TrackedPoint::Wrist.index()].midpoint(&points[TrackedPoint::MiddleMcp.index()]);
    let tips = [
        points[TrackedPoint::ThumbTip.index()],
        points[TrackedPoint::IndexTip.index()],
        extra_tips[0],
        extra_tips[1],
        extra_tips[2],
    ];
    let extended = tips
        .iter()
        .filter(|t| t.distance(&palm) > config.open_hand_distance)
        .count();
    extended >= config.open_hand_min_fingers
}

/// Palm yaw: heading of wrist→middle-MCP on the horizontal (x, z) plane.
pub fn palm_yaw(points: &TrackedPoints) -> f32 {
    let v = points[TrackedPoint::MiddleMcp.index()].sub(&points[TrackedPoint::Wrist.index()]);
    v.x.atan2(v.z)
}

// ── State ──────────────────────────────────────────────────

/// Transition reported by `RotationState::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTransition {
    None,
    Started,
    Released,
}

/// Per-hand rotation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationState {
    pub phase: RotationPhase,
    pub frame_count: u32,
    /// Smoothed yaw, `None` until the first measurement.
    pub smoothed_yaw: Option<f32>,
    pub prev_yaw: f32,
    /// Yaw at which the last structure update was applied.
    pub reference_yaw: f32,
}

impl RotationState {
    /// Fold a raw yaw sample into the smoothed yaw along the shortest arc.
    pub fn update_yaw(&mut self, raw: f32, config: &RotationConfig) {
        match self.smoothed_yaw {
            None => {
                self.prev_yaw = raw;
                self.smoothed_yaw = Some(raw);
            }
            Some(current) => {
                let delta = wrap_angle(raw - current);
                self.prev_yaw = current;
                self.smoothed_yaw = Some(wrap_angle(current + delta * config.yaw_smoothing));
            }
        }
    }

    /// Advance the lifecycle by one frame.  An active pinch forces idle.
    pub fn step(&mut self, open: bool, pinch_active: bool, config: &RotationConfig) -> RotationTransition {
        if pinch_active {
            let was_active = self.phase == RotationPhase::Active;
            self.phase = RotationPhase::Idle;
            self.frame_count = 0;
            return if was_active {
                RotationTransition::Released
            } else {
                RotationTransition::None
            };
        }

        match self.phase {
            RotationPhase::Idle => {
                if open {
                    self.phase = RotationPhase::Pending;
                    self.frame_count = 1;
                    return self.try_activate(config);
                }
            }
            RotationPhase::Pending => {
                if open {
                    self.frame_count += 1;
                    return self.try_activate(config);
                }
                self.phase = RotationPhase::Idle;
                self.frame_count = 0;
            }
            RotationPhase::Active => {
                if !open {
                    self.phase = RotationPhase::Idle;
                    self.frame_count = 0;
                    return RotationTransition::Released;
                }
            }
        }
        RotationTransition::None
    }

    fn try_activate(&mut self, config: &RotationConfig) -> RotationTransition {
        if self.frame_count < config.activation_frames.max(1) {
            return RotationTransition::None;
        }
        self.phase = RotationPhase::Active;
        self.frame_count = 0;
        self.reference_yaw = self.smoothed_yaw.unwrap_or(0.0);
        debug!("Rotation active, reference yaw {:.3}", self.reference_yaw);
        RotationTransition::Started
    }

    /// Structure yaw increment for this frame, if any.
    ///
    /// Advances the reference only when an increment is produced so slow
    /// drift below the dead zone accumulates instead of being lost.
    pub fn take_increment(&mut self, config: &RotationConfig) -> Option<f32> {
        if self.phase != RotationPhase::Active {
            return None;
        }
        let current = self.smoothed_yaw?;
        let delta = wrap_angle(current - self.reference_yaw);
        if delta.abs() <= config.dead_zone {
            return None;
        }
        self.reference_yaw = current;
        Some(delta * config.speed)
    }

    pub fn is_active(&self) -> bool {
        self.phase == RotationPhase::Active
    }

    /// Force back to idle (lifecycle reset).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Tests ──────────────────────────────────────────────────
