//! Keypoint input types — hand labels, 3D points, and per-tick frames.
//!
//! The detection model yields 21 landmarks per hand; the interaction core
//! tracks six of them (plus three extra fingertips for the open-hand
//! classifier).  Coordinates are camera-normalized: x, y in [0, 1] and z a
//! relative depth.

use tracing::debug;

// ── Hand label ─────────────────────────────────────────────

/// Which hand a frame belongs to.  Stable across frames while tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandLabel {
    Left,
    Right,
}

impl HandLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a handedness string as reported by the detection model.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" | "Left" => Some(Self::Left),
            "right" | "Right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Point ──────────────────────────────────────────────────

/// A 3D point (camera-normalized or world units depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Point3) -> Point3 {
        self.lerp(other, 0.5)
    }

    pub fn lerp(&self, other: &Point3, t: f32) -> Point3 {
        Point3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, s: f32) -> Point3 {
        Point3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ── Landmark indices ───────────────────────────────────────

/// Number of landmarks the detection model reports per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices in the detection model's 21-point convention.
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;
}

// ── Tracked points ─────────────────────────────────────────

/// The six keypoints the core smooths and tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedPoint {
    IndexTip,
    ThumbTip,
    Wrist,
    IndexMcp,
    PinkyMcp,
    MiddleMcp,
}

/// How far outside the normalized image a landmark may sit before the
/// frame is treated as a detector glitch.
pub const LANDMARK_MARGIN: f32 = 0.5;

/// Largest relative depth accepted from the detector.
pub const LANDMARK_MAX_DEPTH: f32 = 1.5;

fn landmark_in_range(p: &Point3) -> bool {
    let lo = -LANDMARK_MARGIN;
    let hi = 1.0 + LANDMARK_MARGIN;
    p.is_finite()
        && (lo..=hi).contains(&p.x)
        && (lo..=hi).contains(&p.y)
        && p.z.abs() <= LANDMARK_MAX_DEPTH
}

/// Number of tracked points per hand.
pub const TRACKED_COUNT: usize = 6;

impl TrackedPoint {
    pub const ALL: [TrackedPoint; TRACKED_COUNT] = [
        Self::IndexTip,
        Self::ThumbTip,
        Self::Wrist,
        Self::IndexMcp,
        Self::PinkyMcp,
        Self::MiddleMcp,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Fingertips get the faster blend factor.
    pub fn is_fingertip(&self) -> bool {
        matches!(self, Self::IndexTip | Self::ThumbTip)
    }

    fn landmark(&self) -> usize {
        match self {
            Self::IndexTip => landmarks::INDEX_TIP,
            Self::ThumbTip => landmarks::THUMB_TIP,
            Self::Wrist => landmarks::WRIST,
            Self::IndexMcp => landmarks::INDEX_MCP,
            Self::PinkyMcp => landmarks::PINKY_MCP,
            Self::MiddleMcp => landmarks::MIDDLE_MCP,
        }
    }
}

/// One smoothed-or-raw sample of the six tracked points, indexed by `TrackedPoint`.
pub type TrackedPoints = [Point3; TRACKED_COUNT];

// ── Frame ──────────────────────────────────────────────────

/// One detected hand for one sample tick.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointFrame {
    pub label: HandLabel,
    /// Sample time in milliseconds.
    pub timestamp_ms: f64,
    /// Tracked points indexed by `TrackedPoint::index()`.
    pub points: TrackedPoints,
    /// Middle, ring and pinky tips (raw, used only for open-hand classification).
    pub extra_tips: [Point3; 3],
}

impl KeypointFrame {
    /// Select the tracked points from a full 21-landmark set.
    ///
    /// Returns `None` if any selected coordinate is non-finite or lies well
    /// outside the image; such a frame is treated as "hand absent".
    pub fn from_landmarks(
        label: HandLabel,
        lm: &[Point3; LANDMARK_COUNT],
        timestamp_ms: f64,
    ) -> Option<Self> {
        let points = TrackedPoint::ALL.map(|p| lm[p.landmark()]);
        let extra_tips = [
            lm[landmarks::MIDDLE_TIP],
            lm[landmarks::RING_TIP],
            lm[landmarks::PINKY_TIP],
        ];
        if !points.iter().chain(extra_tips.iter()).all(landmark_in_range) {
            debug!("Dropping {:?} frame with out-of-range keypoints", label);
            return None;
        }
        Some(Self {
            label,
            timestamp_ms,
            points,
            extra_tips,
        })
    }

    pub fn point(&self, p: TrackedPoint) -> Point3 {
        self.points[p.index()]
    }
}

// ── Camera mapping ─────────────────────────────────────────

/// Maps camera-normalized coordinates onto the structure's world plane.
#[derive(Debug, Clone)]
pub struct CameraMapping {
    /// Mirror x so on-screen motion matches the user's hand (selfie view).
    pub mirror_x: bool,
    /// World units spanned by the full camera width/height.
    pub world_scale: f32,
}

impl Default for CameraMapping {
    fn default() -> Self {
        Self {
            mirror_x: true,
            world_scale: 10.0,
        }
    }
}

impl CameraMapping {
    /// Project a camera-normalized point onto the world plane at `depth`.
    ///
    /// Image y grows downward, world y grows upward.  Camera depth is not
    /// mapped: gestures act on the structure's plane.
    pub fn to_world(&self, p: &Point3, depth: f32) -> Point3 {
        let x = if self.mirror_x { 1.0 - p.x } else { p.x };
        Point3::new(
            (x - 0.5) * self.world_scale,
            -(p.y - 0.5) * self.world_scale,
            depth,
        )
    }
}

#[cfg(test)]
pub(crate) fn test_landmarks(fill: Point3) -> [Point3; LANDMARK_COUNT] {
    [fill; LANDMARK_COUNT]
}

// ── Tests ──────────────────────────────────────────────────
