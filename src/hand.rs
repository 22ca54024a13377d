//! Per-hand interaction state and lifecycle.
//!
//! One `HandState` per hand label, created on first sighting and kept for
//! the session.  A hand that stays out of view while holding gesture state
//! is force-reset so the structure cannot be left in a stuck drag.

use std::collections::BTreeMap;

use tracing::info;

use crate::gesture::keypoints::{HandLabel, Point3};
use crate::gesture::pinch::{PinchPhase, PinchState};
use crate::gesture::rotation::{RotationPhase, RotationState};
use crate::gesture::smoothing::SmoothedPoints;
use crate::structure::BlockId;

// ── Interaction mode ───────────────────────────────────────

/// What a confirmed drag does to the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Selected, but neither hold nor flick has been recognized yet.
    #[default]
    Undecided,
    Move,
    Spawn,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undecided => "none",
            Self::Move => "move",
            Self::Spawn => "spawn",
        }
    }
}

/// Dwell tracking for the block nearest a pinching fingertip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorCandidate {
    pub block: BlockId,
    /// Consecutive frames this block was the nearest hit.
    pub hits: u32,
}

// ── Hand state ─────────────────────────────────────────────

/// Session state for one tracked hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandState {
    pub label: HandLabel,
    pub points: SmoothedPoints,
    pub pinch: PinchState,
    pub rotation: RotationState,

    pub is_dragging: bool,
    pub mode: InteractionMode,
    pub selected_block: Option<BlockId>,
    /// Block position minus pinch position, captured when `Move` resolves.
    pub drag_offset: Point3,
    pub pinch_start_world: Option<Point3>,
    pub pinch_start_ms: f64,
    /// Tip of the spawn chain.
    pub last_spawned: Option<BlockId>,
    pub spawn_accum_x: f32,
    pub spawn_accum_y: f32,
    pub anchor_candidate: Option<AnchorCandidate>,

    /// Latest pinch midpoint in world space, `None` before the first frame.
    pub pinch_world: Option<Point3>,
    pub frames_missing: u32,
}

impl HandState {
    pub fn new(label: HandLabel) -> Self {
        Self {
            label,
            points: SmoothedPoints::default(),
            pinch: PinchState::default(),
            rotation: RotationState::default(),
            is_dragging: false,
            mode: InteractionMode::default(),
            selected_block: None,
            drag_offset: Point3::default(),
            pinch_start_world: None,
            pinch_start_ms: 0.0,
            last_spawned: None,
            spawn_accum_x: 0.0,
            spawn_accum_y: 0.0,
            anchor_candidate: None,
            pinch_world: None,
            frames_missing: 0,
        }
    }

    /// Drop all drag and selection state.  Returns whether a drag was held.
    ///
    /// Safe to call repeatedly; a second call changes nothing.
    pub fn release_drag(&mut self) -> bool {
        let was_dragging = self.is_dragging;
        self.is_dragging = false;
        self.mode = InteractionMode::Undecided;
        self.selected_block = None;
        self.drag_offset = Point3::default();
        self.pinch_start_world = None;
        self.pinch_start_ms = 0.0;
        self.last_spawned = None;
        self.spawn_accum_x = 0.0;
        self.spawn_accum_y = 0.0;
        self.anchor_candidate = None;
        was_dragging
    }

    /// Whether any gesture state would survive the hand leaving view.
    pub fn holds_gesture(&self) -> bool {
        self.is_dragging
            || self.pinch.phase != PinchPhase::Idle
            || self.rotation.phase != RotationPhase::Idle
    }

    /// Return to a freshly-sighted state, keeping only the label and
    /// the missing-frame count.
    pub fn reset_lifecycle(&mut self) {
        let frames_missing = self.frames_missing;
        *self = Self::new(self.label);
        self.frames_missing = frames_missing;
    }
}

// ── Registry ───────────────────────────────────────────────

/// All hand states, iterated in label order.
pub type HandRegistry = BTreeMap<HandLabel, HandState>;

/// Whether any hand currently owns a drag.
pub fn any_dragging(hands: &HandRegistry) -> bool {
    hands.values().any(|h| h.is_dragging)
}

// ── Lifecycle ──────────────────────────────────────────────

/// Configuration for hand presence tracking.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Missing frames tolerated before a hand's gesture state is reset.
    pub missing_reset_frames: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            missing_reset_frames: 30,
        }
    }
}

/// Age every hand not in `present`.  Returns the labels that were reset.
pub fn age_missing(
    hands: &mut HandRegistry,
    present: &[HandLabel],
    config: &LifecycleConfig,
) -> Vec<HandLabel> {
    let mut reset = Vec::new();
    for (label, hand) in hands.iter_mut() {
        if present.contains(label) {
            continue;
        }
        hand.frames_missing = hand.frames_missing.saturating_add(1);
        if hand.frames_missing > config.missing_reset_frames && hand.holds_gesture() {
            info!(
                "Hand {} missing for {} frames, resetting gesture state",
                label.as_str(),
                hand.frames_missing
            );
            hand.reset_lifecycle();
            reset.push(*label);
        }
    }
    reset
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Structure;

    fn dragging_hand(label: HandLabel) -> HandState {
        let structure = Structure::default();
        let mut hand = HandState::new(label);
        hand.pinch.phase = PinchPhase::Active;
        hand.is_dragging = true;
        hand.mode = InteractionMode::Move;
        hand.selected_block = structure.original().map(|b| b.id);
        hand.drag_offset = Point3::new(0.2, 0.1, 0.0);
        hand
    }

    #[test]
    fn test_release_clears_drag() {
        let mut hand = dragging_hand(HandLabel::Left);
        assert!(hand.release_drag());
        assert!(!hand.is_dragging);
        assert_eq!(hand.mode, InteractionMode::Undecided);
        assert!(hand.selected_block.is_none());
        assert_eq!(hand.drag_offset, Point3::default());
        assert!(hand.anchor_candidate.is_none());
    }

    #[test]
    fn test_release_idempotent() {
        let mut once = dragging_hand(HandLabel::Left);
        once.release_drag();
        let mut twice = once.clone();
        assert!(!twice.release_drag());
        assert_eq!(once, twice);

        let mut idle = HandState::new(HandLabel::Right);
        let before = idle.clone();
        assert!(!idle.release_drag());
        assert_eq!(idle, before);
    }

    #[test]
    fn test_missing_hand_resets_after_threshold() {
        let config = LifecycleConfig::default();
        let mut hands = HandRegistry::new();
        hands.insert(HandLabel::Right, dragging_hand(HandLabel::Right));

        for tick in 1..=30 {
            let reset = age_missing(&mut hands, &[], &config);
            assert!(reset.is_empty(), "reset too early on tick {}", tick);
            assert!(hands[&HandLabel::Right].is_dragging);
        }
        let reset = age_missing(&mut hands, &[], &config);
        assert_eq!(reset, vec![HandLabel::Right]);
        let hand = &hands[&HandLabel::Right];
        assert!(!hand.is_dragging);
        assert!(hand.selected_block.is_none());
        assert_eq!(hand.pinch.phase, PinchPhase::Idle);
        assert_eq!(hand.rotation.phase, RotationPhase::Idle);
        assert_eq!(hand.frames_missing, 31);
    }

    #[test]
    fn test_present_hand_not_aged() {
        let config = LifecycleConfig::default();
        let mut hands = HandRegistry::new();
        hands.insert(HandLabel::Left, dragging_hand(HandLabel::Left));
        for _ in 0..100 {
            age_missing(&mut hands, &[HandLabel::Left], &config);
        }
        assert_eq!(hands[&HandLabel::Left].frames_missing, 0);
        assert!(hands[&HandLabel::Left].is_dragging);
    }

    #[test]
    fn test_idle_missing_hand_untouched() {
        let config = LifecycleConfig::default();
        let mut hands = HandRegistry::new();
        hands.insert(HandLabel::Left, HandState::new(HandLabel::Left));
        for _ in 0..40 {
            assert!(age_missing(&mut hands, &[], &config).is_empty());
        }
        assert_eq!(hands[&HandLabel::Left].frames_missing, 40);
    }

    #[test]
    fn test_any_dragging() {
        let mut hands = HandRegistry::new();
        hands.insert(HandLabel::Left, HandState::new(HandLabel::Left));
        assert!(!any_dragging(&hands));
        hands.insert(HandLabel::Right, dragging_hand(HandLabel::Right));
        assert!(any_dragging(&hands));
    }
}
