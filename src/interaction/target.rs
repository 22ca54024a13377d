//! Target resolution — dwell-gated selection of the block nearest a
//! pinching fingertip, with first-pinch-wins arbitration across hands.

use tracing::debug;

use crate::gesture::keypoints::Point3;
use crate::hand::{AnchorCandidate, HandState, InteractionMode};
use crate::structure::{BlockId, Structure};

/// Configuration for block selection.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// World distance from the pinch point within which a block can be grabbed.
    pub radius: f32,
    /// Consecutive frames the same nearest block is required before selection.
    pub dwell_frames: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            radius: 0.8,
            dwell_frames: 3,
        }
    }
}

/// What the resolver did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Not pinching, or already dragging.
    Inactive,
    /// Another hand owns a drag.
    Blocked,
    NoCandidate,
    Dwelling { block: BlockId, hits: u32 },
    Selected(BlockId),
}

/// Track the nearest block and select it once the dwell completes.
///
/// `other_dragging` is the tick's "some hand is dragging" flag; the caller
/// sets it as soon as one hand selects so later hands in the same tick are
/// denied.
pub fn resolve(
    hand: &mut HandState,
    structure: &Structure,
    pinch_world: Point3,
    now_ms: f64,
    other_dragging: bool,
    config: &SelectionConfig,
) -> TargetOutcome {
    if !hand.pinch.is_active() || hand.is_dragging {
        return TargetOutcome::Inactive;
    }
    if other_dragging {
        hand.anchor_candidate = None;
        return TargetOutcome::Blocked;
    }

    let Some(nearest) = structure.nearest_within(&pinch_world, config.radius) else {
        hand.anchor_candidate = None;
        return TargetOutcome::NoCandidate;
    };

    let hits = match hand.anchor_candidate {
        Some(c) if c.block == nearest => c.hits + 1,
        _ => 1,
    };

    if hits < config.dwell_frames.max(1) {
        hand.anchor_candidate = Some(AnchorCandidate {
            block: nearest,
            hits,
        });
        return TargetOutcome::Dwelling {
            block: nearest,
            hits,
        };
    }

    hand.anchor_candidate = None;
    hand.selected_block = Some(nearest);
    hand.is_dragging = true;
    hand.mode = InteractionMode::Undecided;
    hand.pinch_start_world = Some(pinch_world);
    hand.pinch_start_ms = now_ms;
    debug!(
        "Hand {} selected block {} after {} frames",
        hand.label.as_str(),
        nearest.raw(),
        hits
    );
    TargetOutcome::Selected(nearest)
}

// ── Tests ──────────────────────────────────────────────────
