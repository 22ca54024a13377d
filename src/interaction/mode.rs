//! Move-vs-spawn resolution for a fresh drag.
//!
//! After selection the drag is ambiguous: a flick beyond the dead zone
//! means "build a trail", a steady hold means "move this block".  Nothing
//! is mutated until one of the two fires.

use tracing::debug;

use crate::gesture::keypoints::Point3;
use crate::hand::{HandState, InteractionMode};
use crate::structure::Structure;

/// Configuration for drag mode resolution.
#[derive(Debug, Clone)]
pub struct DragConfig {
    /// World distance the pinch must travel (before the hold elapses) to spawn.
    pub movement_dead_zone: f32,
    /// Hold time (ms) inside the dead zone that resolves to a move.
    pub hold_to_move_ms: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            movement_dead_zone: 0.3,
            hold_to_move_ms: 250.0,
        }
    }
}

/// Decide the drag mode if it is still undecided.  Returns the mode
/// chosen this frame, if any.
pub fn resolve(
    hand: &mut HandState,
    structure: &Structure,
    pinch_world: Point3,
    now_ms: f64,
    config: &DragConfig,
) -> Option<InteractionMode> {
    if !hand.is_dragging || hand.mode != InteractionMode::Undecided {
        return None;
    }
    let selected = hand.selected_block?;
    let start = hand.pinch_start_world?;

    let moved = pinch_world.distance(&start);
    if moved > config.movement_dead_zone {
        hand.mode = InteractionMode::Spawn;
        hand.last_spawned = Some(selected);
        hand.spawn_accum_x = 0.0;
        hand.spawn_accum_y = 0.0;
    } else if now_ms - hand.pinch_start_ms > config.hold_to_move_ms {
        let block_pos = structure.world_position(selected)?;
        hand.mode = InteractionMode::Move;
        hand.drag_offset = block_pos.sub(&pinch_world);
    } else {
        return None;
    }

    debug!(
        "Hand {} drag resolved to {} (moved {:.2}, held {:.0}ms)",
        hand.label.as_str(),
        hand.mode.as_str(),
        moved,
        now_ms - hand.pinch_start_ms
    );
    Some(hand.mode)
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::keypoints::HandLabel;

    fn selected_hand(structure: &Structure, start: Point3) -> HandState {
        let mut hand = HandState::new(HandLabel::Right);
        hand.is_dragging = true;
        hand.selected_block = structure.original().map(|b| b.id);
        hand.pinch_start_world = Some(start);
        hand.pinch_start_ms = 1000.0;
        hand
    }

    #[test]
    fn test_flick_resolves_spawn() {
        let config = DragConfig::default();
        let structure = Structure::default();
        let mut hand = selected_hand(&structure, Point3::new(0.0, 0.0, 0.0));
        hand.spawn_accum_x = 0.7;

        let mode = resolve(&mut hand, &structure, Point3::new(0.5, 0.0, 0.0), 1050.0, &config);
        assert_eq!(mode, Some(InteractionMode::Spawn));
        assert_eq!(hand.last_spawned, hand.selected_block);
        assert_eq!(hand.spawn_accum_x, 0.0);
    }

    #[test]
    fn test_hold_resolves_move_with_offset() {
        let config = DragConfig::default();
        let structure = Structure::default();
        let start = Point3::new(0.2, -0.1, 0.0);
        let mut hand = selected_hand(&structure, start);

        assert_eq!(resolve(&mut hand, &structure, start, 1200.0, &config), None);
        assert_eq!(hand.mode, InteractionMode::Undecided);

        let mode = resolve(&mut hand, &structure, start, 1300.0, &config);
        assert_eq!(mode, Some(InteractionMode::Move));
        assert!((hand.drag_offset.x - -0.2).abs() < 1e-6);
        assert!((hand.drag_offset.y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_movement_wins_when_both_hold() {
        let config = DragConfig::default();
        let structure = Structure::default();
        let mut hand = selected_hand(&structure, Point3::default());
        let mode = resolve(&mut hand, &structure, Point3::new(0.0, 1.0, 0.0), 5000.0, &config);
        assert_eq!(mode, Some(InteractionMode::Spawn));
    }

    #[test]
    fn test_resolves_once() {
        let config = DragConfig::default();
        let structure = Structure::default();
        let mut hand = selected_hand(&structure, Point3::default());
        resolve(&mut hand, &structure, Point3::default(), 2000.0, &config);
        assert_eq!(hand.mode, InteractionMode::Move);
        assert_eq!(
            resolve(&mut hand, &structure, Point3::new(3.0, 0.0, 0.0), 2100.0, &config),
            None
        );
        assert_eq!(hand.mode, InteractionMode::Move);
    }
}
