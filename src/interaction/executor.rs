//! Drag executors — grid-snapped moves and chained block spawning.
//!
//! Occupied targets are rejected silently; a move retries every frame and a
//! spawn chain skips the blocked cell but keeps consuming motion.

use tracing::debug;

use crate::gesture::keypoints::Point3;
use crate::hand::HandState;
use crate::structure::{BlockId, GridCell, MoveOutcome, Structure};

/// Move the selected block to the snapped pinch position plus grab offset.
pub fn apply_move(hand: &HandState, structure: &mut Structure, pinch_world: Point3) -> MoveOutcome {
    let Some(id) = hand.selected_block else {
        return MoveOutcome::Missing;
    };
    let target = structure.snap(&pinch_world.add(&hand.drag_offset));
    structure.try_move(id, target)
}

/// A block created by the spawn executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub block: BlockId,
    pub cell: GridCell,
}

/// Most grid steps one axis may take in a single frame.  Whole units beyond
/// this are discarded rather than queued.
pub const MAX_STEPS_PER_FRAME: u32 = 16;

/// Feed one frame of pinch displacement (world axes) into the spawn chain.
///
/// X is drained before Y, so a Y step in the same frame extends from a
/// block the X pass just created.
pub fn apply_spawn(hand: &mut HandState, structure: &mut Structure, delta: Point3) -> Vec<Spawned> {
    let unit = structure.config.grid_unit;
    let mut spawned = Vec::new();
    if !(unit > 0.0) {
        return spawned;
    }

    let local = structure.to_local_vector(&delta);
    hand.spawn_accum_x += local.x;
    hand.spawn_accum_y += local.y;

    let (sign_x, steps_x) = drain_units(&mut hand.spawn_accum_x, unit);
    for _ in 0..steps_x {
        extend_chain(hand, structure, sign_x, 0, &mut spawned);
    }
    let (sign_y, steps_y) = drain_units(&mut hand.spawn_accum_y, unit);
    for _ in 0..steps_y {
        extend_chain(hand, structure, 0, sign_y, &mut spawned);
    }
    spawned
}

/// Take every whole grid unit out of `accum`, leaving the signed remainder.
/// Returns the step direction and how many steps to take (capped).
fn drain_units(accum: &mut f32, unit: f32) -> (i32, u32) {
    let whole = (*accum / unit).trunc();
    if !whole.is_finite() {
        debug!("Spawn accumulator overflowed ({}), discarding", accum);
        *accum = 0.0;
        return (0, 0);
    }
    if whole == 0.0 {
        return (0, 0);
    }
    *accum -= whole * unit;
    // Large magnitudes lose the fraction entirely; never carry a whole unit over.
    if !(accum.abs() < unit) {
        *accum = 0.0;
    }
    let wanted = whole.abs();
    let steps = wanted.min(MAX_STEPS_PER_FRAME as f32) as u32;
    if wanted > steps as f32 {
        debug!("Spawn motion of {} cells in one frame capped to {}", wanted, steps);
    }
    (whole.signum() as i32, steps)
}

fn extend_chain(
    hand: &mut HandState,
    structure: &mut Structure,
    dx: i32,
    dy: i32,
    out: &mut Vec<Spawned>,
) {
    let anchor = hand
        .last_spawned
        .or(hand.selected_block)
        .and_then(|id| structure.get(id))
        .map(|b| b.cell);
    let Some(anchor) = anchor else {
        return;
    };
    let cell = anchor.offset(dx, dy);
    if let Some(block) = structure.try_spawn(cell) {
        hand.last_spawned = Some(block);
        out.push(Spawned { block, cell });
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::keypoints::HandLabel;
    use crate::hand::InteractionMode;

    fn spawning_hand(structure: &Structure) -> HandState {
        let mut hand = HandState::new(HandLabel::Right);
        hand.is_dragging = true;
        hand.mode = InteractionMode::Spawn;
        hand.selected_block = structure.original().map(|b| b.id);
        hand.last_spawned = hand.selected_block;
        hand
    }

    fn assert_unique_cells(s: &Structure) {
        let mut cells: Vec<GridCell> = s.blocks().iter().map(|b| b.cell).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), s.len(), "duplicate cells in {}", s.status_sexp());
    }

    #[test]
    fn test_move_to_snapped_target() {
        let mut structure = Structure::default();
        let mut hand = HandState::new(HandLabel::Left);
        hand.selected_block = structure.original().map(|b| b.id);
        hand.drag_offset = Point3::new(0.3, 0.0, 0.0);

        let outcome = apply_move(&hand, &mut structure, Point3::new(0.9, 0.2, 0.0));
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: GridCell::new(0, 0),
                to: GridCell::new(1, 0)
            }
        );
        // Same target again leaves it in place.
        let outcome = apply_move(&hand, &mut structure, Point3::new(0.9, 0.2, 0.0));
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(structure.original().unwrap().cell, GridCell::new(1, 0));
    }

    #[test]
    fn test_move_blocked_then_retried() {
        let mut structure = Structure::default();
        let blocker = structure.try_spawn(GridCell::new(1, 0)).unwrap();
        let mut hand = HandState::new(HandLabel::Left);
        hand.selected_block = structure.original().map(|b| b.id);

        let target = Point3::new(1.0, 0.0, 0.0);
        assert_eq!(apply_move(&hand, &mut structure, target), MoveOutcome::Occupied);
        assert_eq!(structure.original().unwrap().cell, GridCell::new(0, 0));

        // Moving the blocker away frees the cell for the next frame.
        structure.try_move(blocker, GridCell::new(5, 5));
        assert!(matches!(
            apply_move(&hand, &mut structure, target),
            MoveOutcome::Moved { .. }
        ));
    }

    #[test]
    fn test_spawn_consumes_one_unit() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);

        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(1.3, 0.0, 0.0));
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].cell, GridCell::new(1, 0));
        assert!((hand.spawn_accum_x - 0.3).abs() < 1e-5, "accum {}", hand.spawn_accum_x);
        assert_eq!(hand.last_spawned, Some(spawned[0].block));
    }

    #[test]
    fn test_fast_motion_spawns_multiple() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(-3.2, 0.0, 0.0));
        let cells: Vec<GridCell> = spawned.iter().map(|s| s.cell).collect();
        assert_eq!(
            cells,
            vec![GridCell::new(-1, 0), GridCell::new(-2, 0), GridCell::new(-3, 0)]
        );
        assert!((hand.spawn_accum_x - -0.2).abs() < 1e-5);
    }

    #[test]
    fn test_small_motion_accumulates() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        for _ in 0..4 {
            assert!(apply_spawn(&mut hand, &mut structure, Point3::new(0.0, 0.2, 0.0)).is_empty());
        }
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(0.0, 0.25, 0.0));
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].cell, GridCell::new(0, 1));
    }

    #[test]
    fn test_x_then_y_chains_from_new_tip() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(1.0, 1.0, 0.0));
        let cells: Vec<GridCell> = spawned.iter().map(|s| s.cell).collect();
        assert_eq!(cells, vec![GridCell::new(1, 0), GridCell::new(1, 1)]);
    }

    #[test]
    fn test_huge_displacement_is_capped() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(1.0e9, -3.0e8, 0.0));
        let cap = MAX_STEPS_PER_FRAME as usize;
        assert_eq!(spawned.len(), 2 * cap, "spawned {}", spawned.len());
        assert!(hand.spawn_accum_x.abs() < 1.0 && hand.spawn_accum_y.abs() < 1.0);
        assert_unique_cells(&structure);

        // Chain keeps working normally afterwards.
        let more = apply_spawn(&mut hand, &mut structure, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(more.len(), 1);
    }

    #[test]
    fn test_overflowed_accumulator_discarded() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(f32::MAX, 0.0, 0.0));
        assert!(spawned.len() <= MAX_STEPS_PER_FRAME as usize);
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(f32::MAX, 0.0, 0.0));
        assert!(spawned.len() <= MAX_STEPS_PER_FRAME as usize);
        assert!(hand.spawn_accum_x.is_finite());
    }

    #[test]
    fn test_spawn_follows_structure_yaw() {
        let mut structure = Structure::default();
        structure.rotate(std::f32::consts::PI);
        let mut hand = spawning_hand(&structure);
        // After a half turn, world +x runs along local -x.
        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(1.3, 0.0, 0.0));
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].cell, GridCell::new(-1, 0));
    }

    #[test]
    fn test_occupied_cell_skipped_but_consumed() {
        let mut structure = Structure::default();
        structure.try_spawn(GridCell::new(1, 0)).unwrap();
        let mut hand = spawning_hand(&structure);
        let anchor = hand.last_spawned;

        let spawned = apply_spawn(&mut hand, &mut structure, Point3::new(1.1, 0.0, 0.0));
        assert!(spawned.is_empty());
        assert_eq!(hand.last_spawned, anchor);
        assert!((hand.spawn_accum_x - 0.1).abs() < 1e-5);
        assert_unique_cells(&structure);
    }

    #[test]
    fn test_random_walk_keeps_cells_unique() {
        let mut structure = Structure::default();
        let mut hand = spawning_hand(&structure);
        let deltas = [
            (1.2, 0.0),
            (0.0, 1.1),
            (-1.4, 0.0),
            (0.0, -1.3),
            (2.5, -0.4),
            (-0.6, 2.2),
            (-2.1, -2.1),
            (1.0, 1.0),
        ];
        for (dx, dy) in deltas {
            apply_spawn(&mut hand, &mut structure, Point3::new(dx, dy, 0.0));
            assert_unique_cells(&structure);
        }
        let others: Vec<_> = structure.blocks().iter().filter(|b| !b.is_original).collect();
        assert!(!others.is_empty());
    }
}
