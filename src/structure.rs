//! Block structure — grid-snapped blocks with an occupancy index and a
//! shared yaw rotation.
//!
//! The structure owns every block.  Hands refer to blocks by `BlockId`
//! and must look them up before use.  Blocks are only ever created, never
//! removed, and no two blocks share a grid cell.

use std::collections::HashMap;

use tracing::debug;

use crate::gesture::keypoints::Point3;

// ── Identifiers ────────────────────────────────────────────

/// Handle to a block owned by a `Structure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Integer grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

// ── Block ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub cell: GridCell,
    /// The seed block created with the structure.
    pub is_original: bool,
}

// ── Config ─────────────────────────────────────────────────

/// Grid geometry for a structure.
#[derive(Debug, Clone)]
pub struct StructureConfig {
    /// World distance between adjacent cells.
    pub grid_unit: f32,
    /// World z of the plane every block sits on.
    pub depth: f32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            grid_unit: 1.0,
            depth: 0.0,
        }
    }
}

// ── Outcomes ───────────────────────────────────────────────

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: GridCell, to: GridCell },
    /// Already at the target cell.
    Unchanged,
    /// Another block holds the target cell.
    Occupied,
    /// No block with that id.
    Missing,
}

// ── Structure ──────────────────────────────────────────────

/// Ordered block collection sharing one yaw about a common pivot.
#[derive(Debug, Clone)]
pub struct Structure {
    pub config: StructureConfig,
    blocks: Vec<Block>,
    occupancy: HashMap<GridCell, BlockId>,
    /// Cumulative yaw (radians) applied about `pivot`.
    yaw: f32,
    pivot: Point3,
}

impl Structure {
    /// Create a structure holding only the original block at cell (0, 0).
    pub fn new(config: StructureConfig) -> Self {
        let pivot = Point3::new(0.0, 0.0, config.depth);
        let mut s = Self {
            config,
            blocks: Vec::new(),
            occupancy: HashMap::new(),
            yaw: 0.0,
            pivot,
        };
        s.insert(GridCell::default(), true);
        s
    }

    fn insert(&mut self, cell: GridCell, is_original: bool) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block {
            id,
            cell,
            is_original,
        });
        self.occupancy.insert(cell, id);
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn original(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.is_original)
    }

    pub fn occupant(&self, cell: GridCell) -> Option<BlockId> {
        self.occupancy.get(&cell).copied()
    }

    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupancy.contains_key(&cell)
    }

    // ── Geometry ──
    //
    // Cells live in structure-local space.  World space is local space
    // turned by `yaw` about the vertical axis through `pivot`.

    /// Structure-local center of a cell on the structure plane.
    pub fn cell_center(&self, cell: GridCell) -> Point3 {
        Point3::new(
            cell.x as f32 * self.config.grid_unit,
            cell.y as f32 * self.config.grid_unit,
            self.config.depth,
        )
    }

    /// Rotate a local offset into world axes.
    pub fn to_world_vector(&self, v: &Point3) -> Point3 {
        let (sin, cos) = self.yaw.sin_cos();
        Point3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
    }

    /// Rotate a world offset into local axes.
    pub fn to_local_vector(&self, v: &Point3) -> Point3 {
        let (sin, cos) = self.yaw.sin_cos();
        Point3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
    }

    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.pivot.add(&self.to_world_vector(&local.sub(&self.pivot)))
    }

    pub fn to_local(&self, world: &Point3) -> Point3 {
        self.pivot.add(&self.to_local_vector(&world.sub(&self.pivot)))
    }

    /// Where a block is drawn, yaw included.
    pub fn world_position(&self, id: BlockId) -> Option<Point3> {
        self.get(id).map(|b| self.to_world(&self.cell_center(b.cell)))
    }

    /// Cell under a world point.
    pub fn snap(&self, p: &Point3) -> GridCell {
        let local = self.to_local(p);
        let unit = self.config.grid_unit;
        GridCell::new((local.x / unit).round() as i32, (local.y / unit).round() as i32)
    }

    /// Nearest block within `radius` of world point `p`.  Ties go to the
    /// older block.
    pub fn nearest_within(&self, p: &Point3, radius: f32) -> Option<BlockId> {
        let local = self.to_local(p);
        let mut best: Option<(BlockId, f32)> = None;
        for block in &self.blocks {
            let d = self.cell_center(block.cell).distance(&local);
            if d > radius {
                continue;
            }
            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some((block.id, d)),
            }
        }
        best.map(|(id, _)| id)
    }

    // ── Mutation ──

    /// Move a block to `target` unless another block holds it.
    pub fn try_move(&mut self, id: BlockId, target: GridCell) -> MoveOutcome {
        let Some(from) = self.get(id).map(|b| b.cell) else {
            return MoveOutcome::Missing;
        };
        if from == target {
            return MoveOutcome::Unchanged;
        }
        if let Some(holder) = self.occupant(target) {
            debug!("Block {} blocked at ({}, {}) by block {}", id.0, target.x, target.y, holder.0);
            return MoveOutcome::Occupied;
        }
        self.occupancy.remove(&from);
        self.occupancy.insert(target, id);
        self.blocks[id.0].cell = target;
        debug!("Block {} moved ({}, {}) -> ({}, {})", id.0, from.x, from.y, target.x, target.y);
        MoveOutcome::Moved { from, to: target }
    }

    /// Add a block at `cell`.  Returns `None` if the cell is taken.
    pub fn try_spawn(&mut self, cell: GridCell) -> Option<BlockId> {
        if self.is_occupied(cell) {
            return None;
        }
        let id = self.insert(cell, false);
        debug!("Block {} spawned at ({}, {})", id.0, cell.x, cell.y);
        Some(id)
    }

    // ── Rotation ──

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pivot(&self) -> Point3 {
        self.pivot
    }

    pub fn rotate(&mut self, delta: f32) {
        self.yaw += delta;
    }

    /// Generate s-expression describing the structure.
    pub fn status_sexp(&self) -> String {
        let cells: Vec<String> = self
            .blocks
            .iter()
            .map(|b| format!("({} {})", b.cell.x, b.cell.y))
            .collect();
        format!(
            "(:blocks {} :yaw {:.3} :grid-unit {:.2} :cells ({}))",
            self.blocks.len(),
            self.yaw,
            self.config.grid_unit,
            cells.join(" "),
        )
    }
}

impl Default for Structure {
    fn default() -> Self {
        Self::new(StructureConfig::default())
    }
}

// ── Tests ──────────────────────────────────────────────────
