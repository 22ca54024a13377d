//! Renderer-facing view of committed interaction state.
//!
//! The render tick takes a `SceneSnapshot` between detection ticks and
//! hands it to a `SceneSink`.  Nothing here mutates the engine.

use tracing::{debug, info};

use crate::engine::InteractionEngine;
use crate::gesture::keypoints::{HandLabel, Point3};
use crate::gesture::pinch::PinchPhase;
use crate::gesture::rotation::RotationPhase;
use crate::hand::InteractionMode;
use crate::structure::{BlockId, GridCell};

/// One block as the renderer places it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub id: BlockId,
    pub cell: GridCell,
    /// Unrotated world position; the renderer applies `yaw` about `pivot`.
    pub position: Point3,
    pub is_original: bool,
    /// Anchor of some hand's drag (for highlighting).
    pub selected: bool,
}

/// One tracked hand's indicator state.
#[derive(Debug, Clone, PartialEq)]
pub struct HandView {
    pub label: HandLabel,
    pub pinch: PinchPhase,
    pub rotation: RotationPhase,
    pub mode: InteractionMode,
    pub dragging: bool,
    pub selected: Option<BlockId>,
    /// Predicted pinch point in world space.
    pub cursor: Option<Point3>,
    pub frames_missing: u32,
}

/// Committed scene state at a tick boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub tick: u64,
    pub yaw: f32,
    pub pivot: Point3,
    pub blocks: Vec<BlockView>,
    pub hands: Vec<HandView>,
}

impl SceneSnapshot {
    pub fn capture(engine: &InteractionEngine) -> Self {
        let structure = engine.structure();
        let anchors: Vec<BlockId> = engine
            .hands()
            .values()
            .filter(|h| h.is_dragging)
            .filter_map(|h| h.selected_block)
            .collect();

        let blocks = structure
            .blocks()
            .iter()
            .map(|b| BlockView {
                id: b.id,
                cell: b.cell,
                position: structure.cell_center(b.cell),
                is_original: b.is_original,
                selected: anchors.contains(&b.id),
            })
            .collect();

        let hands = engine
            .hands()
            .values()
            .map(|h| HandView {
                label: h.label,
                pinch: h.pinch.phase,
                rotation: h.rotation.phase,
                mode: h.mode,
                dragging: h.is_dragging,
                selected: h.selected_block,
                cursor: if h.frames_missing == 0 {
                    engine.cursor(h.label)
                } else {
                    None
                },
                frames_missing: h.frames_missing,
            })
            .collect();

        Self {
            tick: engine.ticks(),
            yaw: structure.yaw(),
            pivot: structure.pivot(),
            blocks,
            hands,
        }
    }

    /// Generate s-expression describing the scene.
    pub fn status_sexp(&self) -> String {
        let cells: Vec<String> = self
            .blocks
            .iter()
            .map(|b| format!("({} {})", b.cell.x, b.cell.y))
            .collect();
        let hands: Vec<String> = self
            .hands
            .iter()
            .map(|h| {
                format!(
                    "(:hand :{} :pinch :{} :rotation :{} :mode :{} :dragging {})",
                    h.label.as_str(),
                    h.pinch.as_str(),
                    h.rotation.as_str(),
                    h.mode.as_str(),
                    if h.dragging { "t" } else { "nil" },
                )
            })
            .collect();
        format!(
            "(:tick {} :yaw {:.3} :blocks {} :cells ({}) :hands ({}))",
            self.tick,
            self.yaw,
            self.blocks.len(),
            cells.join(" "),
            hands.join(" "),
        )
    }
}

// ── Sinks ──────────────────────────────────────────────────

/// Consumer of committed scene state, called once per render tick.
pub trait SceneSink {
    fn present(&mut self, snapshot: &SceneSnapshot);
}

/// Sink that logs the scene whenever it changes.
#[derive(Debug, Default)]
pub struct LogSink {
    last: Option<String>,
    frames: u64,
}

impl LogSink {
    #[cfg(test)]
    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneSink for LogSink {
    fn present(&mut self, snapshot: &SceneSnapshot) {
        self.frames += 1;
        let status = snapshot.status_sexp();
        if self.last.as_deref() == Some(status.as_str()) {
            return;
        }
        if self.last.is_none() {
            info!("Scene: {}", status);
        } else {
            debug!("Scene at frame {}: {}", self.frames, status);
        }
        self.last = Some(status);
    }
}
