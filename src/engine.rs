//! Per-tick interaction pipeline.
//!
//! One call to `tick` consumes every hand detected in a sample and runs,
//! per hand in label order: smoothing, pinch and rotation debounce, target
//! resolution, mode resolution and the move/spawn executors.  The structure
//! and hand registry are only ever observed between ticks, so a renderer
//! reading them never sees a half-applied frame.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::InteractionConfig;
use crate::gesture::keypoints::{HandLabel, KeypointFrame, Point3, TrackedPoint};
use crate::gesture::pinch::{self, PinchTransition};
use crate::gesture::rotation::{self, RotationTransition};
use crate::hand::{self, HandRegistry, HandState, InteractionMode};
use crate::interaction::{executor, mode, target, TargetOutcome};
use crate::scene::SceneSnapshot;
use crate::structure::{BlockId, GridCell, MoveOutcome, Structure};

// ── Events ─────────────────────────────────────────────────

/// Discrete change produced by a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PinchStarted { hand: HandLabel },
    PinchReleased { hand: HandLabel },
    /// A drag ended with the pinch; `block` was the anchor.
    DragReleased { hand: HandLabel, block: Option<BlockId> },
    RotationStarted { hand: HandLabel },
    RotationReleased { hand: HandLabel },
    BlockSelected { hand: HandLabel, block: BlockId },
    ModeResolved { hand: HandLabel, mode: InteractionMode },
    BlockMoved { hand: HandLabel, block: BlockId, from: GridCell, to: GridCell },
    BlockSpawned { hand: HandLabel, block: BlockId, cell: GridCell },
    StructureRotated { hand: HandLabel, delta: f32, yaw: f32 },
    /// Gesture state force-reset after the hand stayed out of view.
    HandLost { hand: HandLabel },
}

impl InteractionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PinchStarted { .. } => "pinch-started",
            Self::PinchReleased { .. } => "pinch-released",
            Self::DragReleased { .. } => "drag-released",
            Self::RotationStarted { .. } => "rotation-started",
            Self::RotationReleased { .. } => "rotation-released",
            Self::BlockSelected { .. } => "block-selected",
            Self::ModeResolved { .. } => "mode-resolved",
            Self::BlockMoved { .. } => "block-moved",
            Self::BlockSpawned { .. } => "block-spawned",
            Self::StructureRotated { .. } => "structure-rotated",
            Self::HandLost { .. } => "hand-lost",
        }
    }

    pub fn hand(&self) -> HandLabel {
        match self {
            Self::PinchStarted { hand }
            | Self::PinchReleased { hand }
            | Self::DragReleased { hand, .. }
            | Self::RotationStarted { hand }
            | Self::RotationReleased { hand }
            | Self::BlockSelected { hand, .. }
            | Self::ModeResolved { hand, .. }
            | Self::BlockMoved { hand, .. }
            | Self::BlockSpawned { hand, .. }
            | Self::StructureRotated { hand, .. }
            | Self::HandLost { hand } => *hand,
        }
    }

    /// Format as an event s-expression.
    pub fn to_sexp(&self) -> String {
        let mut s = format!(
            "(:type :event :event :{} :hand :{}",
            self.as_str(),
            self.hand().as_str()
        );
        match self {
            Self::DragReleased { block: Some(b), .. } | Self::BlockSelected { block: b, .. } => {
                s.push_str(&format!(" :block {}", b.raw()));
            }
            Self::ModeResolved { mode, .. } => {
                s.push_str(&format!(" :mode :{}", mode.as_str()));
            }
            Self::BlockMoved { block, from, to, .. } => {
                s.push_str(&format!(
                    " :block {} :from ({} {}) :to ({} {})",
                    block.raw(),
                    from.x,
                    from.y,
                    to.x,
                    to.y
                ));
            }
            Self::BlockSpawned { block, cell, .. } => {
                s.push_str(&format!(" :block {} :cell ({} {})", block.raw(), cell.x, cell.y));
            }
            Self::StructureRotated { delta, yaw, .. } => {
                s.push_str(&format!(" :delta {:.4} :yaw {:.4}", delta, yaw));
            }
            _ => {}
        }
        s.push(')');
        s
    }
}

// ── Tick ───────────────────────────────────────────────────

/// Run one detection tick over every detected hand.
///
/// Frames with a repeated label are dropped after the first.  Hands absent
/// from `frames` age toward a lifecycle reset.
pub fn tick(
    hands: &mut HandRegistry,
    structure: &mut Structure,
    frames: &[KeypointFrame],
    now_ms: f64,
    config: &InteractionConfig,
) -> Vec<InteractionEvent> {
    let mut batch: BTreeMap<HandLabel, &KeypointFrame> = BTreeMap::new();
    for frame in frames {
        if batch.contains_key(&frame.label) {
            debug!("Duplicate {} hand in one sample, keeping the first", frame.label.as_str());
            continue;
        }
        batch.insert(frame.label, frame);
    }
    let present: Vec<HandLabel> = batch.keys().copied().collect();

    let mut events: Vec<InteractionEvent> = hand::age_missing(hands, &present, &config.lifecycle)
        .into_iter()
        .map(|hand| InteractionEvent::HandLost { hand })
        .collect();

    // Arbitration flag, fixed at tick start and raised by the first selection.
    let mut dragging = hand::any_dragging(hands);

    for (label, frame) in batch {
        let hand = hands.entry(label).or_insert_with(|| {
            info!("Hand {} first seen", label.as_str());
            HandState::new(label)
        });
        step_hand(hand, structure, frame, now_ms, &mut dragging, config, &mut events);
    }
    events
}

fn step_hand(
    hand: &mut HandState,
    structure: &mut Structure,
    frame: &KeypointFrame,
    now_ms: f64,
    dragging: &mut bool,
    config: &InteractionConfig,
    events: &mut Vec<InteractionEvent>,
) {
    let label = hand.label;
    hand.frames_missing = 0;
    hand.points.update(&frame.points, frame.timestamp_ms, &config.smoothing);
    let Some(points) = hand.points.current else {
        return;
    };

    // ── Pinch ──
    let previous_world = hand.pinch_world;
    let (sample, transition) = pinch::update(&mut hand.pinch, &points, now_ms, &config.pinch);
    let pinch_world = config.camera.to_world(&sample.midpoint, structure.config.depth);
    hand.pinch_world = Some(pinch_world);
    match transition {
        PinchTransition::Started => events.push(InteractionEvent::PinchStarted { hand: label }),
        PinchTransition::Released => {
            events.push(InteractionEvent::PinchReleased { hand: label });
            let block = hand.selected_block;
            if hand.release_drag() {
                events.push(InteractionEvent::DragReleased { hand: label, block });
            }
        }
        PinchTransition::None => {}
    }

    // ── Rotation ──
    hand.rotation.update_yaw(rotation::palm_yaw(&points), &config.rotation);
    let open = rotation::is_hand_open(&points, &frame.extra_tips, &config.rotation);
    match hand.rotation.step(open, hand.pinch.is_active(), &config.rotation) {
        RotationTransition::Started => events.push(InteractionEvent::RotationStarted { hand: label }),
        RotationTransition::Released => {
            events.push(InteractionEvent::RotationReleased { hand: label })
        }
        RotationTransition::None => {}
    }
    if let Some(delta) = hand.rotation.take_increment(&config.rotation) {
        structure.rotate(delta);
        events.push(InteractionEvent::StructureRotated {
            hand: label,
            delta,
            yaw: structure.yaw(),
        });
    }

    if !hand.pinch.is_active() {
        return;
    }

    // ── Drag ──
    if !hand.is_dragging {
        if let TargetOutcome::Selected(block) = target::resolve(
            hand,
            structure,
            pinch_world,
            now_ms,
            *dragging,
            &config.selection,
        ) {
            *dragging = true;
            events.push(InteractionEvent::BlockSelected { hand: label, block });
        }
        return;
    }

    let anchor_valid = hand
        .selected_block
        .map(|id| structure.get(id).is_some())
        .unwrap_or(false);
    if !anchor_valid {
        debug!("Hand {} anchor no longer in structure, releasing", label.as_str());
        hand.release_drag();
        return;
    }

    match hand.mode {
        InteractionMode::Undecided => {
            if let Some(mode) = mode::resolve(hand, structure, pinch_world, now_ms, &config.drag) {
                events.push(InteractionEvent::ModeResolved { hand: label, mode });
            }
        }
        InteractionMode::Move => {
            if let MoveOutcome::Moved { from, to } =
                executor::apply_move(hand, structure, pinch_world)
            {
                if let Some(block) = hand.selected_block {
                    events.push(InteractionEvent::BlockMoved { hand: label, block, from, to });
                }
            }
        }
        InteractionMode::Spawn => {
            let delta = previous_world
                .map(|p| pinch_world.sub(&p))
                .unwrap_or_default();
            for spawned in executor::apply_spawn(hand, structure, delta) {
                events.push(InteractionEvent::BlockSpawned {
                    hand: label,
                    block: spawned.block,
                    cell: spawned.cell,
                });
            }
        }
    }
}

// ── Engine ─────────────────────────────────────────────────

/// Owns the structure and hand registry for one session.
pub struct InteractionEngine {
    pub config: InteractionConfig,
    hands: HandRegistry,
    structure: Structure,
    ticks: u64,
}

impl InteractionEngine {
    pub fn new(config: InteractionConfig) -> Self {
        let structure = Structure::new(config.structure.clone());
        Self {
            config,
            hands: HandRegistry::new(),
            structure,
            ticks: 0,
        }
    }

    /// Run one detection tick.
    pub fn update(&mut self, frames: &[KeypointFrame], now_ms: f64) -> Vec<InteractionEvent> {
        self.ticks += 1;
        tick(
            &mut self.hands,
            &mut self.structure,
            frames,
            now_ms,
            &self.config,
        )
    }

    pub fn hands(&self) -> &HandRegistry {
        &self.hands
    }

    pub fn hand(&self, label: HandLabel) -> Option<&HandState> {
        self.hands.get(&label)
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// World-space cursor for a hand, extrapolated along its recent motion.
    pub fn cursor(&self, label: HandLabel) -> Option<Point3> {
        let hand = self.hands.get(&label)?;
        let smoothing = &self.config.smoothing;
        let index = hand.points.predicted(TrackedPoint::IndexTip, smoothing)?;
        let thumb = hand.points.predicted(TrackedPoint::ThumbTip, smoothing)?;
        Some(
            self.config
                .camera
                .to_world(&index.midpoint(&thumb), self.structure.config.depth),
        )
    }

    /// Committed state for the renderer.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot::capture(self)
    }
}

// ── Tests ──────────────────────────────────────────────────
