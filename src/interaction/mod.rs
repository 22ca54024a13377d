//! Interaction layer — turns confirmed pinches into structure edits.
//!
//! Provides:
//! - `target`: dwell-gated block selection with cross-hand arbitration
//! - `mode`: hold-to-move vs. flick-to-spawn resolution
//! - `executor`: grid-snapped moves and chained spawning

pub mod executor;
pub mod mode;
pub mod target;

pub use executor::Spawned;
pub use mode::DragConfig;
pub use target::{SelectionConfig, TargetOutcome};
