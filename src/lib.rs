//! handgrid — bare-hand gesture interaction for a grid-aligned block structure.
//!
//! Noisy per-frame hand keypoints go in; debounced pinch and open-palm
//! gestures come out as block moves, chained spawns and structure yaw.

pub mod backend;
pub mod config;
pub mod engine;
pub mod gesture;
pub mod hand;
pub mod interaction;
pub mod scene;
pub mod sexp;
pub mod structure;

pub use config::InteractionConfig;
pub use engine::{InteractionEngine, InteractionEvent};
pub use scene::{SceneSink, SceneSnapshot};
pub use structure::Structure;
