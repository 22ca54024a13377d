//! Gesture layer — keypoint input, smoothing, pinch and open-palm rotation.
//!
//! Provides:
//! - `keypoints`: hand labels, points, per-tick frames, camera→world mapping
//! - `smoothing`: outlier-gated exponential smoothing with prediction
//! - `pinch`: size-normalized pinch detection with debounce and cooldown
//! - `rotation`: open-hand classification, palm yaw, debounced rotation

pub mod keypoints;
pub mod pinch;
pub mod rotation;
pub mod smoothing;

pub use keypoints::{CameraMapping, HandLabel, KeypointFrame, Point3, TrackedPoint};
pub use pinch::{PinchConfig, PinchPhase};
pub use rotation::{RotationConfig, RotationPhase};
pub use smoothing::SmoothingConfig;
