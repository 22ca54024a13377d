//! Backend abstraction — keypoint sources and the headless driver loop.

pub mod headless;
pub mod replay;

use std::path::PathBuf;

use crate::gesture::keypoints::KeypointFrame;

/// Every hand detected in one sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameBatch {
    pub timestamp_ms: f64,
    pub frames: Vec<KeypointFrame>,
}

/// Producer of detection samples, polled once per detection tick.
pub trait KeypointSource {
    /// Next sample, or `None` once the source is exhausted.
    ///
    /// `now_ms` is time since the loop started, for sources without their
    /// own clock.
    fn next_batch(&mut self, now_ms: f64) -> Option<FrameBatch>;

    fn name(&self) -> &str;
}

/// Source with no camera attached: every tick is an empty sample.
#[derive(Debug, Default)]
pub struct IdleSource;

impl KeypointSource for IdleSource {
    fn next_batch(&mut self, now_ms: f64) -> Option<FrameBatch> {
        Some(FrameBatch {
            timestamp_ms: now_ms,
            frames: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "idle"
    }
}

/// Source selector.
#[derive(Debug, Clone)]
pub enum SourceType {
    Idle,
    Replay(PathBuf),
}

/// Open the selected source.
pub fn open(source: &SourceType) -> anyhow::Result<Box<dyn KeypointSource>> {
    match source {
        SourceType::Idle => Ok(Box::new(IdleSource)),
        SourceType::Replay(path) => Ok(Box::new(replay::ReplaySource::open(path)?)),
    }
}
