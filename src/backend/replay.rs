//! Recorded keypoint replay.
//!
//! One sample per line:
//!
//! ```text
//! (:t 33.0 :hands ((:label :right :points (x0 y0 z0 x1 y1 z1 ... x20 y20 z20))))
//! ```
//!
//! `:points` holds all 21 landmarks, flattened.  Blank lines and lines
//! starting with `;` are skipped.  A malformed line is warned about and
//! dropped; the rest of the file still plays.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use lexpr::Value;
use tracing::{info, warn};

use super::{FrameBatch, KeypointSource};
use crate::gesture::keypoints::{HandLabel, KeypointFrame, Point3, LANDMARK_COUNT};
use crate::sexp;

/// Parse one replay line.  `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<FrameBatch>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return Ok(None);
    }
    let value = lexpr::from_str(line).context("invalid s-expression")?;
    let timestamp_ms = sexp::get_float(&value, "t").ok_or_else(|| anyhow!("missing :t"))?;

    let mut frames = Vec::new();
    if let Some(hands) = sexp::get_value(&value, "hands") {
        for (i, entry) in sexp::list_items(hands).into_iter().enumerate() {
            let frame = parse_hand(entry, timestamp_ms).with_context(|| format!("hand {}", i))?;
            // Non-finite landmarks mean the hand is absent this sample.
            if let Some(frame) = frame {
                frames.push(frame);
            }
        }
    }
    Ok(Some(FrameBatch {
        timestamp_ms,
        frames,
    }))
}

fn parse_hand(entry: &Value, timestamp_ms: f64) -> Result<Option<KeypointFrame>> {
    let label = sexp::get_value(entry, "label")
        .and_then(sexp::as_name)
        .ok_or_else(|| anyhow!("missing :label"))?;
    let label = HandLabel::parse(label).ok_or_else(|| anyhow!("unknown hand label {}", label))?;

    let coords: Vec<f64> = match sexp::get_value(entry, "points") {
        Some(points) => sexp::list_items(points)
            .into_iter()
            .map(|v| sexp::as_f64(v).ok_or_else(|| anyhow!("non-numeric coordinate {}", v)))
            .collect::<Result<_>>()?,
        None => bail!("missing :points"),
    };
    if coords.len() != LANDMARK_COUNT * 3 {
        bail!(
            "expected {} coordinates, got {}",
            LANDMARK_COUNT * 3,
            coords.len()
        );
    }

    let mut landmarks = [Point3::default(); LANDMARK_COUNT];
    for (lm, xyz) in landmarks.iter_mut().zip(coords.chunks_exact(3)) {
        *lm = Point3::new(xyz[0] as f32, xyz[1] as f32, xyz[2] as f32);
    }
    Ok(KeypointFrame::from_landmarks(label, &landmarks, timestamp_ms))
}

/// Plays a recorded session one sample per detection tick.
pub struct ReplaySource {
    name: String,
    batches: VecDeque<FrameBatch>,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening replay {}", path.display()))?;
        let source = Self::from_reader(&path.display().to_string(), std::io::BufReader::new(file))?;
        info!(
            "Loaded {} sample(s) from replay {}",
            source.remaining(),
            path.display()
        );
        Ok(source)
    }

    pub fn from_reader(name: &str, reader: impl BufRead) -> Result<Self> {
        let mut batches = VecDeque::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading {} line {}", name, i + 1))?;
            match parse_line(&line) {
                Ok(Some(batch)) => batches.push_back(batch),
                Ok(None) => {}
                Err(e) => warn!("Skipping {} line {}: {:#}", name, i + 1, e),
            }
        }
        Ok(Self {
            name: name.to_string(),
            batches,
        })
    }

    /// Samples not yet played.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl KeypointSource for ReplaySource {
    fn next_batch(&mut self, _now_ms: f64) -> Option<FrameBatch> {
        self.batches.pop_front()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Format one sample in replay syntax.
#[cfg(test)]
pub(crate) fn format_line(timestamp_ms: f64, hands: &[(HandLabel, [Point3; LANDMARK_COUNT])]) -> String {
    let hands: Vec<String> = hands
        .iter()
        .map(|(label, lm)| {
            let coords: Vec<String> = lm
                .iter()
                .map(|p| format!("{} {} {}", p.x, p.y, p.z))
                .collect();
            format!("(:label :{} :points ({}))", label.as_str(), coords.join(" "))
        })
        .collect();
    format!("(:t {:.1} :hands ({}))", timestamp_ms, hands.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::keypoints::{test_landmarks, TrackedPoint};

    fn line(t: f64, label: HandLabel, fill: f32) -> String {
        format_line(t, &[(label, test_landmarks(Point3::new(fill, fill, 0.0)))])
    }

    #[test]
    fn test_parse_single_hand() {
        let batch = parse_line(&line(66.0, HandLabel::Left, 0.25)).unwrap().unwrap();
        assert!((batch.timestamp_ms - 66.0).abs() < 1e-9);
        assert_eq!(batch.frames.len(), 1);
        let frame = &batch.frames[0];
        assert_eq!(frame.label, HandLabel::Left);
        assert_eq!(frame.point(TrackedPoint::Wrist), Point3::new(0.25, 0.25, 0.0));
    }

    #[test]
    fn test_parse_empty_hands() {
        let batch = parse_line("(:t 10 :hands ())").unwrap().unwrap();
        assert!(batch.frames.is_empty());
        let batch = parse_line("(:t 10)").unwrap().unwrap();
        assert!(batch.frames.is_empty());
    }

    #[test]
    fn test_comment_and_blank_skipped() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ; recorded 2024").unwrap().is_none());
    }

    #[test]
    fn test_bad_lines_rejected() {
        assert!(parse_line("(:hands ())").is_err(), "missing :t");
        assert!(parse_line("(:t 1 :hands ((:label :middle :points ())))").is_err());
        assert!(parse_line("(:t 1 :hands ((:label :left :points (1 2 3))))").is_err());
        assert!(parse_line("(:t 1").is_err());
    }

    #[test]
    fn test_reader_skips_malformed() {
        let text = format!(
            "{}\n(:t oops)\n\n{}\n",
            line(0.0, HandLabel::Right, 0.5),
            line(33.0, HandLabel::Right, 0.5)
        );
        let mut source = ReplaySource::from_reader("mem", text.as_bytes()).unwrap();
        assert_eq!(source.remaining(), 2);
        assert!(source.next_batch(0.0).is_some());
        let second = source.next_batch(0.0).unwrap();
        assert!((second.timestamp_ms - 33.0).abs() < 1e-9);
        assert!(source.next_batch(0.0).is_none());
    }
}
