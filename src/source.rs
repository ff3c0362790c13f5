// src/source.rs - Upstream landmark producers: recorded detector output and a synthetic performer
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use nalgebra::{Rotation2, Vector2};

use crate::error::SourceError;
use crate::landmarks::*;
use crate::profile::PoseProfile;

pub enum LandmarkSource {
    Recording(RecordingReader),
    Simulated(SimulatedPerformer),
}

impl LandmarkSource {
    /// Next detector output due at `now_ms` (session clock), if any.
    pub fn next_frame(&mut self, now_ms: u64) -> Option<DetectorOutput> {
        match self {
            LandmarkSource::Recording(reader) => reader.next_due(now_ms),
            LandmarkSource::Simulated(performer) => Some(performer.frame_at(now_ms)),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            LandmarkSource::Recording(reader) => reader.is_finished(),
            LandmarkSource::Simulated(_) => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LandmarkSource::Recording(reader) => format!("recording {}", reader.path.display()),
            LandmarkSource::Simulated(performer) => format!("simulated {}", performer.profile.id),
        }
    }
}

/// JSON-lines file with one `DetectorOutput` per line, timestamps relative
/// to the start of the recording.
pub struct RecordingReader {
    path: PathBuf,
    frames: Vec<DetectorOutput>,
    cursor: usize,
    skipped_lines: usize,
}

impl RecordingReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path)?;

        let mut frames = Vec::new();
        let mut skipped_lines = 0;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DetectorOutput>(&line) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping unreadable recording line");
                    skipped_lines += 1;
                }
            }
        }
        frames.sort_by_key(|f| f.timestamp_ms);

        tracing::info!(path = %path.display(), frames = frames.len(), skipped_lines, "loaded landmark recording");
        Ok(Self {
            path,
            frames,
            cursor: 0,
            skipped_lines,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Returns the newest frame due by `now_ms`, dropping older ones the
    /// caller was too slow to consume.
    pub fn next_due(&mut self, now_ms: u64) -> Option<DetectorOutput> {
        let mut due = None;
        while let Some(frame) = self.frames.get(self.cursor) {
            if frame.timestamp_ms > now_ms {
                break;
            }
            due = Some(frame.clone());
            self.cursor += 1;
        }
        due
    }
}

pub fn write_recording(path: impl AsRef<Path>, frames: &[DetectorOutput]) -> anyhow::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
    for frame in frames {
        serde_json::to_writer(&mut file, frame)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(())
}

/// Synthetic practitioner for demo mode. Each cycle holds the pose for the
/// first two thirds, breaks form with the first joint, then briefly leaves
/// the camera's view.
pub struct SimulatedPerformer {
    profile: PoseProfile,
    period_ms: u64,
    width: u32,
    height: u32,
}

// Normalized standing positions, facing the camera.
fn rest_position(index: usize) -> Vector2<f64> {
    let (x, y) = match index {
        0 => (0.50, 0.15),
        LEFT_SHOULDER => (0.58, 0.30),
        RIGHT_SHOULDER => (0.42, 0.30),
        LEFT_ELBOW => (0.68, 0.30),
        RIGHT_ELBOW => (0.32, 0.30),
        LEFT_WRIST => (0.78, 0.30),
        RIGHT_WRIST => (0.22, 0.30),
        LEFT_HIP => (0.55, 0.55),
        RIGHT_HIP => (0.45, 0.55),
        LEFT_KNEE => (0.56, 0.72),
        RIGHT_KNEE => (0.44, 0.72),
        LEFT_ANKLE => (0.57, 0.90),
        RIGHT_ANKLE => (0.43, 0.90),
        _ => (0.50, 0.50),
    };
    Vector2::new(x, y)
}

impl SimulatedPerformer {
    pub fn new(profile: PoseProfile, period_secs: f64) -> Self {
        Self {
            profile,
            period_ms: ((period_secs * 1000.0) as u64).max(1000),
            width: 640,
            height: 480,
        }
    }

    pub fn frame_at(&self, now_ms: u64) -> DetectorOutput {
        let phase = (now_ms % self.period_ms) as f64 / self.period_ms as f64;
        let landmarks = if phase >= 0.95 {
            None
        } else {
            Some(self.pose_landmarks(now_ms, phase < 2.0 / 3.0))
        };

        DetectorOutput {
            timestamp_ms: now_ms,
            width: self.width,
            height: self.height,
            landmarks,
        }
    }

    fn pose_landmarks(&self, now_ms: u64, in_form: bool) -> Vec<Option<NormalizedLandmark>> {
        // Work in pixel space so the generated angles survive the raster's aspect ratio
        let scale = Vector2::new(self.width as f64, self.height as f64);
        let mut placed: Vec<Option<Vector2<f64>>> = vec![None; LANDMARK_COUNT];
        let sway = 3.0 * (now_ms as f64 / 700.0).sin();

        for (i, joint) in self.profile.joints.iter().enumerate() {
            let [a, v, b] = joint.indices;
            let start = *placed[a].get_or_insert_with(|| rest_position(a).component_mul(&scale));
            let vertex = *placed[v].get_or_insert_with(|| rest_position(v).component_mul(&scale));
            if placed[b].is_some() {
                continue;
            }

            let reachable_max = joint.range.max.min(180) as f64;
            let mut target = (joint.range.min as f64 + reachable_max) / 2.0 + sway;
            if !in_form && i == 0 {
                target -= 45.0;
            }
            let target = target.clamp(0.0, 180.0);

            let ray = start - vertex;
            let end = vertex + Rotation2::new(target.to_radians()) * ray;
            placed[b] = Some(end);
        }

        placed
            .into_iter()
            .map(|p| {
                p.map(|p| NormalizedLandmark {
                    x: p.x / scale.x,
                    y: p.y / scale.y,
                })
            })
            .collect()
    }
}
