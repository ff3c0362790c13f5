// src/landmarks.rs
use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;
use crate::profile::PoseProfile;

// MediaPipe pose landmark indices
pub const LANDMARK_COUNT: usize = 33;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Detector coordinate, normalized to [0, 1] of the frame raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
}

/// One video frame's worth of detector output, before scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorOutput {
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    /// `None` when the detector found no body.
    #[serde(default)]
    pub landmarks: Option<Vec<Option<NormalizedLandmark>>>,
}

impl DetectorOutput {
    pub fn to_frame(&self) -> Option<LandmarkFrame> {
        self.landmarks
            .as_ref()
            .map(|lms| LandmarkFrame::from_normalized(lms, self.width, self.height))
    }
}

/// Pixel-space landmarks indexed by the 33-point body layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<Option<Point2D>>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Option<Point2D>>) -> Self {
        Self { points }
    }

    pub fn from_normalized(landmarks: &[Option<NormalizedLandmark>], width: u32, height: u32) -> Self {
        let points = landmarks
            .iter()
            .map(|lm| lm.map(|lm| Point2D::new(lm.x * width as f64, lm.y * height as f64)))
            .collect();
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.points.get(index).copied().flatten()
    }

    /// True when the detector produced no point at all, whatever the slot count.
    pub fn has_no_landmarks(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }
}

/// Points of one joint group, or `None` if any landmark was missing.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedJoint {
    pub name: String,
    pub points: Option<Vec<Point2D>>,
}

pub fn group(frame: &LandmarkFrame, profile: &PoseProfile) -> Vec<GroupedJoint> {
    profile
        .joints
        .iter()
        .map(|joint| {
            let points: Option<Vec<Point2D>> = joint.indices.iter().map(|&i| frame.get(i)).collect();
            GroupedJoint {
                name: joint.name.clone(),
                points,
            }
        })
        .collect()
}
