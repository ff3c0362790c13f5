// src/profile.rs
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::landmarks::*;

/// Inclusive tolerance band in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: i32,
    pub max: i32,
}

impl AngleRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, degrees: i32) -> bool {
        self.min <= degrees && degrees <= self.max
    }
}

/// Three landmarks whose middle one is the measured vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointGroup {
    pub name: String,
    pub indices: [usize; 3],
    pub range: AngleRange,
    /// Overlay label prefix; the bare angle is shown when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Pixel offset of the angle label from the vertex.
    #[serde(default = "default_label_offset")]
    pub label_offset: [f32; 2],
}

pub const DEFAULT_LABEL_OFFSET: [f32; 2] = [20.0, 20.0];

fn default_label_offset() -> [f32; 2] {
    DEFAULT_LABEL_OFFSET
}

impl JointGroup {
    pub fn new(name: &str, indices: [usize; 3], range: AngleRange) -> Self {
        Self {
            name: name.to_string(),
            indices,
            range,
            label: None,
            label_offset: default_label_offset(),
        }
    }

    fn labeled(mut self, label: &str, offset: [f32; 2]) -> Self {
        self.label = Some(label.to_string());
        self.label_offset = offset;
        self
    }

    fn offset(mut self, offset: [f32; 2]) -> Self {
        self.label_offset = offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub joints: Vec<JointGroup>,
}

impl PoseProfile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.id.trim().is_empty() {
            return Err(ProfileError::EmptyId);
        }
        if self.joints.is_empty() {
            return Err(ProfileError::NoJoints(self.id.clone()));
        }

        let mut seen = HashSet::new();
        for joint in &self.joints {
            if !seen.insert(joint.name.as_str()) {
                return Err(ProfileError::DuplicateJoint {
                    profile: self.id.clone(),
                    joint: joint.name.clone(),
                });
            }
            if joint.range.min > joint.range.max {
                return Err(ProfileError::InvertedRange {
                    profile: self.id.clone(),
                    joint: joint.name.clone(),
                    min: joint.range.min,
                    max: joint.range.max,
                });
            }
            if let Some(&index) = joint.indices.iter().find(|&&i| i >= LANDMARK_COUNT) {
                return Err(ProfileError::LandmarkOutOfRange {
                    profile: self.id.clone(),
                    joint: joint.name.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

// Thresholds are the reference poses' calibration values, kept as-is.
static BUILTIN_PROFILES: Lazy<Vec<PoseProfile>> = Lazy::new(|| {
    vec![
        PoseProfile {
            id: "trikonasana".to_string(),
            display_name: "Trikonasana".to_string(),
            joints: vec![
                JointGroup::new("left_arm", [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST], AngleRange::new(165, 195))
                    .offset([20.0, 20.0]),
                JointGroup::new("right_arm", [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST], AngleRange::new(165, 195))
                    .offset([-120.0, 20.0]),
                JointGroup::new("back", [RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE], AngleRange::new(120, 140))
                    .offset([0.0, 40.0]),
            ],
        },
        PoseProfile {
            id: "virabhadrasana".to_string(),
            display_name: "Virabhadrasana".to_string(),
            joints: vec![
                JointGroup::new("left_arm", [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST], AngleRange::new(170, 190))
                    .labeled("Left Hand", [10.0, 20.0]),
                JointGroup::new("right_arm", [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST], AngleRange::new(170, 190))
                    .labeled("Right Hand", [-100.0, 20.0]),
                JointGroup::new("left_leg", [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE], AngleRange::new(110, 130))
                    .labeled("Left Leg", [10.0, 20.0]),
                JointGroup::new("right_leg", [RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE], AngleRange::new(170, 190))
                    .labeled("Right Leg", [-100.0, 20.0]),
            ],
        },
    ]
});

pub fn builtin(id: &str) -> Option<PoseProfile> {
    BUILTIN_PROFILES.iter().find(|p| p.id == id).cloned()
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    profiles: Vec<PoseProfile>,
}

/// Validated pose profiles keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, PoseProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for profile in BUILTIN_PROFILES.iter() {
            registry.profiles.insert(profile.id.clone(), profile.clone());
        }
        registry
    }

    /// Adds or replaces a profile after validating it.
    pub fn insert(&mut self, profile: PoseProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        tracing::debug!(profile = %profile.id, joints = profile.joints.len(), "registered pose profile");
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Loads `{"profiles": [...]}` from JSON. Nothing is registered unless
    /// every profile in the file validates.
    pub fn load_json(&mut self, json: &str) -> Result<usize, ProfileError> {
        let file: ProfileFile = serde_json::from_str(json)?;
        for profile in &file.profiles {
            profile.validate()?;
        }
        let count = file.profiles.len();
        for profile in file.profiles {
            self.profiles.insert(profile.id.clone(), profile);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ProfileError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let count = self.load_json(&content)?;
        tracing::info!(path = %path.as_ref().display(), count, "loaded pose profiles");
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<&PoseProfile> {
        self.profiles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
