// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile id must not be empty")]
    EmptyId,
    #[error("profile {0} declares no joints")]
    NoJoints(String),
    #[error("profile {profile}: joint {joint} has min {min} greater than max {max}")]
    InvertedRange {
        profile: String,
        joint: String,
        min: i32,
        max: i32,
    },
    #[error("profile {profile}: joint {joint} references landmark {index} outside the 33-point body layout")]
    LandmarkOutOfRange {
        profile: String,
        joint: String,
        index: usize,
    },
    #[error("profile {profile}: joint {joint} declared twice")]
    DuplicateJoint { profile: String, joint: String },
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open landmark recording: {0}")]
    Io(#[from] std::io::Error),
}
