pub mod config;
pub mod error;
pub mod evaluator;
pub mod feedback;
pub mod geometry;
pub mod landmarks;
pub mod overlay;
pub mod profile;
pub mod record;
pub mod session;
pub mod source;
