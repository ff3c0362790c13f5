// src/feedback.rs
use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationResult;
use crate::geometry::Point2D;
use crate::profile::{PoseProfile, DEFAULT_LABEL_OFFSET};

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    InTolerance,
    OutOfTolerance,
}

/// Colors and sizes for the overlay. Only the tone-to-color mapping is fixed;
/// the colors themselves are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub in_range_color: Rgb,
    pub out_of_range_color: Rgb,
    pub marker_color: Rgb,
    pub text_color: Rgb,
    pub line_width: f32,
    pub marker_radius: f32,
    pub font_size: f32,
    pub held_label_position: [f32; 2],
    pub show_joint_angles: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            in_range_color: [0, 128, 0],
            out_of_range_color: [255, 0, 0],
            marker_color: [170, 255, 0],
            text_color: [255, 255, 255],
            line_width: 8.0,
            marker_radius: 8.0,
            font_size: 30.0,
            held_label_position: [10.0, 40.0],
            show_joint_angles: true,
        }
    }
}

impl OverlayStyle {
    pub fn color_for(&self, tone: Tone) -> Rgb {
        match tone {
            Tone::InTolerance => self.in_range_color,
            Tone::OutOfTolerance => self.out_of_range_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<Point2D>,
    pub tone: Tone,
    pub color: Rgb,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub center: Point2D,
    pub radius: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub text: String,
    pub position: Point2D,
    pub size: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderInstructions {
    pub polylines: Vec<Polyline>,
    pub markers: Vec<Marker>,
    pub labels: Vec<TextLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioCue {
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub instructions: RenderInstructions,
    pub cue: Option<AudioCue>,
}

/// Overlay hint for the joint named `joint`.
#[derive(Debug, Clone, PartialEq)]
pub struct JointLabel {
    pub joint: String,
    pub label: Option<String>,
    pub offset: [f32; 2],
}

pub struct FeedbackProjector {
    style: OverlayStyle,
    labels: Vec<JointLabel>,
    last_spoken: Option<u64>,
}

impl FeedbackProjector {
    pub fn new(style: OverlayStyle, labels: Vec<JointLabel>) -> Self {
        Self {
            style,
            labels,
            last_spoken: None,
        }
    }

    /// Projector using the label hints declared on each joint of `profile`.
    pub fn for_profile(style: OverlayStyle, profile: &PoseProfile) -> Self {
        let labels = profile
            .joints
            .iter()
            .map(|joint| JointLabel {
                joint: joint.name.clone(),
                label: joint.label.clone(),
                offset: joint.label_offset,
            })
            .collect();
        Self::new(style, labels)
    }

    fn label_for(&self, joint: &str) -> Option<&JointLabel> {
        self.labels.iter().find(|hint| hint.joint == joint)
    }

    pub fn last_spoken(&self) -> Option<u64> {
        self.last_spoken
    }

    pub fn reset(&mut self) {
        self.last_spoken = None;
    }

    pub fn project(&mut self, result: &EvaluationResult) -> Projection {
        let style = &self.style;
        let mut instructions = RenderInstructions::default();

        for joint in &result.joints {
            if joint.points.len() < 2 {
                continue;
            }
            let tone = if joint.in_range {
                Tone::InTolerance
            } else {
                Tone::OutOfTolerance
            };
            instructions.polylines.push(Polyline {
                points: joint.points.clone(),
                tone,
                color: style.color_for(tone),
                width: style.line_width,
            });
        }

        instructions.markers = result
            .joints
            .iter()
            .flat_map(|joint| joint.points.iter())
            .map(|&center| Marker {
                center,
                radius: style.marker_radius,
                color: style.marker_color,
            })
            .collect();

        instructions.labels.push(TextLabel {
            text: format!("Seconds held: {}", result.held_seconds),
            position: Point2D::new(
                style.held_label_position[0] as f64,
                style.held_label_position[1] as f64,
            ),
            size: style.font_size,
            color: style.text_color,
        });

        if style.show_joint_angles {
            for joint in &result.joints {
                // Unavailable joints have no vertex to anchor to
                let Some(vertex) = joint.points.get(1) else { continue };
                let hint = self.label_for(&joint.name);
                let offset = hint.map(|h| h.offset).unwrap_or(DEFAULT_LABEL_OFFSET);
                let text = match hint.and_then(|h| h.label.as_deref()) {
                    Some(label) => format!("{}: {}", label, joint.angle_degrees),
                    None => joint.angle_degrees.to_string(),
                };
                instructions.labels.push(TextLabel {
                    text,
                    position: Point2D::new(vertex.x + offset[0] as f64, vertex.y + offset[1] as f64),
                    size: style.font_size * 0.8,
                    color: style.text_color,
                });
            }
        }

        Projection {
            instructions,
            cue: self.next_cue(result.held_seconds),
        }
    }

    fn next_cue(&mut self, held_seconds: u64) -> Option<AudioCue> {
        if self.last_spoken == Some(held_seconds) {
            return None;
        }
        self.last_spoken = Some(held_seconds);
        Some(AudioCue { seconds: held_seconds })
    }
}
