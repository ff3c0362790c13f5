// src/overlay.rs - egui render surface for overlay instructions
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

use crate::feedback::{RenderInstructions, Rgb};
use crate::geometry::Point2D;
use crate::session::RenderSink;

pub fn color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Maps frame pixels into a widget rect, letterboxed to keep the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMapping {
    origin: Pos2,
    scale: f32,
}

impl FrameMapping {
    pub fn fit(rect: Rect, frame_size: Vec2) -> Self {
        if frame_size.x <= 0.0 || frame_size.y <= 0.0 {
            return Self {
                origin: rect.min,
                scale: 1.0,
            };
        }
        let scale = (rect.width() / frame_size.x).min(rect.height() / frame_size.y);
        let used = frame_size * scale;
        let origin = rect.min + (rect.size() - used) / 2.0;
        Self { origin, scale }
    }

    pub fn to_screen(&self, p: Point2D) -> Pos2 {
        Pos2::new(
            self.origin.x + p.x as f32 * self.scale,
            self.origin.y + p.y as f32 * self.scale,
        )
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

pub fn paint(painter: &egui::Painter, mapping: &FrameMapping, instructions: &RenderInstructions) {
    let s = mapping.scale();

    for line in &instructions.polylines {
        let stroke = Stroke::new(line.width * s, color32(line.color));
        for pair in line.points.windows(2) {
            painter.line_segment([mapping.to_screen(pair[0]), mapping.to_screen(pair[1])], stroke);
        }
    }

    for marker in &instructions.markers {
        painter.circle_filled(mapping.to_screen(marker.center), marker.radius * s, color32(marker.color));
    }

    for label in &instructions.labels {
        // Canvas text is positioned by its baseline
        painter.text(
            mapping.to_screen(label.position),
            Align2::LEFT_BOTTOM,
            &label.text,
            FontId::proportional((label.size * s).max(8.0)),
            color32(label.color),
        );
    }
}

/// Keeps the most recent instructions so skipped frames leave the previous
/// overlay on screen.
#[derive(Debug, Default)]
pub struct OverlayCanvas {
    current: Option<RenderInstructions>,
    frames_rendered: u64,
}

impl OverlayCanvas {
    pub fn current(&self) -> Option<&RenderInstructions> {
        self.current.as_ref()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn paint(&self, painter: &egui::Painter, rect: Rect, frame_size: Vec2) {
        painter.rect_filled(rect, egui::Rounding::same(8.0), Color32::from_rgb(50, 50, 55));
        match &self.current {
            Some(instructions) => paint(painter, &FrameMapping::fit(rect, frame_size), instructions),
            None => {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "No Pose Detected",
                    FontId::proportional(16.0),
                    Color32::from_rgb(150, 150, 155),
                );
            }
        }
    }
}

impl RenderSink for OverlayCanvas {
    fn render(&mut self, instructions: &RenderInstructions) {
        self.current = Some(instructions.clone());
        self.frames_rendered += 1;
    }
}
