// src/geometry.rs
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Landmark position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Angle in degrees at the middle point, between the rays to the first and
/// third points. Always in [0, 180]; degenerate input gives 0.
pub fn angle_at_vertex(points: &[Point2D]) -> f64 {
    let [a, vertex, b] = match points {
        [a, v, b] => [*a, *v, *b],
        _ => return 0.0,
    };

    if !(a.is_finite() && vertex.is_finite() && b.is_finite()) {
        return 0.0;
    }

    let v1 = a.to_vector() - vertex.to_vector();
    let v2 = b.to_vector() - vertex.to_vector();

    if v1.norm() == 0.0 || v2.norm() == 0.0 {
        return 0.0;
    }

    // atan2 of |cross| and dot stays accurate near 0 and 180 where acos does not
    let cross = v1.perp(&v2);
    let dot = v1.dot(&v2);
    cross.abs().atan2(dot).to_degrees()
}
