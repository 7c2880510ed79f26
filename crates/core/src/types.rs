//! Host render primitives
//!
//! Scripts never render anything themselves. They hand these requests to
//! the host, which decides how (and whether) to draw them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Clamp every component into the displayable range
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A triangle draw request, centred on `(x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
}

impl Triangle {
    pub fn new(x: f64, y: f64, radius: f64, color: Color) -> Self {
        Self { x, y, radius, color }
    }

    /// Corner positions of an upward-pointing equilateral triangle
    pub fn vertices(&self) -> [(f64, f64); 3] {
        let step = std::f64::consts::TAU / 3.0;
        let start = std::f64::consts::FRAC_PI_2;
        let mut out = [(0.0, 0.0); 3];
        for (i, vertex) in out.iter_mut().enumerate() {
            let angle = start + step * i as f64;
            *vertex = (
                self.x + self.radius * angle.cos(),
                self.y + self.radius * angle.sin(),
            );
        }
        out
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "triangle at ({}, {}) radius {} {}",
            self.x, self.y, self.radius, self.color
        )
    }
}
