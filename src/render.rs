//! Drawing surface abstraction
//!
//! The simulation issues shape fills through `DrawSurface` so it never
//! touches a platform canvas directly. The browser backend wraps a 2D
//! canvas context (see `main.rs`); tests and the native smoke runner use
//! the recording surface.

use serde::{Deserialize, Serialize};

/// Solid color, 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgba()` string at the given opacity
    pub fn css(&self, alpha: f32) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

/// Minimal 2D surface contract: transparent clear plus alpha-blended
/// circle fill, specified in logical (CSS) pixels.
pub trait DrawSurface {
    /// Wipe the full surface back to transparency
    fn clear(&mut self, width: f32, height: f32);
    /// Fill a circle centered at (x, y)
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear {
        width: f32,
        height: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgb,
        alpha: f32,
    },
}

/// `DrawSurface` that records ops instead of painting
#[derive(Debug, Default)]
pub struct Recorder {
    pub ops: Vec<DrawOp>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of circle fills since the last clear
    pub fn circles(&self) -> usize {
        let last_clear = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear { .. }));
        let start = last_clear.map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count()
    }
}

impl DrawSurface for Recorder {
    fn clear(&mut self, width: f32, height: f32) {
        self.ops.push(DrawOp::Clear { width, height });
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        self.ops.push(DrawOp::Circle {
            x,
            y,
            radius,
            color,
            alpha,
        });
    }
}
