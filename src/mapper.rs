//! Cover-fit anchor mapping
//!
//! The background illustration is rendered with `object-fit: cover`, and the
//! book sprite sits at a fixed pixel box inside that image. This module
//! reproduces the cover scaling rule so an HTML hotspot can stay pinned to
//! the sprite at any viewport size:
//! - scale = max(vw / img_w, vh / img_h)
//! - the scaled image is centered, cropping whichever axis overflows
//! - the sprite box is mapped through the same scale + offset

use serde::{Deserialize, Serialize};

/// Axis-aligned box in background-image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// On-screen rectangle for the anchored hotspot, CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Background intrinsic size plus the sprite box measured inside it.
///
/// Immutable configuration; the default carries the locked measurements
/// taken from the shipped illustration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteMap {
    pub img_w: f32,
    pub img_h: f32,
    pub sprite: SpriteBox,
}

impl Default for SpriteMap {
    fn default() -> Self {
        Self {
            img_w: 1536.0,
            img_h: 1024.0,
            sprite: SpriteBox {
                x: 1302.0,
                y: 863.0,
                w: 411.0,
                h: 610.0,
            },
        }
    }
}

impl SpriteMap {
    pub fn new(img_w: f32, img_h: f32, sprite: SpriteBox) -> Self {
        Self { img_w, img_h, sprite }
    }

    /// Compute the hotspot rectangle for the given viewport.
    ///
    /// Pure and idempotent. Returns `None` for degenerate inputs (viewport
    /// or image with a non-positive dimension) so callers keep the previous
    /// rectangle instead of applying a zero-sized one.
    pub fn anchor_rect(&self, viewport: Viewport) -> Option<AnchorRect> {
        if viewport.width <= 0.0
            || viewport.height <= 0.0
            || self.img_w <= 0.0
            || self.img_h <= 0.0
        {
            return None;
        }

        let scale = (viewport.width / self.img_w).max(viewport.height / self.img_h);
        let drawn_w = self.img_w * scale;
        let drawn_h = self.img_h * scale;
        let offset_x = (viewport.width - drawn_w) / 2.0;
        let offset_y = (viewport.height - drawn_h) / 2.0;

        Some(AnchorRect {
            left: offset_x + self.sprite.x * scale,
            top: offset_y + self.sprite.y * scale,
            width: self.sprite.w * scale,
            height: self.sprite.h * scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn test_cover_fit_landscape() {
        // Width-limited viewport: scale = 1920/1536 = 1.25, image overflows
        // vertically and is cropped top and bottom.
        let map = SpriteMap::default();
        let rect = map
            .anchor_rect(Viewport::new(1920.0, 1080.0))
            .expect("valid viewport");

        assert_close(rect.left, 1627.5);
        assert_close(rect.top, 1008.75);
        assert_close(rect.width, 513.75);
        assert_close(rect.height, 762.5);
    }

    #[test]
    fn test_cover_fit_portrait() {
        // Height-limited viewport: scale = 1000/1024, horizontal crop.
        let map = SpriteMap::default();
        let rect = map
            .anchor_rect(Viewport::new(800.0, 1000.0))
            .expect("valid viewport");

        let scale = 1000.0 / 1024.0;
        assert_close(rect.left, (800.0 - 1536.0 * scale) / 2.0 + 1302.0 * scale);
        assert_close(rect.top, 863.0 * scale);
        assert_close(rect.width, 411.0 * scale);
        assert_close(rect.height, 610.0 * scale);
    }

    #[test]
    fn test_exact_image_size_is_identity() {
        let map = SpriteMap::default();
        let rect = map
            .anchor_rect(Viewport::new(1536.0, 1024.0))
            .expect("valid viewport");

        assert_close(rect.left, 1302.0);
        assert_close(rect.top, 863.0);
        assert_close(rect.width, 411.0);
        assert_close(rect.height, 610.0);
    }

    #[test]
    fn test_degenerate_viewport_skipped() {
        let map = SpriteMap::default();
        assert!(map.anchor_rect(Viewport::new(0.0, 1080.0)).is_none());
        assert!(map.anchor_rect(Viewport::new(1920.0, 0.0)).is_none());
        assert!(map.anchor_rect(Viewport::new(-100.0, -100.0)).is_none());
    }

    #[test]
    fn test_idempotent() {
        let map = SpriteMap::default();
        let vp = Viewport::new(1366.0, 768.0);
        assert_eq!(map.anchor_rect(vp), map.anchor_rect(vp));
    }
}
