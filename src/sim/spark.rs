//! Spark value record and its motion/brightness math
//!
//! A spark is a short-lived glowing dot: it rises with a small lateral
//! sway, fades linearly over its lifetime, and twinkles around a fixed
//! brightness band. Lifetimes are in whole frames; `life > 0` is enforced
//! at spawn so the fade never divides by zero.

use glam::Vec2;

/// One live ember particle, owned by the engine's collection
#[derive(Debug, Clone, PartialEq)]
pub struct Spark {
    /// Position in logical surface pixels
    pub pos: Vec2,
    /// Velocity in pixels per frame
    pub vel: Vec2,
    /// Draw radius in pixels
    pub radius: f32,
    /// Initial opacity scalar, (0, 1)
    pub base_alpha: f32,
    /// Frames lived so far
    pub age: u32,
    /// Frames until forced expiry, always > 0
    pub life: f32,
    /// Twinkle frequency, radians per frame of age
    pub twinkle_rate: f32,
    /// Cull margin inherited from the spawn region
    pub margin: f32,
    /// Whether this frame draws the bright inner core (re-rolled each tick)
    pub hot_core: bool,
}

impl Spark {
    /// Linear fade, 1 at birth down to 0 at end of life
    #[inline]
    pub fn fade(&self) -> f32 {
        (1.0 - self.age as f32 / self.life).max(0.0)
    }

    /// Brightness oscillation in the 0.65 ± 0.35 band
    #[inline]
    pub fn twinkle(&self) -> f32 {
        0.65 + 0.35 * (self.age as f32 * self.twinkle_rate).sin()
    }

    /// Final draw opacity: base alpha × fade × twinkle
    pub fn opacity(&self) -> f32 {
        (self.base_alpha * self.fade() * self.twinkle()).max(0.0)
    }

    /// True once the spark should leave the live collection
    pub fn expired(&self) -> bool {
        self.age as f32 >= self.life || self.opacity() <= 0.0
    }

    /// Advance one frame: age, then integrate velocity plus a sinusoidal
    /// lateral sway keyed off age and x position.
    pub fn advance(&mut self, sway_amp: f32, sway_freq: f32, sway_shift: f32) {
        self.age += 1;
        let sway = (self.age as f32 * sway_freq + self.pos.x * sway_shift).sin() * sway_amp;
        self.pos.x += self.vel.x + sway;
        self.pos.y += self.vel.y;
    }

    /// True once the spark has drifted past the surface by more than its margin
    pub fn out_of_bounds(&self, width: f32, height: f32) -> bool {
        self.pos.x < -self.margin
            || self.pos.x > width + self.margin
            || self.pos.y < -self.margin
            || self.pos.y > height + self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spark(life: f32) -> Spark {
        Spark {
            pos: Vec2::new(50.0, 80.0),
            vel: Vec2::new(0.1, -0.6),
            radius: 1.5,
            base_alpha: 0.9,
            age: 0,
            life,
            twinkle_rate: 0.3,
            margin: 24.0,
            hot_core: false,
        }
    }

    #[test]
    fn test_fade_monotonic_and_zero_at_end_of_life() {
        let mut s = spark(40.0);
        let mut prev = s.fade();
        assert_eq!(prev, 1.0);
        for _ in 0..40 {
            s.advance(0.2, 0.11, 0.015);
            let fade = s.fade();
            assert!(fade <= prev, "fade rose at age {}", s.age);
            prev = fade;
        }
        assert_eq!(s.fade(), 0.0);
        assert_eq!(s.opacity(), 0.0);
        assert!(s.expired());
    }

    #[test]
    fn test_twinkle_stays_in_band() {
        let mut s = spark(60.0);
        for _ in 0..60 {
            s.advance(0.2, 0.11, 0.015);
            let tw = s.twinkle();
            assert!((0.3..=1.0).contains(&tw), "twinkle {tw} out of band");
        }
    }

    #[test]
    fn test_opacity_never_negative() {
        let mut s = spark(10.0);
        for _ in 0..30 {
            s.advance(0.2, 0.11, 0.015);
            assert!(s.opacity() >= 0.0);
        }
    }

    #[test]
    fn test_advance_integrates_velocity_and_sway() {
        let mut s = spark(40.0);
        let x0 = s.pos.x;
        let y0 = s.pos.y;
        s.advance(0.2, 0.11, 0.015);
        assert_eq!(s.age, 1);
        // y is pure velocity; x is velocity plus bounded sway
        assert_eq!(s.pos.y, y0 - 0.6);
        assert!((s.pos.x - (x0 + 0.1)).abs() <= 0.2 + 1e-6);
    }

    #[test]
    fn test_out_of_bounds_respects_margin() {
        let mut s = spark(40.0);
        s.pos = Vec2::new(-20.0, 50.0);
        assert!(!s.out_of_bounds(100.0, 100.0));
        s.pos.x = -25.0;
        assert!(s.out_of_bounds(100.0, 100.0));
        s.pos = Vec2::new(50.0, 123.0);
        assert!(!s.out_of_bounds(100.0, 100.0));
        s.pos.y = 125.0;
        assert!(s.out_of_bounds(100.0, 100.0));
    }
}
