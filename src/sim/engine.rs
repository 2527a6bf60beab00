//! Ember engine: bounded spark collection and the spawn/integrate/cull cycle
//!
//! The engine owns its sparks, its surface size, and its RNG; multiple
//! instances coexist without shared state. Stepping is explicit
//! (`tick(frames)`) so production can drive it from an animation-frame
//! loop while tests drive it manually.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::{EmberConfig, sample};
use crate::consts::{DPR_MAX, SPAWN_EDGE_MAX, SPAWN_EDGE_MIN};
use crate::render::DrawSurface;

use super::spark::Spark;

/// Logical surface size plus backing density
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// Logical width, CSS pixels
    pub width: f32,
    /// Logical height, CSS pixels
    pub height: f32,
    /// Device pixel ratio, clamped to [1, 2]
    pub dpr: f32,
}

impl SurfaceSize {
    /// Backing-store size in device pixels, never zero-area
    pub fn device(&self) -> (u32, u32) {
        (
            (self.width * self.dpr).round().max(1.0) as u32,
            (self.height * self.dpr).round().max(1.0) as u32,
        )
    }
}

/// Hover-driven ember animation over the book hotspot
pub struct EmberEngine {
    config: EmberConfig,
    sparks: VecDeque<Spark>,
    surface: SurfaceSize,
    rng: Pcg32,
    running: bool,
    loop_armed: bool,
    frame: u64,
}

impl EmberEngine {
    pub fn new(config: EmberConfig, seed: u64) -> Self {
        let mut config = config;
        config.sanitize();
        Self {
            config,
            sparks: VecDeque::new(),
            surface: SurfaceSize {
                width: 1.0,
                height: 1.0,
                dpr: 1.0,
            },
            rng: Pcg32::seed_from_u64(seed),
            running: false,
            loop_armed: false,
            frame: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn spark_count(&self) -> usize {
        self.sparks.len()
    }

    /// Live sparks, oldest first
    pub fn sparks(&self) -> impl Iterator<Item = &Spark> {
        self.sparks.iter()
    }

    pub fn config(&self) -> &EmberConfig {
        &self.config
    }

    /// Begin animating. Residual sparks from the previous run are dropped.
    /// Returns false (and does nothing) when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.sparks.clear();
        self.frame = 0;
        log::info!("embers started");
        true
    }

    /// Stop scheduling frames. The surface is NOT wiped here: the host
    /// clears it after a short delay via [`Self::clear_if_stopped`] so a
    /// quick re-hover never flashes. Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        log::info!("embers stopped after {} frames", self.frame);
        true
    }

    /// Reserve the single pending animation-frame callback. The host calls
    /// this before scheduling one and [`Self::frame_fired`] at the top of
    /// the callback. A stop followed by a quick restart leaves the original
    /// callback pending; refusing to arm a second one here keeps exactly
    /// one loop alive.
    pub fn arm_frame_loop(&mut self) -> bool {
        if self.loop_armed {
            return false;
        }
        self.loop_armed = true;
        true
    }

    /// Release the pending-callback reservation; the callback body runs now
    pub fn frame_fired(&mut self) {
        self.loop_armed = false;
    }

    /// Deferred wipe after `stop()`. Checks the running flag at fire time:
    /// a restart in the meantime suppresses the clear and keeps sparks.
    pub fn clear_if_stopped(&mut self, surface: &mut impl DrawSurface) -> bool {
        if self.running {
            return false;
        }
        self.sparks.clear();
        surface.clear(self.surface.width, self.surface.height);
        true
    }

    /// Apply a new anchor rectangle. Non-finite or non-positive dimensions
    /// floor at one logical pixel so the backing store never has zero area;
    /// dpr is clamped to [1, 2]. Returns the size for the host to apply to
    /// its canvas backing store and transform.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> SurfaceSize {
        let width = if width.is_finite() && width > 0.0 {
            width
        } else {
            log::warn!("degenerate surface width {width}, flooring at 1px");
            1.0
        };
        let height = if height.is_finite() && height > 0.0 {
            height
        } else {
            log::warn!("degenerate surface height {height}, flooring at 1px");
            1.0
        };
        let dpr = if dpr.is_finite() { dpr } else { 1.0 };
        self.surface = SurfaceSize {
            width,
            height,
            dpr: dpr.clamp(1.0, DPR_MAX),
        };
        self.surface
    }

    /// Advance the simulation by whole frames. No-op while stopped.
    pub fn tick(&mut self, frames: u32) {
        if !self.running {
            return;
        }
        for _ in 0..frames {
            self.step();
        }
    }

    /// One simulation frame: spawn, integrate, cull
    fn step(&mut self) {
        self.frame += 1;

        for _ in 0..self.config.tuning.spawn_per_frame {
            self.spawn();
        }

        let t = &self.config.tuning;
        let (amp, freq, shift) = (t.sway_amp, t.sway_freq, t.sway_shift);
        let core_chance = t.hot_core_chance;
        for spark in self.sparks.iter_mut() {
            spark.advance(amp, freq, shift);
            spark.hot_core = self.rng.random::<f32>() < core_chance;
        }

        let (w, h) = (self.surface.width, self.surface.height);
        self.sparks
            .retain(|s| !s.expired() && !s.out_of_bounds(w, h));
    }

    /// Spawn one spark inside a weighted region, evicting the oldest spark
    /// when the collection is at capacity.
    fn spawn(&mut self) {
        let region = *self.config.pick_region(&mut self.rng);
        let tuning = self.config.tuning.clone();

        let jitter_x = self.rng.random_range(-region.jitter..=region.jitter);
        let jitter_y = self.rng.random_range(-region.jitter..=region.jitter);
        let nx = (sample(&mut self.rng, region.nx) + jitter_x)
            .clamp(SPAWN_EDGE_MIN, SPAWN_EDGE_MAX);
        let ny = (sample(&mut self.rng, region.ny) + jitter_y)
            .clamp(SPAWN_EDGE_MIN, SPAWN_EDGE_MAX);

        let spark = Spark {
            pos: Vec2::new(nx * self.surface.width, ny * self.surface.height),
            vel: Vec2::new(
                sample(&mut self.rng, tuning.vx),
                sample(&mut self.rng, tuning.vy),
            ),
            radius: sample(&mut self.rng, tuning.radius),
            base_alpha: sample(&mut self.rng, tuning.base_alpha),
            age: 0,
            // sanitize() keeps the range >= 1, but guard anyway
            life: sample(&mut self.rng, tuning.life).max(1.0),
            twinkle_rate: sample(&mut self.rng, tuning.twinkle_rate),
            margin: region.margin,
            hot_core: false,
        };

        if self.sparks.len() >= tuning.max_sparks {
            self.sparks.pop_front();
        }
        self.sparks.push_back(spark);
    }

    /// Draw the current frame: full transparent clear, then one circle per
    /// spark, plus the smaller bright core on sparks that rolled one.
    pub fn render(&self, surface: &mut impl DrawSurface) {
        let t = &self.config.tuning;
        surface.clear(self.surface.width, self.surface.height);
        for spark in &self.sparks {
            let alpha = spark.opacity();
            if alpha <= 0.0 {
                continue;
            }
            surface.fill_circle(spark.pos.x, spark.pos.y, spark.radius, t.color, alpha);
            if spark.hot_core {
                surface.fill_circle(
                    spark.pos.x,
                    spark.pos.y,
                    spark.radius * 0.45,
                    t.core_color,
                    (alpha * 1.4).min(1.0),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawOp, Recorder};
    use proptest::prelude::*;

    fn running_engine(seed: u64) -> EmberEngine {
        let mut engine = EmberEngine::new(EmberConfig::default(), seed);
        engine.resize(200.0, 300.0, 1.0);
        engine.start();
        engine
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut engine = running_engine(1);
        assert!(!engine.start(), "second start must be a no-op");
        engine.tick(10);
        let count = engine.spark_count();
        assert!(count > 0);

        assert!(engine.stop());
        assert!(!engine.stop(), "second stop must be a no-op");
        // Sparks survive stop until the deferred clear fires
        assert_eq!(engine.spark_count(), count);
    }

    #[test]
    fn test_start_clears_residual_sparks() {
        let mut engine = running_engine(2);
        engine.tick(10);
        engine.stop();
        engine.start();
        assert_eq!(engine.spark_count(), 0);
    }

    #[test]
    fn test_tick_while_stopped_is_noop() {
        let mut engine = EmberEngine::new(EmberConfig::default(), 3);
        engine.resize(200.0, 300.0, 1.0);
        engine.tick(30);
        assert_eq!(engine.spark_count(), 0);
    }

    #[test]
    fn test_single_frame_loop_survives_raced_restart() {
        let mut engine = running_engine(11);
        assert!(engine.arm_frame_loop());
        assert!(!engine.arm_frame_loop(), "one callback pending at a time");

        // Hover out then back in before the pending callback fires: the
        // restart must not arm a second loop alongside it
        engine.stop();
        engine.start();
        assert!(!engine.arm_frame_loop());

        // The pending callback fires, sees the engine running, re-arms once
        engine.frame_fired();
        assert!(engine.arm_frame_loop());
        assert!(!engine.arm_frame_loop());

        // Un-raced stop: the last callback fires and nothing re-arms
        engine.stop();
        engine.frame_fired();
        assert!(engine.arm_frame_loop(), "reservation fully released");
    }

    #[test]
    fn test_deferred_clear_fires_when_still_stopped() {
        let mut engine = running_engine(4);
        engine.tick(10);
        engine.stop();

        let mut rec = Recorder::new();
        assert!(engine.clear_if_stopped(&mut rec));
        assert_eq!(engine.spark_count(), 0);
        assert!(matches!(rec.ops[0], DrawOp::Clear { .. }));
    }

    #[test]
    fn test_deferred_clear_suppressed_by_restart() {
        let mut engine = running_engine(5);
        engine.tick(10);
        engine.stop();
        engine.start();
        engine.tick(5);
        let count = engine.spark_count();
        assert!(count > 0);

        // The stale timer fires after the restart: nothing happens
        let mut rec = Recorder::new();
        assert!(!engine.clear_if_stopped(&mut rec));
        assert_eq!(engine.spark_count(), count);
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn test_fifo_eviction_removes_oldest() {
        // Long lifetimes and slow drift so eviction is the only removal path
        let mut config = EmberConfig::default();
        config.tuning.life = (600.0, 900.0);
        config.tuning.vy = (-0.2, -0.1);
        let mut engine = EmberEngine::new(config, 6);
        engine.resize(200.0, 300.0, 1.0);
        engine.start();

        // Far past capacity; the survivors must be the youngest
        engine.tick(600);
        assert_eq!(engine.spark_count(), engine.config().tuning.max_sparks);
        let ages: Vec<u32> = engine.sparks().map(|s| s.age).collect();
        for pair in ages.windows(2) {
            assert!(pair[0] >= pair[1], "collection must stay oldest-first");
        }
    }

    #[test]
    fn test_resize_clamps_dpr_and_floors_size() {
        let mut engine = EmberEngine::new(EmberConfig::default(), 7);
        let size = engine.resize(0.0, -5.0, 3.0);
        assert_eq!(size.width, 1.0);
        assert_eq!(size.height, 1.0);
        assert_eq!(size.dpr, 2.0);
        assert_eq!(size.device(), (2, 2));

        let size = engine.resize(400.5, 600.0, 0.5);
        assert_eq!(size.dpr, 1.0);
        assert_eq!(size.device(), (401, 600));
    }

    #[test]
    fn test_determinism_same_seed_same_sparks() {
        let mut a = running_engine(99);
        let mut b = running_engine(99);
        a.tick(120);
        b.tick(120);

        assert_eq!(a.spark_count(), b.spark_count());
        for (sa, sb) in a.sparks().zip(b.sparks()) {
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn test_render_draws_each_visible_spark() {
        let mut engine = running_engine(8);
        engine.tick(20);

        let mut rec = Recorder::new();
        engine.render(&mut rec);

        assert!(matches!(rec.ops[0], DrawOp::Clear { .. }));
        let visible = engine.sparks().filter(|s| s.opacity() > 0.0).count();
        let cores = engine.sparks().filter(|s| s.hot_core && s.opacity() > 0.0).count();
        assert_eq!(rec.circles(), visible + cores);
    }

    #[test]
    fn test_render_opacity_in_unit_range() {
        let mut engine = running_engine(9);
        engine.tick(45);
        let mut rec = Recorder::new();
        engine.render(&mut rec);
        for op in &rec.ops {
            if let DrawOp::Circle { alpha, .. } = op {
                assert!((0.0..=1.0).contains(alpha), "alpha {alpha}");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_capacity_bound(seed in any::<u64>(), frames in 1u32..240) {
            let mut engine = running_engine(seed);
            let max = engine.config().tuning.max_sparks;
            engine.tick(frames);
            prop_assert!(engine.spark_count() <= max);
        }

        #[test]
        fn prop_live_sparks_stay_inside_margin(seed in any::<u64>(), frames in 1u32..120) {
            let mut engine = running_engine(seed);
            engine.tick(frames);
            let size = engine.surface();
            for spark in engine.sparks() {
                prop_assert!(!spark.out_of_bounds(size.width, size.height));
                prop_assert!(spark.pos.x >= -spark.margin && spark.pos.x <= size.width + spark.margin);
                prop_assert!(spark.pos.y >= -spark.margin && spark.pos.y <= size.height + spark.margin);
            }
        }

        #[test]
        fn prop_zero_surface_never_produces_nan(seed in any::<u64>()) {
            // Zero-area anchor at construction time (layout thrash)
            let mut engine = EmberEngine::new(EmberConfig::default(), seed);
            engine.resize(0.0, 0.0, 0.0);
            engine.start();
            engine.tick(2);
            for spark in engine.sparks() {
                prop_assert!(spark.pos.x.is_finite() && spark.pos.y.is_finite());
                prop_assert!(spark.life > 0.0);
            }
        }

        #[test]
        fn prop_spawn_positions_respect_edge_band(seed in any::<u64>()) {
            let mut engine = running_engine(seed);
            engine.tick(1);
            let size = engine.surface();
            // Age-1 sparks moved at most one velocity+sway step from their
            // clamped spawn point
            for spark in engine.sparks() {
                let slack = spark.vel.length() + 1.0;
                prop_assert!(spark.pos.x >= 0.02 * size.width - slack);
                prop_assert!(spark.pos.x <= 0.98 * size.width + slack);
                prop_assert!(spark.pos.y >= 0.02 * size.height - slack);
                prop_assert!(spark.pos.y <= 0.98 * size.height + slack);
            }
        }
    }
}
