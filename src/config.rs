//! Data-driven ember tuning
//!
//! The spawn layout went through many visual iterations on the original
//! page ("7-shape", "top + right", "corner hotspot"). The mechanism
//! (weighted normalized bands with jitter) is fixed; the geometry is
//! data, so presets here are config tables rather than code paths. The
//! host may replace them wholesale from an embedded JSON block.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::render::Rgb;

/// Inclusive (min, max) sampling range
pub type Range = (f32, f32);

/// Draw a uniform sample from an inclusive range; tolerates inverted or
/// collapsed ranges.
pub(crate) fn sample<R: Rng>(rng: &mut R, (lo, hi): Range) -> f32 {
    if hi <= lo {
        return lo;
    }
    rng.random_range(lo..=hi)
}

/// A normalized spawn band: fractions of the surface, not pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRegion {
    /// Horizontal band as fractions of surface width
    pub nx: Range,
    /// Vertical band as fractions of surface height
    pub ny: Range,
    /// Relative selection weight
    pub weight: f32,
    /// Max random offset added to each normalized coordinate
    pub jitter: f32,
    /// Out-of-bounds cull margin in logical pixels for sparks born here
    pub margin: f32,
}

/// Motion, brightness and lifetime ranges shared by all regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmberTuning {
    /// New sparks per simulation frame
    pub spawn_per_frame: u32,
    /// Hard capacity bound; insertion beyond it evicts the oldest spark
    pub max_sparks: usize,
    /// Horizontal velocity, pixels per frame
    pub vx: Range,
    /// Vertical velocity, pixels per frame (negative = rising)
    pub vy: Range,
    /// Draw radius, pixels
    pub radius: Range,
    /// Lifetime in frames
    pub life: Range,
    /// Initial opacity scalar
    pub base_alpha: Range,
    /// Per-spark twinkle frequency, radians per frame of age
    pub twinkle_rate: Range,
    /// Lateral sway amplitude, pixels per frame
    pub sway_amp: f32,
    /// Sway frequency over age
    pub sway_freq: f32,
    /// Sway phase shift per pixel of x position
    pub sway_shift: f32,
    /// Chance per spark per frame of drawing the bright inner core
    pub hot_core_chance: f32,
    /// Ember body color
    pub color: Rgb,
    /// Hot core color
    pub core_color: Rgb,
}

impl Default for EmberTuning {
    fn default() -> Self {
        Self {
            spawn_per_frame: 2,
            max_sparks: 60,
            vx: (-0.15, 0.15),
            vy: (-0.9, -0.4),
            radius: (0.8, 2.2),
            life: (30.0, 60.0),
            base_alpha: (0.55, 0.95),
            twinkle_rate: (0.18, 0.45),
            sway_amp: 0.22,
            sway_freq: 0.11,
            sway_shift: 0.015,
            hot_core_chance: 0.3,
            color: Rgb::new(255, 170, 90),
            core_color: Rgb::new(255, 224, 168),
        }
    }
}

impl EmberTuning {
    /// Clamp fields the simulation depends on for safety: lifetimes stay
    /// positive, chances stay in [0, 1], at least one spark of headroom.
    pub fn sanitize(&mut self) {
        self.life.0 = self.life.0.max(1.0);
        self.life.1 = self.life.1.max(self.life.0);
        self.max_sparks = self.max_sparks.max(1);
        self.hot_core_chance = self.hot_core_chance.clamp(0.0, 1.0);
        self.base_alpha.0 = self.base_alpha.0.clamp(0.0, 1.0);
        self.base_alpha.1 = self.base_alpha.1.clamp(self.base_alpha.0, 1.0);
    }
}

/// One load-time ambient ember: a CSS-animated span, not a simulated
/// spark. The host writes these as custom properties on `.ember` spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientEmber {
    /// Horizontal position, percent of the book hotspot
    pub x: f32,
    /// Vertical position, percent
    pub y: f32,
    /// Span size, pixels
    pub size: f32,
    /// Animation duration, seconds
    pub duration: f32,
    /// Animation delay, seconds
    pub delay: f32,
}

/// Sampling ranges for the ambient layer that fades in once after load,
/// clustered around the sigil so it reads as stag-specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientConfig {
    pub count: usize,
    /// Percent of hotspot width
    pub x: Range,
    /// Percent of hotspot height
    pub y: Range,
    /// Pixels
    pub size: Range,
    /// Seconds
    pub duration: Range,
    /// Seconds
    pub delay: Range,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            count: 14,
            x: (36.0, 64.0),
            y: (44.0, 92.0),
            size: (6.0, 14.0),
            duration: (2.8, 5.6),
            delay: (0.0, 2.6),
        }
    }
}

impl AmbientConfig {
    /// Draw the full set of ambient embers for one page load
    pub fn spawn<R: Rng>(&self, rng: &mut R) -> Vec<AmbientEmber> {
        (0..self.count)
            .map(|_| AmbientEmber {
                x: sample(rng, self.x),
                y: sample(rng, self.y),
                size: sample(rng, self.size),
                duration: sample(rng, self.duration),
                delay: sample(rng, self.delay),
            })
            .collect()
    }
}

/// Full engine configuration: shared tuning plus the spawn layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmberConfig {
    pub tuning: EmberTuning,
    pub regions: Vec<SpawnRegion>,
}

impl Default for EmberConfig {
    /// The shipped layout: one band over the sigil, mid-page
    fn default() -> Self {
        Self {
            tuning: EmberTuning::default(),
            regions: vec![SpawnRegion {
                nx: (0.35, 0.65),
                ny: (0.60, 0.80),
                weight: 1.0,
                jitter: 0.03,
                margin: 24.0,
            }],
        }
    }
}

impl EmberConfig {
    /// "Top + right" layout from the design iterations: 60% of sparks
    /// along the top edge, 40% down the right side.
    pub fn top_right() -> Self {
        Self {
            tuning: EmberTuning::default(),
            regions: vec![
                SpawnRegion {
                    nx: (0.05, 0.95),
                    ny: (0.02, 0.12),
                    weight: 0.6,
                    jitter: 0.02,
                    margin: 12.0,
                },
                SpawnRegion {
                    nx: (0.86, 0.98),
                    ny: (0.05, 0.95),
                    weight: 0.4,
                    jitter: 0.02,
                    margin: 40.0,
                },
            ],
        }
    }

    /// Three-way split used for the "7-shape" over the book spine
    pub fn seven_shape() -> Self {
        Self {
            tuning: EmberTuning::default(),
            regions: vec![
                SpawnRegion {
                    nx: (0.15, 0.85),
                    ny: (0.04, 0.14),
                    weight: 0.25,
                    jitter: 0.025,
                    margin: 16.0,
                },
                SpawnRegion {
                    nx: (0.78, 0.95),
                    ny: (0.10, 0.70),
                    weight: 0.40,
                    jitter: 0.025,
                    margin: 32.0,
                },
                SpawnRegion {
                    nx: (0.55, 0.80),
                    ny: (0.65, 0.92),
                    weight: 0.35,
                    jitter: 0.03,
                    margin: 24.0,
                },
            ],
        }
    }

    /// Parse a config override (the host embeds one as an inline JSON block)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Enforce invariants after construction or deserialization
    pub fn sanitize(&mut self) {
        self.tuning.sanitize();
        if self.regions.is_empty() {
            self.regions = Self::default().regions;
        }
        for region in &mut self.regions {
            region.weight = region.weight.max(0.0);
            region.jitter = region.jitter.clamp(0.0, 0.1);
            region.margin = region.margin.max(0.0);
        }
        // All-zero weights would make selection impossible
        if self.regions.iter().all(|r| r.weight <= 0.0) {
            for region in &mut self.regions {
                region.weight = 1.0;
            }
        }
    }

    /// Pick a spawn region by weighted draw (single uniform sample walked
    /// against cumulative weights).
    pub fn pick_region<R: Rng>(&self, rng: &mut R) -> &SpawnRegion {
        let total: f32 = self.regions.iter().map(|r| r.weight).sum();
        let mut roll = rng.random::<f32>() * total;
        let mut fallback = None;
        for region in &self.regions {
            if region.weight <= 0.0 {
                continue;
            }
            roll -= region.weight;
            if roll <= 0.0 {
                return region;
            }
            fallback = Some(region);
        }
        // Float round-off can leave a sliver; fall through to the last
        // selectable region
        fallback.expect("sanitize keeps at least one positive weight")
    }
}
