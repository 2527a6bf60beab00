//! Stag Lore - landing page animation core
//!
//! Core modules:
//! - `mapper`: cover-fit anchor mapping for the book hotspot
//! - `sim`: deterministic ember simulation (spawn, drift, fade, cull)
//! - `config`: data-driven spawn regions and tuning
//! - `render`: drawing surface abstraction (2D canvas in the browser)
//! - `reader`: lore reader state machine (spreads, page turns)

pub mod config;
pub mod mapper;
pub mod reader;
pub mod render;
pub mod sim;

pub use config::{AmbientConfig, AmbientEmber, EmberConfig, EmberTuning, SpawnRegion};
pub use mapper::{AnchorRect, SpriteBox, SpriteMap, Viewport};
pub use reader::{Page, Reader, Spread};
pub use sim::{EmberEngine, Spark, SurfaceSize};

/// Animation timing constants
pub mod consts {
    /// Nominal frame duration at display refresh (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Maximum simulation frames consumed per animation callback
    pub const MAX_CATCHUP_FRAMES: u32 = 4;

    /// Device pixel ratio cap (bounds backing-store cost on dense displays)
    pub const DPR_MAX: f32 = 2.0;

    /// Delay before the canvas is wiped after stop() (ms)
    pub const CLEAR_DELAY_MS: i32 = 120;
    /// Stillness beat before the page is marked ready (ms)
    pub const READY_DELAY_MS: i32 = 480;
    /// Ambient ember spans appear shortly after the ready beat (ms)
    pub const EMBER_WARMUP_MS: i32 = 520;
    /// Page-turn animation length, must match the CSS keyframes (ms)
    pub const FLIP_DURATION_MS: i32 = 1260;

    /// Normalized spawn coordinates stay inside this band so sparks never
    /// sit flush against the surface edge
    pub const SPAWN_EDGE_MIN: f32 = 0.02;
    pub const SPAWN_EDGE_MAX: f32 = 0.98;
}
