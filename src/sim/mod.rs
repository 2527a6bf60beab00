//! Deterministic ember simulation
//!
//! All animation logic lives here. This module must be pure and deterministic:
//! - Frame-count stepping only (the host converts wall time to frames)
//! - Seeded RNG only
//! - No rendering or platform dependencies; drawing is a read-only pass

pub mod engine;
pub mod spark;

pub use engine::{EmberEngine, SurfaceSize};
pub use spark::Spark;
