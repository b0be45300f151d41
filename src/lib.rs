//! Deterministic, tick-driven maze-chase simulation engine.
//!
//! One player evades four ghosts on a fixed tile grid. The crate owns the
//! simulation only: ghost behavior and targeting, grid-constrained
//! movement, Scatter/Chase wave scheduling, pen release gating, and
//! collision outcomes. Rendering, input capture, and sound are
//! collaborators that drive [`engine::GameEngine::step`] and read
//! snapshots and events.

pub mod constants;
pub mod engine;
pub mod level;
pub mod types;
