//! Mouth strip rendering and speech amplitude visualization.

pub mod strip;
pub mod visualizer;

pub use strip::{Mouth, Rgb};
pub use visualizer::{play_clip, FramePacer, MouthVisualizer};
