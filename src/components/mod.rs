//! ECS components.
//!
//! - `playback` – per-instance sprite playback cursor
pub mod playback;
