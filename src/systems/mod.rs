//! ECS systems.
//!
//! - `playback` – advances sprite playback cursors
//! - `time` – updates the world clock
pub mod playback;
pub mod time;
