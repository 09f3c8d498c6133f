//! Sprite catalog library.
//!
//! The in-memory catalog of every sprite resource a rendering client uses:
//! handle allocation, a case-insensitive name index, animations that
//! reference stationary frames, atlas substitution, persistence, and the
//! per-instance playback cursors driven every tick.
//!
//! - [`sprite`] – descriptor data model, file format and errors
//! - [`resources`] – the registry, bitmap loading, configuration and time
//! - [`components`] – the playback cursor component
//! - [`systems`] – ECS systems advancing playback and time

pub mod components;
pub mod resources;
pub mod sprite;
pub mod systems;
