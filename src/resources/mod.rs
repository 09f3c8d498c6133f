//! ECS resources made available to systems.
//!
//! Overview
//! - `bitmapstore` – bitmap loading behind the `BitmapLoader` seam
//! - `catalogconfig` – INI configuration for catalog and content locations
//! - `spriteregistry` – the sprite catalog: handles, names, animations, persistence
//! - `worldtime` – simulation time, delta and millisecond tick
pub mod bitmapstore;
pub mod catalogconfig;
pub mod spriteregistry;
pub mod worldtime;
