//! Sprite playback cursor component.
//!
//! A [`SpritePlayback`] tracks how far one sprite instance has advanced
//! through its descriptor's frames. It refers to the descriptor by
//! [`SpriteKey`] only; descriptors are shared by any number of cursors and
//! are never modified by them.
//!
//! Playback follows [`AnimationMode`]:
//!
//! - `None` – the frame does not move.
//! - `Loop` – the frame advances by `elapsed_ms * speed` and wraps around,
//!   however many loops the elapsed time spans.
//! - `LoopOnce` – like `Loop` until the end is passed, then the cursor stops
//!   and rests on the first frame.
//!
//! # Related
//!
//! - [`crate::systems::playback::sprite_playback`] – calls [`SpritePlayback::update`] every tick
//! - [`crate::resources::spriteregistry::SpriteRegistry::frame_source`] – what to draw for a cursor

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::resources::spriteregistry::{SpriteRegistry, SpriteSource};
use crate::sprite::descriptor::SpriteDescriptor;
use crate::sprite::error::{SpriteError, SpriteResult};
use crate::sprite::handle::SpriteKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationMode {
    #[default]
    None,
    Loop,
    LoopOnce,
}

#[derive(Component, Debug, Clone, Default)]
pub struct SpritePlayback {
    sprite: Option<SpriteKey>,
    frame: f32,
    mode: AnimationMode,
    last_tick: u64,
}

impl SpritePlayback {
    /// An unbound cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor bound to `sprite`, stopped on its first frame.
    pub fn bound(sprite: &SpriteDescriptor) -> Self {
        let mut cursor = Self::new();
        cursor.bind(sprite);
        cursor
    }

    /// Bind to `sprite` and rewind to frame 0.
    ///
    /// Rebinding the sprite already bound keeps the mode and tick; binding a
    /// different one also stops playback.
    pub fn bind(&mut self, sprite: &SpriteDescriptor) {
        let key = sprite.key();
        self.frame = 0.0;
        if self.sprite != Some(key) {
            self.sprite = Some(key);
            self.mode = AnimationMode::None;
            self.last_tick = 0;
        }
    }

    pub fn unbind(&mut self) {
        *self = Self::default();
    }

    pub fn sprite(&self) -> Option<SpriteKey> {
        self.sprite
    }

    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    /// Fractional frame position.
    pub fn frame(&self) -> f32 {
        self.frame
    }

    /// Whole frame currently shown.
    pub fn frame_index(&self) -> usize {
        self.frame as usize
    }

    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    /// Switch mode, counting elapsed time from `tick`.
    pub fn play(&mut self, mode: AnimationMode, tick: u64) {
        self.mode = mode;
        self.last_tick = tick;
    }

    pub fn stop(&mut self) {
        self.mode = AnimationMode::None;
    }

    /// Jump to `frame`, which must lie in `[0, frame_count)`.
    pub fn set_frame(&mut self, frame: f32, sprite: &SpriteDescriptor) -> SpriteResult<()> {
        let count = sprite.frame_count();
        if !(0.0..count as f32).contains(&frame) {
            log::error!("Frame {} out of range for '{}'", frame, sprite.name());
            return Err(SpriteError::FrameOutOfRange {
                sprite: sprite.name().clone(),
                frame,
                count,
            });
        }
        self.frame = frame;
        Ok(())
    }

    /// Advance playback to `tick` (milliseconds) against the bound `sprite`.
    pub fn update(&mut self, tick: u64, sprite: &SpriteDescriptor) {
        if self.sprite != Some(sprite.key()) {
            log::warn!("Cursor bound to {:?} updated against {}", self.sprite, sprite.key());
            return;
        }
        let elapsed = tick.saturating_sub(self.last_tick);
        self.last_tick = tick;

        let count = sprite.frame_count();
        if self.mode == AnimationMode::None || count == 0 {
            return;
        }

        let new_frame = self.frame as f64 + elapsed as f64 * sprite.speed() as f64;
        if new_frame < count as f64 {
            self.frame = new_frame as f32;
        } else if self.mode == AnimationMode::LoopOnce {
            self.mode = AnimationMode::None;
            self.frame = 0.0;
        } else {
            self.frame = new_frame.rem_euclid(count as f64) as f32;
        }
    }

    /// What to draw for the current frame.
    pub fn source(&self, registry: &mut SpriteRegistry) -> Option<SpriteSource> {
        registry.frame_source(self.sprite?, self.frame_index())
    }
}
