//! Sprite playback system.
//!
//! [`sprite_playback`] advances every [`SpritePlayback`] cursor to the
//! current [`WorldTime::tick`]. Cursors whose sprite has been deleted, or
//! whose handle now belongs to a different sprite, are unbound.
//!
//! # Related
//!
//! - [`crate::components::playback::SpritePlayback`] – the cursor state machine
//! - [`crate::resources::spriteregistry::SpriteRegistry`] – resolves cursor keys

use bevy_ecs::prelude::*;

use crate::components::playback::SpritePlayback;
use crate::resources::spriteregistry::SpriteRegistry;
use crate::resources::worldtime::WorldTime;

/// Advance sprite playback.
///
/// Contract
/// - Reads [`WorldTime`] for the current tick.
/// - Resolves each cursor's sprite through [`SpriteRegistry`]; never mutates it.
/// - Mutates [`SpritePlayback`] state only.
pub fn sprite_playback(
    mut query: Query<(Entity, &mut SpritePlayback)>,
    registry: Res<SpriteRegistry>,
    time: Res<WorldTime>,
) {
    for (entity, mut cursor) in query.iter_mut() {
        let Some(key) = cursor.sprite() else {
            continue;
        };
        match registry.get_key(key) {
            Some(sprite) => cursor.update(time.tick, sprite),
            None => {
                log::debug!("Entity {:?}: sprite {} is gone, unbinding", entity, key);
                cursor.unbind();
            }
        }
    }
}
