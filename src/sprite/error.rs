//! Error taxonomy for the sprite catalog.
//!
//! Usage errors are precondition violations by the caller (acting on a
//! recycled handle, atlas on an animation, ...). Content errors point at bad
//! catalog data and carry enough context to find it. I/O and format errors
//! come from loading or saving the catalog file.

use std::path::PathBuf;

use thiserror::Error;

use crate::sprite::categorization::Categorization;
use crate::sprite::handle::SpriteHandle;

#[derive(Debug, Error)]
pub enum SpriteError {
    // --- usage ---
    #[error("invalid sprite handle {0}")]
    InvalidHandle(SpriteHandle),

    #[error("sprite handle {handle} exceeds the maximum {max}")]
    HandleOutOfRange {
        handle: SpriteHandle,
        max: SpriteHandle,
    },

    #[error("no sprite registered at {0}")]
    NotFound(SpriteHandle),

    #[error("handle {handle} is already occupied by '{occupant}'")]
    HandleOccupied {
        handle: SpriteHandle,
        occupant: Categorization,
    },

    #[error("name '{name}' is already used by {holder}")]
    NameTaken {
        name: Categorization,
        holder: SpriteHandle,
    },

    #[error("stale reference to {handle}: the sprite stored there is a different instance")]
    StaleReference { handle: SpriteHandle },

    #[error("frame {frame} out of range for '{sprite}' with {count} frames")]
    FrameOutOfRange {
        sprite: Categorization,
        frame: f32,
        count: usize,
    },

    #[error("automatic animation '{0}' cannot be duplicated")]
    DuplicateAutoAnimated(Categorization),

    #[error("atlas substitution requires a stationary sprite, '{0}' is animated")]
    AtlasOnAnimated(Categorization),

    #[error("'{0}' is not an animation")]
    NotAnimated(Categorization),

    // --- content ---
    #[error("animation '{referrer}' ({referrer_handle}) frame {position} references missing sprite {missing}")]
    DanglingFrame {
        missing: SpriteHandle,
        referrer: Categorization,
        referrer_handle: SpriteHandle,
        position: usize,
    },

    #[error("animation '{referrer}' frame {position} references {frame}, which is not a stationary sprite")]
    FrameNotStationary {
        frame: SpriteHandle,
        referrer: Categorization,
        position: usize,
    },

    #[error("animation '{0}' has no frames")]
    EmptyAnimation(Categorization),

    #[error("failed to scan frame directory {path:?}: {source}")]
    FrameScan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    // --- persistence ---
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} catalog entries were rejected on load; saving would drop them")]
    RejectedEntries(usize),

    #[error("malformed catalog document: {0}")]
    Format(#[from] serde_json::Error),
}

pub type SpriteResult<T> = Result<T, SpriteError>;
