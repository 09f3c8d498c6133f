//! Sprite handles and stale-reference keys.
//!
//! A [`SpriteHandle`] is the small integer a descriptor is indexed by in the
//! [`SpriteRegistry`](crate::resources::spriteregistry::SpriteRegistry).
//! Handles are recycled once their descriptor is deleted, so anything that
//! needs to refer to one particular descriptor over time holds a
//! [`SpriteKey`] instead: the handle plus the [`InstanceId`] of the
//! descriptor that owned it when the key was taken.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Registry-assigned identifier of a sprite descriptor.
///
/// Values `<= 0` are invalid. [`SpriteHandle::MIN`] is the first handle the
/// registry hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteHandle(pub i32);

impl SpriteHandle {
    /// The "no sprite" handle.
    pub const INVALID: SpriteHandle = SpriteHandle(0);
    /// Smallest valid handle.
    pub const MIN: SpriteHandle = SpriteHandle(1);
    /// Largest handle the registry accepts. The arena is addressed directly
    /// by handle, so this bounds its size.
    pub const MAX: SpriteHandle = SpriteHandle(1 << 20);

    pub fn new(value: i32) -> Self {
        SpriteHandle(value)
    }

    pub fn is_valid(self) -> bool {
        self.0 >= Self::MIN.0
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Slot index in the registry arena, `None` for invalid handles.
    pub(crate) fn slot(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        SpriteHandle(slot as i32)
    }
}

impl Default for SpriteHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for SpriteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique identity of one descriptor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    pub(crate) fn next() -> Self {
        InstanceId(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle pinned to the descriptor instance that owned it.
///
/// Presenting a key whose instance no longer matches the descriptor stored at
/// the handle is how stale references are detected after recycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub handle: SpriteHandle,
    pub instance: InstanceId,
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.handle, self.instance.0)
    }
}
