//! Sprite descriptors.
//!
//! A [`SpriteDescriptor`] carries the fields every sprite shares (handle,
//! instance identity, name, pixel size) and a closed [`SpriteKind`] for the
//! variant-specific part:
//!
//! - [`SpriteKind::Stationary`] – one region of one bitmap.
//! - [`SpriteKind::Animated`] – an ordered list of handles of other
//!   (stationary) descriptors plus a playback speed.
//! - [`SpriteKind::AutoAnimated`] – like `Animated`, but the frame list is
//!   discovered from a directory of numbered files and never persisted.
//!
//! Animations hold their frames as handles only. Resolving a frame to a
//! descriptor goes through the registry, which is also the only place that
//! assigns frame lists so it can validate them.

use smallvec::SmallVec;

use crate::resources::bitmapstore::{Bitmap, BitmapLoader};
use crate::sprite::atlas::AtlasRegion;
use crate::sprite::categorization::Categorization;
use crate::sprite::error::{SpriteError, SpriteResult};
use crate::sprite::geometry::{Rect, SpriteSize};
use crate::sprite::handle::{InstanceId, SpriteHandle, SpriteKey};

/// Frame duration given to automatic animations, in milliseconds.
pub const DEFAULT_AUTO_FRAME_MS: f32 = 100.0;

pub type FrameList = SmallVec<[SpriteHandle; 8]>;

#[derive(Debug, Clone, Default)]
pub(crate) enum BitmapSlot {
    #[default]
    Unloaded,
    Loaded(Bitmap),
    Missing,
}

/// A single bitmap region.
#[derive(Debug, Clone)]
pub struct StationarySprite {
    pub(crate) bitmap_name: String,
    pub(crate) auto_size: bool,
    pub(crate) rect: Rect,
    pub(crate) atlas: Option<AtlasRegion>,
    pub(crate) bitmap: BitmapSlot,
}

impl StationarySprite {
    /// `rect == None` sizes the sprite to the whole bitmap once it loads.
    pub fn new(bitmap_name: impl Into<String>, rect: Option<Rect>) -> Self {
        Self {
            bitmap_name: bitmap_name.into(),
            auto_size: rect.is_none(),
            rect: rect.unwrap_or_default(),
            atlas: None,
            bitmap: BitmapSlot::Unloaded,
        }
    }

    pub fn bitmap_name(&self) -> &str {
        &self.bitmap_name
    }

    pub fn auto_size(&self) -> bool {
        self.auto_size
    }

    /// The bitmap currently held, if it has been loaded.
    pub fn loaded_bitmap(&self) -> Option<&Bitmap> {
        match &self.bitmap {
            BitmapSlot::Loaded(bitmap) => Some(bitmap),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.bitmap, BitmapSlot::Missing)
    }

    /// Return the current bitmap, loading it on first use and reloading it
    /// when the loader no longer considers it valid.
    ///
    /// A bitmap that failed to load stays missing until [`Self::reload`].
    pub fn ensure_bitmap(&mut self, loader: &mut dyn BitmapLoader) -> Option<Bitmap> {
        match &self.bitmap {
            BitmapSlot::Loaded(bitmap) if loader.is_valid(bitmap) => Some(bitmap.clone()),
            BitmapSlot::Missing => None,
            _ => self.reload(loader),
        }
    }

    /// Load the bitmap again. A new bitmap identity drops any atlas
    /// substitution since the packed copy no longer matches.
    pub fn reload(&mut self, loader: &mut dyn BitmapLoader) -> Option<Bitmap> {
        let previous = match &self.bitmap {
            BitmapSlot::Loaded(bitmap) => Some(bitmap.id),
            _ => None,
        };
        match loader.load(&self.bitmap_name) {
            Ok(bitmap) => {
                if previous.is_some_and(|id| id != bitmap.id) && self.atlas.take().is_some() {
                    log::debug!(
                        "Bitmap '{}' reloaded, atlas substitution cleared",
                        self.bitmap_name
                    );
                }
                if self.auto_size {
                    self.rect = Rect::whole(bitmap.width, bitmap.height);
                }
                self.bitmap = BitmapSlot::Loaded(bitmap.clone());
                Some(bitmap)
            }
            Err(e) => {
                log::warn!("Sprite bitmap '{}' unavailable: {}", self.bitmap_name, e);
                if previous.is_some() {
                    self.atlas = None;
                }
                self.bitmap = BitmapSlot::Missing;
                None
            }
        }
    }
}

/// Explicit or directory-derived frame sequence.
#[derive(Debug, Clone)]
pub struct AnimatedSprite {
    /// Frames per millisecond.
    pub(crate) speed: f32,
    pub(crate) frames: FrameList,
}

impl AnimatedSprite {
    /// Animation advancing one frame every `frame_ms` milliseconds.
    pub fn from_frame_duration(frame_ms: f32) -> Self {
        let speed = if frame_ms > 0.0 { 1.0 / frame_ms } else { 0.0 };
        Self::with_speed(speed)
    }

    /// Animation with speed given directly in frames per millisecond.
    pub fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            frames: FrameList::new(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Milliseconds per frame, `None` for a stopped animation.
    pub fn frame_duration(&self) -> Option<f32> {
        (self.speed > 0.0).then(|| 1.0 / self.speed)
    }

    pub fn frames(&self) -> &[SpriteHandle] {
        &self.frames
    }
}

#[derive(Debug, Clone)]
pub enum SpriteKind {
    Stationary(StationarySprite),
    Animated(AnimatedSprite),
    AutoAnimated(AnimatedSprite),
}

/// Catalog record for one sprite resource.
#[derive(Debug)]
pub struct SpriteDescriptor {
    handle: SpriteHandle,
    instance: InstanceId,
    pub(crate) name: Categorization,
    pub(crate) size: SpriteSize,
    pub(crate) kind: SpriteKind,
}

impl SpriteDescriptor {
    pub fn new(handle: SpriteHandle, name: Categorization, kind: SpriteKind) -> Self {
        let size = match &kind {
            SpriteKind::Stationary(s) => s.rect.size(),
            _ => SpriteSize::default(),
        };
        Self {
            handle,
            instance: InstanceId::next(),
            name,
            size,
            kind,
        }
    }

    pub fn stationary(
        handle: SpriteHandle,
        name: Categorization,
        bitmap_name: impl Into<String>,
        rect: Option<Rect>,
    ) -> Self {
        Self::new(
            handle,
            name,
            SpriteKind::Stationary(StationarySprite::new(bitmap_name, rect)),
        )
    }

    /// Empty animation; frames are assigned through the registry.
    pub fn animated(handle: SpriteHandle, name: Categorization, frame_ms: f32) -> Self {
        Self::new(
            handle,
            name,
            SpriteKind::Animated(AnimatedSprite::from_frame_duration(frame_ms)),
        )
    }

    /// Directory-driven animation; frames are discovered through the registry.
    pub fn auto_animated(handle: SpriteHandle, name: Categorization) -> Self {
        Self::new(
            handle,
            name,
            SpriteKind::AutoAnimated(AnimatedSprite::from_frame_duration(
                DEFAULT_AUTO_FRAME_MS,
            )),
        )
    }

    pub fn handle(&self) -> SpriteHandle {
        self.handle
    }

    pub fn key(&self) -> SpriteKey {
        SpriteKey {
            handle: self.handle,
            instance: self.instance,
        }
    }

    pub fn name(&self) -> &Categorization {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.name.category
    }

    pub fn title(&self) -> &str {
        &self.name.title
    }

    pub fn size(&self) -> SpriteSize {
        self.size
    }

    pub fn kind(&self) -> &SpriteKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SpriteKind::Stationary(_) => "stationary",
            SpriteKind::Animated(_) => "animated",
            SpriteKind::AutoAnimated(_) => "automatic",
        }
    }

    pub fn as_stationary(&self) -> Option<&StationarySprite> {
        match &self.kind {
            SpriteKind::Stationary(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_stationary_mut(&mut self) -> Option<&mut StationarySprite> {
        match &mut self.kind {
            SpriteKind::Stationary(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_animation(&self) -> Option<&AnimatedSprite> {
        match &self.kind {
            SpriteKind::Animated(a) | SpriteKind::AutoAnimated(a) => Some(a),
            SpriteKind::Stationary(_) => None,
        }
    }

    pub(crate) fn as_animation_mut(&mut self) -> Option<&mut AnimatedSprite> {
        match &mut self.kind {
            SpriteKind::Animated(a) | SpriteKind::AutoAnimated(a) => Some(a),
            SpriteKind::Stationary(_) => None,
        }
    }

    /// Frames advanced per millisecond of playback. Stationary sprites never advance.
    pub fn speed(&self) -> f32 {
        self.as_animation().map_or(0.0, AnimatedSprite::speed)
    }

    /// 1 for stationary sprites, otherwise the length of the frame list.
    pub fn frame_count(&self) -> usize {
        match &self.kind {
            SpriteKind::Stationary(_) => 1,
            SpriteKind::Animated(a) | SpriteKind::AutoAnimated(a) => a.frames.len(),
        }
    }

    /// Handle of the descriptor shown at frame `index`.
    ///
    /// A stationary sprite is its own single frame for any index.
    pub fn frame_handle(&self, index: usize) -> SpriteResult<SpriteHandle> {
        match &self.kind {
            SpriteKind::Stationary(_) => Ok(self.handle),
            SpriteKind::Animated(a) | SpriteKind::AutoAnimated(a) => {
                a.frames
                    .get(index)
                    .copied()
                    .ok_or_else(|| SpriteError::FrameOutOfRange {
                        sprite: self.name.clone(),
                        frame: index as f32,
                        count: a.frames.len(),
                    })
            }
        }
    }

    /// Load (or revalidate) the bitmap of a stationary sprite and refresh its size.
    pub(crate) fn ensure_bitmap(&mut self, loader: &mut dyn BitmapLoader) -> Option<Bitmap> {
        let stationary = self.as_stationary_mut()?;
        let bitmap = stationary.ensure_bitmap(loader);
        let size = stationary.rect.size();
        self.size = size;
        bitmap
    }

    pub(crate) fn reload_bitmap(&mut self, loader: &mut dyn BitmapLoader) -> Option<Bitmap> {
        let stationary = self.as_stationary_mut()?;
        let bitmap = stationary.reload(loader);
        let size = stationary.rect.size();
        self.size = size;
        bitmap
    }

    /// Copy this descriptor under a new handle and a fresh identity.
    ///
    /// Loaded bitmaps and atlas substitutions are not carried over; the copy
    /// loads lazily like any new descriptor.
    pub fn duplicate(&self, handle: SpriteHandle) -> SpriteResult<SpriteDescriptor> {
        let kind = match &self.kind {
            SpriteKind::Stationary(s) => SpriteKind::Stationary(StationarySprite {
                atlas: None,
                bitmap: BitmapSlot::Unloaded,
                ..s.clone()
            }),
            SpriteKind::Animated(a) => SpriteKind::Animated(a.clone()),
            SpriteKind::AutoAnimated(_) => {
                return Err(SpriteError::DuplicateAutoAnimated(self.name.clone()));
            }
        };
        Ok(SpriteDescriptor {
            handle,
            instance: InstanceId::next(),
            name: self.name.clone(),
            size: self.size,
            kind,
        })
    }
}
