//! Atlas substitution for stationary sprites.
//!
//! After an atlas packer has copied a sprite's pixels into a shared atlas
//! bitmap, the sprite can be pointed at the packed copy so the render batch
//! draws many sprites from one bitmap. The substitution is transparent to
//! readers: [`StationarySprite::current_bitmap`] and
//! [`StationarySprite::source_rect`] return the atlas values while it is
//! active, while [`StationarySprite::original_source`] keeps returning the
//! sprite's own rectangle.
//!
//! Reloading the sprite's own bitmap with a new identity drops the
//! substitution, see [`StationarySprite::reload`].

use crate::resources::bitmapstore::Bitmap;
use crate::sprite::descriptor::{SpriteDescriptor, StationarySprite};
use crate::sprite::error::{SpriteError, SpriteResult};
use crate::sprite::geometry::Rect;

/// Where a sprite's pixels live inside an atlas bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasRegion {
    pub bitmap: Bitmap,
    pub rect: Rect,
}

impl StationarySprite {
    pub fn set_atlas(&mut self, bitmap: Bitmap, rect: Rect) {
        self.atlas = Some(AtlasRegion { bitmap, rect });
    }

    pub fn remove_atlas(&mut self) -> Option<AtlasRegion> {
        self.atlas.take()
    }

    pub fn atlas(&self) -> Option<&AtlasRegion> {
        self.atlas.as_ref()
    }

    /// Rectangle to draw from: the atlas region when substituted.
    pub fn source_rect(&self) -> Rect {
        self.atlas.as_ref().map_or(self.rect, |atlas| atlas.rect)
    }

    /// The sprite's own rectangle, unaffected by atlas substitution.
    pub fn original_source(&self) -> Rect {
        self.rect
    }

    /// Bitmap to draw from: the atlas bitmap when substituted, otherwise the
    /// loaded bitmap (if any).
    pub fn current_bitmap(&self) -> Option<&Bitmap> {
        match &self.atlas {
            Some(atlas) => Some(&atlas.bitmap),
            None => self.loaded_bitmap(),
        }
    }
}

impl SpriteDescriptor {
    /// Substitute an atlas region. Animations have no single bitmap and are
    /// rejected.
    pub fn set_atlas(&mut self, bitmap: Bitmap, rect: Rect) -> SpriteResult<()> {
        let name = self.name.clone();
        let stationary = self
            .as_stationary_mut()
            .ok_or(SpriteError::AtlasOnAnimated(name))?;
        stationary.set_atlas(bitmap, rect);
        Ok(())
    }

    pub fn remove_atlas(&mut self) -> SpriteResult<Option<AtlasRegion>> {
        let name = self.name.clone();
        let stationary = self
            .as_stationary_mut()
            .ok_or(SpriteError::AtlasOnAnimated(name))?;
        Ok(stationary.remove_atlas())
    }

    pub fn original_source(&self) -> Option<Rect> {
        self.as_stationary().map(StationarySprite::original_source)
    }
}
