//! Catalog file format.
//!
//! The catalog is one JSON document with three ordered collections, written
//! and read in this order so animations can resolve their frames against
//! sprites that are already registered:
//!
//! ```json
//! {
//!   "Stationary": [
//!     { "handle": 1,
//!       "category": { "category": "hero", "title": "idle" },
//!       "texture": { "source": "hero/idle.png",
//!                    "rect": { "x": 0, "y": 0, "width": 32, "height": 32 } },
//!       "auto_size": false }
//!   ],
//!   "Animated": [
//!     { "handle": 2,
//!       "category": { "category": "hero", "title": "walk" },
//!       "speed": 0.01,
//!       "frames": [1, 3, 4] }
//!   ],
//!   "AutomaticAnimated": [
//!     { "handle": 5, "category": { "category": "fx", "title": "spark" } }
//!   ]
//! }
//! ```
//!
//! `speed` is frames per millisecond, the reciprocal of the authored frame
//! duration. Automatic animations store no frames; they are rediscovered on
//! load.

use serde::{Deserialize, Serialize};

use crate::sprite::categorization::Categorization;
use crate::sprite::descriptor::{AnimatedSprite, SpriteDescriptor, SpriteKind, StationarySprite};
use crate::sprite::geometry::Rect;
use crate::sprite::handle::SpriteHandle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(rename = "Stationary", default)]
    pub stationary: Vec<StationaryNode>,
    #[serde(rename = "Animated", default)]
    pub animated: Vec<AnimatedNode>,
    #[serde(rename = "AutomaticAnimated", default)]
    pub automatic_animated: Vec<AutoAnimatedNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureNode {
    pub source: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationaryNode {
    pub handle: SpriteHandle,
    pub category: Categorization,
    pub texture: TextureNode,
    #[serde(default)]
    pub auto_size: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimatedNode {
    pub handle: SpriteHandle,
    pub category: Categorization,
    pub speed: f32,
    #[serde(default)]
    pub frames: Vec<SpriteHandle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAnimatedNode {
    pub handle: SpriteHandle,
    pub category: Categorization,
}

impl CatalogDocument {
    /// Build a document from live descriptors, each collection sorted by
    /// name so the output is reproducible.
    pub fn from_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a SpriteDescriptor>) -> Self {
        let mut doc = CatalogDocument::default();
        for d in descriptors {
            let category = d.name().clone();
            match d.kind() {
                SpriteKind::Stationary(s) => doc.stationary.push(StationaryNode {
                    handle: d.handle(),
                    category,
                    texture: TextureNode {
                        source: s.bitmap_name().to_string(),
                        rect: s.original_source(),
                    },
                    auto_size: s.auto_size(),
                }),
                SpriteKind::Animated(a) => doc.animated.push(AnimatedNode {
                    handle: d.handle(),
                    category,
                    speed: a.speed(),
                    frames: a.frames().to_vec(),
                }),
                SpriteKind::AutoAnimated(_) => doc.automatic_animated.push(AutoAnimatedNode {
                    handle: d.handle(),
                    category,
                }),
            }
        }
        doc.stationary.sort_by(|a, b| a.category.cmp(&b.category));
        doc.animated.sort_by(|a, b| a.category.cmp(&b.category));
        doc.automatic_animated
            .sort_by(|a, b| a.category.cmp(&b.category));
        doc
    }

    pub fn len(&self) -> usize {
        self.stationary.len() + self.animated.len() + self.automatic_animated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StationaryNode {
    pub fn to_descriptor(&self) -> SpriteDescriptor {
        let rect = (!self.auto_size).then_some(self.texture.rect);
        let mut sprite = StationarySprite::new(self.texture.source.clone(), rect);
        // auto-sized sprites keep the last known rectangle until the bitmap loads
        sprite.rect = self.texture.rect;
        SpriteDescriptor::new(
            self.handle,
            self.category.clone(),
            SpriteKind::Stationary(sprite),
        )
    }
}

impl AnimatedNode {
    /// Descriptor with an empty frame list; the registry assigns `frames`
    /// after validating them.
    pub fn to_descriptor(&self) -> SpriteDescriptor {
        SpriteDescriptor::new(
            self.handle,
            self.category.clone(),
            SpriteKind::Animated(AnimatedSprite::with_speed(self.speed)),
        )
    }
}

impl AutoAnimatedNode {
    pub fn to_descriptor(&self) -> SpriteDescriptor {
        SpriteDescriptor::auto_animated(self.handle, self.category.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_field_names() {
        let json = r#"{
            "Stationary": [
                { "handle": 3,
                  "category": { "category": "hero", "title": "idle" },
                  "texture": { "source": "hero.png",
                               "rect": { "x": 1, "y": 2, "width": 3, "height": 4 } },
                  "auto_size": false }
            ],
            "Animated": [
                { "handle": 4,
                  "category": { "category": "hero", "title": "walk" },
                  "speed": 0.1,
                  "frames": [3, 3] }
            ]
        }"#;
        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(doc.automatic_animated.is_empty());
        let d = doc.stationary[0].to_descriptor();
        assert_eq!(d.handle(), SpriteHandle(3));
        assert_eq!(d.original_source(), Some(Rect::new(1, 2, 3, 4)));
        assert_eq!(doc.animated[0].frames, vec![SpriteHandle(3), SpriteHandle(3)]);
    }

    #[test]
    fn test_collections_sorted_by_name() {
        let b = SpriteDescriptor::stationary(
            SpriteHandle(1),
            Categorization::new("b", "x"),
            "b.png",
            None,
        );
        let a = SpriteDescriptor::stationary(
            SpriteHandle(2),
            Categorization::new("A", "x"),
            "a.png",
            None,
        );
        let doc = CatalogDocument::from_descriptors([&b, &a]);
        assert_eq!(doc.stationary[0].handle, SpriteHandle(2));
        assert_eq!(doc.stationary[1].handle, SpriteHandle(1));
        assert!(doc.stationary[0].auto_size);
    }
}
