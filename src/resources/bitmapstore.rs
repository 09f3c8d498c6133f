//! Bitmap loading for sprite descriptors.
//!
//! Stationary sprites name their bitmap by a string key. The registry never
//! decodes pixels itself; it asks a [`BitmapLoader`] to turn the key into a
//! [`Bitmap`] the first time the sprite is read, and asks again whenever the
//! loader reports the previously returned bitmap as no longer valid.
//!
//! [`BitmapStore`] is the stock loader. It resolves keys either against
//! directories on disk (reading image headers with the `image` crate) or
//! against an in-memory table of dimensions, which is what tools and tests
//! use when no pixel data is at hand. A directory store searches its roots in
//! order and uses the first one holding the file.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Identity of one successful load. Reloading yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapId(pub u64);

/// A loaded bitmap as seen by the registry and the render batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub id: BitmapId,
    pub name: Arc<str>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum BitmapError {
    #[error("bitmap not found: {0}")]
    NotFound(String),
    #[error("failed to decode bitmap {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Content loader used by the registry to resolve bitmap names.
pub trait BitmapLoader: Send + Sync {
    /// Load (or return the cached) bitmap for `name`.
    fn load(&mut self, name: &str) -> Result<Bitmap, BitmapError>;
    /// Whether a bitmap returned earlier is still the current one.
    fn is_valid(&self, bitmap: &Bitmap) -> bool;
    /// Whether `name` could be loaded. Must not load anything.
    fn exists(&self, name: &str) -> bool;
    /// Drop a loaded bitmap so bitmaps handed out for `name` become invalid.
    fn invalidate(&mut self, name: &str);
}

#[derive(Debug)]
enum BitmapSource {
    Directory(Vec<PathBuf>),
    Memory(FxHashMap<String, (u32, u32)>),
}

/// Loaded bitmaps keyed by name.
#[derive(Debug)]
pub struct BitmapStore {
    source: BitmapSource,
    loaded: FxHashMap<String, Bitmap>,
    next_id: u64,
}

impl BitmapStore {
    /// Store resolving names relative to `root`.
    pub fn from_directory(root: impl Into<PathBuf>) -> Self {
        Self {
            source: BitmapSource::Directory(vec![root.into()]),
            loaded: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Store backed by a table of known dimensions.
    pub fn in_memory() -> Self {
        Self {
            source: BitmapSource::Memory(FxHashMap::default()),
            loaded: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Also look for bitmaps under `root`, after the roots already given.
    ///
    /// Has no effect on an in-memory store.
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        if let BitmapSource::Directory(roots) = &mut self.source {
            let root = root.into();
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        self
    }

    /// Register dimensions for `name` in an in-memory store.
    ///
    /// Has no effect on a directory-backed store.
    pub fn insert_dimensions(&mut self, name: impl Into<String>, width: u32, height: u32) {
        if let BitmapSource::Memory(table) = &mut self.source {
            table.insert(name.into(), (width, height));
        }
    }

    /// Forget every loaded bitmap.
    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    /// Number of bitmaps currently loaded.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn dimensions(&self, name: &str) -> Result<(u32, u32), BitmapError> {
        match &self.source {
            BitmapSource::Directory(roots) => {
                let path = find_file(roots, name)
                    .ok_or_else(|| BitmapError::NotFound(name.to_string()))?;
                image::image_dimensions(&path).map_err(|source| BitmapError::Decode {
                    name: name.to_string(),
                    source,
                })
            }
            BitmapSource::Memory(table) => table
                .get(name)
                .copied()
                .ok_or_else(|| BitmapError::NotFound(name.to_string())),
        }
    }
}

impl BitmapLoader for BitmapStore {
    fn load(&mut self, name: &str) -> Result<Bitmap, BitmapError> {
        if let Some(bitmap) = self.loaded.get(name) {
            return Ok(bitmap.clone());
        }
        let (width, height) = self.dimensions(name)?;
        let bitmap = Bitmap {
            id: BitmapId(self.next_id),
            name: Arc::from(name),
            width,
            height,
        };
        self.next_id += 1;
        debug!("Loaded bitmap '{}' ({}x{})", name, width, height);
        self.loaded.insert(name.to_string(), bitmap.clone());
        Ok(bitmap)
    }

    fn is_valid(&self, bitmap: &Bitmap) -> bool {
        self.loaded
            .get(bitmap.name.as_ref())
            .is_some_and(|current| current.id == bitmap.id)
    }

    fn exists(&self, name: &str) -> bool {
        match &self.source {
            BitmapSource::Directory(roots) => find_file(roots, name).is_some(),
            BitmapSource::Memory(table) => table.contains_key(name),
        }
    }

    fn invalidate(&mut self, name: &str) {
        if self.loaded.remove(name).is_some() {
            debug!("Invalidated bitmap '{}'", name);
        }
    }
}

fn find_file(roots: &[PathBuf], name: &str) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(name))
        .find(|path| path.is_file())
}
