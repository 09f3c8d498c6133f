//! Sprite registry resource.
//!
//! The catalog of every sprite descriptor known to the client. Descriptors
//! live in an arena addressed directly by [`SpriteHandle`]; a second,
//! derived index maps `category -> title -> handle` case-insensitively. Every
//! operation that touches a slot or a descriptor's name updates both within
//! the same call, so `get(d.handle())` and `get_by_name(d.category(), d.title())`
//! always agree.
//!
//! # Lifecycle
//!
//! 1. Construct with a [`BitmapLoader`] and insert as a bevy resource.
//! 2. [`SpriteRegistry::load`] populates it from a catalog file.
//! 3. Authoring tools mutate it ([`add`](SpriteRegistry::add),
//!    [`rename`](SpriteRegistry::rename), [`delete`](SpriteRegistry::delete),
//!    [`duplicate`](SpriteRegistry::duplicate), ...).
//! 4. [`SpriteRegistry::save`] flushes it back to disk.
//!
//! # Notifications
//!
//! Listeners registered with [`SpriteRegistry::add_listener`] receive a
//! [`RegistryEvent`] for every registration and removal, synchronously and
//! with mutable access to the registry. Events raised while a listener runs
//! are queued and delivered once it returns, before the outermost call
//! returns.
//!
//! # Related
//!
//! - [`crate::components::playback::SpritePlayback`] – per-instance playback cursor
//! - [`crate::systems::playback::sprite_playback`] – advances cursors every tick

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::resources::bitmapstore::{Bitmap, BitmapLoader};
use crate::sprite::atlas::AtlasRegion;
use crate::sprite::categorization::{Categorization, first_free_name, fold};
use crate::sprite::descriptor::{FrameList, SpriteDescriptor, SpriteKind};
use crate::sprite::error::{SpriteError, SpriteResult};
use crate::sprite::geometry::{Rect, SpriteSize};
use crate::sprite::handle::{SpriteHandle, SpriteKey};
use crate::sprite::persist::CatalogDocument;

/// Registry notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// Every registration, including bulk loading.
    Added { key: SpriteKey, name: Categorization },
    /// Registrations outside of bulk loading, i.e. created by authoring.
    AddedNew { key: SpriteKey, name: Categorization },
    Removed { key: SpriteKey, name: Categorization },
}

impl RegistryEvent {
    pub fn key(&self) -> SpriteKey {
        match self {
            RegistryEvent::Added { key, .. }
            | RegistryEvent::AddedNew { key, .. }
            | RegistryEvent::Removed { key, .. } => *key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&mut SpriteRegistry, &RegistryEvent) + Send + Sync>;

/// What the render batch needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSource {
    /// `None` when the bitmap is missing; draw nothing.
    pub bitmap: Option<Bitmap>,
    pub source: Rect,
    pub size: SpriteSize,
}

/// Outcome of a catalog load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: usize,
    /// Entries left out because their content could not be resolved.
    pub rejected: Vec<SpriteError>,
}

/// The sprite catalog.
#[derive(Resource)]
pub struct SpriteRegistry {
    /// Indexed by handle; slot 0 is never used.
    slots: Vec<Option<SpriteDescriptor>>,
    /// Unoccupied slots below `slots.len()`.
    free: BTreeSet<usize>,
    names: FxHashMap<String, FxHashMap<String, SpriteHandle>>,
    count: usize,
    loader: Box<dyn BitmapLoader>,
    sprite_root: PathBuf,
    bulk_loading: bool,
    /// Entries the loaded catalog holds that are not in the registry.
    rejected_on_load: usize,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    removed_listeners: Vec<ListenerId>,
    pending: VecDeque<RegistryEvent>,
    dispatching: bool,
}

impl SpriteRegistry {
    pub fn new(loader: impl BitmapLoader + 'static) -> Self {
        Self {
            slots: vec![None],
            free: BTreeSet::new(),
            names: FxHashMap::default(),
            count: 0,
            loader: Box::new(loader),
            sprite_root: PathBuf::from("."),
            bulk_loading: false,
            rejected_on_load: 0,
            listeners: Vec::new(),
            next_listener: 1,
            removed_listeners: Vec::new(),
            pending: VecDeque::new(),
            dispatching: false,
        }
    }

    /// Directory that automatic animations are discovered under.
    pub fn with_sprite_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sprite_root = root.into();
        self
    }

    pub fn set_sprite_root(&mut self, root: impl Into<PathBuf>) {
        self.sprite_root = root.into();
    }

    pub fn sprite_root(&self) -> &Path {
        &self.sprite_root
    }

    pub fn loader(&self) -> &dyn BitmapLoader {
        self.loader.as_ref()
    }

    pub fn loader_mut(&mut self) -> &mut dyn BitmapLoader {
        self.loader.as_mut()
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, handle: SpriteHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: SpriteHandle) -> Option<&SpriteDescriptor> {
        let slot = handle.slot()?;
        self.slots.get(slot)?.as_ref()
    }

    fn get_mut(&mut self, handle: SpriteHandle) -> Option<&mut SpriteDescriptor> {
        let slot = handle.slot()?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Look up by name, ignoring case.
    pub fn get_by_name(&self, category: &str, title: &str) -> Option<&SpriteDescriptor> {
        let handle = self.handle_by_name(category, title)?;
        self.get(handle)
    }

    /// The descriptor `key` was taken from, or `None` if it is gone or its
    /// handle now belongs to another instance.
    pub fn get_key(&self, key: SpriteKey) -> Option<&SpriteDescriptor> {
        self.get(key.handle).filter(|d| d.key() == key)
    }

    fn handle_by_name(&self, category: &str, title: &str) -> Option<SpriteHandle> {
        self.names
            .get(&fold(category))
            .and_then(|titles| titles.get(&fold(title)))
            .copied()
    }

    /// Live descriptors in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = &SpriteDescriptor> {
        self.slots.iter().flatten()
    }

    /// Smallest unoccupied handle.
    pub fn next_free_handle(&self) -> SpriteHandle {
        let slot = self.free.first().copied().unwrap_or(self.slots.len());
        SpriteHandle::from_slot(slot)
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Register `descriptor` at its own handle.
    ///
    /// Fails if the handle is invalid or above [`SpriteHandle::MAX`], already
    /// occupied, or the name is taken by another sprite.
    pub fn add(&mut self, descriptor: SpriteDescriptor) -> SpriteResult<SpriteKey> {
        let handle = descriptor.handle();
        let Some(slot) = handle.slot() else {
            error!("Refusing to register '{}' at {}", descriptor.name(), handle);
            return Err(SpriteError::InvalidHandle(handle));
        };
        if handle > SpriteHandle::MAX {
            error!("Refusing to register '{}' at {}: handle too large", descriptor.name(), handle);
            return Err(SpriteError::HandleOutOfRange {
                handle,
                max: SpriteHandle::MAX,
            });
        }
        if let Some(occupant) = self.get(handle) {
            error!(
                "Handle {} already holds '{}', cannot register '{}'",
                handle,
                occupant.name(),
                descriptor.name()
            );
            return Err(SpriteError::HandleOccupied {
                handle,
                occupant: occupant.name().clone(),
            });
        }
        if let Some(holder) = self.handle_by_name(descriptor.category(), descriptor.title()) {
            error!("Name '{}' already used by {}", descriptor.name(), holder);
            return Err(SpriteError::NameTaken {
                name: descriptor.name().clone(),
                holder,
            });
        }

        if slot >= self.slots.len() {
            self.free.extend(self.slots.len()..slot);
            self.slots.resize_with(slot + 1, || None);
        } else {
            self.free.remove(&slot);
        }

        let key = descriptor.key();
        let name = descriptor.name().clone();
        self.index_name(&name, handle);
        self.slots[slot] = Some(descriptor);
        self.count += 1;
        debug!("Registered '{}' at {}", name, handle);

        self.pending.push_back(RegistryEvent::Added {
            key,
            name: name.clone(),
        });
        if !self.bulk_loading {
            self.pending.push_back(RegistryEvent::AddedNew { key, name });
        }
        self.dispatch();
        Ok(key)
    }

    /// Remove the descriptor `key` refers to.
    ///
    /// An invalid handle is a no-op. A key whose instance does not match the
    /// descriptor currently stored at its handle is rejected and nothing is
    /// removed.
    pub fn delete(&mut self, key: SpriteKey) -> SpriteResult<()> {
        let Some(slot) = key.handle.slot() else {
            return Ok(());
        };
        if self.get_key(key).is_none() {
            error!("Stale delete of {}: stored instance differs", key);
            return Err(SpriteError::StaleReference { handle: key.handle });
        }
        let Some(descriptor) = self.slots[slot].take() else {
            return Err(SpriteError::StaleReference { handle: key.handle });
        };
        self.unindex_name(descriptor.name());
        self.free.insert(slot);
        self.count -= 1;
        debug!("Deleted '{}' from {}", descriptor.name(), key.handle);

        self.pending.push_back(RegistryEvent::Removed {
            key,
            name: descriptor.name().clone(),
        });
        self.dispatch();
        Ok(())
    }

    /// Remove every descriptor, notifying for each.
    pub fn clear(&mut self) {
        let slots = std::mem::replace(&mut self.slots, vec![None]);
        self.free.clear();
        self.names.clear();
        self.count = 0;
        for descriptor in slots.into_iter().flatten() {
            self.pending.push_back(RegistryEvent::Removed {
                key: descriptor.key(),
                name: descriptor.name().clone(),
            });
        }
        self.dispatch();
    }

    /// Rename a descriptor, keeping the name index in step.
    ///
    /// Renaming to a name held by a different sprite fails and changes
    /// nothing. Changing only the letter case is allowed.
    pub fn rename(
        &mut self,
        handle: SpriteHandle,
        category: impl Into<String>,
        title: impl Into<String>,
    ) -> SpriteResult<()> {
        let new_name = Categorization::new(category, title);
        let old_name = self
            .get(handle)
            .ok_or(SpriteError::NotFound(handle))?
            .name()
            .clone();
        if let Some(holder) = self.handle_by_name(&new_name.category, &new_name.title)
            && holder != handle
        {
            error!("Cannot rename {} to '{}': used by {}", handle, new_name, holder);
            return Err(SpriteError::NameTaken {
                name: new_name,
                holder,
            });
        }
        self.unindex_name(&old_name);
        self.index_name(&new_name, handle);
        if let Some(descriptor) = self.get_mut(handle) {
            descriptor.name = new_name;
        }
        debug!("Renamed {} from '{}'", handle, old_name);
        Ok(())
    }

    /// Copy a descriptor into the next free handle under a unique title in
    /// the same category.
    pub fn duplicate(&mut self, handle: SpriteHandle) -> SpriteResult<SpriteKey> {
        let source = self.get(handle).ok_or(SpriteError::NotFound(handle))?;
        let mut copy = source.duplicate(self.next_free_handle())?;
        copy.name.title = self.unique_title(&copy.name.category, &copy.name.title);
        self.add(copy)
    }

    /// Replace an animation's frame list and re-derive its size.
    ///
    /// Every frame must resolve to a stationary sprite. The size is computed
    /// here and not tracked afterwards.
    pub fn set_frames(
        &mut self,
        handle: SpriteHandle,
        frames: impl IntoIterator<Item = SpriteHandle>,
    ) -> SpriteResult<()> {
        let frames: FrameList = frames.into_iter().collect();
        let descriptor = self.get(handle).ok_or(SpriteError::NotFound(handle))?;
        if descriptor.as_animation().is_none() {
            return Err(SpriteError::NotAnimated(descriptor.name().clone()));
        }
        let name = descriptor.name().clone();
        let size = self.resolve_frames(&name, handle, &frames)?;
        if let Some(descriptor) = self.get_mut(handle) {
            assign_frames(descriptor, frames, size);
        }
        Ok(())
    }

    /// Check that every frame resolves to a stationary sprite and return the
    /// component-wise maximum of their sizes.
    fn resolve_frames(
        &mut self,
        referrer: &Categorization,
        referrer_handle: SpriteHandle,
        frames: &[SpriteHandle],
    ) -> SpriteResult<SpriteSize> {
        if frames.is_empty() {
            return Err(SpriteError::EmptyAnimation(referrer.clone()));
        }
        let mut size = SpriteSize::default();
        for (position, &frame) in frames.iter().enumerate() {
            let slot = frame.slot().and_then(|s| self.slots.get_mut(s));
            let Some(Some(descriptor)) = slot else {
                return Err(SpriteError::DanglingFrame {
                    missing: frame,
                    referrer: referrer.clone(),
                    referrer_handle,
                    position,
                });
            };
            if !matches!(descriptor.kind(), SpriteKind::Stationary(_)) {
                return Err(SpriteError::FrameNotStationary {
                    frame,
                    referrer: referrer.clone(),
                    position,
                });
            }
            descriptor.ensure_bitmap(self.loader.as_mut());
            size = size.max(descriptor.size());
        }
        Ok(size)
    }

    /// Rediscover the frames of an automatic animation from
    /// `<sprite_root>/<category>/<title>/`.
    ///
    /// Files whose stem is a non-negative integer become frames in numeric
    /// order. Each frame is the stationary sprite named
    /// (`<category>/<title>`, `<n>`), created with automatic size if it does
    /// not exist yet. Returns the number of frames.
    ///
    /// Frame sprites are ordinary catalog entries: they are saved and loaded
    /// like any stationary sprite and outlive the animation and the files
    /// they were discovered from. Only the sprites created by a discovery
    /// that then fails are removed again.
    pub fn refresh_auto_frames(&mut self, handle: SpriteHandle) -> SpriteResult<usize> {
        let descriptor = self.get(handle).ok_or(SpriteError::NotFound(handle))?;
        if !matches!(descriptor.kind(), SpriteKind::AutoAnimated(_)) {
            return Err(SpriteError::NotAnimated(descriptor.name().clone()));
        }
        let name = descriptor.name().clone();
        let mut created = Vec::new();
        let resolved = self
            .discover_frames(&name, &mut created)
            .and_then(|frames| {
                let size = self.resolve_frames(&name, handle, &frames)?;
                Ok((frames, size))
            });
        let (frames, size) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                self.discard_frames(&name, created);
                return Err(e);
            }
        };
        let count = frames.len();
        if let Some(descriptor) = self.get_mut(handle) {
            assign_frames(descriptor, frames, size);
        }
        Ok(count)
    }

    fn discard_frames(&mut self, name: &Categorization, created: Vec<SpriteKey>) {
        if created.is_empty() {
            return;
        }
        debug!("Removing {} frames created for '{}'", created.len(), name);
        for key in created {
            if let Err(e) = self.delete(key) {
                warn!("Could not remove frame {} of '{}': {}", key, name, e);
            }
        }
    }

    fn discover_frames(
        &mut self,
        name: &Categorization,
        created: &mut Vec<SpriteKey>,
    ) -> SpriteResult<FrameList> {
        let dir = self.sprite_root.join(&name.category).join(&name.title);
        let mut numbered: Vec<(u32, String)> = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| SpriteError::FrameScan {
                path: dir.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(number) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            let file_name = entry.file_name().to_string_lossy().into_owned();
            numbered.push((number, file_name));
        }
        numbered.sort();
        numbered.dedup_by_key(|(number, _)| *number);

        let frame_category = format!("{}/{}", name.category, name.title);
        let mut frames = FrameList::new();
        for (number, file_name) in numbered {
            let title = number.to_string();
            let handle = match self.handle_by_name(&frame_category, &title) {
                Some(existing) => existing,
                None => {
                    let handle = self.next_free_handle();
                    let frame = SpriteDescriptor::stationary(
                        handle,
                        Categorization::new(frame_category.clone(), title),
                        format!("{frame_category}/{file_name}"),
                        None,
                    );
                    let key = self.add(frame)?;
                    created.push(key);
                    key.handle
                }
            };
            frames.push(handle);
        }
        debug!("Discovered {} frames for '{}' in {:?}", frames.len(), name, dir);
        Ok(frames)
    }

    // ---------------------------------------------------------------------
    // Bitmaps and atlas
    // ---------------------------------------------------------------------

    /// Resolve what to draw for frame `frame_index` of the sprite `key`
    /// refers to, loading the frame's bitmap if needed.
    pub fn frame_source(&mut self, key: SpriteKey, frame_index: usize) -> Option<SpriteSource> {
        let descriptor = self.get_key(key)?;
        let frame = match descriptor.frame_handle(frame_index) {
            Ok(frame) => frame,
            Err(e) => {
                error!("{}", e);
                return None;
            }
        };
        let is_self = frame == key.handle;
        let own_size = descriptor.size();

        let slot = frame.slot()?;
        let loader = self.loader.as_mut();
        let Some(frame_descriptor) = self.slots.get_mut(slot).and_then(Option::as_mut) else {
            warn!("Sprite {} frame {} refers to deleted {}", key, frame_index, frame);
            return None;
        };
        frame_descriptor.ensure_bitmap(loader);
        let stationary = frame_descriptor.as_stationary()?;
        Some(SpriteSource {
            bitmap: stationary.current_bitmap().cloned(),
            source: stationary.source_rect(),
            size: if is_self {
                frame_descriptor.size()
            } else {
                own_size
            },
        })
    }

    /// Force a stationary sprite to reload its bitmap. Returns `Ok(None)`
    /// for animations and for bitmaps that fail to load.
    pub fn reload_bitmap(&mut self, handle: SpriteHandle) -> SpriteResult<Option<Bitmap>> {
        let loader = self.loader.as_mut();
        let slot = handle.slot().ok_or(SpriteError::InvalidHandle(handle))?;
        let descriptor = self
            .slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or(SpriteError::NotFound(handle))?;
        Ok(descriptor.reload_bitmap(loader))
    }

    pub fn set_atlas(&mut self, handle: SpriteHandle, bitmap: Bitmap, rect: Rect) -> SpriteResult<()> {
        let descriptor = self.get_mut(handle).ok_or(SpriteError::NotFound(handle))?;
        descriptor.set_atlas(bitmap, rect).inspect_err(|e| error!("{}", e))
    }

    pub fn remove_atlas(&mut self, handle: SpriteHandle) -> SpriteResult<Option<AtlasRegion>> {
        let descriptor = self.get_mut(handle).ok_or(SpriteError::NotFound(handle))?;
        descriptor.remove_atlas()
    }

    /// The sprite's own rectangle regardless of atlas substitution.
    pub fn original_source(&self, handle: SpriteHandle) -> SpriteResult<Rect> {
        let descriptor = self.get(handle).ok_or(SpriteError::NotFound(handle))?;
        descriptor
            .original_source()
            .ok_or_else(|| SpriteError::AtlasOnAnimated(descriptor.name().clone()))
    }

    /// Animations that use `handle` as one of their frames.
    pub fn referrers(&self, handle: SpriteHandle) -> Vec<SpriteHandle> {
        self.iter()
            .filter(|d| d.as_animation().is_some_and(|a| a.frames().contains(&handle)))
            .map(SpriteDescriptor::handle)
            .collect()
    }

    /// Stationary sprites whose bitmap is missing or could not be loaded.
    pub fn find_entries_with_missing_bitmaps(&self) -> Vec<SpriteHandle> {
        self.iter()
            .filter(|d| {
                d.as_stationary()
                    .is_some_and(|s| s.is_missing() || !self.loader.exists(s.bitmap_name()))
            })
            .map(SpriteDescriptor::handle)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Naming helpers
    // ---------------------------------------------------------------------

    /// `base`, or `base (N)` for the first N no sprite uses as a category.
    pub fn unique_category(&self, base: &str) -> String {
        first_free_name(base, |candidate| self.names.contains_key(&fold(candidate)))
    }

    /// `base`, or `base (N)` for the first N free as a title in `category`.
    pub fn unique_title(&self, category: &str, base: &str) -> String {
        first_free_name(base, |candidate| {
            self.handle_by_name(category, candidate).is_some()
        })
    }

    fn index_name(&mut self, name: &Categorization, handle: SpriteHandle) {
        let (category, title) = name.key();
        self.names.entry(category).or_default().insert(title, handle);
    }

    fn unindex_name(&mut self, name: &Categorization) {
        let (category, title) = name.key();
        if let Some(titles) = self.names.get_mut(&category) {
            titles.remove(&title);
            if titles.is_empty() {
                self.names.remove(&category);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&mut SpriteRegistry, &RegistryEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(existing, _)| *existing != id);
        if self.dispatching {
            self.removed_listeners.push(id);
        }
    }

    fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(event) = self.pending.pop_front() {
            let mut listeners = std::mem::take(&mut self.listeners);
            for (id, listener) in listeners.iter_mut() {
                if self.removed_listeners.contains(id) {
                    continue;
                }
                listener(self, &event);
            }
            // keep listeners registered while dispatching
            listeners.append(&mut self.listeners);
            let removed = std::mem::take(&mut self.removed_listeners);
            listeners.retain(|(id, _)| !removed.contains(id));
            self.listeners = listeners;
        }
        self.dispatching = false;
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Replace the registry's contents with the catalog at `path`.
    ///
    /// A document that cannot be read or parsed fails the whole load and
    /// leaves the registry untouched. Entries whose frames do not resolve are
    /// skipped and reported in [`LoadSummary::rejected`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> SpriteResult<LoadSummary> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let document: CatalogDocument = serde_json::from_str(&text)?;
        self.clear();
        self.rejected_on_load = 0;
        let summary = self.load_document(&document);
        info!(
            "Loaded {} sprites from {:?} ({} rejected)",
            summary.loaded,
            path,
            summary.rejected.len()
        );
        Ok(summary)
    }

    /// Register every entry of `document`: stationary sprites first, then
    /// animations, then automatic animations.
    pub fn load_document(&mut self, document: &CatalogDocument) -> LoadSummary {
        let mut summary = LoadSummary::default();
        self.bulk_loading = true;

        for node in &document.stationary {
            let result = self.add(node.to_descriptor());
            summary.record(result.map(|_| ()));
        }

        for node in &document.animated {
            let mut descriptor = node.to_descriptor();
            let result = self
                .resolve_frames(&node.category, node.handle, &node.frames)
                .and_then(|size| {
                    assign_frames(&mut descriptor, node.frames.iter().copied().collect(), size);
                    self.add(descriptor)
                });
            summary.record(result.map(|_| ()));
        }

        for node in &document.automatic_animated {
            let result = self.add(node.to_descriptor()).and_then(|key| {
                self.refresh_auto_frames(key.handle).or_else(|e| {
                    // an automatic animation without frames cannot play
                    self.delete(key)?;
                    Err(e)
                })
            });
            summary.record(result.map(|_| ()));
        }

        self.bulk_loading = false;
        self.rejected_on_load += summary.rejected.len();
        summary
    }

    /// Number of entries rejected since the catalog was last loaded.
    pub fn rejected_on_load(&self) -> usize {
        self.rejected_on_load
    }

    /// Write the catalog to `path` through a temporary file in the same
    /// directory, replacing `path` only once the write has fully succeeded.
    ///
    /// Refuses with [`SpriteError::RejectedEntries`] if the last load rejected
    /// entries, since the written catalog would silently lose them. Use
    /// [`Self::save_discarding_rejected`] to write anyway.
    pub fn save(&self, path: impl AsRef<Path>) -> SpriteResult<()> {
        if self.rejected_on_load > 0 {
            error!(
                "Not saving {:?}: {} rejected entries would be lost",
                path.as_ref(),
                self.rejected_on_load
            );
            return Err(SpriteError::RejectedEntries(self.rejected_on_load));
        }
        self.write_catalog(path.as_ref())
    }

    /// Save even though entries rejected on load will be dropped.
    pub fn save_discarding_rejected(&self, path: impl AsRef<Path>) -> SpriteResult<()> {
        if self.rejected_on_load > 0 {
            warn!(
                "Dropping {} rejected entries from {:?}",
                self.rejected_on_load,
                path.as_ref()
            );
        }
        self.write_catalog(path.as_ref())
    }

    fn write_catalog(&self, path: &Path) -> SpriteResult<()> {
        let document = CatalogDocument::from_descriptors(self.iter());
        let text = serde_json::to_string_pretty(&document)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(text.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        info!("Saved {} sprites to {:?}", document.len(), path);
        Ok(())
    }
}

impl LoadSummary {
    fn record(&mut self, result: SpriteResult<()>) {
        match result {
            Ok(()) => self.loaded += 1,
            Err(e) => {
                error!("Rejected catalog entry: {}", e);
                self.rejected.push(e);
            }
        }
    }
}

fn assign_frames(descriptor: &mut SpriteDescriptor, frames: FrameList, size: SpriteSize) {
    if let Some(animation) = descriptor.as_animation_mut() {
        animation.frames = frames;
    }
    descriptor.size = size;
}
