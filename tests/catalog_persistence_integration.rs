//! Catalog persistence integration tests: save, load, rejection of bad
//! entries and discovery of automatic animations on disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use spritecatalog::resources::bitmapstore::BitmapStore;
use spritecatalog::resources::catalogconfig::CatalogConfig;
use spritecatalog::resources::spriteregistry::{RegistryEvent, SpriteRegistry};
use spritecatalog::sprite::categorization::Categorization;
use spritecatalog::sprite::descriptor::{SpriteDescriptor, SpriteKind};
use spritecatalog::sprite::error::SpriteError;
use spritecatalog::sprite::geometry::{Rect, SpriteSize};
use spritecatalog::sprite::handle::SpriteHandle;
use spritecatalog::sprite::persist::CatalogDocument;

fn memory_loader() -> BitmapStore {
    let mut loader = BitmapStore::in_memory();
    loader.insert_dimensions("hero.png", 64, 32);
    loader.insert_dimensions("tiles.png", 128, 128);
    loader
}

/// Two stationary sprites, an animation over them and a stationary sprite
/// with automatic size.
fn populated_registry() -> SpriteRegistry {
    let mut registry = SpriteRegistry::new(memory_loader());
    let a = SpriteDescriptor::stationary(
        registry.next_free_handle(),
        Categorization::new("hero", "step 1"),
        "hero.png",
        Some(Rect::new(0, 0, 32, 32)),
    );
    let a = registry.add(a).unwrap();
    let b = SpriteDescriptor::stationary(
        registry.next_free_handle(),
        Categorization::new("hero", "step 2"),
        "hero.png",
        Some(Rect::new(32, 0, 32, 32)),
    );
    let b = registry.add(b).unwrap();
    let tiles = SpriteDescriptor::stationary(
        registry.next_free_handle(),
        Categorization::new("world", "tiles"),
        "tiles.png",
        None,
    );
    registry.add(tiles).unwrap();
    let walk = SpriteDescriptor::animated(
        registry.next_free_handle(),
        Categorization::new("hero", "walk"),
        50.0,
    );
    let walk = registry.add(walk).unwrap();
    registry
        .set_frames(walk.handle, [a.handle, b.handle, a.handle])
        .unwrap();
    registry
}

fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbaImage::new(width, height).save(path).unwrap();
}

#[test]
fn save_then_load_restores_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    populated_registry().save(&path).unwrap();

    let mut registry = SpriteRegistry::new(memory_loader());
    let summary = registry.load(&path).unwrap();
    assert_eq!(summary.loaded, 4);
    assert!(summary.rejected.is_empty());
    assert_eq!(registry.len(), 4);

    let step = registry.get_by_name("hero", "step 2").unwrap();
    assert_eq!(step.handle(), SpriteHandle(2));
    let s = step.as_stationary().unwrap();
    assert_eq!(s.bitmap_name(), "hero.png");
    assert_eq!(s.original_source(), Rect::new(32, 0, 32, 32));
    assert!(!s.auto_size());

    let tiles = registry.get_by_name("WORLD", "Tiles").unwrap();
    assert!(tiles.as_stationary().unwrap().auto_size());

    let walk = registry.get_by_name("hero", "walk").unwrap();
    assert_eq!(walk.handle(), SpriteHandle(4));
    assert!((walk.speed() - 0.02).abs() < 1e-6);
    assert_eq!(
        walk.as_animation().unwrap().frames(),
        &[SpriteHandle(1), SpriteHandle(2), SpriteHandle(1)]
    );
    assert_eq!(walk.size(), SpriteSize::new(32, 32));
    assert_eq!(registry.next_free_handle(), SpriteHandle(5));
}

#[test]
fn saved_output_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let registry = populated_registry();
    registry.save(&first).unwrap();

    // same content registered in another order
    let mut reordered = SpriteRegistry::new(memory_loader());
    let mut descriptors: Vec<_> = registry.iter().collect();
    descriptors.reverse();
    for d in descriptors {
        let copy = d.duplicate(d.handle()).unwrap();
        reordered.add(copy).unwrap();
    }
    reordered.save(&second).unwrap();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn save_leaves_no_temporary_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    let registry = populated_registry();
    registry.save(&path).unwrap();
    registry.save(&path).unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("sprites.json")]);
}

#[test]
fn dangling_frame_rejects_only_its_animation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    fs::write(
        &path,
        r#"{
            "Stationary": [
                { "handle": 1,
                  "category": { "category": "hero", "title": "idle" },
                  "texture": { "source": "hero.png",
                               "rect": { "x": 0, "y": 0, "width": 32, "height": 32 } } }
            ],
            "Animated": [
                { "handle": 2,
                  "category": { "category": "hero", "title": "walk" },
                  "speed": 0.1,
                  "frames": [1, 42] },
                { "handle": 3,
                  "category": { "category": "hero", "title": "blink" },
                  "speed": 0.1,
                  "frames": [1] }
            ]
        }"#,
    )
    .unwrap();

    let mut registry = SpriteRegistry::new(memory_loader());
    let summary = registry.load(&path).unwrap();
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.rejected.len(), 1);
    match &summary.rejected[0] {
        SpriteError::DanglingFrame {
            missing,
            referrer,
            referrer_handle,
            position,
        } => {
            assert_eq!(*missing, SpriteHandle(42));
            assert_eq!(referrer, &Categorization::new("hero", "walk"));
            assert_eq!(*referrer_handle, SpriteHandle(2));
            assert_eq!(*position, 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(registry.get_by_name("hero", "walk").is_none());
    assert!(registry.get_by_name("hero", "blink").is_some());
    assert_eq!(registry.next_free_handle(), SpriteHandle(2));
}

#[test]
fn bulk_load_does_not_announce_new_sprites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    populated_registry().save(&path).unwrap();

    let mut registry = SpriteRegistry::new(memory_loader());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.add_listener(move |_, event| sink.lock().unwrap().push(event.clone()));
    registry.load(&path).unwrap();

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|e| matches!(e, RegistryEvent::Added { .. })));
    }

    let extra = SpriteDescriptor::stationary(
        registry.next_free_handle(),
        Categorization::new("hero", "jump"),
        "hero.png",
        None,
    );
    registry.add(extra).unwrap();
    let seen = seen.lock().unwrap();
    assert!(matches!(seen.last(), Some(RegistryEvent::AddedNew { .. })));
}

#[test]
fn unreadable_catalog_leaves_registry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"Stationary\": [ { \"handle\": ").unwrap();

    let mut registry = populated_registry();
    assert!(matches!(registry.load(&path), Err(SpriteError::Format(_))));
    assert!(matches!(
        registry.load(dir.path().join("absent.json")),
        Err(SpriteError::Io(_))
    ));
    assert_eq!(registry.len(), 4);
    assert!(registry.get_by_name("hero", "walk").is_some());
}

#[test]
fn automatic_animation_discovers_numbered_frames() {
    let root = tempfile::tempdir().unwrap();
    let spark = root.path().join("fx").join("spark");
    write_png(&spark.join("0.png"), 4, 4);
    write_png(&spark.join("1.png"), 4, 4);
    write_png(&spark.join("2.png"), 4, 4);
    write_png(&spark.join("10.png"), 8, 2);
    fs::write(spark.join("readme.txt"), "not a frame").unwrap();

    let path = root.path().join("sprites.json");
    fs::write(
        &path,
        r#"{ "AutomaticAnimated": [
              { "handle": 1, "category": { "category": "fx", "title": "spark" } } ] }"#,
    )
    .unwrap();

    let mut registry =
        SpriteRegistry::new(BitmapStore::from_directory(root.path())).with_sprite_root(root.path());
    let summary = registry.load(&path).unwrap();
    assert!(summary.rejected.is_empty());
    assert_eq!(registry.len(), 5);

    let spark = registry.get(SpriteHandle(1)).unwrap();
    assert!(matches!(spark.kind(), SpriteKind::AutoAnimated(_)));
    assert_eq!(spark.frame_count(), 4);
    assert_eq!(spark.size(), SpriteSize::new(8, 4));
    let titles: Vec<String> = (0..4)
        .map(|i| {
            let frame = spark.frame_handle(i).unwrap();
            let d = registry.get(frame).unwrap();
            assert_eq!(d.category(), "fx/spark");
            d.title().to_string()
        })
        .collect();
    assert_eq!(titles, ["0", "1", "2", "10"]);
    let last = registry.get_by_name("fx/spark", "10").unwrap();
    assert_eq!(
        last.as_stationary().unwrap().bitmap_name(),
        "fx/spark/10.png"
    );

    registry.save(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(raw["AutomaticAnimated"][0].get("frames").is_none());
    let document: CatalogDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(document.stationary.len(), 4);
    assert!(document.stationary.iter().all(|n| n.auto_size));

    // frames saved as stationary sprites are reused rather than recreated
    let mut reloaded =
        SpriteRegistry::new(BitmapStore::from_directory(root.path())).with_sprite_root(root.path());
    let summary = reloaded.load(&path).unwrap();
    assert_eq!(summary.loaded, 5);
    assert_eq!(reloaded.len(), 5);
    assert_eq!(reloaded.get(SpriteHandle(1)).unwrap().frame_count(), 4);
}

#[test]
fn automatic_animation_without_frames_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("fx").join("empty")).unwrap();
    let path = root.path().join("sprites.json");
    fs::write(
        &path,
        r#"{ "AutomaticAnimated": [
              { "handle": 1, "category": { "category": "fx", "title": "gone" } },
              { "handle": 2, "category": { "category": "fx", "title": "empty" } } ] }"#,
    )
    .unwrap();

    let mut registry =
        SpriteRegistry::new(BitmapStore::from_directory(root.path())).with_sprite_root(root.path());
    let summary = registry.load(&path).unwrap();
    assert_eq!(summary.loaded, 0);
    assert_eq!(summary.rejected.len(), 2);
    assert!(matches!(summary.rejected[0], SpriteError::FrameScan { .. }));
    assert!(matches!(summary.rejected[1], SpriteError::EmptyAnimation(_)));
    assert!(registry.is_empty());
}

#[test]
fn oversized_handle_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    fs::write(
        &path,
        r#"{ "Stationary": [
              { "handle": 2147483647,
                "category": { "category": "hero", "title": "huge" },
                "texture": { "source": "hero.png",
                             "rect": { "x": 0, "y": 0, "width": 8, "height": 8 } } },
              { "handle": 1,
                "category": { "category": "hero", "title": "idle" },
                "texture": { "source": "hero.png",
                             "rect": { "x": 0, "y": 0, "width": 8, "height": 8 } } } ] }"#,
    )
    .unwrap();

    let mut registry = SpriteRegistry::new(memory_loader());
    let summary = registry.load(&path).unwrap();
    assert_eq!(summary.loaded, 1);
    assert!(matches!(
        summary.rejected[..],
        [SpriteError::HandleOutOfRange { .. }]
    ));
    assert_eq!(registry.next_free_handle(), SpriteHandle(2));
}

#[test]
fn save_refuses_to_drop_rejected_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprites.json");
    fs::write(
        &path,
        r#"{
            "Stationary": [
                { "handle": 1,
                  "category": { "category": "hero", "title": "idle" },
                  "texture": { "source": "hero.png",
                               "rect": { "x": 0, "y": 0, "width": 32, "height": 32 } } }
            ],
            "Animated": [
                { "handle": 2,
                  "category": { "category": "hero", "title": "walk" },
                  "speed": 0.1,
                  "frames": [1, 9] }
            ]
        }"#,
    )
    .unwrap();
    let walk_on_disk = |path: &Path| {
        let document: CatalogDocument =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        document
            .animated
            .iter()
            .any(|n| n.category == Categorization::new("hero", "walk"))
    };

    let mut registry = SpriteRegistry::new(memory_loader());
    registry.load(&path).unwrap();
    assert_eq!(registry.rejected_on_load(), 1);
    registry.rename(SpriteHandle(1), "hero", "stand").unwrap();

    assert!(matches!(
        registry.save(&path),
        Err(SpriteError::RejectedEntries(1))
    ));
    assert!(walk_on_disk(&path));

    registry.save_discarding_rejected(&path).unwrap();
    assert!(!walk_on_disk(&path));

    // the rewritten catalog loads cleanly, so saving is allowed again
    registry.load(&path).unwrap();
    assert_eq!(registry.rejected_on_load(), 0);
    registry.save(&path).unwrap();
}

#[test]
fn automatic_frames_load_when_roots_differ() {
    let root = tempfile::tempdir().unwrap();
    let mut config = CatalogConfig::with_path(root.path().join("spritecatalog.ini"));
    config.bitmap_root = root.path().join("tex");
    config.sprite_root = root.path().join("anim");
    config.catalog_path = root.path().join("sprites.json");
    fs::create_dir_all(&config.bitmap_root).unwrap();
    write_png(&config.sprite_root.join("fx/spark/1.png"), 6, 3);
    fs::write(
        &config.catalog_path,
        r#"{ "AutomaticAnimated": [
              { "handle": 1, "category": { "category": "fx", "title": "spark" } } ] }"#,
    )
    .unwrap();

    let mut registry =
        SpriteRegistry::new(config.bitmap_store()).with_sprite_root(&config.sprite_root);
    let summary = registry.load(&config.catalog_path).unwrap();
    assert!(summary.rejected.is_empty());
    assert!(registry.find_entries_with_missing_bitmaps().is_empty());
    assert_eq!(
        registry.get(SpriteHandle(1)).unwrap().size(),
        SpriteSize::new(6, 3)
    );
}
