//! Sprite catalog command-line tool.
//!
//! Loads the catalog named by the configuration file and inspects or edits
//! it. Editing commands save the catalog back in place.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config spritecatalog.ini list
//! cargo run --release -- play hero walk --duration-ms 2000
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::{Parser, Subcommand};

use spritecatalog::components::playback::{AnimationMode, SpritePlayback};
use spritecatalog::resources::catalogconfig::CatalogConfig;
use spritecatalog::resources::spriteregistry::SpriteRegistry;
use spritecatalog::resources::worldtime::WorldTime;
use spritecatalog::sprite::descriptor::{SpriteDescriptor, SpriteKind};
use spritecatalog::sprite::error::SpriteError;
use spritecatalog::sprite::handle::SpriteHandle;
use spritecatalog::systems::playback::sprite_playback;
use spritecatalog::systems::time::update_world_time;

/// Inspect and edit a sprite catalog.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (default: ./spritecatalog.ini).
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Catalog file, overriding the configuration.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Save even if entries were rejected on load (they are dropped), and
    /// delete sprites still used as animation frames.
    #[arg(long)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List sprites, optionally only one category.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one sprite in detail.
    Show { category: String, title: String },
    /// List stationary sprites whose bitmap cannot be loaded.
    Missing,
    /// Rename a sprite and save.
    Rename {
        category: String,
        title: String,
        new_category: String,
        new_title: String,
    },
    /// Delete a sprite and save.
    Delete { category: String, title: String },
    /// Duplicate a sprite under a unique title and save.
    Duplicate { category: String, title: String },
    /// Simulate playback of a sprite and print frame changes.
    Play {
        category: String,
        title: String,
        /// Total simulated time.
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
        /// Simulated frame step.
        #[arg(long, default_value_t = 16)]
        step_ms: u64,
        /// Play once instead of looping.
        #[arg(long)]
        once: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match cli.config {
        Some(path) => CatalogConfig::with_path(path),
        None => CatalogConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }

    let mut registry =
        SpriteRegistry::new(config.bitmap_store()).with_sprite_root(&config.sprite_root);
    let summary = registry
        .load(&config.catalog_path)
        .map_err(|e| e.to_string())?;
    for rejected in &summary.rejected {
        eprintln!("rejected: {rejected}");
    }

    match cli.command {
        Command::List { category } => {
            for sprite in registry.iter().filter(|d| {
                category
                    .as_deref()
                    .is_none_or(|c| d.category().eq_ignore_ascii_case(c))
            }) {
                print_summary(sprite);
            }
        }
        Command::Show { category, title } => {
            let handle = find(&registry, &category, &title)?;
            show(&mut registry, handle);
        }
        Command::Missing => {
            for handle in registry.find_entries_with_missing_bitmaps() {
                if let Some(sprite) = registry.get(handle) {
                    print_summary(sprite);
                }
            }
        }
        Command::Rename {
            category,
            title,
            new_category,
            new_title,
        } => {
            let handle = find(&registry, &category, &title)?;
            registry
                .rename(handle, new_category, new_title)
                .map_err(|e| e.to_string())?;
            save(&registry, &config, cli.force)?;
        }
        Command::Delete { category, title } => {
            let handle = find(&registry, &category, &title)?;
            let referrers = registry.referrers(handle);
            if !referrers.is_empty() && !cli.force {
                return Err(format!(
                    "'{category}/{title}' is a frame of {} animation(s); use --force to delete it anyway",
                    referrers.len()
                ));
            }
            let key = registry
                .get(handle)
                .map(SpriteDescriptor::key)
                .ok_or_else(|| format!("{handle} vanished"))?;
            registry.delete(key).map_err(|e| e.to_string())?;
            save(&registry, &config, cli.force)?;
        }
        Command::Duplicate { category, title } => {
            let handle = find(&registry, &category, &title)?;
            let key = registry.duplicate(handle).map_err(|e| e.to_string())?;
            if let Some(copy) = registry.get(key.handle) {
                print_summary(copy);
            }
            save(&registry, &config, cli.force)?;
        }
        Command::Play {
            category,
            title,
            duration_ms,
            step_ms,
            once,
        } => {
            let handle = find(&registry, &category, &title)?;
            let mode = if once {
                AnimationMode::LoopOnce
            } else {
                AnimationMode::Loop
            };
            play(registry, handle, mode, duration_ms, step_ms.max(1));
        }
    }
    Ok(())
}

fn find(registry: &SpriteRegistry, category: &str, title: &str) -> Result<SpriteHandle, String> {
    registry
        .get_by_name(category, title)
        .map(SpriteDescriptor::handle)
        .ok_or_else(|| format!("no sprite named '{category}/{title}'"))
}

fn save(registry: &SpriteRegistry, config: &CatalogConfig, force: bool) -> Result<(), String> {
    let result = if force {
        registry.save_discarding_rejected(&config.catalog_path)
    } else {
        registry.save(&config.catalog_path)
    };
    result.map_err(|e| match e {
        SpriteError::RejectedEntries(_) => format!("{e}; use --force to save anyway"),
        e => e.to_string(),
    })
}

fn print_summary(sprite: &SpriteDescriptor) {
    let size = sprite.size();
    println!(
        "{:>6}  {:<10}  {:>4}x{:<4}  {}",
        sprite.handle().get(),
        sprite.kind_name(),
        size.width,
        size.height,
        sprite.name()
    );
}

fn show(registry: &mut SpriteRegistry, handle: SpriteHandle) {
    let Some(sprite) = registry.get(handle) else {
        return;
    };
    print_summary(sprite);
    let key = sprite.key();
    match sprite.kind() {
        SpriteKind::Stationary(s) => {
            let r = s.original_source();
            println!(
                "        bitmap {} rect {},{} {}x{}{}",
                s.bitmap_name(),
                r.x,
                r.y,
                r.width,
                r.height,
                if s.auto_size() { " (auto)" } else { "" }
            );
            if let Some(source) = registry.frame_source(key, 0) {
                match source.bitmap {
                    Some(bitmap) => println!("        loaded {}x{}", bitmap.width, bitmap.height),
                    None => println!("        bitmap missing"),
                }
            }
        }
        SpriteKind::Animated(a) | SpriteKind::AutoAnimated(a) => {
            let duration = a
                .frame_duration()
                .map_or_else(|| "stopped".to_string(), |ms| format!("{ms:.1} ms/frame"));
            println!("        {} frames, {}", a.frames().len(), duration);
            for (i, frame) in a.frames().iter().enumerate() {
                let name = registry
                    .get(*frame)
                    .map_or_else(|| "<missing>".to_string(), |d| d.name().to_string());
                println!("        [{i}] {} {}", frame.get(), name);
            }
        }
    }
}

fn play(registry: SpriteRegistry, handle: SpriteHandle, mode: AnimationMode, duration_ms: u64, step_ms: u64) {
    let Some(mut cursor) = registry.get(handle).map(SpritePlayback::bound) else {
        return;
    };
    cursor.play(mode, 0);

    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(registry);
    let entity = world.spawn(cursor).id();

    let mut update = Schedule::default();
    update.add_systems(sprite_playback);

    let mut last_frame = None;
    let mut now = 0;
    while now <= duration_ms {
        update.run(&mut world);
        let Some(cursor) = world.get::<SpritePlayback>(entity) else {
            break;
        };
        let frame = cursor.frame_index();
        let mode = cursor.mode();
        if last_frame != Some(frame) {
            println!("{now:>8} ms  frame {frame}  {mode:?}");
            last_frame = Some(frame);
        }
        if mode == AnimationMode::None {
            break;
        }
        update_world_time(&mut world, step_ms as f32 / 1000.0);
        now = world.resource::<WorldTime>().tick;
    }
}
