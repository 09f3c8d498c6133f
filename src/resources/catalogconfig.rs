//! Catalog configuration.
//!
//! Locations of the catalog file and of the content it refers to, loaded
//! from an INI file. Missing values keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [catalog]
//! path = ./assets/sprites.json
//!
//! [bitmaps]
//! root = ./assets/textures
//!
//! [sprites]
//! root = ./assets/textures
//! ```
//!
//! `[bitmaps] root` is where bitmap names resolve; `[sprites] root` is where
//! automatic animations look for their numbered frame directories. Frame
//! bitmaps of automatic animations are named relative to `[sprites] root`,
//! so [`CatalogConfig::bitmap_store`] searches both.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;

use crate::resources::bitmapstore::BitmapStore;

const DEFAULT_CATALOG_PATH: &str = "./assets/sprites.json";
const DEFAULT_BITMAP_ROOT: &str = "./assets/textures";
const DEFAULT_CONFIG_PATH: &str = "./spritecatalog.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Catalog document read by `load` and written by `save`.
    pub catalog_path: PathBuf,
    /// Directory bitmap names are relative to.
    pub bitmap_root: PathBuf,
    /// Directory automatic animations are discovered under.
    pub sprite_root: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            bitmap_root: PathBuf::from(DEFAULT_BITMAP_ROOT),
            sprite_root: PathBuf::from(DEFAULT_BITMAP_ROOT),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration read from (and saved to) `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Bitmap loader resolving names under the bitmap root, then the sprite
    /// root.
    pub fn bitmap_store(&self) -> BitmapStore {
        BitmapStore::from_directory(&self.bitmap_root).with_search_root(&self.sprite_root)
    }

    /// Load configuration from the INI file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        if let Some(path) = config.get("catalog", "path") {
            self.catalog_path = PathBuf::from(path);
        }
        if let Some(root) = config.get("bitmaps", "root") {
            self.bitmap_root = PathBuf::from(root);
        }
        if let Some(root) = config.get("sprites", "root") {
            self.sprite_root = PathBuf::from(root);
        }

        info!(
            "Loaded config: catalog={:?}, bitmaps={:?}, sprites={:?}",
            self.catalog_path, self.bitmap_root, self.sprite_root
        );
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        config.set(
            "catalog",
            "path",
            Some(self.catalog_path.display().to_string()),
        );
        config.set(
            "bitmaps",
            "root",
            Some(self.bitmap_root.display().to_string()),
        );
        config.set(
            "sprites",
            "root",
            Some(self.sprite_root.display().to_string()),
        );
        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_keep_defaults() {
        let mut config = CatalogConfig::new();
        config
            .load_from_str("[catalog]\npath = data/cat.json\n")
            .unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("data/cat.json"));
        assert_eq!(config.bitmap_root, PathBuf::from(DEFAULT_BITMAP_ROOT));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.ini");
        let mut config = CatalogConfig::with_path(&path);
        config.bitmap_root = PathBuf::from("tex");
        config.sprite_root = PathBuf::from("anim");
        config.save_to_file().unwrap();

        let mut loaded = CatalogConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = CatalogConfig::with_path("/nonexistent/spritecatalog.ini");
        assert!(config.load_from_file().is_err());
    }
}
