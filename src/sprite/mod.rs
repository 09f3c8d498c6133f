//! Sprite data model.
//!
//! - `handle` – handles, instance identities and stale-reference keys
//! - `categorization` – case-insensitive `(category, title)` names
//! - `geometry` – rectangles and pixel sizes
//! - `descriptor` – the descriptor record and its closed set of kinds
//! - `atlas` – reversible atlas substitution on stationary sprites
//! - `persist` – serde types of the catalog file
//! - `error` – error taxonomy shared by the catalog
pub mod atlas;
pub mod categorization;
pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod persist;
