//! Human-readable sprite names.
//!
//! A sprite is named by a `(category, title)` pair. Both parts compare
//! case-insensitively; the original spelling is kept for display and
//! persistence. Categories are delimiter-separated paths (`"ui/buttons"`) but
//! the registry treats them as opaque strings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used inside hierarchical categories.
pub const CATEGORY_DELIMITER: char = '/';

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Categorization {
    pub category: String,
    pub title: String,
}

impl Categorization {
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
        }
    }

    /// Lowercased `(category, title)` used as the name-index key.
    pub fn key(&self) -> (String, String) {
        (fold(&self.category), fold(&self.title))
    }

    /// Case-insensitive comparison against a raw pair.
    pub fn matches(&self, category: &str, title: &str) -> bool {
        fold(&self.category) == fold(category) && fold(&self.title) == fold(title)
    }
}

impl PartialEq for Categorization {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Categorization {}

impl PartialOrd for Categorization {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Categorization {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Categorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category, CATEGORY_DELIMITER, self.title)
    }
}

pub(crate) fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Remove a trailing ` (N)` suffix so repeated duplication does not stack
/// suffixes (`"hero (2) (1)"`).
pub fn strip_counter_suffix(name: &str) -> &str {
    let Some(open) = name.rfind(" (") else {
        return name;
    };
    let tail = &name[open + 2..];
    match tail.strip_suffix(')') {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            &name[..open]
        }
        _ => name,
    }
}

/// Yield `base`, then `base (1)`, `base (2)`, ... until `taken` says no.
pub fn first_free_name(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let stem = strip_counter_suffix(base);
    let mut n: u32 = 1;
    loop {
        let candidate = format!("{stem} ({n})");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
